//! Breadth-first route search over walkable tiles

use crate::models::{Direction, Location};
use crate::world::{Pathfinder, World};
use std::collections::{HashMap, VecDeque};

/// Bounded BFS pathfinder
///
/// Explores the eight neighbours of each tile on the starting floor and
/// returns the first route found, which is shortest in steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct GridPathfinder;

impl Pathfinder for GridPathfinder {
    fn find_path(
        &self,
        world: &dyn World,
        from: Location,
        to: Location,
        max_steps: usize,
    ) -> Option<Vec<Direction>> {
        if from.z != to.z {
            return None;
        }
        if from == to {
            return Some(Vec::new());
        }

        let mut came_from: HashMap<Location, (Location, Direction)> = HashMap::new();
        let mut frontier = VecDeque::from([(from, 0usize)]);

        while let Some((current, depth)) = frontier.pop_front() {
            if depth >= max_steps {
                continue;
            }

            for direction in Direction::ALL {
                let next = current.step(direction);
                if next == from || came_from.contains_key(&next) {
                    continue;
                }
                let walkable = world.tile(next).is_some_and(|tile| tile.is_walkable());
                if !walkable {
                    continue;
                }

                came_from.insert(next, (current, direction));
                if next == to {
                    return Some(unwind(&came_from, from, to));
                }
                frontier.push_back((next, depth + 1));
            }
        }

        None
    }
}

fn unwind(
    came_from: &HashMap<Location, (Location, Direction)>,
    from: Location,
    to: Location,
) -> Vec<Direction> {
    let mut directions = Vec::new();
    let mut cursor = to;
    while cursor != from {
        match came_from.get(&cursor) {
            Some((previous, direction)) => {
                directions.push(*direction);
                cursor = *previous;
            }
            None => break,
        }
    }
    directions.reverse();
    directions
}
