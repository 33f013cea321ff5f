//! Map coordinates and facing directions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position on the map
///
/// `z` is the floor; interactions never cross floors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: u8,
}

impl Location {
    pub const fn new(x: i32, y: i32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Chebyshev distance on the same floor, `None` across floors
    ///
    /// # Example
    /// ```
    /// use tick_engine_core_rs::models::Location;
    ///
    /// let a = Location::new(10, 10, 7);
    /// assert_eq!(a.distance_to(&Location::new(12, 11, 7)), Some(2));
    /// assert_eq!(a.distance_to(&Location::new(10, 10, 6)), None);
    /// ```
    pub fn distance_to(&self, other: &Location) -> Option<u32> {
        if self.z != other.z {
            return None;
        }
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        Some(dx.max(dy))
    }

    /// Whether `other` is within `radius` steps on the same floor
    pub fn is_within(&self, other: &Location, radius: u32) -> bool {
        self.distance_to(other).is_some_and(|d| d <= radius)
    }

    /// The neighbouring location in `direction`
    pub fn step(&self, direction: Direction) -> Location {
        let (dx, dy) = direction.offset();
        Location::new(self.x + dx, self.y + dy, self.z)
    }

    /// Direction of a single step from `self` to an adjacent `other`
    pub fn direction_to(&self, other: &Location) -> Option<Direction> {
        if self.z != other.z {
            return None;
        }
        let dx = (other.x - self.x).signum();
        let dy = (other.y - self.y).signum();
        Direction::from_offset(dx, dy)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Facing or stepping direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    /// `(dx, dy)` with north being negative y
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, -1),
            Direction::SouthEast => (1, 1),
            Direction::SouthWest => (-1, 1),
            Direction::NorthWest => (-1, -1),
        }
    }

    pub fn from_offset(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|direction| direction.offset() == (dx, dy))
    }

    /// Diagonal steps cost more time than straight ones
    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.offset();
        dx != 0 && dy != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_and_direction_round_trip() {
        let origin = Location::new(5, 5, 7);
        for direction in Direction::ALL {
            let next = origin.step(direction);
            assert_eq!(origin.direction_to(&next), Some(direction));
            assert_eq!(origin.distance_to(&next), Some(1));
        }
    }

    #[test]
    fn test_is_within_requires_same_floor() {
        let a = Location::new(0, 0, 7);
        assert!(a.is_within(&Location::new(1, 1, 7), 1));
        assert!(!a.is_within(&Location::new(0, 0, 8), 5));
    }

    #[test]
    fn test_direction_to_same_location_is_none() {
        let a = Location::new(3, 3, 7);
        assert_eq!(a.direction_to(&a), None);
    }
}
