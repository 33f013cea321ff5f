//! Ambient light

use serde::{Deserialize, Serialize};

/// Snapshot of the world's ambient light handed to clients at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldLight {
    pub level: u8,
    pub color: u8,
}

impl Default for WorldLight {
    fn default() -> Self {
        Self { level: 250, color: 215 }
    }
}
