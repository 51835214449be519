//! Port geometry: quarter-turn rotations and compass directions.
//!
//! Catalog entries list their ports in canonical (unrotated) orientation.
//! A placed building stores a [`Rotation`]; callers always rotate the
//! canonical ports by it before computing neighbour coordinates.

use serde::{Deserialize, Serialize};

/// Rotation applied to a placed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Cw90,
    /// 180 degrees.
    Cw180,
    /// 270 degrees clockwise (90 degrees counter-clockwise).
    Cw270,
}

impl Rotation {
    /// All four rotation values.
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::None,
            Rotation::Cw90,
            Rotation::Cw180,
            Rotation::Cw270,
        ]
    }

    /// Build from a count of clockwise quarter turns (taken modulo 4).
    pub fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Cw270,
        }
    }

    /// Number of clockwise quarter turns, 0..=3.
    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Cw270 => 3,
        }
    }

    /// Rotate 90 degrees clockwise.
    pub fn rotate_cw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }

    /// Rotate 90 degrees counter-clockwise.
    pub fn rotate_ccw(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 3)
    }
}

/// Port directions. The declaration order is the cyclic order a clockwise
/// quarter turn walks through: up, right, down, left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// All four directions in cyclic order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ]
    }

    /// Grid offset for this direction. `y` grows downwards.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// This direction after applying `rotation`.
    pub fn rotated(self, rotation: Rotation) -> Direction {
        let all = Self::all();
        all[(self as usize + rotation.quarter_turns() as usize) % 4]
    }

    /// The direction pointing the other way.
    pub fn opposite(self) -> Direction {
        self.rotated(Rotation::Cw180)
    }
}

/// Rotate every direction in `directions`, preserving order.
pub fn rotate_all(directions: &[Direction], rotation: Rotation) -> Vec<Direction> {
    directions.iter().map(|d| d.rotated(rotation)).collect()
}
