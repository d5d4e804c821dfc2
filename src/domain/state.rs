// Domain-level player state and movement primitives.

use serde::{Deserialize, Serialize};

/// Facing of a player on the board. The wire spelling is the uppercase
/// variant name ("UP", "DOWN", "LEFT", "RIGHT"), which is what the peer
/// engine speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// The cell reached by moving one step from (x, y) in this direction.
    pub fn step(self, x: i32, y: i32) -> (i32, i32) {
        match self {
            Direction::Up => (x, y + 1),
            Direction::Down => (x, y - 1),
            Direction::Left => (x - 1, y),
            Direction::Right => (x + 1, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub alive: bool,
}

impl PlayerState {
    pub fn new(x: i32, y: i32, direction: Direction) -> Self {
        Self {
            x,
            y,
            direction,
            alive: true,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}
