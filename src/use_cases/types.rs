// Use-case level inputs/outputs for the client game loop.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Direction;

/// High-level session state exposed to the embedding app (renderer, UI).
#[derive(Debug, Clone)]
pub enum GamePhase {
    Running,
    /// Terminal state; earliest-eliminated player first.
    Over { death_order: Vec<String> },
}

/// Snapshot of one player for rendering.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub pid: String,
    pub nickname: String,
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub alive: bool,
}

/// A cell claimed during the most recent round resolution. Renderers extend
/// trails incrementally from these instead of rescanning the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedCell {
    pub x: i32,
    pub y: i32,
    pub pid: String,
}

/// Snapshot of the session broadcast to collaborators on each tick.
#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub round: u32,
    pub players: Vec<PlayerSnapshot>,
    pub newly_occupied: Vec<ClaimedCell>,
}

/// A player's negotiated starting state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerStart {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
}

/// Everything the lobby collaborator hands over at game construction:
/// who we are, where everyone starts, and what to call them. Owned plainly
/// here; nothing in the session mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSetup {
    pub local_pid: String,
    pub starting_positions: HashMap<String, PlayerStart>,
    #[serde(default)]
    pub nicknames: HashMap<String, String>,
}

impl GameSetup {
    /// Display name for a pid, falling back to the pid itself.
    pub fn nickname(&self, pid: &str) -> String {
        self.nicknames
            .get(pid)
            .cloned()
            .unwrap_or_else(|| pid.to_string())
    }
}
