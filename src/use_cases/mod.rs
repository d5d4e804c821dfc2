// Use cases layer: the round state machine and the game tick loop.

pub mod game;
pub mod round;
pub mod types;

pub use round::{RoundCoordinator, RoundPhase};
pub use types::{ClaimedCell, GamePhase, GameSetup, PlayerSnapshot, PlayerStart, WorldUpdate};
