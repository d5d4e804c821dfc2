// Domain layer: board state and movement rules.

pub mod grid;
pub mod state;
pub mod tuning;

pub use grid::{CellUpdate, GridError, GridState};
pub use state::{Direction, PlayerState};
pub use tuning::GridTuning;
