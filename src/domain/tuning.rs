/// Gameplay tuning for the board.
///
/// Keep this separate from runtime configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct GridTuning {
    /// Board width in cells.
    pub width: i32,

    /// Board height in cells.
    pub height: i32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
        }
    }
}
