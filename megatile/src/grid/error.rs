//! Configuration errors for grid and bounds validation.

use thiserror::Error;

/// Errors raised while validating static render parameters.
///
/// All of these are fatal and are reported before any tile is dispatched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A size parameter is zero or not a power of two.
    #[error("{what} must be a power of 2, got {value}")]
    NotPowerOfTwo { what: &'static str, value: u32 },

    /// The grid must have at least two tiles per side.
    #[error("image size must be greater than 1 tile, got {0}")]
    GridTooSmall(u32),

    /// A one-pixel tile leaves no room for the overlap border.
    #[error("tile size must be greater than 1 pixel, got {0}")]
    TileTooSmall(u32),

    /// The grid would have more tiles than can be numbered.
    #[error("image size {0} produces more tiles than can be indexed")]
    TooManyTiles(u32),

    /// Upper bound is not strictly greater than lower bound on some axis.
    #[error("upper bound must exceed lower bound on the {axis} axis ({lo} >= {hi})")]
    EmptyBounds { axis: char, lo: f64, hi: f64 },

    /// A bound coordinate is NaN or infinite.
    #[error("bounds must be finite, got ({x}, {y})")]
    NonFiniteBounds { x: f64, y: f64 },

    /// The worker pool needs at least one worker.
    #[error("job count must be at least 1")]
    ZeroJobs,
}
