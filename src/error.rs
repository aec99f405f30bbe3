// THEORY:
// Every failure the engine can report is an invariant violation: two buffers that
// should be congruent are not, or a rectangle does not fit its canvas. None of them
// is transient, so nothing here is retried; the run aborts with a typed error and the
// caller decides what to show the user.

use thiserror::Error;

/// Errors produced by the approximation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApproxError {
    /// Two canvases that must share dimensions do not.
    #[error("can't compare different-sized canvases: {left_width}x{left_height} vs {right_width}x{right_height}")]
    SizeMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    /// A mutation rectangle does not fit inside the canvas it targets.
    #[error("mutation {w}x{h} at ({x}, {y}) does not fit a {width}x{height} canvas")]
    OutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        width: u32,
        height: u32,
    },

    /// A raw pixel buffer does not hold exactly `width * height` RGBA pixels.
    #[error("buffer of {len} bytes can't back a {width}x{height} RGBA canvas")]
    InvalidBuffer { width: u32, height: u32, len: usize },

    /// The operation needs at least one pixel.
    #[error("canvas has no pixels")]
    EmptyCanvas,

    #[error("invalid run configuration: {0}")]
    InvalidConfig(String),

    /// A search worker panicked or was torn down by the runtime.
    #[error("search worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, ApproxError>;
