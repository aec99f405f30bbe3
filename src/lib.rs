// THEORY:
// This file is the entry point of the `approx_draw` library crate. It exposes the
// high-level API (`pipeline`, `parallel_pipeline`, `progress`) and keeps the building
// blocks in `core_modules` available for callers that want to score or paint canvases
// directly.
//
// The engine approximates a target image with flat-color rectangles: each round many
// random rectangles are scored in parallel and the single best one is painted.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;
pub mod progress;

pub use error::{ApproxError, Result};
pub use parallel_pipeline::{Approximator, ControlHandle};
pub use pipeline::{ApproxConfig, Approximation, approximate};
