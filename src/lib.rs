//! Learned tilemap generation from hand-authored examples
//!
//! The crate trains a per-cell neighborhood softmax classifier while simulating
//! its own generation order, records every tile adjacency observed in the
//! examples, and at generation time couples the classifier's predictions with
//! an arc-consistency constraint solver so the output is both statistically
//! similar to the examples and strictly consistent with the observed rules.

#![forbid(unsafe_code)]

/// Core engine: weights, predictor, trainer, constraint solver, generator
pub mod algorithm;
/// Example ingestion and adjacency analysis
pub mod analysis;
/// Input/output operations and error handling
pub mod io;
/// Set and sampling primitives used throughout the engine
pub mod math;
/// Regions, grid geometry, and tile data structures
pub mod spatial;

pub use algorithm::generator::{GenerateOptions, Generator};
pub use algorithm::trainer::{BuildConfig, BuildMode, Builder};
pub use io::error::{EngineError, Result};
