//! Mathematical primitives for the engine

/// Fixed-capacity sparse integer set backing candidate domains
pub mod indexset;
/// Softmax, Gumbel noise, and weighted sampling helpers
pub mod sampling;

pub use indexset::IndexSet;
