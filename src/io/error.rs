//! Error types for build, generation, and io operations

use std::fmt;
use std::path::PathBuf;

/// Main error type for all engine operations
#[derive(Debug)]
pub enum EngineError {
    /// Build was requested with no example maps
    ZeroMaps,

    /// An example map carries no layers
    NullMaps,

    /// Example maps disagree on layer count
    MismatchedLayers {
        /// Layer count of the first example
        expected: usize,
        /// Conflicting layer count
        found: usize,
    },

    /// Example sampling weights are unusable
    InvalidCommonality {
        /// Description of what is wrong with the weights
        reason: String,
    },

    /// Training produced a NaN or underflowed probability
    ///
    /// Weights are left exactly as they were; the usual remedy is a lower
    /// starting learning rate.
    NumericFault {
        /// Epoch during which the fault was detected
        epoch: u64,
    },

    /// Build was aborted via the cancellation signal
    Cancelled,

    /// No assignment satisfies the preexisting tiles and the learned rules
    Unsatisfiable,

    /// Even with preexisting tiles discarded, no assignment satisfies the
    /// enforced border constraints
    BorderImpossible,

    /// The target grid's layer count does not match the trained generator
    LayerCountMismatch {
        /// Layer count the generator was trained with
        expected: usize,
        /// Layer count of the target grid
        found: usize,
    },

    /// The generator has no tiles to place
    EmptyUniqueTileSet,

    /// Failed to load a source image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save a generated image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Encoding or decoding a persisted generator failed
    Serialization {
        /// Operation that failed ("encode" or "decode")
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMaps => {
                write!(f, "No example maps were provided")
            }
            Self::NullMaps => {
                write!(f, "An example map has no layers")
            }
            Self::MismatchedLayers { expected, found } => {
                write!(
                    f,
                    "Example maps disagree on layer count ({expected} vs {found})"
                )
            }
            Self::InvalidCommonality { reason } => {
                write!(f, "Invalid example weights: {reason}")
            }
            Self::NumericFault { epoch } => {
                write!(
                    f,
                    "Training diverged numerically at epoch {epoch}; lower the starting learning rate"
                )
            }
            Self::Cancelled => {
                write!(f, "Build was cancelled")
            }
            Self::Unsatisfiable => {
                write!(
                    f,
                    "No assignment satisfies the preexisting tiles under the learned adjacency rules"
                )
            }
            Self::BorderImpossible => {
                write!(
                    f,
                    "No assignment satisfies the enforced border constraints"
                )
            }
            Self::LayerCountMismatch { expected, found } => {
                write!(
                    f,
                    "Generator was trained for {expected} layers but the target grid has {found}"
                )
            }
            Self::EmptyUniqueTileSet => {
                write!(f, "Generator has an empty tile table")
            }
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Serialization { operation, reason } => {
                write!(f, "Failed to {operation} generator state: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Convenience type alias for engine results
pub type Result<T> = std::result::Result<T, EngineError>;

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> EngineError {
    EngineError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
