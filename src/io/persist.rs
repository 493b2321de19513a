//! Persistence of trained generators
//!
//! The on-disk format is a straight bincode encoding of the generator state:
//! layer count, unique-tile table, neighborhood radius, connectivity kind,
//! border and acknowledge flags, the full weight tensor and biases, the
//! cumulative epoch counter, and the connectivity and border tables. Floats
//! are stored as they are held in memory, so a round trip is lossless.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::algorithm::generator::Generator;
use crate::io::error::{EngineError, Result};
use crate::io::image::Palette;

/// A trained generator together with the palette that maps its handles back
/// to colors; what the CLI writes next to each other in one file
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainedBundle {
    /// The trained generator
    pub generator: Generator,
    /// Color table behind the generator's tile handles
    pub palette: Palette,
}

/// Encode a generator to bytes
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn generator_to_bytes(generator: &Generator) -> Result<Vec<u8>> {
    bincode::serialize(generator).map_err(|error| EngineError::Serialization {
        operation: "encode",
        reason: error.to_string(),
    })
}

/// Decode a generator from bytes
///
/// # Errors
///
/// Returns an error if decoding fails.
pub fn generator_from_bytes(bytes: &[u8]) -> Result<Generator> {
    bincode::deserialize(bytes).map_err(|error| EngineError::Serialization {
        operation: "decode",
        reason: error.to_string(),
    })
}

/// Save a bundle to disk, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if encoding or any filesystem operation fails.
pub fn save_bundle(bundle: &TrainedBundle, path: &Path) -> Result<()> {
    let bytes = bincode::serialize(bundle).map_err(|error| EngineError::Serialization {
        operation: "encode",
        reason: error.to_string(),
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| EngineError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source,
            })?;
        }
    }

    std::fs::write(path, bytes).map_err(|source| EngineError::FileSystem {
        path: path.to_path_buf(),
        operation: "write",
        source,
    })
}

/// Load a bundle from disk
///
/// # Errors
///
/// Returns an error if reading or decoding fails.
pub fn load_bundle(path: &Path) -> Result<TrainedBundle> {
    let bytes = std::fs::read(path).map_err(|source| EngineError::FileSystem {
        path: path.to_path_buf(),
        operation: "read",
        source,
    })?;
    bincode::deserialize(&bytes).map_err(|error| EngineError::Serialization {
        operation: "decode",
        reason: error.to_string(),
    })
}
