//! Example ingestion and adjacency analysis

/// Observed-adjacency tables and support queries
pub mod connectivity;
/// Example validation and uniqueness assignment
pub mod ingest;

pub use connectivity::ConnectivityTable;
pub use ingest::TrainingMap;
