//! Runtime defaults and tuning constants

/// Fixed seed for reproducible builds and generation
pub const DEFAULT_SEED: u64 = 42;

/// Default number of training epochs
pub const DEFAULT_EPOCHS: u64 = 1000;

/// Default neighborhood radius of the classifier
pub const DEFAULT_RADIUS: usize = 1;

/// Default learning rate at the first epoch
pub const DEFAULT_LR_START: f64 = 0.05;

/// Default learning rate approached at the last epoch
pub const DEFAULT_LR_END: f64 = 0.005;

/// Epochs covered by the rolling loss average
pub const LOSS_WINDOW: usize = 20;

/// Neutral collapse temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.0;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed generation region dimension
pub const MAX_REGION_DIMENSION: usize = 10_000;

/// How often the CLI refreshes the training progress bar
pub const PROGRESS_POLL_MS: u64 = 100;
