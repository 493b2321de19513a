//! Training progress display for the CLI

use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};

use crate::algorithm::trainer::BuildProgress;

static EPOCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Epochs: [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// One epoch bar fed from build progress snapshots
pub struct TrainingDisplay {
    bar: ProgressBar,
}

impl TrainingDisplay {
    /// Create a bar for a known epoch target
    pub fn new(total_epochs: u64) -> Self {
        let bar = ProgressBar::new(total_epochs);
        bar.set_style(EPOCH_STYLE.clone());
        Self { bar }
    }

    /// Reflect the latest snapshot
    pub fn update(&self, progress: &BuildProgress) {
        if progress.total_epochs > 0 {
            self.bar.set_length(progress.total_epochs);
        }
        self.bar.set_position(progress.epoch);
        self.bar.set_message(format!(
            "loss {:.4} (avg20 {:.4}) lr {:.5}",
            progress.loss_last, progress.loss_avg20, progress.learning_rate
        ));
    }

    /// Finish the bar with a closing message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
