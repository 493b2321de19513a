//! Build orchestration: epochs, learning-rate schedule, and signals
//!
//! Training runs on whichever thread calls [`Builder::run`]; hosts that want
//! a background build use [`spawn_build`], which moves the builder onto a
//! worker thread and hands back polling and cancellation handles. The two
//! signals are cooperative and only observed at epoch boundaries, so an
//! abort never leaves the weight tensor half-updated within a cell step.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use log::{debug, trace};
use rand::{SeedableRng, rngs::StdRng};

use crate::algorithm::generator::Generator;
use crate::algorithm::predictor::PredictorEngine;
use crate::algorithm::weights::GeneratorWeights;
use crate::analysis::ingest::{ExistingState, TrainingMap, ingest};
use crate::io::configuration::{
    DEFAULT_EPOCHS, DEFAULT_LR_END, DEFAULT_LR_START, DEFAULT_RADIUS, DEFAULT_SEED, LOSS_WINDOW,
};
use crate::io::error::{EngineError, Result, invalid_parameter};
use crate::math::sampling::{log_lerp, weighted_choice};
use crate::spatial::geometry::{BorderFlags, ConnectivityKind};
use crate::spatial::region::Region;

/// How a build relates to previously trained state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Train a brand-new generator
    Fresh,
    /// Train a replacement for an existing generator (fresh weights, but the
    /// layer count must stay compatible with the asset being replaced)
    Overwrite,
    /// Keep training an existing generator's weights and connectivity
    Continue,
}

/// Coarse lifecycle of a build, exposed through progress polling
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildState {
    /// No build has started
    None,
    /// Epochs are running
    InProgress,
    /// The abort signal stopped the build; weights are undefined
    Cancelled,
    /// All epochs ran, or save-and-quit ended the build cleanly
    Success,
    /// Training diverged numerically
    NanError,
    /// Example maps disagree on layer count
    MismatchedLayers,
    /// An example map has no layers
    NullMaps,
    /// No example maps were provided
    ZeroMaps,
    /// Example sampling weights are unusable
    InvalidCommonality,
}

impl From<&EngineError> for BuildState {
    fn from(error: &EngineError) -> Self {
        match error {
            EngineError::ZeroMaps => Self::ZeroMaps,
            EngineError::NullMaps => Self::NullMaps,
            EngineError::MismatchedLayers { .. } => Self::MismatchedLayers,
            EngineError::InvalidCommonality { .. } => Self::InvalidCommonality,
            EngineError::NumericFault { .. } => Self::NanError,
            EngineError::Cancelled => Self::Cancelled,
            _ => Self::None,
        }
    }
}

/// Snapshot of a build's progress, cheap to copy out under the lock
#[derive(Clone, Copy, Debug)]
pub struct BuildProgress {
    /// Cumulative epochs finished (includes prior runs when continuing)
    pub epoch: u64,
    /// Cumulative epoch target for this run
    pub total_epochs: u64,
    /// Mean per-cell loss of the last finished epoch
    pub loss_last: f64,
    /// Rolling mean loss over the last twenty epochs
    pub loss_avg20: f64,
    /// Learning rate used by the last finished epoch
    pub learning_rate: f64,
    /// When the run started
    pub start_time: Option<Instant>,
    /// When the run finished, successfully or not
    pub end_time: Option<Instant>,
    /// Lifecycle state
    pub state: BuildState,
}

impl Default for BuildProgress {
    fn default() -> Self {
        Self {
            epoch: 0,
            total_epochs: 0,
            loss_last: 0.0,
            loss_avg20: 0.0,
            learning_rate: 0.0,
            start_time: None,
            end_time: None,
            state: BuildState::None,
        }
    }
}

/// Cooperative build signals, observed at epoch boundaries
#[derive(Clone, Debug, Default)]
pub struct BuildSignals {
    abort: Arc<AtomicBool>,
    save_quit: Arc<AtomicBool>,
}

impl BuildSignals {
    /// Create a fresh signal pair
    pub fn new() -> Self {
        Self::default()
    }

    /// Request an abort; the in-progress epoch is discarded
    pub fn cancel(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Request a clean stop after the current epoch
    pub fn save_and_quit(&self) {
        self.save_quit.store(true, Ordering::Relaxed);
    }

    /// Test whether an abort was requested
    pub fn cancelled(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Test whether a clean stop was requested
    pub fn saving(&self) -> bool {
        self.save_quit.load(Ordering::Relaxed)
    }
}

/// Build parameters
#[derive(Clone, Copy, Debug)]
pub struct BuildConfig {
    /// Neighborhood radius of the classifier, at least 1
    pub radius: usize,
    /// Grid connectivity to learn and enforce
    pub connectivity: ConnectivityKind,
    /// Border sides enforced against observed border occupancy
    pub enforce_borders: BorderFlags,
    /// Border sides the classifier may sense beyond the region
    pub acknowledge_bounds: BorderFlags,
    /// Treat holes as a real tile instead of skipping them
    pub empty_as_tile: bool,
    /// Learning rate at the first epoch
    pub lr_start: f64,
    /// Learning rate approached at the last epoch
    pub lr_end: f64,
    /// Number of epochs for this run
    pub epochs: u64,
    /// Relation to previously trained state
    pub mode: BuildMode,
    /// Seed for every stochastic choice during the build
    pub seed: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            connectivity: ConnectivityKind::Four,
            enforce_borders: BorderFlags::default(),
            acknowledge_bounds: BorderFlags::default(),
            empty_as_tile: false,
            lr_start: DEFAULT_LR_START,
            lr_end: DEFAULT_LR_END,
            epochs: DEFAULT_EPOCHS,
            mode: BuildMode::Fresh,
            seed: DEFAULT_SEED,
        }
    }
}

/// Orchestrates one build from validated examples to a trained generator
pub struct Builder {
    maps: Vec<TrainingMap>,
    config: BuildConfig,
    existing: Option<Generator>,
    progress: Arc<Mutex<BuildProgress>>,
    signals: BuildSignals,
}

impl Builder {
    /// Create a fresh build
    ///
    /// # Errors
    ///
    /// Returns an error if the example set fails validation, a parameter is
    /// out of range, or the mode requires an existing generator.
    pub fn new(maps: Vec<TrainingMap>, config: BuildConfig) -> Result<Self> {
        if config.mode != BuildMode::Fresh {
            return Err(invalid_parameter(
                "mode",
                &format!("{:?}", config.mode),
                &"this mode requires an existing generator; use with_existing",
            ));
        }
        Self::validated(maps, config, None)
    }

    /// Create a build that replaces or continues an existing generator
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the example layer count does
    /// not match the existing generator.
    pub fn with_existing(
        generator: Generator,
        maps: Vec<TrainingMap>,
        config: BuildConfig,
    ) -> Result<Self> {
        Self::validated(maps, config, Some(generator))
    }

    fn validated(
        maps: Vec<TrainingMap>,
        config: BuildConfig,
        existing: Option<Generator>,
    ) -> Result<Self> {
        let layer_count = crate::analysis::ingest::validate_examples(&maps)?;
        if let Some(generator) = &existing {
            if generator.layer_count() != layer_count {
                return Err(EngineError::MismatchedLayers {
                    expected: generator.layer_count(),
                    found: layer_count,
                });
            }
        }
        if config.radius == 0 {
            return Err(invalid_parameter(
                "radius",
                &config.radius,
                &"neighborhood radius must be at least 1",
            ));
        }
        if config.epochs == 0 {
            return Err(invalid_parameter(
                "epochs",
                &config.epochs,
                &"at least one epoch is required",
            ));
        }
        if !(config.lr_start > 0.0) || !(config.lr_end > 0.0) {
            return Err(invalid_parameter(
                "learning_rate",
                &format!("{}..{}", config.lr_start, config.lr_end),
                &"learning rates must be positive",
            ));
        }

        Ok(Self {
            maps,
            config,
            existing,
            progress: Arc::new(Mutex::new(BuildProgress::default())),
            signals: BuildSignals::new(),
        })
    }

    /// Handles for polling this build's progress
    pub fn progress_handle(&self) -> Arc<Mutex<BuildProgress>> {
        Arc::clone(&self.progress)
    }

    /// Snapshot of the current progress
    pub fn progress(&self) -> BuildProgress {
        self.progress
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    /// The cooperative signal pair for this build
    pub fn signals(&self) -> BuildSignals {
        self.signals.clone()
    }

    /// Run every epoch to completion on the calling thread
    ///
    /// # Errors
    ///
    /// Returns an error on cancellation or numeric fault; ingest validation
    /// errors were already surfaced at construction.
    pub fn run(mut self) -> Result<Generator> {
        let result = self.train();
        if let Ok(mut progress) = self.progress.lock() {
            progress.end_time = Some(Instant::now());
            progress.state = match &result {
                Ok(_) => BuildState::Success,
                Err(error) => BuildState::from(error),
            };
        }
        result
    }

    fn train(&mut self) -> Result<Generator> {
        let config = self.config;

        let (prior_weights, existing_state) = match (config.mode, self.existing.take()) {
            (BuildMode::Continue, Some(generator)) => {
                let state = ExistingState {
                    tiles: generator.tiles().to_vec(),
                    connectivity: generator.connectivity().clone(),
                    empty_index: generator.empty_index(),
                };
                (Some(generator.weights().clone()), Some(state))
            }
            (BuildMode::Continue, None) => {
                return Err(invalid_parameter(
                    "mode",
                    &"Continue",
                    &"continuing requires an existing generator",
                ));
            }
            _ => (None, None),
        };

        let ingested = ingest(
            &self.maps,
            config.connectivity,
            config.enforce_borders,
            config.empty_as_tile,
            existing_state,
        )?;

        let unique = ingested.tiles.len();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut weights = match prior_weights {
            Some(weights) => weights.grown(unique, &mut rng),
            None => GeneratorWeights::new(unique, config.radius, config.acknowledge_bounds, &mut rng),
        };

        let start_epochs = weights.epochs_trained();
        let total_epochs = start_epochs + config.epochs;
        if let Ok(mut progress) = self.progress.lock() {
            progress.state = BuildState::InProgress;
            progress.epoch = start_epochs;
            progress.total_epochs = total_epochs;
            progress.start_time = Some(Instant::now());
        }
        debug!(
            "training {} epochs over {} maps ({} unique tiles)",
            config.epochs,
            self.maps.len(),
            unique
        );

        let commonalities: Vec<f64> = self.maps.iter().map(TrainingMap::commonality).collect();
        let mut engine: Option<(usize, PredictorEngine)> = None;
        let mut window: VecDeque<f64> = VecDeque::with_capacity(LOSS_WINDOW);

        for epoch_index in 0..config.epochs {
            if self.signals.cancelled() {
                return Err(EngineError::Cancelled);
            }

            let t = epoch_index as f64 / config.epochs as f64;
            let learning_rate = log_lerp(config.lr_start, config.lr_end, t);

            let map_index = weighted_choice(&mut rng, &commonalities);
            let rebuild = engine
                .as_ref()
                .is_none_or(|(bound, _)| *bound != map_index);
            if rebuild {
                let map = self.maps.get(map_index).ok_or(EngineError::ZeroMaps)?;
                let region = Region::new([0, 0], [map.width(), map.height()]);
                engine = Some((
                    map_index,
                    PredictorEngine::new(region, weights.radius(), weights.acknowledge()),
                ));
            }
            let Some((_, engine)) = engine.as_mut() else {
                return Err(EngineError::ZeroMaps);
            };
            let Some(index_grid) = ingested.index_grids.get(map_index) else {
                return Err(EngineError::ZeroMaps);
            };

            engine.reset(&mut rng);
            let mut loss_sum = 0.0;
            let mut trained_cells = 0usize;

            while let Some((x, y)) = engine.next_pos() {
                match index_grid.get([y, x]).copied().flatten() {
                    Some(target) => {
                        let step = engine.train_step(
                            &mut weights,
                            x,
                            y,
                            target,
                            learning_rate,
                            &mut rng,
                        );
                        let Some(loss) = step else {
                            return Err(EngineError::NumericFault {
                                epoch: weights.epochs_trained(),
                            });
                        };
                        loss_sum += loss;
                        trained_cells += 1;
                        engine.mark_collapsed(x, y, target);
                    }
                    None => engine.mark_skipped(x, y),
                }
            }

            let epoch_loss = if trained_cells > 0 {
                loss_sum / trained_cells as f64
            } else {
                0.0
            };
            if window.len() == LOSS_WINDOW {
                window.pop_front();
            }
            window.push_back(epoch_loss);
            let window_mean = window.iter().sum::<f64>() / window.len().max(1) as f64;

            weights.bump_epoch();
            if let Ok(mut progress) = self.progress.lock() {
                progress.epoch = weights.epochs_trained();
                progress.loss_last = epoch_loss;
                progress.loss_avg20 = window_mean;
                progress.learning_rate = learning_rate;
            }
            trace!(
                "epoch {}: loss {epoch_loss:.6}, lr {learning_rate:.6}",
                weights.epochs_trained()
            );

            if self.signals.saving() {
                debug!("save-and-quit after epoch {}", weights.epochs_trained());
                break;
            }
        }

        Ok(Generator::from_parts(
            ingested.layer_count,
            ingested.tiles,
            config.enforce_borders,
            weights,
            ingested.connectivity,
            ingested.empty_index,
        ))
    }
}

/// Handle to a build running on a background worker thread
pub struct BuildHandle {
    progress: Arc<Mutex<BuildProgress>>,
    signals: BuildSignals,
    worker: JoinHandle<Result<Generator>>,
}

impl BuildHandle {
    /// Snapshot of the current progress
    pub fn progress(&self) -> BuildProgress {
        self.progress
            .lock()
            .map(|guard| *guard)
            .unwrap_or_default()
    }

    /// The build's cooperative signals
    pub fn signals(&self) -> BuildSignals {
        self.signals.clone()
    }

    /// Test whether the worker has finished
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and take its result
    ///
    /// # Errors
    ///
    /// Propagates the build's error; a vanished worker reports as cancelled.
    pub fn join(self) -> Result<Generator> {
        self.worker
            .join()
            .unwrap_or(Err(EngineError::Cancelled))
    }
}

/// Move a builder onto a worker thread
///
/// The returned handle polls progress and carries the signal pair; the
/// library never touches the weights from another thread while the worker
/// is live.
pub fn spawn_build(builder: Builder) -> BuildHandle {
    let progress = builder.progress_handle();
    let signals = builder.signals();
    let worker = std::thread::spawn(move || builder.run());
    BuildHandle {
        progress,
        signals,
        worker,
    }
}
