//! The trainable forecaster shared by the pipeline.
//!
//! Parameters live behind an `RwLock` and are only replaced wholesale:
//! a training run clones the committed state into a private candidate,
//! trains the candidate without holding any lock, and swaps it in under a
//! short write lock once every epoch finished with a finite loss. A failed
//! run drops its candidate, so readers only ever observe complete parameter
//! sets. An atomic flag keeps at most one run in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use coincast_core::ValidationError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::network::StackedNetwork;
use crate::optimizer::Adam;
use crate::{EpochReport, ModelConfig, ModelError, TrainOptions, TrainingMetrics};

const RUN_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
struct ModelState {
    network: StackedNetwork,
    optimizer: Adam,
    trained: bool,
    runs: u64,
}

impl ModelState {
    fn fresh(config: &ModelConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            network: StackedNetwork::new(config, &mut rng),
            optimizer: Adam::new(config.learning_rate),
            trained: false,
            runs: 0,
        }
    }
}

/// Result of a training request that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    Completed(TrainingMetrics),
    /// Another run was already in progress; nothing changed.
    Skipped,
}

/// Clears the in-flight flag when dropped.
struct TrainingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> TrainingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for TrainingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct ForecastModel {
    config: ModelConfig,
    state: RwLock<ModelState>,
    training: AtomicBool,
}

impl ForecastModel {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let state = ModelState::fresh(&config);
        Ok(Self {
            config,
            state: RwLock::new(state),
            training: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn window_len(&self) -> usize {
        self.config.window_len
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::Acquire)
    }

    /// Whether a training run has been committed.
    pub fn is_trained(&self) -> bool {
        self.read_state().trained
    }

    /// Number of committed training runs.
    pub fn completed_runs(&self) -> u64 {
        self.read_state().runs
    }

    pub fn train(
        &self,
        windows: &[Vec<f64>],
        targets: &[f64],
        options: &TrainOptions,
    ) -> Result<TrainOutcome, ModelError> {
        self.train_with_progress(windows, targets, options, |_| {})
    }

    /// Train on `windows` (each of length `window_len`) against one target
    /// per window, calling `on_epoch` after every epoch.
    ///
    /// Returns [`TrainOutcome::Skipped`] without touching the parameters
    /// when another run is active. Divergence and deadline errors leave the
    /// committed parameters as they were.
    pub fn train_with_progress<F>(
        &self,
        windows: &[Vec<f64>],
        targets: &[f64],
        options: &TrainOptions,
        on_epoch: F,
    ) -> Result<TrainOutcome, ModelError>
    where
        F: FnMut(&EpochReport),
    {
        self.train_observed(windows, targets, options, || {}, on_epoch)
    }

    /// Same as [`train_with_progress`](Self::train_with_progress), with
    /// `on_start` called once this run holds the training slot. A skipped
    /// or rejected request never calls it.
    pub fn train_observed<S, F>(
        &self,
        windows: &[Vec<f64>],
        targets: &[f64],
        options: &TrainOptions,
        on_start: S,
        mut on_epoch: F,
    ) -> Result<TrainOutcome, ModelError>
    where
        S: FnOnce(),
        F: FnMut(&EpochReport),
    {
        options.validate()?;
        self.validate_batch(windows, targets)?;

        let Some(_guard) = TrainingGuard::acquire(&self.training) else {
            warn!("training already in progress, request skipped");
            return Ok(TrainOutcome::Skipped);
        };
        on_start();

        let started = Instant::now();
        let mut candidate = self.read_state().clone();
        let mut rng = self.run_rng(candidate.runs);
        let mut order: Vec<usize> = (0..windows.len()).collect();
        let mut epoch_losses = Vec::with_capacity(options.epochs);

        for epoch in 0..options.epochs {
            if options.shuffle {
                order.shuffle(&mut rng);
            }

            let mut weighted_loss = 0.0;
            for chunk in order.chunks(options.batch_size) {
                if let Some(deadline) = options.deadline {
                    let elapsed = started.elapsed();
                    if elapsed >= deadline {
                        warn!(epoch, ?elapsed, "training deadline exceeded, candidate discarded");
                        return Err(ModelError::DeadlineExceeded {
                            completed_epochs: epoch,
                            elapsed,
                        });
                    }
                }

                let batch: Vec<&[f64]> = chunk.iter().map(|&i| windows[i].as_slice()).collect();
                let batch_targets: Vec<f64> = chunk.iter().map(|&i| targets[i]).collect();
                let (loss, grads) =
                    candidate
                        .network
                        .loss_and_gradients(&batch, &batch_targets, &mut rng);
                if !loss.is_finite() {
                    warn!(epoch, loss, "non-finite training loss, candidate discarded");
                    return Err(ModelError::TrainingDivergence { epoch, loss });
                }
                candidate.network.apply(&mut candidate.optimizer, &grads);
                weighted_loss += loss * chunk.len() as f64;
            }

            let loss = weighted_loss / windows.len() as f64;
            if !candidate.network.is_finite() {
                warn!(epoch, loss, "non-finite parameters after update, candidate discarded");
                return Err(ModelError::TrainingDivergence {
                    epoch,
                    loss: f64::NAN,
                });
            }

            epoch_losses.push(loss);
            let report = EpochReport {
                epoch,
                epochs: options.epochs,
                loss,
            };
            debug!(epoch, loss, percent = report.percent(), "epoch finished");
            on_epoch(&report);
        }

        candidate.trained = true;
        candidate.runs += 1;
        *self.write_state() = candidate;

        let metrics = TrainingMetrics {
            epoch_losses,
            samples: windows.len(),
            duration: started.elapsed(),
        };
        info!(
            epochs = metrics.epochs(),
            samples = metrics.samples,
            final_loss = metrics.final_loss(),
            "training committed"
        );
        Ok(TrainOutcome::Completed(metrics))
    }

    /// Forecast the next normalized value after `window`.
    pub fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        self.check_window(0, window)?;
        let state = self.read_state();
        if !state.trained {
            return Err(ModelError::UntrainedModel);
        }
        Ok(state.network.predict(window))
    }

    /// Predict every window against the same committed parameters.
    pub fn predict_batch(&self, windows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        for (index, window) in windows.iter().enumerate() {
            self.check_window(index, window)?;
        }
        let state = self.read_state();
        if !state.trained {
            return Err(ModelError::UntrainedModel);
        }
        Ok(windows
            .iter()
            .map(|window| state.network.predict(window))
            .collect())
    }

    /// Discard trained parameters and optimizer state. Returns `false`
    /// when a run is in flight, in which case nothing changes.
    pub fn reset(&self) -> bool {
        let Some(_guard) = TrainingGuard::acquire(&self.training) else {
            return false;
        };
        *self.write_state() = ModelState::fresh(&self.config);
        info!("model parameters reset");
        true
    }

    fn validate_batch(&self, windows: &[Vec<f64>], targets: &[f64]) -> Result<(), ValidationError> {
        if windows.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        if windows.len() != targets.len() {
            return Err(ValidationError::TargetCountMismatch {
                windows: windows.len(),
                targets: targets.len(),
            });
        }
        for (index, window) in windows.iter().enumerate() {
            self.check_window(index, window)?;
        }
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "target" });
        }
        Ok(())
    }

    fn check_window(&self, index: usize, window: &[f64]) -> Result<(), ValidationError> {
        if window.len() != self.config.window_len {
            return Err(ValidationError::WindowLengthMismatch {
                asset: format!("#{index}"),
                expected: self.config.window_len,
                actual: window.len(),
            });
        }
        if window.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "window" });
        }
        Ok(())
    }

    fn run_rng(&self, runs: u64) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ RUN_SEED_SALT.wrapping_mul(runs + 1)),
            None => StdRng::from_entropy(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
