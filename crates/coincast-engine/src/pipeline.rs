//! One retraining trigger end to end:
//!
//! ```text
//! Idle → Normalizing → Training → Predicting → Scoring → Done
//! ```
//!
//! The normalization range is fitted on the pooled windows of the whole
//! batch; targets are each asset's current price scaled with that range.
//! The last `Done` report survives every failed or fallen-back run.
//! Triggers on one pipeline run one at a time; a second trigger waits for
//! the first to leave its stage sequence. `Training` is only entered by the
//! run that holds the model's training slot, so a skipped run moves from
//! `Normalizing` straight to `Predicting`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use coincast_core::{
    confidence, normalizer, percent_change, recommendation, volatility, AssetForecast,
    AssetSnapshot, MarketRecord, NormalizationRange, UtcDateTime, ValidationError,
};
use coincast_ml::{ForecastModel, ModelError, TrainOutcome, TrainOptions};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::report::{
    FallbackReason, PipelineStage, RunOutcome, RunReport, TrainingProgress, TrainingSummary,
};
use crate::sentiment::{self, SentimentSource};
use crate::PipelineError;

/// Normalized training batch for one run.
struct PreparedBatch {
    range: NormalizationRange,
    windows: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

pub struct ForecastPipeline {
    config: PipelineConfig,
    model: Arc<ForecastModel>,
    stage: Arc<watch::Sender<PipelineStage>>,
    progress: Arc<watch::Sender<TrainingProgress>>,
    last_done: Mutex<Option<RunReport>>,
    trigger: AsyncMutex<()>,
}

impl ForecastPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let model = ForecastModel::new(config.model_config())?;
        Ok(Self::assemble(config, Arc::new(model)))
    }

    /// Build a pipeline over an existing, possibly shared, model.
    pub fn with_model(
        config: PipelineConfig,
        model: Arc<ForecastModel>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        if model.window_len() != config.window_len {
            return Err(crate::config::ConfigError::Invalid(format!(
                "model window {} does not match pipeline window {}",
                model.window_len(),
                config.window_len
            ))
            .into());
        }
        Ok(Self::assemble(config, model))
    }

    fn assemble(config: PipelineConfig, model: Arc<ForecastModel>) -> Self {
        let (stage, _) = watch::channel(PipelineStage::Idle);
        let (progress, _) = watch::channel(TrainingProgress::default());
        Self {
            config,
            model,
            stage: Arc::new(stage),
            progress: Arc::new(progress),
            last_done: Mutex::new(None),
            trigger: AsyncMutex::new(()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &Arc<ForecastModel> {
        &self.model
    }

    pub fn stage(&self) -> PipelineStage {
        *self.stage.borrow()
    }

    pub fn subscribe_stage(&self) -> watch::Receiver<PipelineStage> {
        self.stage.subscribe()
    }

    /// Receiver for `training_progress`; the value moves from 0 to 100
    /// while a run is in `Training`.
    pub fn progress(&self) -> watch::Receiver<TrainingProgress> {
        self.progress.subscribe()
    }

    pub fn training_progress(&self) -> u8 {
        self.progress.borrow().percent
    }

    /// The last report that reached `Done`.
    pub fn last_report(&self) -> Option<RunReport> {
        self.last_done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cut windows from full histories and run one cycle.
    pub async fn run_records(
        &self,
        records: &[MarketRecord],
        sentiment: &dyn SentimentSource,
    ) -> Result<RunOutcome, PipelineError> {
        let snapshots = records
            .iter()
            .map(|record| record.snapshot(self.config.window_len))
            .collect::<Result<Vec<_>, _>>()?;
        self.run(&snapshots, sentiment).await
    }

    /// Run one retraining trigger over `snapshots`.
    pub async fn run(
        &self,
        snapshots: &[AssetSnapshot],
        sentiment: &dyn SentimentSource,
    ) -> Result<RunOutcome, PipelineError> {
        let _trigger = match self.trigger.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("another trigger is active, waiting for it to finish");
                self.trigger.lock().await
            }
        };
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "forecast_run",
            %run_id,
            variant = %self.config.variant,
            assets = snapshots.len()
        );
        let result = self.execute(run_id, snapshots, sentiment).instrument(span).await;
        if result.is_err() || matches!(result, Ok(RunOutcome::Fallback { .. })) {
            self.enter(PipelineStage::Idle);
        }
        result
    }

    /// Drop trained parameters. Refused while a run is training.
    pub fn reset_model(&self) -> bool {
        self.model.reset()
    }

    async fn execute(
        &self,
        run_id: Uuid,
        snapshots: &[AssetSnapshot],
        sentiment: &dyn SentimentSource,
    ) -> Result<RunOutcome, PipelineError> {
        self.enter(PipelineStage::Idle);

        self.enter(PipelineStage::Normalizing);
        let PreparedBatch {
            range,
            windows,
            targets,
        } = self.prepare(snapshots)?;

        let (windows, trained) = self.train(windows, targets).await?;
        let training = match trained {
            Ok(TrainOutcome::Completed(metrics)) => TrainingSummary::Completed {
                epochs: metrics.epochs(),
                final_loss: metrics.final_loss().unwrap_or(f64::NAN),
                duration_ms: duration_ms(metrics.duration),
            },
            Ok(TrainOutcome::Skipped) => {
                warn!("another training run is active, predicting with committed parameters");
                TrainingSummary::Skipped
            }
            Err(error) => return self.fall_back(error),
        };

        self.enter(PipelineStage::Predicting);
        let predictions = self.model.predict_batch(&windows)?;

        self.enter(PipelineStage::Scoring);
        let mut warnings = Vec::new();
        let mut forecasts = Vec::with_capacity(snapshots.len());
        for (snapshot, normalized) in snapshots.iter().zip(predictions) {
            let reading = sentiment::resolve(sentiment, &snapshot.asset_id);
            warnings.extend(reading.warning);
            forecasts.push(self.score(snapshot, normalizer::inverse(normalized, &range), reading.value)?);
        }

        let report = RunReport {
            run_id,
            generated_at: UtcDateTime::now(),
            variant: self.config.variant,
            range,
            training,
            forecasts,
            warnings,
        };
        *self.last_done.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        self.enter(PipelineStage::Done);
        info!(forecasts = report.forecasts.len(), "run completed");
        Ok(RunOutcome::Completed(report))
    }

    fn prepare(&self, snapshots: &[AssetSnapshot]) -> Result<PreparedBatch, ValidationError> {
        if snapshots.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        let expected = self.config.window_len;
        if let Some(bad) = snapshots
            .iter()
            .find(|snapshot| snapshot.price_window.len() != expected)
        {
            return Err(ValidationError::WindowLengthMismatch {
                asset: bad.asset_id.to_string(),
                expected,
                actual: bad.price_window.len(),
            });
        }

        let range = normalizer::fit(snapshots.iter().map(|s| &s.price_window))?;
        let windows = snapshots
            .iter()
            .map(|s| normalizer::transform(&s.price_window, &range))
            .collect();
        let targets = snapshots
            .iter()
            .map(|s| range.scale(s.current_price))
            .collect();
        debug!(min = range.min(), max = range.max(), "range fitted");
        Ok(PreparedBatch {
            range,
            windows,
            targets,
        })
    }

    /// Train on a blocking thread. The windows are handed back for the
    /// prediction stage. Progress resets and the stage becomes `Training`
    /// only once the model accepts the run.
    async fn train(
        &self,
        windows: Vec<Vec<f64>>,
        targets: Vec<f64>,
    ) -> Result<(Vec<Vec<f64>>, Result<TrainOutcome, ModelError>), PipelineError> {
        let model = Arc::clone(&self.model);
        let stage = Arc::clone(&self.stage);
        let progress = Arc::clone(&self.progress);
        let options: TrainOptions = self.config.train_options();

        task::spawn_blocking(move || {
            let outcome = model.train_observed(
                &windows,
                &targets,
                &options,
                || {
                    progress.send_replace(TrainingProgress::default());
                    transition(&stage, PipelineStage::Training);
                },
                |report| {
                    progress.send_replace(TrainingProgress::from(report));
                },
            );
            (windows, outcome)
        })
        .await
        .map_err(|error| PipelineError::TrainingTask(error.to_string()))
    }

    fn fall_back(&self, error: ModelError) -> Result<RunOutcome, PipelineError> {
        let reason = match &error {
            ModelError::TrainingDivergence { .. } => FallbackReason::Diverged,
            ModelError::DeadlineExceeded { .. } => FallbackReason::TimedOut,
            _ => return Err(error.into()),
        };
        let previous = self.last_report();
        warn!(
            %reason,
            %error,
            has_previous = previous.is_some(),
            "training failed, keeping previous results"
        );
        Ok(RunOutcome::Fallback { reason, previous })
    }

    fn score(
        &self,
        snapshot: &AssetSnapshot,
        predicted_price: f64,
        sentiment: f64,
    ) -> Result<AssetForecast, ValidationError> {
        let change = percent_change(snapshot.current_price, predicted_price);
        let volatility = volatility::estimate(&snapshot.price_window, self.config.volatility_lookback)?;
        let confidence = confidence::score(change, sentiment, volatility);
        Ok(AssetForecast {
            asset_id: snapshot.asset_id.clone(),
            name: snapshot.name.clone(),
            symbol: snapshot.symbol.clone(),
            current_price: snapshot.current_price,
            predicted_price,
            percent_change: change,
            sentiment,
            volatility,
            confidence,
            recommendation: recommendation::classify(change, confidence),
        })
    }

    fn enter(&self, stage: PipelineStage) {
        transition(&self.stage, stage);
    }
}

fn transition(sender: &watch::Sender<PipelineStage>, stage: PipelineStage) {
    let previous = sender.send_replace(stage);
    if previous != stage {
        debug!(from = %previous, to = %stage, "stage transition");
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
