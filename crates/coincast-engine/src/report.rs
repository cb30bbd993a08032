use std::fmt::{Display, Formatter};

use coincast_core::screening::{matches_query, rank_by_change};
use coincast_core::{AssetForecast, AssetId, NormalizationRange, UtcDateTime};
use coincast_ml::EpochReport;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PipelineVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    #[default]
    Idle,
    Normalizing,
    Training,
    Predicting,
    Scoring,
    Done,
}

impl PipelineStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Normalizing => "normalizing",
            Self::Training => "training",
            Self::Predicting => "predicting",
            Self::Scoring => "scoring",
            Self::Done => "done",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable training progress, updated after every epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrainingProgress {
    pub epoch: usize,
    pub epochs: usize,
    /// 0 to 100.
    pub percent: u8,
    pub loss: Option<f64>,
}

impl From<&EpochReport> for TrainingProgress {
    fn from(report: &EpochReport) -> Self {
        Self {
            epoch: report.epoch + 1,
            epochs: report.epochs,
            percent: report.percent(),
            loss: Some(report.loss),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingSummary {
    Completed {
        epochs: usize,
        final_loss: f64,
        duration_ms: u64,
    },
    /// Another run held the model; prediction used its committed parameters.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub generated_at: UtcDateTime,
    pub variant: PipelineVariant,
    pub range: NormalizationRange,
    pub training: TrainingSummary,
    pub forecasts: Vec<AssetForecast>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RunReport {
    pub fn forecast(&self, asset_id: &AssetId) -> Option<&AssetForecast> {
        self.forecasts.iter().find(|f| &f.asset_id == asset_id)
    }

    /// Forecasts matching `query`, optionally sorted by predicted change.
    pub fn select(&self, query: Option<&str>, ranked: bool) -> Vec<AssetForecast> {
        let mut selected: Vec<AssetForecast> = self
            .forecasts
            .iter()
            .filter(|f| query.map_or(true, |q| matches_query(f, q)))
            .cloned()
            .collect();
        if ranked {
            rank_by_change(&mut selected);
        }
        selected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Diverged,
    TimedOut,
}

impl Display for FallbackReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Diverged => "training diverged",
            Self::TimedOut => "training deadline exceeded",
        })
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed(RunReport),
    /// Training failed recoverably; `previous` is the last completed run.
    Fallback {
        reason: FallbackReason,
        previous: Option<RunReport>,
    },
}

impl RunOutcome {
    /// The report callers should display: fresh or stale.
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Fallback { previous, .. } => previous.as_ref(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
