//! # Coincast Engine
//!
//! Orchestrates one forecasting cycle over a batch of assets: normalizes
//! the pooled windows, trains the shared [`coincast_ml::ForecastModel`],
//! predicts, and scores every asset into an
//! [`AssetForecast`](coincast_core::AssetForecast).
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`pipeline`] | [`ForecastPipeline`] state machine |
//! | [`config`] | Variants and YAML configuration |
//! | [`sentiment`] | External sentiment readings |
//! | [`report`] | Run reports, stages, progress |
//! | [`telemetry`] | `tracing-subscriber` setup |
//! | [`error`] | Pipeline errors |

pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod sentiment;
pub mod telemetry;

pub use config::{ConfigError, PipelineConfig, PipelineVariant};
pub use error::PipelineError;
pub use pipeline::ForecastPipeline;
pub use report::{
    FallbackReason, PipelineStage, RunOutcome, RunReport, TrainingProgress, TrainingSummary,
};
pub use sentiment::{NeutralSentiment, SentimentMap, SentimentSource};
