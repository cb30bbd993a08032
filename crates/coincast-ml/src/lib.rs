//! # Coincast ML
//!
//! Recurrent sequence-to-one regressor used by the forecasting pipeline.
//!
//! ## Architecture
//!
//! ```text
//! window (W x 1) → LSTM (full sequence) → dropout → GRU (last state) → linear → value
//! ```
//!
//! Everything is implemented directly on `ndarray`: forward passes keep
//! their activations, gradients come from backpropagation through time,
//! and parameters are updated with Adam against mean squared error.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`layers`] | LSTM, GRU, dropout and dense layers |
//! | [`optimizer`] | Adam |
//! | [`network`] | The stacked network and its loss gradient |
//! | [`model`] | [`ForecastModel`]: single-flight training, atomic commits |
//! | [`config`] | Architecture and training schedule |
//! | [`metrics`] | Per-epoch and per-run reports |

pub mod config;
pub mod error;
mod init;
pub mod layers;
pub mod metrics;
pub mod model;
pub mod network;
pub mod optimizer;

pub use config::{ModelConfig, TrainOptions};
pub use error::ModelError;
pub use metrics::{EpochReport, TrainingMetrics};
pub use model::{ForecastModel, TrainOutcome};
