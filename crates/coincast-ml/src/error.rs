use std::time::Duration;

use coincast_core::ValidationError;
use thiserror::Error;

/// Errors produced by model training and inference.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("model has not completed a training run")]
    UntrainedModel,

    #[error("training diverged at epoch {epoch} (loss {loss})")]
    TrainingDivergence { epoch: usize, loss: f64 },

    #[error("training deadline exceeded after {completed_epochs} epochs ({elapsed:?})")]
    DeadlineExceeded {
        completed_epochs: usize,
        elapsed: Duration,
    },

    #[error("invalid model config: {0}")]
    InvalidConfig(String),
}

impl ModelError {
    /// Errors after which the previously committed parameters stay usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TrainingDivergence { .. } | Self::DeadlineExceeded { .. }
        )
    }
}
