use coincast_core::ValidationError;
use coincast_ml::ModelError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    /// No committed parameters to predict with.
    #[error("forecast unavailable: model has not completed a training run")]
    UntrainedModel,

    #[error(transparent)]
    Model(ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("training task failed: {0}")]
    TrainingTask(String),
}

impl From<ModelError> for PipelineError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::InvalidInput(validation) => Self::InvalidInput(validation),
            ModelError::UntrainedModel => Self::UntrainedModel,
            other => Self::Model(other),
        }
    }
}
