use std::path::PathBuf;

use coincast_core::CoreError;
use coincast_engine::telemetry::TelemetryError;
use coincast_engine::PipelineError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] coincast_core::ValidationError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

impl From<CoreError> for CliError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(validation) => Self::Validation(validation),
            CoreError::Serialization(serialization) => Self::Serialization(serialization),
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Command(_) => 2,
            Self::Pipeline(PipelineError::UntrainedModel) => 3,
            Self::Pipeline(PipelineError::TrainingTask(_)) => 10,
            Self::Pipeline(_) => 2,
            Self::Serialization(_) => 4,
            Self::Read { .. } => 10,
            Self::Io(_) => 10,
            Self::Telemetry(_) => 2,
        }
    }
}
