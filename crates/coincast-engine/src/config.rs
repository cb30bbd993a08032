//! Pipeline configuration.
//!
//! Two named variants carry the training schedules the application ships
//! with. A YAML file names a variant and overrides any subset of its
//! fields:
//!
//! ```yaml
//! variant: hybrid
//! epochs: 10
//! seed: 42
//! ```

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use coincast_core::volatility::DEFAULT_LOOKBACK;
use coincast_ml::{ModelConfig, TrainOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TRAINING_DEADLINE_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineVariant {
    /// 7-observation windows, 100 shuffled epochs of batch 8, dropout 0.2.
    #[default]
    Detailed,
    /// 30-observation windows, 5 epochs of batch 32, no dropout.
    Hybrid,
}

impl PipelineVariant {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Hybrid => "hybrid",
        }
    }
}

impl Display for PipelineVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineVariant {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(Self::Detailed),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(ConfigError::Invalid(format!("unknown variant '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineConfig {
    pub variant: PipelineVariant,
    pub window_len: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub lstm_units: usize,
    pub dropout: f64,
    pub gru_units: usize,
    pub learning_rate: f64,
    pub volatility_lookback: usize,
    /// Zero disables the deadline.
    pub training_deadline_ms: u64,
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_variant(PipelineVariant::default())
    }
}

/// On-disk shape: every field is optional and falls back to the variant's
/// value. A missing variant means `detailed`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPipelineConfig {
    variant: Option<PipelineVariant>,
    window_len: Option<usize>,
    epochs: Option<usize>,
    batch_size: Option<usize>,
    shuffle: Option<bool>,
    lstm_units: Option<usize>,
    dropout: Option<f64>,
    gru_units: Option<usize>,
    learning_rate: Option<f64>,
    volatility_lookback: Option<usize>,
    training_deadline_ms: Option<u64>,
    seed: Option<u64>,
}

impl RawPipelineConfig {
    /// `variant` replaces the file's variant as the base the other fields
    /// are laid over.
    fn resolve(self, variant: Option<PipelineVariant>) -> PipelineConfig {
        let variant = variant.or(self.variant).unwrap_or_default();
        let base = PipelineConfig::for_variant(variant);
        PipelineConfig {
            variant,
            window_len: self.window_len.unwrap_or(base.window_len),
            epochs: self.epochs.unwrap_or(base.epochs),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            shuffle: self.shuffle.unwrap_or(base.shuffle),
            lstm_units: self.lstm_units.unwrap_or(base.lstm_units),
            dropout: self.dropout.unwrap_or(base.dropout),
            gru_units: self.gru_units.unwrap_or(base.gru_units),
            learning_rate: self.learning_rate.unwrap_or(base.learning_rate),
            volatility_lookback: self.volatility_lookback.unwrap_or(base.volatility_lookback),
            training_deadline_ms: self
                .training_deadline_ms
                .unwrap_or(base.training_deadline_ms),
            seed: self.seed.or(base.seed),
        }
    }
}

impl<'de> Deserialize<'de> for PipelineConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        RawPipelineConfig::deserialize(deserializer).map(|raw| raw.resolve(None))
    }
}

impl PipelineConfig {
    pub fn for_variant(variant: PipelineVariant) -> Self {
        match variant {
            PipelineVariant::Detailed => Self {
                variant,
                window_len: 7,
                epochs: 100,
                batch_size: 8,
                shuffle: true,
                lstm_units: 64,
                dropout: 0.2,
                gru_units: 32,
                learning_rate: 0.001,
                volatility_lookback: DEFAULT_LOOKBACK,
                training_deadline_ms: DEFAULT_TRAINING_DEADLINE_MS,
                seed: None,
            },
            PipelineVariant::Hybrid => Self {
                variant,
                window_len: 30,
                epochs: 5,
                batch_size: 32,
                shuffle: false,
                lstm_units: 64,
                dropout: 0.0,
                gru_units: 64,
                learning_rate: 0.001,
                volatility_lookback: DEFAULT_LOOKBACK,
                training_deadline_ms: DEFAULT_TRAINING_DEADLINE_MS,
                seed: None,
            },
        }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, ConfigError> {
        Self::from_yaml_str_with_variant(input, None)
    }

    /// Parse `input`, laying its fields over `variant` instead of the
    /// variant the file names.
    pub fn from_yaml_str_with_variant(
        input: &str,
        variant: Option<PipelineVariant>,
    ) -> Result<Self, ConfigError> {
        let raw: RawPipelineConfig = serde_yaml::from_str(input)?;
        let config = raw.resolve(variant);
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_path_with_variant(path, None)
    }

    pub fn from_path_with_variant(
        path: impl AsRef<Path>,
        variant: Option<PipelineVariant>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str_with_variant(&raw, variant)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volatility_lookback == 0 {
            return Err(ConfigError::Invalid(
                "volatility_lookback must be positive".into(),
            ));
        }
        let invalid = |error: coincast_ml::ModelError| ConfigError::Invalid(error.to_string());
        self.model_config().validate().map_err(invalid)?;
        self.train_options().validate().map_err(invalid)?;
        Ok(())
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            window_len: self.window_len,
            lstm_units: self.lstm_units,
            dropout: self.dropout,
            gru_units: self.gru_units,
            learning_rate: self.learning_rate,
            seed: self.seed,
        }
    }

    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            shuffle: self.shuffle,
            deadline: self.training_deadline(),
        }
    }

    pub fn training_deadline(&self) -> Option<Duration> {
        (self.training_deadline_ms > 0).then(|| Duration::from_millis(self.training_deadline_ms))
    }
}
