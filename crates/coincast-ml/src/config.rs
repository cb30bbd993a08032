use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Architecture and optimizer settings. Fixed for the life of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub window_len: usize,
    pub lstm_units: usize,
    pub dropout: f64,
    pub gru_units: usize,
    pub learning_rate: f64,
    /// Seeds weight init, shuffling and dropout masks. `None` draws from
    /// the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_len: 7,
            lstm_units: 64,
            dropout: 0.2,
            gru_units: 32,
            learning_rate: 0.001,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.window_len == 0 {
            return Err(ModelError::InvalidConfig("window_len must be positive".into()));
        }
        if self.lstm_units == 0 || self.gru_units == 0 {
            return Err(ModelError::InvalidConfig("layer units must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ModelError::InvalidConfig(format!(
                "dropout {} must be in [0, 1)",
                self.dropout
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ModelError::InvalidConfig(format!(
                "learning_rate {} must be positive",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Per-run training schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub deadline: Option<Duration>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            batch_size: 8,
            shuffle: true,
            deadline: None,
        }
    }
}

impl TrainOptions {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.epochs == 0 {
            return Err(ModelError::InvalidConfig("epochs must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidConfig("batch_size must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
        assert!(TrainOptions::default().validate().is_ok());
    }

    #[test]
    fn rejects_dropout_of_one() {
        let config = ModelConfig {
            dropout: 1.0,
            ..ModelConfig::default()
        };
        assert!(matches!(config.validate(), Err(ModelError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_epochs() {
        let options = TrainOptions {
            epochs: 0,
            ..TrainOptions::default()
        };
        assert!(options.validate().is_err());
    }
}
