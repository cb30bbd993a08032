use std::time::Duration;

use serde::Serialize;

/// Emitted after every completed epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochReport {
    /// Zero-based.
    pub epoch: usize,
    pub epochs: usize,
    pub loss: f64,
}

impl EpochReport {
    /// `round((epoch + 1) / epochs * 100)`.
    pub fn percent(&self) -> u8 {
        if self.epochs == 0 {
            return 0;
        }
        let ratio = (self.epoch + 1) as f64 / self.epochs as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// Summary of a committed training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetrics {
    /// Mean squared error per epoch, in order.
    pub epoch_losses: Vec<f64>,
    pub samples: usize,
    pub duration: Duration,
}

impl TrainingMetrics {
    pub fn epochs(&self) -> usize {
        self.epoch_losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}
