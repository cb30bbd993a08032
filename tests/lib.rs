// Shared fixtures for the behavioural test suites.
pub use coincast_core::{AssetId, AssetSnapshot, MarketRecord, PriceSeries};
pub use coincast_engine::{PipelineConfig, PipelineVariant};
pub use coincast_ml::{ModelConfig, TrainOptions};
pub use std::sync::Arc;

pub fn asset(id: &str) -> AssetId {
    AssetId::parse(id).expect("valid asset id")
}

pub fn series(values: &[f64]) -> PriceSeries {
    PriceSeries::new(values.to_vec()).expect("valid series")
}

pub fn snapshot(id: &str, window: &[f64], current_price: f64) -> AssetSnapshot {
    AssetSnapshot::new(asset(id), current_price, series(window)).expect("valid snapshot")
}

/// Detailed-variant pipeline shrunk so a run takes milliseconds.
pub fn fast_config(window_len: usize) -> PipelineConfig {
    PipelineConfig {
        window_len,
        epochs: 5,
        batch_size: 4,
        lstm_units: 6,
        gru_units: 4,
        learning_rate: 0.01,
        ..PipelineConfig::for_variant(PipelineVariant::Detailed)
    }
    .with_seed(17)
}

pub fn small_model(window_len: usize, seed: u64) -> ModelConfig {
    ModelConfig {
        window_len,
        lstm_units: 8,
        dropout: 0.0,
        gru_units: 4,
        learning_rate: 0.01,
        seed: Some(seed),
    }
}

/// Three assets with rising, falling and flat five-point windows.
pub fn mixed_batch() -> Vec<AssetSnapshot> {
    vec![
        snapshot("alpha", &[10.0, 11.0, 12.0, 13.0, 14.0], 15.0),
        snapshot("beta", &[20.0, 19.0, 18.0, 17.0, 16.0], 15.0),
        snapshot("gamma", &[12.0, 12.0, 12.0, 12.0, 12.0], 12.0),
    ]
}

/// `[start, start + step, ...]` with `len` points.
pub fn ramp(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}
