//! Coefficient-of-variation risk proxy.

use crate::{PriceSeries, ValidationError};

/// Observations considered when no lookback is configured.
pub const DEFAULT_LOOKBACK: usize = 5;

/// Returned when dispersion cannot be measured: assume moderate risk.
pub const FALLBACK_VOLATILITY: f64 = 50.0;

/// Population standard deviation over mean of the last `lookback` points,
/// as a percentage.
pub fn estimate(series: &PriceSeries, lookback: usize) -> Result<f64, ValidationError> {
    if lookback == 0 {
        return Err(ValidationError::InvalidLookback);
    }

    let values = series.values();
    let recent = &values[values.len().saturating_sub(lookback)..];
    if recent.len() < 2 {
        return Ok(FALLBACK_VOLATILITY);
    }

    let count = recent.len() as f64;
    let mean = recent.iter().sum::<f64>() / count;
    if mean == 0.0 {
        return Ok(FALLBACK_VOLATILITY);
    }

    let variance = recent.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    Ok(variance.sqrt() / mean * 100.0)
}
