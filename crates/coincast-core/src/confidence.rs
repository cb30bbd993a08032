//! Fusion of model direction and sentiment into a bounded confidence.
//!
//! The technical component is a hard sign (`±0.6`): every upward forecast
//! scores the same regardless of its magnitude. Direction is carried by
//! `percent_change`; confidence only reports strength.

use crate::ValidationError;

pub const TECHNICAL_SIGNAL: f64 = 0.6;
pub const SENTIMENT_WEIGHT: f64 = 0.4;
pub const TECHNICAL_WEIGHT: f64 = 0.6;

/// Confidence in `[0, 100]`.
///
/// `volatility` is reported alongside the score but does not enter it.
pub fn score(percent_change: f64, sentiment: f64, _volatility: f64) -> f64 {
    let technical = if percent_change > 0.0 {
        TECHNICAL_SIGNAL
    } else {
        -TECHNICAL_SIGNAL
    };
    let combined = SENTIMENT_WEIGHT * sentiment + TECHNICAL_WEIGHT * technical;
    (combined * 100.0).abs().clamp(0.0, 100.0)
}

/// Validate an externally supplied sentiment reading.
pub fn validate_sentiment(value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "sentiment" });
    }
    if !(-1.0..=1.0).contains(&value) {
        return Err(ValidationError::SentimentOutOfRange { value });
    }
    Ok(value)
}
