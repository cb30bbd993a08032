//! Min-max scaling of price windows.
//!
//! The range is fitted once per training batch over every asset's window
//! pooled together, not per asset. One asset with an extreme price therefore
//! compresses the normalized inputs of all the others; forecasts depend on
//! that relative scaling, so it is kept.

use serde::{Deserialize, Serialize};

use crate::{PriceSeries, ValidationError};

/// `{min, max}` pair fitted over a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationRange {
    min: f64,
    max: f64,
}

impl NormalizationRange {
    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// `max - min`, or 1 for a degenerate range.
    pub fn span(&self) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            1.0
        } else {
            span
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    pub fn unscale(&self, value: f64) -> f64 {
        value * self.span() + self.min
    }
}

/// Scan every value of every series in the batch.
pub fn fit<'a, I>(batch: I) -> Result<NormalizationRange, ValidationError>
where
    I: IntoIterator<Item = &'a PriceSeries>,
{
    let mut bounds: Option<(f64, f64)> = None;
    for series in batch {
        if series.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        for &value in series.values() {
            bounds = Some(match bounds {
                None => (value, value),
                Some((min, max)) => (min.min(value), max.max(value)),
            });
        }
    }

    let (min, max) = bounds.ok_or(ValidationError::EmptyBatch)?;
    Ok(NormalizationRange { min, max })
}

pub fn transform(series: &PriceSeries, range: &NormalizationRange) -> Vec<f64> {
    series.values().iter().map(|&value| range.scale(value)).collect()
}

pub fn inverse(value: f64, range: &NormalizationRange) -> f64 {
    range.unscale(value)
}
