use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Ordered, validated price observations for one asset.
///
/// Values are finite and non-negative. A series is never mutated in place:
/// tail extraction returns a new series and normalization returns new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    pub fn new(values: Vec<f64>) -> Result<Self, ValidationError> {
        if values.is_empty() {
            return Err(ValidationError::EmptySeries);
        }
        for value in &values {
            validate_price(*value)?;
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn first(&self) -> Option<f64> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    /// The last `len` observations, or `None` when the series is shorter.
    pub fn tail(&self, len: usize) -> Option<Self> {
        if len == 0 || len > self.0.len() {
            return None;
        }
        Some(Self(self.0[self.0.len() - len..].to_vec()))
    }
}

impl TryFrom<Vec<f64>> for PriceSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriceSeries> for Vec<f64> {
    fn from(value: PriceSeries) -> Self {
        value.0
    }
}

pub(crate) fn validate_price(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field: "price" });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field: "price" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_series() {
        let err = PriceSeries::new(Vec::new()).expect_err("must fail");
        assert_eq!(err, ValidationError::EmptySeries);
    }

    #[test]
    fn rejects_nan_and_negative_prices() {
        let nan = PriceSeries::new(vec![1.0, f64::NAN]).expect_err("must fail");
        assert!(matches!(nan, ValidationError::NonFiniteValue { .. }));

        let negative = PriceSeries::new(vec![1.0, -2.0]).expect_err("must fail");
        assert!(matches!(negative, ValidationError::NegativeValue { .. }));
    }

    #[test]
    fn tail_takes_most_recent_observations() {
        let series = PriceSeries::new(vec![1.0, 2.0, 3.0, 4.0]).expect("valid");
        let tail = series.tail(2).expect("long enough");
        assert_eq!(tail.values(), &[3.0, 4.0]);
        assert!(series.tail(5).is_none());
        assert!(series.tail(0).is_none());
    }
}
