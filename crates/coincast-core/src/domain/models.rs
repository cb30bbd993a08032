use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::domain::series::validate_price;
use crate::{AssetId, CoreError, PriceSeries, ValidationError};

/// Raw market record as handed over by the fetch layer: the full recent
/// history of one asset plus its latest price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub asset_id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub current_price: f64,
    pub history: PriceSeries,
}

impl MarketRecord {
    /// Parse a JSON array of records, validating every price.
    pub fn parse_batch(input: &str) -> Result<Vec<Self>, CoreError> {
        let records: Vec<Self> = serde_json::from_str(input)?;
        for record in &records {
            validate_current_price(record.current_price)?;
        }
        Ok(records)
    }

    /// Cut the forecast window (the last `window_len` observations).
    pub fn snapshot(&self, window_len: usize) -> Result<AssetSnapshot, ValidationError> {
        let mut snapshot = AssetSnapshot::from_history(
            self.asset_id.clone(),
            self.current_price,
            &self.history,
            window_len,
        )?;
        snapshot.name = self.name.clone();
        snapshot.symbol = self.symbol.clone();
        Ok(snapshot)
    }
}

/// Per-asset engine input: the latest price and a fixed-length window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub asset_id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub current_price: f64,
    pub price_window: PriceSeries,
}

impl AssetSnapshot {
    pub fn new(
        asset_id: AssetId,
        current_price: f64,
        price_window: PriceSeries,
    ) -> Result<Self, ValidationError> {
        validate_current_price(current_price)?;
        Ok(Self {
            asset_id,
            name: None,
            symbol: None,
            current_price,
            price_window,
        })
    }

    pub fn from_history(
        asset_id: AssetId,
        current_price: f64,
        history: &PriceSeries,
        window_len: usize,
    ) -> Result<Self, ValidationError> {
        let window = history
            .tail(window_len)
            .ok_or_else(|| ValidationError::InsufficientHistory {
                asset: asset_id.to_string(),
                available: history.len(),
                required: window_len,
            })?;
        Self::new(asset_id, current_price, window)
    }
}

fn validate_current_price(value: f64) -> Result<(), ValidationError> {
    validate_price(value).map_err(|error| match error {
        ValidationError::NonFiniteValue { .. } => ValidationError::NonFiniteValue {
            field: "current_price",
        },
        ValidationError::NegativeValue { .. } => ValidationError::NegativeValue {
            field: "current_price",
        },
        other => other,
    })
}

/// Discrete investment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Watch,
    Sell,
}

impl Recommendation {
    pub const ALL: [Recommendation; 5] = [
        Self::StrongBuy,
        Self::Buy,
        Self::Hold,
        Self::Watch,
        Self::Sell,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::Hold => "Hold",
            Self::Watch => "Watch",
            Self::Sell => "Sell",
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored forecast for one asset. Produced wholesale on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetForecast {
    pub asset_id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub current_price: f64,
    pub predicted_price: f64,
    pub percent_change: f64,
    pub sentiment: f64,
    pub volatility: f64,
    pub confidence: f64,
    pub recommendation: Recommendation,
}

/// Percent move from `current` to `predicted`; zero when there is no
/// positive current price to compare against.
pub fn percent_change(current: f64, predicted: f64) -> f64 {
    if current > 0.0 {
        (predicted - current) / current * 100.0
    } else {
        0.0
    }
}
