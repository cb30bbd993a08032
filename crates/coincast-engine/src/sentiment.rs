//! Sentiment is an external input: one reading in `[-1, 1]` per asset.
//! A missing reading is neutral.

use std::collections::BTreeMap;

use coincast_core::confidence::validate_sentiment;
use coincast_core::{AssetId, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const NEUTRAL_SENTIMENT: f64 = 0.0;

pub trait SentimentSource: Send + Sync {
    fn sentiment(&self, asset_id: &AssetId) -> Option<f64>;
}

/// Source with no readings; every asset is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSentiment;

impl SentimentSource for NeutralSentiment {
    fn sentiment(&self, _asset_id: &AssetId) -> Option<f64> {
        None
    }
}

/// Readings keyed by asset id, deserializable from `{"bitcoin": 0.4}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SentimentMap(BTreeMap<AssetId, f64>);

impl SentimentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn insert(&mut self, asset_id: AssetId, value: f64) -> Option<f64> {
        self.0.insert(asset_id, value)
    }

    pub fn with(mut self, asset_id: AssetId, value: f64) -> Self {
        self.insert(asset_id, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SentimentSource for SentimentMap {
    fn sentiment(&self, asset_id: &AssetId) -> Option<f64> {
        self.0.get(asset_id).copied()
    }
}

impl<F> SentimentSource for F
where
    F: Fn(&AssetId) -> Option<f64> + Send + Sync,
{
    fn sentiment(&self, asset_id: &AssetId) -> Option<f64> {
        self(asset_id)
    }
}

/// A reading ready for scoring, plus a note when it had to be corrected.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedSentiment {
    pub value: f64,
    pub warning: Option<String>,
}

/// Out-of-range readings are clamped into `[-1, 1]`; non-finite readings
/// count as missing.
pub(crate) fn resolve(source: &dyn SentimentSource, asset_id: &AssetId) -> ResolvedSentiment {
    let Some(raw) = source.sentiment(asset_id) else {
        return ResolvedSentiment {
            value: NEUTRAL_SENTIMENT,
            warning: None,
        };
    };

    match validate_sentiment(raw) {
        Ok(value) => ResolvedSentiment {
            value,
            warning: None,
        },
        Err(ValidationError::SentimentOutOfRange { value }) => {
            let clamped = value.clamp(-1.0, 1.0);
            warn!(asset = %asset_id, raw = value, clamped, "sentiment clamped");
            ResolvedSentiment {
                value: clamped,
                warning: Some(format!(
                    "sentiment for '{asset_id}' clamped from {value} to {clamped}"
                )),
            }
        }
        Err(error) => {
            warn!(asset = %asset_id, %error, "sentiment ignored");
            ResolvedSentiment {
                value: NEUTRAL_SENTIMENT,
                warning: Some(format!("sentiment for '{asset_id}' ignored: {error}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> AssetId {
        AssetId::parse(value).expect("valid id")
    }

    #[test]
    fn missing_reading_is_neutral() {
        let resolved = resolve(&NeutralSentiment, &id("bitcoin"));
        assert_eq!(resolved.value, 0.0);
        assert!(resolved.warning.is_none());
    }

    #[test]
    fn out_of_range_reading_is_clamped_with_warning() {
        let source = SentimentMap::new().with(id("eth"), 1.7);
        let resolved = resolve(&source, &id("eth"));
        assert_eq!(resolved.value, 1.0);
        assert!(resolved.warning.is_some());
    }

    #[test]
    fn non_finite_reading_is_ignored() {
        let source = |_: &AssetId| Some(f64::NAN);
        let resolved = resolve(&source, &id("eth"));
        assert_eq!(resolved.value, 0.0);
        assert!(resolved.warning.is_some());
    }

    #[test]
    fn parses_json_map() {
        let map = SentimentMap::from_json(r#"{"Bitcoin": -0.25, "solana": 0.5}"#)
            .expect("valid json");
        assert_eq!(map.len(), 2);
        assert_eq!(map.sentiment(&id("bitcoin")), Some(-0.25));
        assert_eq!(map.sentiment(&id("doge")), None);
    }
}
