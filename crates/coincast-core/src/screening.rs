//! Presentation-side helpers over scored forecasts and raw histories.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{AssetForecast, MarketRecord, PriceSeries};

/// Default threshold for the strong-growth screen, in percent.
pub const STRONG_GROWTH_PCT: f64 = 20.0;

/// Change from the first to the last observation of a history, in percent.
pub fn trend_change(history: &PriceSeries) -> Option<f64> {
    if history.len() < 2 {
        return None;
    }
    let first = history.first()?;
    let last = history.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Case-insensitive substring match on id, name or symbol.
pub fn matches_query(forecast: &AssetForecast, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let haystacks = [
        Some(forecast.asset_id.as_str()),
        forecast.name.as_deref(),
        forecast.symbol.as_deref(),
    ];
    haystacks
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

/// Sort by predicted percent change, largest first. NaN sorts last.
pub fn rank_by_change(forecasts: &mut [AssetForecast]) {
    forecasts.sort_by(|a, b| descending_nan_last(a.percent_change, b.percent_change));
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// History-based screen applied to raw market records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ScreenFilter {
    All,
    StrongGrowth { min_pct: f64 },
}

impl Default for ScreenFilter {
    fn default() -> Self {
        Self::StrongGrowth {
            min_pct: STRONG_GROWTH_PCT,
        }
    }
}

/// A record that passed a screen, with its measured trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenHit<'a> {
    pub record: &'a MarketRecord,
    pub trend_pct: Option<f64>,
}

impl ScreenFilter {
    pub fn accepts(&self, record: &MarketRecord) -> bool {
        match self {
            Self::All => true,
            Self::StrongGrowth { min_pct } => trend_change(&record.history)
                .map(|trend| trend > *min_pct)
                .unwrap_or(false),
        }
    }

    pub fn apply<'a>(&self, records: &'a [MarketRecord]) -> Vec<ScreenHit<'a>> {
        records
            .iter()
            .filter(|record| self.accepts(record))
            .map(|record| ScreenHit {
                record,
                trend_pct: trend_change(&record.history),
            })
            .collect()
    }
}
