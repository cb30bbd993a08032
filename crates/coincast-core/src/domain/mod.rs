//! # Domain Models
//!
//! Canonical types flowing through the forecasting engine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AssetId`] | Validated, lowercase asset identifier |
//! | [`PriceSeries`] | Finite, non-negative price observations |
//! | [`MarketRecord`] | Full history handed over by the fetch layer |
//! | [`AssetSnapshot`] | Engine input: current price plus forecast window |
//! | [`AssetForecast`] | Scored per-asset output |
//! | [`Recommendation`] | Five-label investment recommendation |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! All constructors validate their invariants:
//!
//! ```rust
//! use coincast_core::{PriceSeries, ValidationError};
//!
//! let err = PriceSeries::new(vec![1.0, f64::NAN]).unwrap_err();
//! assert!(matches!(err, ValidationError::NonFiniteValue { .. }));
//! ```

mod asset_id;
mod models;
mod series;
mod timestamp;

pub use asset_id::AssetId;
pub use models::{percent_change, AssetForecast, AssetSnapshot, MarketRecord, Recommendation};
pub use series::PriceSeries;
pub use timestamp::UtcDateTime;
