//! # Coincast Core
//!
//! Domain types and deterministic scoring rules for the coincast
//! forecasting engine.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`domain`] | Asset ids, price series, snapshots, forecasts, recommendations |
//! | [`normalizer`] | Batch-pooled min-max scaling |
//! | [`volatility`] | Coefficient-of-variation risk proxy |
//! | [`confidence`] | Sentiment plus technical confidence score |
//! | [`recommendation`] | Threshold table for recommendation labels |
//! | [`screening`] | Search, ranking and trend screens for the presentation layer |
//! | [`error`] | Core error types |
//!
//! ## Scoring one forecast
//!
//! ```rust
//! use coincast_core::{confidence, percent_change, recommendation, Recommendation};
//!
//! let change = percent_change(100.0, 120.0);
//! let score = confidence::score(change, 1.0, 12.0);
//! assert_eq!(recommendation::classify(change, score), Recommendation::StrongBuy);
//! ```

pub mod confidence;
pub mod domain;
pub mod error;
pub mod normalizer;
pub mod recommendation;
pub mod screening;
pub mod volatility;

pub use domain::{
    percent_change, AssetForecast, AssetId, AssetSnapshot, MarketRecord, PriceSeries,
    Recommendation, UtcDateTime,
};
pub use error::{CoreError, ValidationError};
pub use normalizer::NormalizationRange;
pub use screening::ScreenFilter;
