//! Behavior-driven tests for the numeric rules of the forecasting engine:
//! scaling, dispersion, confidence fusion, classification and the model's
//! ability to learn a simple trend.

use coincast_core::{confidence, normalizer, percent_change, recommendation, volatility, Recommendation};
use coincast_ml::{ForecastModel, TrainOptions, TrainOutcome};
use coincast_tests::{ramp, series, small_model};

// =============================================================================
// Normalization
// =============================================================================

#[test]
fn when_values_are_scaled_and_restored_they_round_trip() {
    // Given: A batch with distinct prices across two assets
    let a = series(&[3.5, 7.25, 11.0]);
    let b = series(&[0.5, 120.0, 64.0]);
    let range = normalizer::fit([&a, &b]).expect("non-empty batch");

    // When: Every value is transformed and inverted
    for original in [&a, &b] {
        let scaled = normalizer::transform(original, &range);

        // Then: Values land in [0, 1] and come back unchanged
        assert!(scaled.iter().all(|v| (0.0..=1.0).contains(v)));
        for (value, restored) in original.values().iter().zip(&scaled) {
            let back = normalizer::inverse(*restored, &range);
            assert!((back - value).abs() < 1e-9, "{value} -> {back}");
        }
    }
}

#[test]
fn when_batch_order_changes_the_same_range_is_fitted() {
    // Given: Three series
    let a = series(&[5.0, 6.0]);
    let b = series(&[1.0, 9.0]);
    let c = series(&[4.0, 3.0]);

    // When: The range is fitted in two different orders
    let forward = normalizer::fit([&a, &b, &c]).expect("fits");
    let reversed = normalizer::fit([&c, &b, &a]).expect("fits");

    // Then: Both ranges are identical and pooled across all assets
    assert_eq!(forward, reversed);
    assert_eq!((forward.min(), forward.max()), (1.0, 9.0));
}

// =============================================================================
// Volatility
// =============================================================================

#[test]
fn when_prices_are_constant_volatility_is_zero() {
    let value = volatility::estimate(&series(&[100.0; 5]), volatility::DEFAULT_LOOKBACK)
        .expect("valid lookback");
    assert_eq!(value, 0.0);
}

#[test]
fn when_only_one_price_exists_volatility_falls_back_to_fifty() {
    let value = volatility::estimate(&series(&[42.0]), 5).expect("valid lookback");
    assert_eq!(value, volatility::FALLBACK_VOLATILITY);
    assert_eq!(value, 50.0);
}

#[test]
fn when_history_is_long_only_recent_points_count() {
    // Given: A wild early history followed by five calm points
    let history = series(&[1.0, 500.0, 3.0, 10.0, 10.0, 10.0, 10.0, 10.0]);

    // When: Volatility is estimated with the default lookback
    let value = volatility::estimate(&history, 5).expect("valid lookback");

    // Then: The early spike is ignored
    assert_eq!(value, 0.0);
}

#[test]
fn when_recent_prices_disperse_volatility_is_population_cv() {
    // Given: Last five prices 2, 4, 4, 4, 6 (mean 4, population std sqrt(1.6))
    let value = volatility::estimate(&series(&[2.0, 4.0, 4.0, 4.0, 6.0]), 5).expect("valid");

    // Then: CV percent = sqrt(1.6) / 4 * 100
    let expected = 1.6f64.sqrt() / 4.0 * 100.0;
    assert!((value - expected).abs() < 1e-9, "value={value} expected={expected}");
}

// =============================================================================
// Confidence and classification
// =============================================================================

#[test]
fn when_signals_are_fused_confidence_stays_in_bounds() {
    for change in [-80.0, -10.0, -0.001, 0.0, 0.001, 4.0, 99.0] {
        for sentiment in [-1.0, -0.7, -0.3, 0.0, 0.3, 0.7, 1.0] {
            let value = confidence::score(change, sentiment, 50.0);
            assert!((0.0..=100.0).contains(&value), "change={change} sentiment={sentiment}");
        }
    }
}

#[test]
fn when_volatility_changes_confidence_does_not() {
    let calm = confidence::score(8.0, 0.3, 0.0);
    let wild = confidence::score(8.0, 0.3, 400.0);
    assert_eq!(calm, wild);
}

#[test]
fn when_boundaries_are_hit_classifier_uses_strict_thresholds() {
    let cases = [
        (15.0, 100.0, Recommendation::Buy),
        (15.01, 100.0, Recommendation::StrongBuy),
        (5.0, 100.0, Recommendation::Hold),
        (5.01, 100.0, Recommendation::Buy),
        (0.0, 100.0, Recommendation::Watch),
        (-10.0, 100.0, Recommendation::Sell),
        (-10.01, 100.0, Recommendation::Sell),
    ];
    for (change, confidence, expected) in cases {
        assert_eq!(
            recommendation::classify(change, confidence),
            expected,
            "change={change}"
        );
    }
}

#[test]
fn when_forecast_is_strong_but_confidence_weak_label_is_hold() {
    // Given: +20% predicted with neutral sentiment (confidence 36)
    let change = percent_change(100.0, 120.0);
    let score = confidence::score(change, 0.0, 10.0);

    // Then: Neither buy row matches
    assert!((score - 36.0).abs() < 1e-9);
    assert_eq!(recommendation::classify(change, score), Recommendation::Hold);
}

// =============================================================================
// Model fit
// =============================================================================

#[test]
fn when_trained_on_linear_trends_model_extrapolates_the_next_step() {
    // Given: Windows rising by 2 per step, each labelled with the next value
    let bases = [90.0, 95.0, 100.0, 105.0, 110.0];
    let raw: Vec<_> = bases.iter().map(|&b| series(&ramp(b, 2.0, 7))).collect();
    let range = normalizer::fit(raw.iter()).expect("fits");
    let windows: Vec<Vec<f64>> = raw.iter().map(|s| normalizer::transform(s, &range)).collect();
    let targets: Vec<f64> = bases.iter().map(|b| range.scale(b + 14.0)).collect();

    let model = ForecastModel::new(small_model(7, 3)).expect("valid config");
    let options = TrainOptions {
        epochs: 300,
        batch_size: 5,
        shuffle: false,
        deadline: None,
    };

    // When: The model is trained and asked about [100, 102, ..., 112]
    let outcome = model.train(&windows, &targets, &options).expect("trains");
    assert!(matches!(outcome, TrainOutcome::Completed(_)));
    let query = normalizer::transform(&series(&ramp(100.0, 2.0, 7)), &range);
    let predicted = normalizer::inverse(model.predict(&query).expect("trained"), &range);

    // Then: The forecast lands within 6 of the linear extrapolation 114
    assert!(
        (predicted - 114.0).abs() < 6.0,
        "predicted {predicted}, expected about 114"
    );
}

#[test]
fn when_training_runs_loss_decreases() {
    // Given: A small learnable batch
    let windows = vec![ramp(0.0, 0.1, 5), ramp(0.5, -0.1, 5), ramp(0.2, 0.05, 5)];
    let targets = vec![0.5, 0.0, 0.45];
    let model = ForecastModel::new(small_model(5, 8)).expect("valid config");

    // When: Training for many epochs
    let options = TrainOptions {
        epochs: 150,
        batch_size: 3,
        shuffle: false,
        deadline: None,
    };
    let TrainOutcome::Completed(metrics) = model.train(&windows, &targets, &options).expect("trains")
    else {
        panic!("expected a completed run");
    };

    // Then: The last epoch's loss is below the first
    let first = metrics.epoch_losses[0];
    let last = metrics.final_loss().expect("has epochs");
    assert!(last < first, "first={first} last={last}");
    assert_eq!(metrics.epochs(), 150);
}
