//! Threshold table mapping forecasts to recommendation labels.
//!
//! | percent_change | confidence | label |
//! |---|---|---|
//! | > 15 | > 70 | Strong Buy |
//! | > 5 | > 60 | Buy |
//! | > 0 | any | Hold |
//! | > -10 | any | Watch |
//! | else | any | Sell |
//!
//! Rows are conjunctive and evaluated top-down; the first match wins, so a
//! +20% forecast at 40% confidence is a Hold.

use crate::Recommendation;

pub fn classify(percent_change: f64, confidence: f64) -> Recommendation {
    if percent_change > 15.0 && confidence > 70.0 {
        Recommendation::StrongBuy
    } else if percent_change > 5.0 && confidence > 60.0 {
        Recommendation::Buy
    } else if percent_change > 0.0 {
        Recommendation::Hold
    } else if percent_change > -10.0 {
        Recommendation::Watch
    } else {
        Recommendation::Sell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_buy_needs_both_thresholds() {
        assert_eq!(classify(20.0, 80.0), Recommendation::StrongBuy);
        assert_eq!(classify(20.0, 40.0), Recommendation::Hold);
        assert_eq!(classify(20.0, 65.0), Recommendation::Buy);
    }

    #[test]
    fn boundaries_are_exclusive() {
        assert_eq!(classify(15.0, 90.0), Recommendation::Buy);
        assert_eq!(classify(15.01, 90.0), Recommendation::StrongBuy);
        assert_eq!(classify(5.0, 90.0), Recommendation::Hold);
        assert_eq!(classify(5.01, 90.0), Recommendation::Buy);
        assert_eq!(classify(0.0, 90.0), Recommendation::Watch);
        assert_eq!(classify(-10.0, 90.0), Recommendation::Sell);
        assert_eq!(classify(-10.01, 90.0), Recommendation::Sell);
        assert_eq!(classify(-9.99, 0.0), Recommendation::Watch);
    }

    #[test]
    fn confidence_boundaries_are_exclusive() {
        assert_eq!(classify(16.0, 70.0), Recommendation::Buy);
        assert_eq!(classify(6.0, 60.0), Recommendation::Hold);
    }
}
