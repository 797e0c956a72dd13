//! Minimum notifiable deal value.

use crate::Deal;
use std::sync::atomic::{AtomicI64, Ordering};

/// Default minimum value (in quote currency) a deal must exceed.
pub const DEFAULT_THRESHOLD: i64 = 500_000;

/// True iff the deal's value is strictly greater than `threshold`.
#[inline]
pub fn passes(deal: &Deal, threshold: i64) -> bool {
    deal.whole_value() > threshold
}

/// Runtime-adjustable threshold shared between a writer and polling loops.
#[derive(Debug)]
pub struct Threshold(AtomicI64);

impl Default for Threshold {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Threshold {
    pub fn new(value: i64) -> Self {
        Self(AtomicI64::new(value))
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: i64) {
        self.0.store(value, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Side;
    use rust_decimal::Decimal;

    fn deal(value: i64) -> Deal {
        Deal::new("BTCUSDT", Side::Buy, 1, Decimal::from(value))
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!passes(&deal(500_000), 500_000));
        assert!(passes(&deal(500_001), 500_000));
        assert!(!passes(&deal(499_999), 500_000));
    }

    #[test]
    fn test_fraction_does_not_cross_boundary() {
        let deal = Deal::new("BTCUSDT", Side::Sell, 1, Decimal::new(50_000_099, 2));
        assert!(!passes(&deal, 500_000));
    }

    #[test]
    fn test_threshold_set_get() {
        let threshold = Threshold::default();
        assert_eq!(threshold.get(), DEFAULT_THRESHOLD);

        threshold.set(1_000_000);
        assert_eq!(threshold.get(), 1_000_000);
        assert!(!passes(&deal(900_000), threshold.get()));
        assert!(passes(&deal(1_000_001), threshold.get()));
    }
}
