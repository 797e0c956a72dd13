//! Dedup boundary between already-delivered and fresh deals.

use crate::Deal;
use serde::{Deserialize, Serialize};

/// Timestamp of the newest deal seen by the previous cycle.
///
/// Zero means nothing has been seen yet and disables dedup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Watermark(i64);

impl Watermark {
    pub const ZERO: Watermark = Watermark(0);

    pub fn new(timestamp: i64) -> Self {
        Self(timestamp)
    }

    #[inline]
    pub fn timestamp(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Leading run of a newest-first batch that is newer than the watermark.
    ///
    /// Scanning stops at the first deal whose timestamp is at or below the
    /// watermark; that deal and everything after it are excluded.
    pub fn fresh<'a>(self, batch: &'a [Deal]) -> &'a [Deal] {
        if self.is_zero() {
            return batch;
        }
        let end = batch
            .iter()
            .position(|deal| deal.timestamp <= self.0)
            .unwrap_or(batch.len());
        &batch[..end]
    }

    /// Watermark after seeing `batch`: the timestamp of its first (newest)
    /// deal, whether or not that deal was delivered. An empty batch leaves
    /// the watermark unchanged.
    pub fn advance(self, batch: &[Deal]) -> Watermark {
        batch
            .first()
            .map(|deal| Watermark(deal.timestamp))
            .unwrap_or(self)
    }
}
