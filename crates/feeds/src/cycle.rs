//! A single poll cycle: fetch → dedup → filter → format.

use crate::error::FeedResult;
use crate::rest::DealSource;
use bigdeal_core::{passes, Deal, DealFormatter, Watermark};
use std::sync::Arc;
use tracing::debug;

/// Outcome of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutput {
    /// Formatted notifications, newest deal first.
    pub notifications: Vec<String>,
    /// Watermark to use for the next cycle.
    pub watermark: Watermark,
}

impl CycleOutput {
    /// No notifications and the prior watermark.
    pub fn unchanged(watermark: Watermark) -> Self {
        Self {
            notifications: Vec::new(),
            watermark,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

/// Runs poll cycles against a deal source. Holds no per-subscriber state;
/// the caller owns the watermark and threshold.
pub struct PollCycle {
    source: Arc<dyn DealSource>,
    formatter: DealFormatter,
}

impl PollCycle {
    pub fn new(source: Arc<dyn DealSource>, formatter: DealFormatter) -> Self {
        Self { source, formatter }
    }

    /// Fetch a batch and process it.
    ///
    /// An empty feed is a normal outcome with the watermark unchanged.
    /// Transport and decode errors are returned as-is and the caller keeps its
    /// prior watermark.
    pub async fn run(&self, prior: Watermark, threshold: i64) -> FeedResult<CycleOutput> {
        let batch = match self.source.fetch().await {
            Ok(batch) => batch,
            Err(e) if e.is_empty_feed() => {
                debug!("Feed returned no deals");
                return Ok(CycleOutput::unchanged(prior));
            }
            Err(e) => return Err(e),
        };
        Ok(self.process(&batch, prior, threshold))
    }

    /// Dedup, filter and format an already fetched batch.
    pub fn process(&self, batch: &[Deal], prior: Watermark, threshold: i64) -> CycleOutput {
        let fresh = prior.fresh(batch);
        let notifications: Vec<String> = fresh
            .iter()
            .filter(|deal| passes(deal, threshold))
            .map(|deal| self.formatter.format(deal))
            .collect();

        debug!(
            batch = batch.len(),
            fresh = fresh.len(),
            notify = notifications.len(),
            "Processed deal batch"
        );

        CycleOutput {
            notifications,
            watermark: prior.advance(batch),
        }
    }
}
