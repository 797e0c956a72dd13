//! Per-recipient polling subscriptions.
//!
//! Each active recipient owns one tokio task that runs a [`PollCycle`] on a
//! fixed interval and hands the output to the [`Notifier`]. The task owns the
//! recipient's watermark; the threshold is shared with the manager so it can
//! be changed while the loop runs.

use crate::config::PollConfig;
use crate::notifier::{deliver, Notifier, RecipientId};
use bigdeal_core::{Threshold, Watermark};
use bigdeal_feeds::PollCycle;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Handle to a running polling loop.
struct Subscription {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns at most one polling loop per recipient.
pub struct SubscriptionManager {
    cycle: Arc<PollCycle>,
    notifier: Arc<dyn Notifier>,
    config: PollConfig,
    subscriptions: DashMap<RecipientId, Subscription>,
    thresholds: DashMap<RecipientId, Arc<Threshold>>,
}

impl SubscriptionManager {
    pub fn new(cycle: PollCycle, notifier: Arc<dyn Notifier>, config: PollConfig) -> Self {
        Self {
            cycle: Arc::new(cycle),
            notifier,
            config,
            subscriptions: DashMap::new(),
            thresholds: DashMap::new(),
        }
    }

    /// Start polling for `recipient`, replacing any loop it already has.
    ///
    /// The first cycle runs before this returns, starting from a zero
    /// watermark, so everything above the threshold in the current batch is
    /// delivered immediately. The repeating loop then continues from the
    /// watermark that cycle produced.
    pub async fn subscribe(&self, recipient: RecipientId) {
        if let Some((_, previous)) = self.subscriptions.remove(&recipient) {
            debug!(recipient = %recipient, "Replacing existing subscription");
            self.retire(recipient, previous).await;
        }

        let threshold = self.threshold_handle(recipient);
        let watermark = run_cycle(
            &self.cycle,
            self.notifier.as_ref(),
            recipient,
            Watermark::ZERO,
            threshold.get(),
        )
        .await;

        let (cancel, cancelled) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.cycle),
            Arc::clone(&self.notifier),
            recipient,
            threshold,
            watermark,
            self.config.interval(),
            cancelled,
        ));

        // A concurrent subscribe for the same recipient may have raced us.
        if let Some(displaced) = self
            .subscriptions
            .insert(recipient, Subscription { cancel, handle })
        {
            let _ = displaced.cancel.send(true);
        }
        info!(recipient = %recipient, "Subscribed");
    }

    /// Signal the recipient's loop to stop. Returns false if it had none.
    ///
    /// Never blocks: the loop notices the signal at its next tick and exits
    /// without running another cycle.
    pub fn unsubscribe(&self, recipient: RecipientId) -> bool {
        match self.subscriptions.remove(&recipient) {
            Some((_, subscription)) => {
                let _ = subscription.cancel.send(true);
                info!(recipient = %recipient, "Unsubscribed");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, recipient: RecipientId) -> bool {
        self.subscriptions.contains_key(&recipient)
    }

    pub fn active_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Current threshold for `recipient`, or the configured default.
    pub fn threshold(&self, recipient: RecipientId) -> i64 {
        self.thresholds
            .get(&recipient)
            .map(|t| t.get())
            .unwrap_or(self.config.default_threshold)
    }

    /// Change the recipient's threshold; an active loop picks it up on its
    /// next cycle. Kept across unsubscribe/subscribe.
    pub fn set_threshold(&self, recipient: RecipientId, value: i64) {
        self.threshold_handle(recipient).set(value);
        info!(recipient = %recipient, threshold = value, "Threshold updated");
    }

    /// Stop every loop and wait (briefly) for them to exit.
    /// Returns the number of subscriptions stopped.
    pub async fn shutdown(&self) -> usize {
        let recipients: Vec<RecipientId> = self.subscriptions.iter().map(|e| *e.key()).collect();
        let mut stopped = 0;
        for recipient in recipients {
            if let Some((_, subscription)) = self.subscriptions.remove(&recipient) {
                self.retire(recipient, subscription).await;
                stopped += 1;
            }
        }
        stopped
    }

    fn threshold_handle(&self, recipient: RecipientId) -> Arc<Threshold> {
        let default = self.config.default_threshold;
        Arc::clone(
            self.thresholds
                .entry(recipient)
                .or_insert_with(|| Arc::new(Threshold::new(default)))
                .value(),
        )
    }

    /// Cancel a loop and wait up to one interval for it to finish its
    /// in-flight cycle; abort it after that.
    async fn retire(&self, recipient: RecipientId, subscription: Subscription) {
        let Subscription { cancel, mut handle } = subscription;
        let _ = cancel.send(true);
        if tokio::time::timeout(self.config.interval(), &mut handle)
            .await
            .is_err()
        {
            warn!(recipient = %recipient, "Polling loop did not stop in time, aborting");
            handle.abort();
        }
    }
}

/// Run one cycle and deliver its output. Returns the watermark for the next
/// cycle; on failure that is the prior watermark.
async fn run_cycle(
    cycle: &PollCycle,
    notifier: &dyn Notifier,
    recipient: RecipientId,
    prior: Watermark,
    threshold: i64,
) -> Watermark {
    match cycle.run(prior, threshold).await {
        Ok(output) => {
            if !output.is_empty() {
                deliver(notifier, recipient, &output.notifications).await;
            }
            output.watermark
        }
        Err(e) if e.is_transient() => {
            warn!(recipient = %recipient, error = %e, "Poll cycle failed, retrying next tick");
            prior
        }
        Err(e) => {
            error!(recipient = %recipient, error = %e, "Feed response rejected, retrying next tick");
            prior
        }
    }
}

async fn poll_loop(
    cycle: Arc<PollCycle>,
    notifier: Arc<dyn Notifier>,
    recipient: RecipientId,
    threshold: Arc<Threshold>,
    mut watermark: Watermark,
    period: Duration,
    mut cancelled: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            changed = cancelled.changed() => {
                if changed.is_err() || *cancelled.borrow() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }
        if *cancelled.borrow() {
            break;
        }

        watermark = run_cycle(
            &cycle,
            notifier.as_ref(),
            recipient,
            watermark,
            threshold.get(),
        )
        .await;
    }

    debug!(recipient = %recipient, watermark = watermark.timestamp(), "Polling loop stopped");
}
