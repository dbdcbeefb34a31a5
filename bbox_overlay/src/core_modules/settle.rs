// THEORY:
// "Settled" means a probe reached a terminal state: loaded or failed. The
// `SettleTracker` counts those terminal states against the number of probes
// launched, and any number of `SettleSignal`s can await the moment nothing is
// pending any more. Failures count as settled so one broken link never blocks
// the page-wide signal.

use serde::Serialize;
use tokio::sync::watch;

/// Counts of a batch of probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettleCounts {
    pub expected: usize,
    pub loaded: usize,
    pub failed: usize,
}

impl SettleCounts {
    pub fn settled(&self) -> usize {
        self.loaded + self.failed
    }

    pub fn pending(&self) -> usize {
        self.expected.saturating_sub(self.settled())
    }

    pub fn is_settled(&self) -> bool {
        self.pending() == 0
    }
}

/// Producer side: records each probe's terminal state.
#[derive(Debug)]
pub struct SettleTracker {
    tx: watch::Sender<SettleCounts>,
}

impl SettleTracker {
    pub fn new(expected: usize) -> Self {
        let (tx, _) = watch::channel(SettleCounts {
            expected,
            ..SettleCounts::default()
        });
        Self { tx }
    }

    pub fn record_loaded(&self) {
        self.tx.send_modify(|c| c.loaded += 1);
    }

    pub fn record_failed(&self) {
        self.tx.send_modify(|c| c.failed += 1);
    }

    pub fn counts(&self) -> SettleCounts {
        *self.tx.borrow()
    }

    pub fn signal(&self) -> SettleSignal {
        SettleSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Consumer side: resolves once every expected probe has settled.
#[derive(Debug, Clone)]
pub struct SettleSignal {
    rx: watch::Receiver<SettleCounts>,
}

impl SettleSignal {
    /// Waits for the batch to settle. If the tracker is dropped first, the last
    /// recorded counts are returned as they stand.
    pub async fn settled(mut self) -> SettleCounts {
        let settled = self
            .rx
            .wait_for(SettleCounts::is_settled)
            .await
            .map(|counts| *counts);
        settled.unwrap_or_else(|_| *self.rx.borrow())
    }
}
