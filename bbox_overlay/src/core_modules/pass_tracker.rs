// THEORY:
// Every overlay pass is stamped with a generation number. Probes complete in
// any order and possibly long after the card list was rescanned, so each late
// completion carries the `PassToken` of the pass that launched it and asks the
// tracker whether that pass is still the current one before touching a card.
//
// Lifecycle:
// - **Begin**: a new pass bumps the generation; all older tokens become stale.
// - **Check**: `is_current` is a single atomic load.
// - **Cancel**: bumping without starting a pass retires the running one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies the pass that issued a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassToken {
    generation: u64,
}

impl PassToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Shared generation counter. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct PassTracker {
    current: Arc<AtomicU64>,
}

impl PassTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new pass and retires every earlier token.
    pub fn begin(&self) -> PassToken {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        PassToken { generation }
    }

    pub fn is_current(&self, token: PassToken) -> bool {
        self.current.load(Ordering::Acquire) == token.generation
    }

    /// Retires the running pass without starting another.
    pub fn cancel(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}
