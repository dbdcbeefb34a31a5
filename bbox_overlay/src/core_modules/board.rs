// THEORY:
// The `CardBoard` is the shared, mutable card list: the thing the page would
// call "the grid". Overlay passes read it at scan time and write one overlay
// per card as probes settle. A rescan swaps the whole list and bumps the
// board epoch.
//
// All reads and writes go through one mutex, and pass start (generation bump
// plus overlay clearing) happens under that same lock. A pass addresses its
// cards by `CardSlot` (epoch plus position at scan time), never by id, so a
// draw checked inside `draw_if_current` can only land on the exact element
// it scanned: not on a rescanned list, and not on a card sharing its id.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core_modules::card::CardElement;
use crate::core_modules::pass_tracker::{PassToken, PassTracker};

/// Where a card sat when a pass scanned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    epoch: u64,
    index: usize,
}

#[derive(Debug, Default)]
struct BoardState {
    epoch: u64,
    cards: Vec<CardElement>,
}

#[derive(Debug, Clone, Default)]
pub struct CardBoard {
    state: Arc<Mutex<BoardState>>,
}

impl CardBoard {
    pub fn new(cards: Vec<CardElement>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState { epoch: 0, cards })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the card list. Overlays on the old cards go away with them,
    /// and every slot handed out before the rescan goes stale.
    pub fn rescan(&self, cards: Vec<CardElement>) {
        let mut state = self.lock();
        state.epoch = state.epoch.wrapping_add(1);
        state.cards = cards;
    }

    pub fn len(&self) -> usize {
        self.lock().cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cards.is_empty()
    }

    /// Cloned view of the current cards, overlays included.
    pub fn snapshot(&self) -> Vec<CardElement> {
        self.lock().cards.clone()
    }

    pub fn overlay_count(&self) -> usize {
        self.lock().cards.iter().filter(|c| c.overlay().is_some()).count()
    }

    /// Starts a pass: bumps the generation, clears every overlay and returns
    /// the token together with each card and its slot.
    pub fn begin_pass(&self, tracker: &PassTracker) -> (PassToken, Vec<(CardSlot, CardElement)>) {
        let mut state = self.lock();
        let token = tracker.begin();
        let epoch = state.epoch;
        let scanned = state
            .cards
            .iter_mut()
            .enumerate()
            .map(|(index, card)| {
                card.clear_overlay();
                (CardSlot { epoch, index }, card.clone())
            })
            .collect();
        (token, scanned)
    }

    /// Runs `f` on the card in `slot`, but only while `token` is current and
    /// the board has not been rescanned since. Returns `None` otherwise.
    pub fn draw_if_current<R>(
        &self,
        tracker: &PassTracker,
        token: PassToken,
        slot: CardSlot,
        f: impl FnOnce(&mut CardElement) -> R,
    ) -> Option<R> {
        let mut state = self.lock();
        if !tracker.is_current(token) || state.epoch != slot.epoch {
            return None;
        }
        state.cards.get_mut(slot.index).map(f)
    }

    /// Runs `f` on the first card with `id` regardless of pass state.
    pub fn with_card<R>(&self, id: &str, f: impl FnOnce(&CardElement) -> R) -> Option<R> {
        self.lock().cards.iter().find(|c| c.id == id).map(f)
    }

    /// Mutable access for layout updates, e.g. a new displayed size after a
    /// resize.
    pub fn with_card_mut<R>(&self, id: &str, f: impl FnOnce(&mut CardElement) -> R) -> Option<R> {
        self.lock().cards.iter_mut().find(|c| c.id == id).map(f)
    }
}
