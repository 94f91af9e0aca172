//! Leaderboard visibility state.
//!
//! # Responsibility
//! - Hold the "hidden/shown" flag and optional reveal time for public
//!   leaderboard views.
//!
//! # Invariants
//! - State is read and replaced as one value; readers never observe a
//!   half-applied update.
//! - A hidden board with a reveal time becomes visible once `now >= reveal`.
//! - This holder lives for one process; `CompetitionApi` persists changes to
//!   the store and `restore_display` seeds a fresh holder from it.

use serde::Serialize;
use std::sync::{PoisonError, RwLock};

/// Point-in-time copy of the display state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    pub hidden: bool,
    /// Epoch milliseconds at which a hidden board shows itself again.
    pub reveal_at_ms: Option<i64>,
}

impl DisplayState {
    pub fn is_visible_at(&self, now_ms: i64) -> bool {
        match (self.hidden, self.reveal_at_ms) {
            (false, _) => true,
            (true, Some(reveal_at)) => now_ms >= reveal_at,
            (true, None) => false,
        }
    }
}

/// Shared, injectable display state.
#[derive(Debug, Default)]
pub struct LeaderboardDisplay {
    state: RwLock<DisplayState>,
}

impl LeaderboardDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> DisplayState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hides the board, optionally until `reveal_at_ms`.
    pub fn hide(&self, reveal_at_ms: Option<i64>) {
        self.replace(DisplayState {
            hidden: true,
            reveal_at_ms,
        });
    }

    pub fn show(&self) {
        self.replace(DisplayState::default());
    }

    /// Replaces the state with one loaded from elsewhere.
    pub fn restore(&self, state: DisplayState) {
        self.replace(state);
    }

    pub fn is_visible_at(&self, now_ms: i64) -> bool {
        self.snapshot().is_visible_at(now_ms)
    }

    fn replace(&self, next: DisplayState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
