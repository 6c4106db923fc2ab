//! Context budget truncation

use super::history::MessageHistory;

/// Drops the oldest messages until the history fits a turn and character budget.
///
/// The newest message is never dropped, so a single oversized message
/// survives even though it exceeds `max_chars`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationPolicy {
    max_turns: usize,
    max_chars: usize,
}

impl TruncationPolicy {
    pub fn new(max_turns: usize, max_chars: usize) -> Self {
        Self {
            max_turns: max_turns.max(1),
            max_chars,
        }
    }

    /// Apply the budget in place, returning how many messages were dropped
    pub fn apply(&self, history: &mut MessageHistory) -> usize {
        let mut dropped = history.keep_last(self.max_turns);

        let mut total = history.total_chars();
        while total > self.max_chars && history.len() > 1 {
            match history.pop_oldest() {
                Some(removed) => {
                    total -= removed.char_count();
                    dropped += 1;
                }
                None => break,
            }
        }

        dropped
    }
}
