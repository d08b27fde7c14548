//! History window: bounded ring of `ConversationTurn`s.

use std::collections::VecDeque;

use neuro_types::ConversationTurn;
use serde::{Deserialize, Serialize};

use crate::tokens::{count_tokens, truncate_to_tokens};

/// Ceilings applied after every append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowLimits {
    /// Maximum retained turns (at least 1).
    pub max_turns: usize,
    /// Optional token budget over all retained turns.
    pub max_tokens: Option<usize>,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            max_turns: 40,
            max_tokens: None,
        }
    }
}

/// Window counters for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowStats {
    /// Retained turns.
    pub turns: usize,
    /// Retained pinned turns.
    pub pinned: usize,
    /// Tokens across retained turns.
    pub tokens: usize,
    /// Turns dropped since creation.
    pub dropped_total: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    turn: ConversationTurn,
    tokens: usize,
}

/// Sliding window. O(1) append; trimming drops the oldest non-pinned turn first.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    ring: VecDeque<Entry>,
    limits: WindowLimits,
    total_tokens: usize,
    dropped_total: u64,
}

impl HistoryWindow {
    /// Create a window with the given ceilings.
    #[must_use]
    pub fn new(limits: WindowLimits) -> Self {
        let limits = WindowLimits {
            max_turns: limits.max_turns.max(1),
            ..limits
        };
        Self {
            ring: VecDeque::with_capacity(limits.max_turns.min(4096)),
            limits,
            total_tokens: 0,
            dropped_total: 0,
        }
    }

    /// Turn-count ceiling only.
    #[must_use]
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self::new(WindowLimits {
            max_turns,
            max_tokens: None,
        })
    }

    /// Append one turn, then trim. Returns how many turns were dropped.
    ///
    /// A turn larger than the whole token budget is truncated to fit.
    pub fn append(&mut self, mut turn: ConversationTurn) -> usize {
        let mut tokens = count_tokens(&turn.content);
        if let Some(budget) = self.limits.max_tokens
            && tokens > budget
        {
            turn.content = truncate_to_tokens(&turn.content, budget);
            tokens = count_tokens(&turn.content);
        }
        self.total_tokens = self.total_tokens.saturating_add(tokens);
        self.ring.push_back(Entry { turn, tokens });
        self.enforce()
    }

    fn over_limits(&self) -> bool {
        self.ring.len() > self.limits.max_turns
            || self
                .limits
                .max_tokens
                .is_some_and(|budget| self.total_tokens > budget)
    }

    fn enforce(&mut self) -> usize {
        let mut dropped = 0;
        while self.over_limits() {
            // The newest turn is never a candidate.
            let newest = self.ring.len().saturating_sub(1);
            let Some(index) = self
                .ring
                .iter()
                .take(newest)
                .position(|entry| !entry.turn.pinned)
            else {
                break;
            };
            if let Some(entry) = self.ring.remove(index) {
                self.total_tokens = self.total_tokens.saturating_sub(entry.tokens);
                dropped += 1;
            }
        }
        self.dropped_total = self.dropped_total.saturating_add(dropped as u64);
        dropped
    }

    /// Retained turns, oldest to newest.
    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.ring.iter().map(|entry| &entry.turn)
    }

    /// Owned copy of the retained turns, oldest to newest.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ConversationTurn> {
        self.turns().cloned().collect()
    }

    /// Last `max_turns` turns (oldest to newest).
    #[must_use]
    pub fn recent(&self, max_turns: usize) -> Vec<&ConversationTurn> {
        let skip = self.ring.len().saturating_sub(max_turns);
        self.turns().skip(skip).collect()
    }

    /// Most recent turn.
    #[must_use]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.ring.back().map(|entry| &entry.turn)
    }

    /// Number of retained turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Active ceilings.
    #[must_use]
    pub fn limits(&self) -> WindowLimits {
        self.limits
    }

    /// Counters for diagnostics.
    #[must_use]
    pub fn stats(&self) -> WindowStats {
        WindowStats {
            turns: self.ring.len(),
            pinned: self.ring.iter().filter(|entry| entry.turn.pinned).count(),
            tokens: self.total_tokens,
            dropped_total: self.dropped_total,
        }
    }

    /// Drop every turn, pinned included.
    pub fn clear(&mut self) {
        self.ring.clear();
        self.total_tokens = 0;
    }
}
