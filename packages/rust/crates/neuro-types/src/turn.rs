//! Conversation turns owned by the orchestration controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Text typed by the human.
    User,
    /// Text produced by the reasoning engine.
    Assistant,
    /// Observation produced by verification or tool execution.
    Tool,
}

impl Role {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// One entry of the append-only session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Producer of this turn.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
    /// Pinned turns survive sliding-window trimming.
    #[serde(default)]
    pub pinned: bool,
    /// Tool that produced an observation turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ConversationTurn {
    /// Build a turn stamped with the current time.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            pinned: false,
            tool_name: None,
        }
    }

    /// User input turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Reasoning-engine output turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Observation turn attributed to `tool_name`.
    #[must_use]
    pub fn observation(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut turn = Self::new(Role::Tool, content);
        turn.tool_name = Some(tool_name.into());
        turn
    }

    /// Mark this turn as pinned.
    #[must_use]
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    /// Override the timestamp (deterministic fixtures).
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
