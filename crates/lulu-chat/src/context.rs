//! Per-session conversation state.
//!
//! Every piece of mutable state a turn touches lives on [`SessionContext`]:
//! the ordered log, the escalation queue, and the last reasoning segment.
//! Sessions share nothing mutable with each other.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lulu_core::types::{Role, Turn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::escalation::EscalationQueue;
use crate::export;

// =============================================================================
// ConversationLog
// =============================================================================

/// Ordered, append-only sequence of turns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// True when the log ends in a user turn with no reply yet.
    pub fn awaiting_reply(&self) -> bool {
        matches!(self.turns.last(), Some(t) if t.role == Role::User)
    }

    /// Append a completed exchange in one step.
    pub(crate) fn append_exchange(&mut self, turns: Vec<Turn>) {
        self.turns.extend(turns);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }
}

impl From<Vec<Turn>> for ConversationLog {
    fn from(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

// =============================================================================
// SessionContext
// =============================================================================

/// State owned by one chat session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub log: ConversationLog,
    pub escalations: EscalationQueue,
    /// Reasoning segment from the most recent model answer, if any.
    pub last_reasoning: Option<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            log: ConversationLog::new(),
            escalations: EscalationQueue::default(),
            last_reasoning: None,
        }
    }

    /// Resume a session from a previously exported log.
    pub fn with_log(log: ConversationLog) -> Self {
        Self {
            log,
            ..Self::new()
        }
    }

    /// File name used when exporting this session.
    pub fn export_file_name(&self) -> String {
        format!("conversation-{}.jsonl", self.id)
    }

    /// Write the log to `{dir}/conversation-{id}.jsonl`.
    ///
    /// Clears the log afterwards when `clear` is set. Returns the file path.
    pub fn export_to(&mut self, dir: &Path, clear: bool) -> Result<PathBuf, ChatError> {
        let path = dir.join(self.export_file_name());
        export::export_to_file(&self.log, &path)?;
        tracing::info!(
            session = %self.id,
            turns = self.log.len(),
            path = %path.display(),
            "Conversation exported"
        );
        if clear {
            self.end();
        }
        Ok(path)
    }

    /// Drop the log and reasoning; escalations stay queued for the sink.
    pub fn end(&mut self) {
        self.log.clear();
        self.last_reasoning = None;
    }
}
