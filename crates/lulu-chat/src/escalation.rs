//! Escalation heuristic and destinations.
//!
//! The heuristic is a lower-cased substring test, so any response mentioning
//! "sorry" or "unable" is flagged, including polite refusals that need no
//! follow-up.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lulu_core::error::{LuluError, Result};
use lulu_core::types::{EscalationRecord, EscalationStatus};
use uuid::Uuid;

// =============================================================================
// EscalationPolicy
// =============================================================================

/// Decides whether a visible response needs human follow-up.
#[derive(Debug, Clone)]
pub struct EscalationPolicy {
    enabled: bool,
    keywords: Vec<String>,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::new(true, ["sorry", "unable"])
    }
}

impl EscalationPolicy {
    pub fn new<I, S>(enabled: bool, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            enabled,
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn should_escalate(&self, response: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let lower = response.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Create a pending record when the response trips the heuristic.
    pub fn evaluate(&self, query: &str, response: &str) -> Option<EscalationRecord> {
        self.should_escalate(response)
            .then(|| EscalationRecord::pending(query, response))
    }
}

// =============================================================================
// EscalationQueue
// =============================================================================

/// Per-session, append-only list of escalations.
///
/// Records are only ever added; the support workflow may flip a record's
/// status with [`EscalationQueue::resolve`]. Records handed to a sink move
/// from the queue to the delivered list.
#[derive(Debug, Clone, Default)]
pub struct EscalationQueue {
    records: Vec<EscalationRecord>,
    delivered: Vec<EscalationRecord>,
}

impl EscalationQueue {
    pub fn push(&mut self, record: EscalationRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[EscalationRecord] {
        &self.records
    }

    /// Records already handed to a sink, oldest first.
    pub fn delivered(&self) -> &[EscalationRecord] {
        &self.delivered
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &EscalationRecord> {
        self.records
            .iter()
            .filter(|r| r.status == EscalationStatus::Pending)
    }

    /// Mark a record resolved. Returns `false` if no record has that id.
    pub fn resolve(&mut self, id: Uuid) -> bool {
        match self
            .records
            .iter_mut()
            .chain(self.delivered.iter_mut())
            .find(|r| r.id == id)
        {
            Some(record) => {
                record.status = EscalationStatus::Resolved;
                true
            }
            None => false,
        }
    }

    /// Hand every queued record to a sink, returning how many were taken.
    ///
    /// Records the sink rejects stay queued.
    pub fn drain_into(&mut self, sink: &dyn EscalationSink) -> Result<usize> {
        let mut taken = 0;
        while let Some(record) = self.records.first() {
            sink.submit(record)?;
            self.delivered.push(self.records.remove(0));
            taken += 1;
        }
        Ok(taken)
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Append-only destination consumed by the human support workflow.
pub trait EscalationSink: Send + Sync {
    fn submit(&self, record: &EscalationRecord) -> Result<()>;
}

/// Sink that appends one JSON object per line to a file.
pub struct JsonlEscalationSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlEscalationSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EscalationSink for JsonlEscalationSink {
    fn submit(&self, record: &EscalationRecord) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| LuluError::Export(format!("sink lock poisoned: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;

        tracing::info!(id = %record.id, path = %self.path.display(), "Escalation recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Policy ----

    #[test]
    fn test_default_keywords() {
        let policy = EscalationPolicy::default();
        assert!(policy.should_escalate("Sorry, I am unable to process that"));
        assert!(policy.should_escalate("I'm UNABLE to help"));
        assert!(!policy.should_escalate("Float approved."));
    }

    #[test]
    fn test_substring_false_positive_is_kept() {
        let policy = EscalationPolicy::default();
        assert!(policy.should_escalate("No need to be sorry, it worked."));
    }

    #[test]
    fn test_disabled_never_escalates() {
        let policy = EscalationPolicy::new(false, ["sorry"]);
        assert!(!policy.should_escalate("sorry"));
        assert!(policy.evaluate("q", "sorry").is_none());
    }

    #[test]
    fn test_evaluate_builds_pending_record() {
        let policy = EscalationPolicy::default();
        let record = policy
            .evaluate("top up float", "Sorry, I am unable to process that")
            .unwrap();
        assert_eq!(record.query, "top up float");
        assert_eq!(record.status, EscalationStatus::Pending);
    }

    // ---- Queue ----

    #[test]
    fn test_queue_resolve() {
        let mut queue = EscalationQueue::default();
        let record = EscalationRecord::pending("q", "sorry");
        let id = record.id;
        queue.push(record);
        queue.push(EscalationRecord::pending("q2", "unable"));

        assert_eq!(queue.pending().count(), 2);
        assert!(queue.resolve(id));
        assert_eq!(queue.pending().count(), 1);
        assert_eq!(queue.records()[0].status, EscalationStatus::Resolved);
        assert!(!queue.resolve(Uuid::new_v4()));
    }

    #[test]
    fn test_drain_into_jsonl_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlEscalationSink::new(dir.path().join("ops").join("escalations.jsonl"));

        let mut queue = EscalationQueue::default();
        queue.push(EscalationRecord::pending("a", "sorry"));
        queue.push(EscalationRecord::pending("b", "unable"));

        assert_eq!(queue.drain_into(&sink).unwrap(), 2);
        assert!(queue.is_empty());
        let handed: Vec<&str> = queue.delivered().iter().map(|r| r.query.as_str()).collect();
        assert_eq!(handed, vec!["a", "b"]);

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: EscalationRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.query, "a");
        assert_eq!(first.status, EscalationStatus::Pending);
    }

    #[test]
    fn test_sink_appends_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlEscalationSink::new(dir.path().join("escalations.jsonl"));
        sink.submit(&EscalationRecord::pending("a", "sorry")).unwrap();
        sink.submit(&EscalationRecord::pending("b", "sorry")).unwrap();
        let content = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
