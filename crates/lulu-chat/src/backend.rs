//! Generative-model backend interface.
//!
//! The turn processor talks to exactly one capability: "generate text given
//! a prompt and history". Concrete servers are adapted behind
//! [`ModelBackend`], and every response shape they produce is normalized into
//! a [`ModelReply`] before any turn logic runs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lulu_core::types::Role;
use serde_json::Value;

// =============================================================================
// Request / reply
// =============================================================================

/// One prior message forwarded to the model as context.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

/// A fully assembled prompt: system instructions, history, new utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_prompt: String,
    pub history: Vec<PromptMessage>,
    pub utterance: String,
}

/// Normalized model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub text: String,
}

impl ModelReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Normalize a decoded backend payload.
    ///
    /// Accepts a bare string, or an object carrying the completion under
    /// `message.content`, `answer`, or `response` (checked in that order).
    pub fn from_payload(payload: &Value) -> Result<Self, BackendError> {
        if let Some(text) = payload.as_str() {
            return Ok(Self::new(text));
        }

        let text = payload
            .pointer("/message/content")
            .and_then(Value::as_str)
            .or_else(|| payload.get("answer").and_then(Value::as_str))
            .or_else(|| payload.get("response").and_then(Value::as_str));

        match text {
            Some(t) => Ok(Self::new(t)),
            None => Err(BackendError::Malformed(
                "payload has no completion text".to_string(),
            )),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Failures a backend can report.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("model backend unavailable: {0}")]
    Unavailable(String),
    #[error("model backend timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed model response: {0}")]
    Malformed(String),
}

/// Coarse failure category, used for fallback selection and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    Unavailable,
    Timeout,
    Malformed,
}

impl BackendError {
    pub fn kind(&self) -> BackendErrorKind {
        match self {
            BackendError::Unavailable(_) => BackendErrorKind::Unavailable,
            BackendError::Timeout(_) => BackendErrorKind::Timeout,
            BackendError::Malformed(_) => BackendErrorKind::Malformed,
        }
    }
}

// =============================================================================
// Trait
// =============================================================================

/// A generative model that answers one prompt at a time.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Generate a completion for the request.
    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, BackendError>;
}

// =============================================================================
// ScriptedBackend
// =============================================================================

/// Backend that replays queued outcomes instead of calling a model.
///
/// Used by tests and the offline `scripted` backend option. Once the script
/// is exhausted, the default reply is returned if one is set; otherwise the
/// backend reports itself unavailable.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    default_reply: Option<String>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()));
        self
    }

    /// Queue a failure.
    pub fn with_error(self, error: BackendError) -> Self {
        self.push(Err(error));
        self
    }

    /// Reply used once the script runs out.
    pub fn with_default_reply(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Some(text.into());
        self
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn push(&self, outcome: Result<String, BackendError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, BackendError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .map_err(|e| BackendError::Unavailable(format!("script lock poisoned: {}", e)))?
            .pop_front();

        match next {
            Some(Ok(text)) => Ok(ModelReply::new(text)),
            Some(Err(e)) => Err(e),
            None => match &self.default_reply {
                Some(text) => Ok(ModelReply::new(text.clone())),
                None => Err(BackendError::Unavailable("script exhausted".to_string())),
            },
        }
    }
}
