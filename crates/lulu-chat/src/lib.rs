//! Conversational turn handling for the Lulu sales assistant.
//!
//! Provides intent detection, model-backend adapters, reasoning extraction,
//! shop directory lookup, escalation, and conversation export for one
//! user utterance at a time.

pub mod backend;
pub mod context;
pub mod directory;
pub mod error;
pub mod escalation;
pub mod export;
pub mod ollama;
pub mod orchestrator;
pub mod parser;
pub mod prompt;
pub mod reasoning;
pub mod response;

pub use backend::{
    BackendError, BackendErrorKind, ModelBackend, ModelReply, ModelRequest, PromptMessage,
    ScriptedBackend,
};
pub use context::{ConversationLog, SessionContext};
pub use directory::ShopDirectory;
pub use error::ChatError;
pub use escalation::{EscalationPolicy, EscalationQueue, EscalationSink, JsonlEscalationSink};
pub use ollama::OllamaBackend;
pub use orchestrator::{Diagnostic, DirectoryOutcome, TurnOutcome, TurnProcessor, TurnStage};
pub use parser::{QueryParser, TurnIntent};
pub use prompt::PromptBuilder;
pub use reasoning::{extract_reasoning, Extracted};
