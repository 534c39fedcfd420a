//! Error types for the turn processor.
//!
//! Only precondition violations surface as [`ChatError`]. Model backend
//! failures are recovered inside the processor and never reach the caller
//! as errors.

use lulu_core::error::LuluError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("conversation log ends with an unanswered user turn")]
    OutOfOrder,
    #[error("directory error: {0}")]
    Directory(String),
    #[error("export error: {0}")]
    Export(String),
}

impl From<LuluError> for ChatError {
    fn from(err: LuluError) -> Self {
        match err {
            LuluError::Directory(msg) => ChatError::Directory(msg),
            other => ChatError::Export(other.to_string()),
        }
    }
}
