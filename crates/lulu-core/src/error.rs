use thiserror::Error;

/// Top-level error type for the Lulu system.
///
/// Subsystem crates define their own error types and implement
/// `From<LuluError>` so that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LuluError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Directory error: {0}")]
    Directory(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LuluError {
    fn from(err: toml::de::Error) -> Self {
        LuluError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LuluError {
    fn from(err: toml::ser::Error) -> Self {
        LuluError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LuluError {
    fn from(err: serde_json::Error) -> Self {
        LuluError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Lulu operations.
pub type Result<T> = std::result::Result<T, LuluError>;
