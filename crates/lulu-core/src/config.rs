use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LuluError, Result};

/// Default persona handed to the model as the system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Lulu, an intelligent AI assistant working \
with a mobile network's sales team. Your job is to support Sales Executives who manage over \
200 on-the-ground agents. Help them with operations, float requests, KYC issues, training \
updates, and urgent tickets. Always respond professionally, concisely, and with context \
relevant to field operations.";

/// Top-level configuration for the Lulu assistant.
///
/// Loaded from `~/.lulu/config.toml` by default. Each section corresponds
/// to one collaborator of the turn processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LuluConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl LuluConfig {
    /// Read and validate the TOML file at `path`.
    ///
    /// Missing sections take their defaults; values that would make the
    /// turn processor unusable are rejected as [`LuluError::Config`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: LuluConfig = toml::from_str(&text)?;
        config.validate()?;
        info!(path = %path.display(), backend = %config.model.backend, "Configuration loaded");
        Ok(config)
    }

    /// Like [`LuluConfig::load`], but a missing file quietly yields the
    /// defaults and an unreadable or invalid one is logged and replaced.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Invalid configuration, using defaults");
            Self::default()
        })
    }

    /// Write the configuration as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Reject settings the turn processor cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_secs == 0 {
            return Err(LuluError::Config("model.timeout_secs must be positive".into()));
        }
        if self.chat.max_message_length == 0 {
            return Err(LuluError::Config(
                "chat.max_message_length must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(LuluError::Config(format!(
                "model.temperature {} outside 0.0..=2.0",
                self.model.temperature
            )));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Base directory for exports and escalation logs.
    pub data_dir: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: "~/.lulu".to_string(),
        }
    }
}

/// Turn-handling limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the assistant accepts turns at all.
    pub enabled: bool,
    /// Maximum utterance length in characters.
    pub max_message_length: usize,
    /// Number of prior turns forwarded to the model as context.
    pub context_turns: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_message_length: 2000,
            context_turns: 20,
        }
    }
}

/// Generative-model backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Backend adapter: "ollama" or "scripted".
    pub backend: String,
    /// Ollama endpoint style: structured chat or plain-text completion.
    pub api: ModelApi,
    /// Base URL of the model server.
    pub base_url: String,
    /// Model name passed to the server.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on a single model call, in seconds.
    pub timeout_secs: u64,
    /// System instructions prepended to every request.
    pub system_prompt: String,
}

/// Which Ollama endpoint a request is sent to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelApi {
    /// `/api/chat` with role-tagged messages.
    #[default]
    Chat,
    /// `/api/generate` with the conversation rendered as one transcript.
    Generate,
}

impl ModelConfig {
    /// The model call timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: "ollama".to_string(),
            api: ModelApi::Chat,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.4,
            timeout_secs: 300,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Shop directory source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Path to the JSON shop directory.
    pub path: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: "shop_location.json".to_string(),
        }
    }
}

/// Escalation heuristic and operator sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Whether failure phrases create escalation records.
    pub enabled: bool,
    /// Lower-case substrings that flag a response for human follow-up.
    pub keywords: Vec<String>,
    /// Optional JSONL file that escalation records are appended to.
    pub log_path: Option<String>,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keywords: vec!["sorry".to_string(), "unable".to_string()],
            log_path: None,
        }
    }
}

/// Conversation export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory that conversation exports are written to.
    pub dir: String,
    /// Clear the session log once it has been exported.
    pub clear_after_export: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: "exports".to_string(),
            clear_after_export: true,
        }
    }
}
