//! Ollama adapter for [`ModelBackend`].
//!
//! Posts a non-streaming request to `{base_url}/api/chat`, or to
//! `{base_url}/api/generate` with a rendered transcript when the model is
//! configured for plain completion, and normalizes the reply with
//! [`ModelReply::from_payload`].

use std::time::Duration;

use async_trait::async_trait;
use lulu_core::config::{ModelApi, ModelConfig};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{BackendError, ModelBackend, ModelReply, ModelRequest};
use crate::prompt::PromptBuilder;

/// Ollama chat endpoint adapter.
pub struct OllamaBackend {
    client: Client,
    api: ModelApi,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, PartialEq)]
struct OllamaMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

impl OllamaBackend {
    /// Build an adapter from the `[model]` config section.
    pub fn new(config: &ModelConfig) -> Result<Self, BackendError> {
        let timeout = config.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api: config.api,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout,
        })
    }

    fn endpoint_url(&self) -> String {
        match self.api {
            ModelApi::Chat => format!("{}/api/chat", self.base_url),
            ModelApi::Generate => format!("{}/api/generate", self.base_url),
        }
    }

    fn to_generate_request<'a>(&'a self, request: &ModelRequest) -> OllamaGenerateRequest<'a> {
        OllamaGenerateRequest {
            model: &self.model,
            prompt: PromptBuilder::render_transcript(request),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }

    fn to_ollama_request<'a>(&'a self, request: &'a ModelRequest) -> OllamaChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if !request.system_prompt.is_empty() {
            messages.push(OllamaMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        for msg in &request.history {
            messages.push(OllamaMessage {
                role: msg.role.as_str(),
                content: &msg.content,
            });
        }
        messages.push(OllamaMessage {
            role: "user",
            content: &request.utterance,
        });

        OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout)
        } else if e.is_connect() {
            BackendError::Unavailable(format!("Connection failed: {}", e))
        } else {
            BackendError::Unavailable(e.to_string())
        }
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, BackendError> {
        let post = self.client.post(self.endpoint_url());
        let post = match self.api {
            ModelApi::Chat => post.json(&self.to_ollama_request(request)),
            ModelApi::Generate => post.json(&self.to_generate_request(request)),
        };

        let response = post
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(BackendError::Unavailable(format!(
                "Server returned {}: {}",
                status, error_body
            )));
        }

        let bytes = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        let payload: Value = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::Malformed(format!("undecodable body: {}", e)))?;

        tracing::debug!(model = %self.model, api = ?self.api, bytes = bytes.len(), "Ollama reply received");
        ModelReply::from_payload(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendErrorKind, PromptMessage};
    use lulu_core::types::Role;

    fn config(base_url: &str) -> ModelConfig {
        ModelConfig {
            base_url: base_url.to_string(),
            timeout_secs: 2,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        let backend = OllamaBackend::new(&config("http://localhost:11434/")).unwrap();
        assert_eq!(backend.endpoint_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn test_generate_api_sends_transcript() {
        let backend = OllamaBackend::new(&ModelConfig {
            api: ModelApi::Generate,
            ..config("http://localhost:11434")
        })
        .unwrap();
        assert_eq!(backend.endpoint_url(), "http://localhost:11434/api/generate");

        let request = ModelRequest {
            system_prompt: "persona".to_string(),
            history: vec![PromptMessage {
                role: Role::User,
                content: "hi".to_string(),
            }],
            utterance: "float limit?".to_string(),
        };
        let json = serde_json::to_value(backend.to_generate_request(&request)).unwrap();
        let prompt = json["prompt"].as_str().unwrap();
        assert!(prompt.starts_with("persona"));
        assert!(prompt.contains("Human: hi\n"));
        assert!(prompt.ends_with("Human: float limit?\nAssistant:"));
        assert_eq!(json["stream"], false);
        assert!(json.get("messages").is_none());
    }

    #[test]
    fn test_request_message_order() {
        let backend = OllamaBackend::new(&config("http://localhost:11434")).unwrap();
        let request = ModelRequest {
            system_prompt: "persona".to_string(),
            history: vec![
                PromptMessage {
                    role: Role::User,
                    content: "hi".to_string(),
                },
                PromptMessage {
                    role: Role::Assistant,
                    content: "hello".to_string(),
                },
            ],
            utterance: "float limit?".to_string(),
        };

        let body = backend.to_ollama_request(&request);
        let roles: Vec<&str> = body.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(body.messages[3].content, "float limit?");
        assert!(!body.stream);
        assert_eq!(body.model, "llama3.2");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json["options"]["temperature"].is_number());
    }

    #[test]
    fn test_request_skips_empty_system_prompt() {
        let backend = OllamaBackend::new(&config("http://localhost:11434")).unwrap();
        let request = ModelRequest {
            system_prompt: String::new(),
            history: vec![],
            utterance: "hi".to_string(),
        };
        let body = backend.to_ollama_request(&request);
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        // Port 9 (discard) on loopback is not expected to accept HTTP.
        let backend = OllamaBackend::new(&config("http://127.0.0.1:9")).unwrap();
        let request = ModelRequest {
            system_prompt: String::new(),
            history: vec![],
            utterance: "hello".to_string(),
        };
        let err = backend.generate(&request).await.unwrap_err();
        assert_ne!(err.kind(), BackendErrorKind::Malformed);
    }
}
