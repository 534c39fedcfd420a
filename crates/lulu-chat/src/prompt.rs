//! Prompt assembly from the conversation log.

use lulu_core::types::{Role, Turn};

use crate::backend::{ModelRequest, PromptMessage};

/// Builds model requests from the system prompt and a window of history.
pub struct PromptBuilder {
    system_prompt: String,
    /// Number of most recent turns forwarded as context.
    context_turns: usize,
}

impl PromptBuilder {
    pub fn new(system_prompt: impl Into<String>, context_turns: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            context_turns,
        }
    }

    /// Assemble a request for `utterance` given the prior turns.
    pub fn build(&self, history: &[Turn], utterance: &str) -> ModelRequest {
        let start = history.len().saturating_sub(self.context_turns);
        let history = history[start..]
            .iter()
            .map(|t| PromptMessage {
                role: t.role,
                content: t.content.clone(),
            })
            .collect();

        ModelRequest {
            system_prompt: self.system_prompt.clone(),
            history,
            utterance: utterance.to_string(),
        }
    }

    /// Render a request as a single plain-text transcript for the
    /// completion endpoint.
    pub fn render_transcript(request: &ModelRequest) -> String {
        let mut out = String::new();
        out.push_str(&request.system_prompt);
        out.push_str("\n\nCurrent conversation:\n");
        for msg in &request.history {
            let speaker = match msg.role {
                Role::User => "Human",
                Role::Assistant => "Assistant",
            };
            out.push_str(speaker);
            out.push_str(": ");
            out.push_str(&msg.content);
            out.push('\n');
        }
        out.push_str("Human: ");
        out.push_str(&request.utterance);
        out.push_str("\nAssistant:");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<Turn> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Turn::user(format!("q{}", i))
                } else {
                    Turn::assistant(format!("a{}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_build_includes_everything_under_window() {
        let builder = PromptBuilder::new("persona", 10);
        let request = builder.build(&history(4), "next");
        assert_eq!(request.system_prompt, "persona");
        assert_eq!(request.history.len(), 4);
        assert_eq!(request.history[0].content, "q0");
        assert_eq!(request.history[1].role, Role::Assistant);
        assert_eq!(request.utterance, "next");
    }

    #[test]
    fn test_build_keeps_most_recent_turns() {
        let builder = PromptBuilder::new("persona", 2);
        let request = builder.build(&history(6), "next");
        assert_eq!(request.history.len(), 2);
        assert_eq!(request.history[0].content, "q4");
        assert_eq!(request.history[1].content, "a5");
    }

    #[test]
    fn test_zero_context_turns() {
        let builder = PromptBuilder::new("persona", 0);
        let request = builder.build(&history(3), "next");
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_render_transcript() {
        let builder = PromptBuilder::new("You are Lulu.", 5);
        let request = builder.build(&history(2), "How do I top up float?");
        let text = PromptBuilder::render_transcript(&request);
        assert!(text.starts_with("You are Lulu."));
        assert!(text.contains("Current conversation:\nHuman: q0\nAssistant: a1\n"));
        assert!(text.ends_with("Human: How do I top up float?\nAssistant:"));
    }
}
