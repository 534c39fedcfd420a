//! Turn processor: central coordinator for one user utterance.
//!
//! A turn moves through
//! `AwaitingModel -> {ModelSucceeded, ModelFailed} -> ReasoningStripped?
//! -> DirectoryChecked -> EscalationChecked -> Done`. Turns are built up
//! locally and appended to the session log only once the turn is done, so a
//! log never holds a half-processed exchange.

use std::sync::Arc;
use std::time::Duration;

use lulu_core::config::{ChatConfig, LuluConfig};
use lulu_core::types::{EscalationRecord, Turn};

use crate::backend::{BackendError, BackendErrorKind, ModelBackend};
use crate::context::SessionContext;
use crate::directory::ShopDirectory;
use crate::error::ChatError;
use crate::escalation::EscalationPolicy;
use crate::parser::{QueryParser, TurnIntent};
use crate::prompt::PromptBuilder;
use crate::reasoning::extract_reasoning;
use crate::response::{fallback_text, format_shop_info, SHOP_NOT_FOUND};

/// Diagnostics target for operator-facing backend failure reports.
pub const DIAGNOSTICS_TARGET: &str = "lulu::diagnostics";

/// Steps a turn passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStage {
    AwaitingModel,
    ModelSucceeded,
    ModelFailed,
    ReasoningStripped,
    DirectoryChecked,
    EscalationChecked,
    Done,
}

/// Result of the shop directory step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryOutcome {
    /// The utterance was not a directory query.
    NotQueried,
    /// A shop matched and an info turn was appended.
    Found,
    /// A directory query matched no shop; the not-found turn was appended.
    NotFound,
}

/// Operator-facing report of a backend failure. Never shown in the log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    pub backend: String,
    pub kind: BackendErrorKind,
    pub detail: String,
}

/// Everything one call to [`TurnProcessor::handle_turn`] produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Turns appended to the log, in order.
    pub turns: Vec<Turn>,
    pub reasoning: Option<String>,
    pub escalation: Option<EscalationRecord>,
    pub directory: DirectoryOutcome,
    pub diagnostic: Option<Diagnostic>,
    /// Stages visited, in order.
    pub stages: Vec<TurnStage>,
}

impl TurnOutcome {
    /// The visible model (or fallback) answer.
    pub fn reply(&self) -> Option<&Turn> {
        self.turns.get(1)
    }
}

/// Turns user utterances into conversation updates.
///
/// Holds only read-only collaborators, so one processor can serve any number
/// of sessions; each call borrows exactly one session mutably.
pub struct TurnProcessor {
    backend: Arc<dyn ModelBackend>,
    directory: Arc<ShopDirectory>,
    parser: QueryParser,
    prompt_builder: PromptBuilder,
    escalation_policy: EscalationPolicy,
    timeout: Duration,
    config: ChatConfig,
}

impl TurnProcessor {
    /// Create a processor from the application configuration.
    pub fn new(
        config: &LuluConfig,
        backend: Arc<dyn ModelBackend>,
        directory: Arc<ShopDirectory>,
    ) -> Self {
        Self {
            backend,
            directory,
            parser: QueryParser::new(),
            prompt_builder: PromptBuilder::new(
                config.model.system_prompt.clone(),
                config.chat.context_turns,
            ),
            escalation_policy: EscalationPolicy::new(
                config.escalation.enabled,
                &config.escalation.keywords,
            ),
            timeout: config.model.timeout(),
            config: config.chat.clone(),
        }
    }

    /// Override the model call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Handle one utterance for `session`.
    ///
    /// Appends `user -> assistant -> (optional directory turn)` to the log.
    /// Backend failures become a fixed fallback turn plus a [`Diagnostic`];
    /// only precondition violations are returned as errors, and in that case
    /// the log is left untouched.
    pub async fn handle_turn(
        &self,
        utterance: &str,
        session: &mut SessionContext,
    ) -> Result<TurnOutcome, ChatError> {
        self.validate(utterance, session)?;

        let mut stages = vec![TurnStage::AwaitingModel];
        let user_turn = Turn::user(utterance);

        // Model call
        let request = self.prompt_builder.build(session.log.turns(), utterance);
        let result = match tokio::time::timeout(self.timeout, self.backend.generate(&request)).await
        {
            Ok(r) => r,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        };

        let (visible, reasoning, diagnostic) = match result {
            Ok(reply) => {
                stages.push(TurnStage::ModelSucceeded);
                let extracted = extract_reasoning(&reply.text);
                if extracted.visible != reply.text {
                    stages.push(TurnStage::ReasoningStripped);
                }
                (extracted.visible, extracted.reasoning, None)
            }
            Err(e) => {
                stages.push(TurnStage::ModelFailed);
                let diagnostic = self.report_failure(session, &e);
                (
                    fallback_text(e.kind()).to_string(),
                    None,
                    Some(diagnostic),
                )
            }
        };
        let reply_turn = Turn::assistant(visible.clone()).with_reasoning(reasoning.clone());

        // Directory
        let (directory, directory_turn) = match self.parser.classify(utterance) {
            TurnIntent::General => (DirectoryOutcome::NotQueried, None),
            TurnIntent::DirectoryQuery => match self.directory.find_in(utterance) {
                Some(shop) => (
                    DirectoryOutcome::Found,
                    Some(Turn::assistant(format_shop_info(shop))),
                ),
                None => (
                    DirectoryOutcome::NotFound,
                    Some(Turn::assistant(SHOP_NOT_FOUND)),
                ),
            },
        };
        stages.push(TurnStage::DirectoryChecked);

        // Escalation
        let escalation = self.escalation_policy.evaluate(utterance, &visible);
        stages.push(TurnStage::EscalationChecked);

        // Commit
        let mut turns = vec![user_turn, reply_turn];
        turns.extend(directory_turn);
        session.log.append_exchange(turns.clone());
        if let Some(ref record) = escalation {
            tracing::info!(
                session = %session.id,
                escalation = %record.id,
                "Turn flagged for human follow-up"
            );
            session.escalations.push(record.clone());
        }
        session.last_reasoning = reasoning.clone();
        stages.push(TurnStage::Done);

        tracing::debug!(
            session = %session.id,
            stages = ?stages,
            directory = ?directory,
            "Turn processed"
        );

        Ok(TurnOutcome {
            turns,
            reasoning,
            escalation,
            directory,
            diagnostic,
            stages,
        })
    }

    // -- Private helpers --

    fn validate(&self, utterance: &str, session: &SessionContext) -> Result<(), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if utterance.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if utterance.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        if session.log.awaiting_reply() {
            return Err(ChatError::OutOfOrder);
        }
        Ok(())
    }

    fn report_failure(&self, session: &SessionContext, error: &BackendError) -> Diagnostic {
        let diagnostic = Diagnostic {
            backend: self.backend.name().to_string(),
            kind: error.kind(),
            detail: error.to_string(),
        };
        tracing::warn!(
            target: DIAGNOSTICS_TARGET,
            session = %session.id,
            backend = %diagnostic.backend,
            kind = ?diagnostic.kind,
            detail = %diagnostic.detail,
            "Model call failed, fallback reply used"
        );
        diagnostic
    }
}

// =============================================================================
// Tests
// =============================================================================
