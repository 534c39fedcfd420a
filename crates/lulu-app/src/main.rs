//! Lulu application binary - composition root.
//!
//! Ties the crates together into an interactive terminal session:
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing (the operator diagnostic channel)
//! 3. Load the shop directory and build the model backend
//! 4. Run the turn loop over stdin until `/quit` or end of input
//! 5. Export the conversation and flush pending escalations on exit

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use lulu_chat::{
    EscalationSink, JsonlEscalationSink, ModelBackend, OllamaBackend, ScriptedBackend,
    SessionContext, ShopDirectory, TurnProcessor,
};
use lulu_core::config::LuluConfig;

use cli::{expand_home, CliArgs};

const SCRIPTED_REPLY: &str = "Scripted mode is active, so no model answered this message.";

const HELP: &str = "Commands: /export  /escalations  /reasoning  /help  /quit";

/// Pick the backend adapter named in the config.
fn build_backend(config: &LuluConfig) -> Result<Arc<dyn ModelBackend>, Box<dyn std::error::Error>> {
    match config.model.backend.as_str() {
        "ollama" => {
            let backend = OllamaBackend::new(&config.model)?;
            tracing::info!(
                url = %config.model.base_url,
                model = %config.model.model,
                timeout_secs = config.model.timeout_secs,
                "Ollama backend configured"
            );
            Ok(Arc::new(backend))
        }
        "scripted" => {
            tracing::info!("Scripted backend configured");
            Ok(Arc::new(
                ScriptedBackend::new().with_default_reply(SCRIPTED_REPLY),
            ))
        }
        other => Err(format!("unknown model backend: {}", other).into()),
    }
}

/// Push any queued escalations to the operator sink.
fn flush_escalations(session: &mut SessionContext, sink: Option<&dyn EscalationSink>) {
    let Some(sink) = sink else {
        return;
    };
    if let Err(e) = session.escalations.drain_into(sink) {
        tracing::warn!(error = %e, "Failed to deliver escalations, they stay queued");
    }
}

fn print_escalations(session: &SessionContext) {
    let queue = &session.escalations;
    if queue.is_empty() && queue.delivered().is_empty() {
        println!("No escalations this session.");
        return;
    }
    for record in queue.delivered() {
        println!("[handed off] {} -> {}", record.query, record.response);
    }
    for record in queue.records() {
        println!("[{:?}, queued] {} -> {}", record.status, record.query, record.response);
    }
}

fn export_session(session: &mut SessionContext, dir: &Path, clear: bool) {
    if session.log.is_empty() {
        println!("Nothing to export.");
        return;
    }
    match session.export_to(dir, clear) {
        Ok(path) => println!("Conversation exported to {}", path.display()),
        Err(e) => tracing::error!(error = %e, "Conversation export failed"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = LuluConfig::load_or_default(&config_file);
    if let Some(ref backend) = args.backend {
        config.model.backend = backend.clone();
    }
    if let Some(ref model) = args.model {
        config.model.model = model.clone();
    }

    // Tracing.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Lulu v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Collaborators.
    let directory_path = args.resolve_directory(&config.directory.path);
    let directory = Arc::new(ShopDirectory::load_or_empty(&directory_path));
    let backend = build_backend(&config)?;
    let processor = TurnProcessor::new(&config, backend, directory);

    let export_dir = args.resolve_export_dir(&config.general.data_dir, &config.export.dir);
    let sink: Option<JsonlEscalationSink> = config
        .escalation
        .log_path
        .as_deref()
        .map(|p| JsonlEscalationSink::new(expand_home(p)));
    let sink_ref = sink.as_ref().map(|s| s as &dyn EscalationSink);

    // Turn loop.
    let mut session = SessionContext::new();
    tracing::info!(session = %session.id, "Session started");
    println!("Lulu is ready. {}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/export" => export_session(&mut session, &export_dir, config.export.clear_after_export),
            "/reasoning" => match session.last_reasoning {
                Some(ref r) => println!("(reasoning) {}", r),
                None => println!("No reasoning recorded for the last answer."),
            },
            "/escalations" => print_escalations(&session),
            utterance => match processor.handle_turn(utterance, &mut session).await {
                Ok(outcome) => {
                    for turn in outcome.turns.iter().skip(1) {
                        println!("\nLulu: {}\n", turn.content);
                    }
                    if outcome.escalation.is_some() {
                        println!("(flagged for follow-up by the support team)");
                    }
                    flush_escalations(&mut session, sink_ref);
                }
                Err(e) => println!("{}", e),
            },
        }
    }

    // Shutdown.
    flush_escalations(&mut session, sink_ref);
    if !session.log.is_empty() {
        export_session(&mut session, &export_dir, true);
    }
    tracing::info!(session = %session.id, "Session ended");

    Ok(())
}
