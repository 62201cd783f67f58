//! Sleuth binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Build the discovery and analysis collaborators
//! 3. Either chat in the terminal or serve the HTTP API

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use sleuth_api::state::AppState;
use sleuth_chat::{analyzer_from_config, ChatOrchestrator, ChatRequest, HttpDiscovery};

use crate::cli::{CliArgs, ConfigSource};

/// Terminal chat loop over a single session.
async fn run_interactive(chat: &ChatOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut session_id: Option<Uuid> = None;

    stdout
        .write_all(b"Sleuth interactive mode. Type 'quit' to exit.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }

        let request = ChatRequest {
            query: line.to_string(),
            session_id,
            ..ChatRequest::default()
        };
        let output = match chat.handle(request).await {
            Ok(resp) => {
                session_id = Some(resp.session_id);
                let mut out = resp.response;
                if !resp.suggestions.is_empty() {
                    out.push_str("\n  try: ");
                    out.push_str(&resp.suggestions.join(" | "));
                }
                out
            }
            Err(e) => format!("error: {}", e),
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Loaded before tracing, which takes its level from it.
    let config_file = args.resolve_config_path();
    let (config, source) = args.load_config(&config_file);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Sleuth v{}", env!("CARGO_PKG_VERSION"));
    match source {
        ConfigSource::File => {
            tracing::info!(path = %config_file.display(), "Configuration loaded")
        }
        ConfigSource::Defaults => {
            tracing::info!(path = %config_file.display(), "No configuration file, using defaults")
        }
        ConfigSource::Invalid(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load configuration, using defaults"
        ),
    }

    // Collaborators.
    let discovery = Arc::new(HttpDiscovery::from_config(&config.discovery));
    tracing::info!(base_url = %discovery.base_url(), "Account discovery configured");
    let analyzer = analyzer_from_config(&config.analysis);

    let chat = ChatOrchestrator::new(&config, discovery, analyzer);

    if args.interactive {
        return run_interactive(&chat).await;
    }

    if !config.chat.enabled {
        tracing::warn!("Chat is disabled in config; POST /chat will return 503");
    }

    let port = config.server.port;
    let state = AppState::new(config, chat);
    if let Err(e) = sleuth_api::start_server(state).await {
        tracing::error!(error = %e, "API server stopped");
        tracing::error!("Try: SLEUTH_PORT={} cargo run -p sleuth-app", port.saturating_add(1));
        return Err(e.into());
    }

    Ok(())
}
