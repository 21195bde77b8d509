use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::client::{HttpMessageApi, MessageApi};
use crate::config::{AppConfig, load_config};
use crate::engine::TranscriptPipeline;
use crate::models::{ConversationRef, Direction, Message};
use crate::sync::{InboxSession, SnapshotFetcher};
use crate::tui;
use crate::utils::{init_file_logging, init_stderr_logging, strip_ansi_codes};

#[derive(Parser)]
#[command(name = "inbox-transcript")]
#[command(version)]
#[command(about = "Follow WhatsApp conversation transcripts from the terminal", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/inbox-transcript/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Follow conversations interactively; Tab switches between them
    Watch {
        /// Conversations as `[green:|twilio:]<id>`
        #[arg(required = true)]
        conversations: Vec<ConversationRef>,
    },
    /// Fetch a conversation once and print its transcript
    Snapshot {
        conversation: ConversationRef,
        /// Print JSON instead of text lines
        #[arg(long)]
        json: bool,
    },
    /// Send one message
    Send { conversation: ConversationRef, text: String },
    /// Show the config file location and effective settings
    Config,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Watch { conversations }) => watch(config_path, conversations).await,
        Some(Commands::Snapshot { conversation, json }) => {
            snapshot(config_path, conversation, json).await
        }
        Some(Commands::Send { conversation, text }) => send(config_path, conversation, &text).await,
        Some(Commands::Config) => show_config(config_path),
        None => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn build_api(config: &AppConfig) -> Result<Arc<dyn MessageApi>> {
    let api = HttpMessageApi::new(&config.server, config.endpoints.clone())
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(api))
}

async fn watch(config_path: Option<&Path>, conversations: Vec<ConversationRef>) -> Result<()> {
    let (config, path) = load_config(config_path)?;
    let log_path = init_file_logging()?;
    info!(config = %path.display(), log = %log_path.display(), "Starting watch");

    let (session, handle) = InboxSession::new(build_api(&config)?, &config);
    let session_task = tokio::spawn(session.run());

    let tui_config = config.tui.clone();
    let viewer = tokio::task::spawn_blocking(move || {
        tui::run_interactive(conversations, handle, &tui_config)
    });
    let result = viewer.await.map_err(|e| anyhow!("Viewer thread failed: {}", e))?;

    // The viewer sends Shutdown on exit; dropping its handle also ends the loop
    session_task.await.map_err(|e| anyhow!("Session task failed: {}", e))?;
    result
}

async fn snapshot(
    config_path: Option<&Path>,
    conversation: ConversationRef,
    json: bool,
) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    init_stderr_logging()?;

    let mut fetcher = SnapshotFetcher::new(
        build_api(&config)?,
        conversation.clone(),
        CancellationToken::new(),
        config.sync.resync_retry_delay(),
    );
    let outcome = fetcher.restart(true).await;
    let snapshot = outcome
        .result
        .with_context(|| format!("Failed to fetch messages for {}", conversation))?;

    let transcript = TranscriptPipeline::new(config.reconcile.clone()).run(&[], &snapshot, &[]);

    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    } else if transcript.is_empty() {
        println!("No messages in {}", conversation);
    } else {
        for msg in &transcript {
            println!("{}", format_snapshot_line(msg));
        }
    }

    Ok(())
}

/// One sanitized line per message: local time, direction arrow, status, body
pub fn format_snapshot_line(msg: &Message) -> String {
    let time = msg.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    let arrow = match msg.direction {
        Direction::Outbound => "→",
        Direction::Inbound => "←",
    };
    let status = msg.status.map(|s| s.label()).unwrap_or("-");
    let body = strip_ansi_codes(&msg.content).split_whitespace().collect::<Vec<_>>().join(" ");

    let mut line = format!("{} {} [{}]", time, arrow, status);
    if !body.is_empty() {
        line.push(' ');
        line.push_str(&body);
    }
    if let Some(url) = msg.media_url.as_deref().filter(|url| !url.is_empty()) {
        line.push_str(&format!(" [media: {}]", strip_ansi_codes(url)));
    }
    line
}

async fn send(config_path: Option<&Path>, conversation: ConversationRef, text: &str) -> Result<()> {
    let (config, _) = load_config(config_path)?;
    init_stderr_logging()?;

    if text.trim().is_empty() {
        anyhow::bail!("Refusing to send an empty message");
    }

    build_api(&config)?
        .send_message(&conversation.send_target(), text)
        .await
        .with_context(|| format!("Failed to send to {}", conversation))?;

    println!("Sent to {}", conversation);
    Ok(())
}

fn show_config(config_path: Option<&Path>) -> Result<()> {
    let (mut config, path) = load_config(config_path)?;
    if config.server.token.is_some() {
        config.server.token = Some("********".to_string());
    }

    println!("Inbox Transcript Configuration");
    println!("==============================");
    println!(
        "Config file: {}{}",
        path.display(),
        if path.exists() { "" } else { " (not found, using defaults)" }
    );
    println!();
    print!("{}", toml::to_string_pretty(&config).context("Failed to render config")?);

    Ok(())
}
