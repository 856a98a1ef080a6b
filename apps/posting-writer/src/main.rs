mod assistant_client;
mod cli;
mod config;
mod errors;
mod postings;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assistant_client::{ConversationClient, OpenAiAssistants};
use crate::cli::Cli;
use crate::config::Config;
use crate::postings::batch::run_batch;
use crate::postings::loader::load_postings;
use crate::postings::orchestrator::PostingOrchestrator;
use crate::postings::writer::OutputWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails fast on a missing credential)
    let config = Config::from_cli(&cli)?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting posting-writer v{}", env!("CARGO_PKG_VERSION"));

    let postings = load_postings(&config.input_path)?;

    let backend = OpenAiAssistants::with_base_url(
        config.openai_api_key.clone(),
        config.assistant_id.clone(),
        config.api_base_url.clone(),
    )?;
    info!(
        "Assistant client initialized (assistant: {}, base url: {})",
        config.assistant_id, config.api_base_url
    );

    let conversation = ConversationClient::new(Arc::new(backend), config.poll);
    let orchestrator = PostingOrchestrator::new(conversation);
    let mut writer = OutputWriter::open(&config.output_path)?;

    let summary = run_batch(&postings, &orchestrator, &mut writer, config.failure_mode).await?;

    info!(
        "All job postings processed: {} appended, {} failed ({} total rows written this run to {})",
        summary.written,
        summary.failed,
        writer.rows_written(),
        writer.path().display()
    );

    Ok(())
}
