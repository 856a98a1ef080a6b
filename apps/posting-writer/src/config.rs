use std::path::PathBuf;
use std::time::Duration;

use crate::assistant_client::openai::DEFAULT_API_BASE_URL;
use crate::assistant_client::PollPolicy;
use crate::cli::Cli;
use crate::errors::AppError;
use crate::postings::batch::FailureMode;

/// Application configuration, built once at startup from `.env`, the process
/// environment and command-line flags (flags win).
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub assistant_id: String,
    pub api_base_url: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub poll: PollPolicy,
    pub failure_mode: FailureMode,
    pub rust_log: String,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_sources(cli, |key| std::env::var(key).ok())
    }

    /// Builds the config with an injectable environment lookup.
    pub fn from_sources<F>(cli: &Cli, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = non_blank("OPENAI_API_KEY")
            .ok_or_else(|| AppError::ConfigMissing("OPENAI_API_KEY".to_string()))?;

        let assistant_id = cli
            .assistant_id
            .clone()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| non_blank("OPENAI_ASSISTANT_ID"))
            .ok_or_else(|| {
                AppError::ConfigMissing("OPENAI_ASSISTANT_ID (or --assistant-id)".to_string())
            })?;

        let api_base_url = cli
            .api_base_url
            .clone()
            .or_else(|| non_blank("OPENAI_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let poll = PollPolicy {
            interval: Duration::from_millis(cli.poll_interval_ms),
            max_attempts: (cli.max_poll_attempts > 0).then_some(cli.max_poll_attempts),
        };

        let failure_mode = if cli.continue_on_error {
            FailureMode::ContinueOnError
        } else {
            FailureMode::Abort
        };

        Ok(Config {
            openai_api_key,
            assistant_id,
            api_base_url,
            input_path: cli.input.clone(),
            output_path: cli.output.clone(),
            poll,
            failure_mode,
            rust_log: non_blank("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
