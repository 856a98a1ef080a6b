use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "posting-writer",
    about = "Generate marketing copy for job postings with a pre-registered OpenAI assistant",
    version
)]
pub struct Cli {
    /// Input table with HRIS ID, Position Title, Position Summary and Feedback columns
    #[arg(long, default_value = "Job Input File.csv")]
    pub input: PathBuf,

    /// Output table; created with a header if missing, appended to otherwise
    #[arg(long, default_value = "masterList.csv")]
    pub output: PathBuf,

    /// Assistant to run (overrides OPENAI_ASSISTANT_ID)
    #[arg(long)]
    pub assistant_id: Option<String>,

    /// API base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    pub api_base_url: Option<String>,

    /// Delay between run status polls
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Give up on a run after this many status polls; 0 waits forever
    #[arg(long, default_value_t = 600)]
    pub max_poll_attempts: u32,

    /// Skip failing rows instead of stopping the run
    #[arg(long)]
    pub continue_on_error: bool,
}
