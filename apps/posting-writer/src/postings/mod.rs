// Job posting pipeline: load rows, run each through its own assistant thread,
// append one output row per input row.
// All assistant calls go through assistant_client; no direct HTTP here.

pub mod batch;
pub mod loader;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod writer;
