//! Batch runner: drives every loaded posting through the orchestrator and writer,
//! strictly one row at a time, in input order.

use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::postings::models::JobPostingInput;
use crate::postings::orchestrator::{PostingOrchestrator, RowStage};
use crate::postings::writer::OutputWriter;

/// What to do when a row fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    /// Stop the run at the first failing row. Rows already written stay written.
    #[default]
    Abort,
    /// Log the failing row, skip it, and carry on with the next one.
    ContinueOnError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub failed: usize,
}

pub async fn run_batch(
    rows: &[JobPostingInput],
    orchestrator: &PostingOrchestrator,
    writer: &mut OutputWriter,
    failure_mode: FailureMode,
) -> Result<BatchSummary, AppError> {
    let mut summary = BatchSummary::default();
    let total = rows.len();

    for (index, row) in rows.iter().enumerate() {
        info!(
            "Processing job {}/{}: {} ({})",
            index + 1,
            total,
            row.position_title,
            row.hris_id
        );

        let output = match orchestrator.process(row).await {
            Ok(output) => output,
            Err(e) => {
                error!("Job {} failed: {e}: {}", row.hris_id, e.root());
                match failure_mode {
                    FailureMode::Abort => return Err(e),
                    FailureMode::ContinueOnError => {
                        warn!("Skipping job {} and continuing", row.hris_id);
                        summary.failed += 1;
                        continue;
                    }
                }
            }
        };

        writer.append(&output)?;
        summary.written += 1;
        debug!("Job {}: {}", row.hris_id, RowStage::Written);
        info!(
            "Appended processed job: {} to {}",
            output.position_title,
            writer.path().display()
        );
    }

    Ok(summary)
}
