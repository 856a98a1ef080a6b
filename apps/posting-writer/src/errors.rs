use std::path::PathBuf;

use thiserror::Error;

use crate::assistant_client::RunStatus;
use crate::postings::orchestrator::RowStage;

/// Application-level error type.
/// Every layer returns `Result<T, AppError>`; `main` converts into `anyhow` at the edge.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Malformed input {}: {reason}", .path.display())]
    InputMalformed { path: PathBuf, reason: String },

    #[error("Assistant service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Run {run_id} ended with status {status}: {message}")]
    RunFailed {
        run_id: String,
        status: RunStatus,
        message: String,
    },

    #[error("Run {run_id} did not complete after {attempts} status polls")]
    RunTimeout { run_id: String, attempts: u32 },

    #[error("Assistant returned no text reply in thread {0}")]
    EmptyReply(String),

    #[error("Row {hris_id} failed after stage {stage}")]
    Row {
        hris_id: String,
        stage: RowStage,
        #[source]
        source: Box<AppError>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Unwraps `Row` to the error that actually stopped the row.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Row { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_nested_row_errors() {
        let err = AppError::Row {
            hris_id: "H-1".to_string(),
            stage: RowStage::ContextSent,
            source: Box::new(AppError::RunTimeout {
                run_id: "run_1".to_string(),
                attempts: 3,
            }),
        };
        assert!(matches!(
            err.root(),
            AppError::RunTimeout { attempts: 3, .. }
        ));
    }

    #[test]
    fn test_row_error_names_stage_and_chains_cause() {
        let err = AppError::Row {
            hris_id: "H-7".to_string(),
            stage: RowStage::Q2Answered,
            source: Box::new(AppError::ServiceUnavailable("connection refused".to_string())),
        };
        let message = err.to_string();
        assert!(message.contains("H-7"));
        assert!(message.contains("Q2_ANSWERED"));
        // The cause is reported once, through the source chain
        assert!(!message.contains("connection refused"));
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert!(cause.contains("connection refused"));
    }

    #[test]
    fn test_config_missing_names_the_key() {
        let err = AppError::ConfigMissing("OPENAI_API_KEY".to_string());
        assert_eq!(err.to_string(), "Missing configuration: OPENAI_API_KEY");
    }
}
