//! Input Loader: reads the job posting table into ordered `JobPostingInput` rows.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::errors::AppError;
use crate::postings::models::JobPostingInput;

pub const REQUIRED_COLUMNS: [&str; 4] = ["HRIS ID", "Position Title", "Position Summary", "Feedback"];

#[derive(Debug, Deserialize)]
struct PostingRow {
    #[serde(rename = "HRIS ID")]
    hris_id: String,
    #[serde(rename = "Position Title")]
    position_title: String,
    #[serde(rename = "Position Summary")]
    position_summary: String,
    #[serde(rename = "Feedback", default, deserialize_with = "blank_as_none")]
    feedback: Option<String>,
}

impl From<PostingRow> for JobPostingInput {
    fn from(row: PostingRow) -> Self {
        Self {
            hris_id: row.hris_id,
            position_title: row.position_title,
            position_summary: row.position_summary,
            feedback: row.feedback,
        }
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Loads every row of the input file, preserving order.
pub fn load_postings(path: &Path) -> Result<Vec<JobPostingInput>, AppError> {
    if !path.exists() {
        return Err(AppError::InputNotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let rows = parse_postings(file, path)?;
    info!("Loaded {} job postings from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parses postings from any reader; `source` is only used in error messages.
pub fn parse_postings<R: Read>(reader: R, source: &Path) -> Result<Vec<JobPostingInput>, AppError> {
    let malformed = |reason: String| AppError::InputMalformed {
        path: source.to_path_buf(),
        reason,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| malformed(format!("unreadable header row: {e}")))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut postings = Vec::new();
    for (index, record) in csv_reader.deserialize::<PostingRow>().enumerate() {
        let row = record.map_err(|e| malformed(format!("data row {}: {e}", index + 1)))?;
        postings.push(row.into());
    }

    Ok(postings)
}
