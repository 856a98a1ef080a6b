use serde::Serialize;

/// One row of the input table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPostingInput {
    /// Opaque; written back verbatim.
    pub hris_id: String,
    pub position_title: String,
    pub position_summary: String,
    /// `None` when the cell was missing or blank.
    pub feedback: Option<String>,
}

/// One row of the output table. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobPostingOutput {
    #[serde(rename = "HRIS ID")]
    pub hris_id: String,
    #[serde(rename = "Position Title")]
    pub position_title: String,
    /// Both short summaries joined with `" | "`.
    #[serde(rename = "Short Summary")]
    pub short_summary: String,
    #[serde(rename = "Day in the Life")]
    pub day_in_life: String,
    /// Trait list as the assistant returned it, `|`-separated.
    #[serde(rename = "Ideal Candidate")]
    pub ideal_candidate: String,
}

pub const OUTPUT_COLUMNS: [&str; 5] = [
    "HRIS ID",
    "Position Title",
    "Short Summary",
    "Day in the Life",
    "Ideal Candidate",
];

pub const SHORT_SUMMARY_SEPARATOR: &str = " | ";

/// Joins the two one-sentence summaries into the single output column.
pub fn join_short_summaries(first: &str, second: &str) -> String {
    format!("{first}{SHORT_SUMMARY_SEPARATOR}{second}")
}
