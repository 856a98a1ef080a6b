//! Incremental Output Writer: append-only, one durable row per call.
//!
//! The header is written once, and only if the output file did not exist when
//! the writer was opened. Re-runs keep appending without a second header.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::AppError;
use crate::postings::models::JobPostingOutput;

pub struct OutputWriter {
    path: PathBuf,
    header_pending: bool,
    rows_written: usize,
}

impl OutputWriter {
    /// Decides header emission from whether `path` exists right now.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let header_pending = !path.exists();

        if header_pending {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            info!("Output file {} will be created", path.display());
        } else {
            info!("Appending to existing output file {}", path.display());
        }

        Ok(Self {
            path,
            header_pending,
            rows_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Appends one record and syncs it to storage before returning.
    pub fn append(&mut self, record: &JobPostingOutput) -> Result<(), AppError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(self.header_pending)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        let file = writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;
        file.sync_data()?;

        self.header_pending = false;
        self.rows_written += 1;
        debug!(
            "Appended row {} ({}) to {}",
            self.rows_written,
            record.hris_id,
            self.path.display()
        );
        Ok(())
    }
}
