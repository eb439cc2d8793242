use crate::core::models::result::CombinedScoreRecord;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column names of the combined score report.
pub const REPORT_HEADER: [&str; 3] = ["Molecule ID", "First Docking", "Second Docking"];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("CSV error for score report '{path}': {source}", path = path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("I/O error for score report '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the comma-separated report correlating round-one and round-two scores.
///
/// The header row is written on creation, so a report with no retained molecules still
/// names its columns. A missing round-one score is written as an empty cell.
pub struct ScoreReportWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl ScoreReportWriter {
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| ReportError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
        writer
            .write_record(REPORT_HEADER)
            .map_err(|e| ReportError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows: 0,
        })
    }

    pub fn append(&mut self, record: &CombinedScoreRecord) -> Result<(), ReportError> {
        self.writer
            .serialize(record)
            .map_err(|e| ReportError::Csv {
                path: self.path.clone(),
                source: e,
            })?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the report to disk and returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize, ReportError> {
        self.writer.flush().map_err(|e| ReportError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(self.rows)
    }
}
