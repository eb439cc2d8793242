use super::config::ConfigError;
use crate::core::io::report::ReportError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole run.
///
/// Anything scoped to a single molecule is reported as a skip instead; see
/// [`crate::engine::summary::SkipReason`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to launch '{program}' for molecule '{molecule_id}': {source}", program = program.display())]
    Launch {
        program: PathBuf,
        molecule_id: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory '{path}': {source}", path = path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read input directory '{path}': {source}", path = path.display())]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Failed to run converter '{program}': {source}", program = program.display())]
    Converter {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
