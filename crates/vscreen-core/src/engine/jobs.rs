use super::config::RoundConfig;
use super::error::EngineError;
use crate::core::models::job::{JobDescriptor, molecule_id_from_path};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creates `path` and any missing parents. An existing directory is not an error, and
/// concurrent creation of the same directory is safe.
pub fn ensure_dir(path: &Path) -> Result<(), EngineError> {
    fs::create_dir_all(path).map_err(|e| EngineError::Directory {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Lists the regular files in `dir` whose extension is exactly `extension`, sorted by file
/// name so that batches are enumerated identically on every run.
pub fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, EngineError> {
    let to_error = |source| EngineError::InputDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(to_error)? {
        let entry = entry.map_err(to_error)?;
        let path = entry.path();
        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == extension);
        if matches_extension && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Builds one [`JobDescriptor`] per ligand file of the round's input directory.
///
/// Results keep the ligand's file name inside the round's results directory; logs are written
/// to `log_{id}.txt` in the logs directory. Both directories are created if needed.
pub fn build_jobs(config: &RoundConfig) -> Result<Vec<JobDescriptor>, EngineError> {
    let results_dir = config.layout.results_dir();
    let logs_dir = config.layout.logs_dir();
    ensure_dir(&results_dir)?;
    ensure_dir(&logs_dir)?;

    let params = Arc::new(config.params.clone());
    let inputs = list_files(&config.input_dir, &config.input_extension)?;

    let mut jobs = Vec::with_capacity(inputs.len());
    for ligand_path in inputs {
        let (Some(molecule_id), Some(file_name)) =
            (molecule_id_from_path(&ligand_path), ligand_path.file_name())
        else {
            warn!("Ignoring input with an unusable file name: {:?}", ligand_path);
            continue;
        };
        let output_path = results_dir.join(file_name);
        let log_path = logs_dir.join(format!("log_{}.txt", molecule_id));
        debug!("Prepared job for molecule '{}'", molecule_id);
        jobs.push(JobDescriptor::new(
            molecule_id,
            ligand_path,
            output_path,
            log_path,
            params.clone(),
        ));
    }

    info!(
        "Prepared {} docking job(s) from {:?}.",
        jobs.len(),
        config.input_dir
    );
    Ok(jobs)
}
