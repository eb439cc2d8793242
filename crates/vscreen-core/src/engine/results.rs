use super::error::EngineError;
use super::jobs::list_files;
use super::scheduler::{JobOutcome, JobStatus};
use super::summary::{Skip, SkipReason};
use crate::core::io::pdbqt::{self, ParseIssue, ParsedResult};
use crate::core::models::job::molecule_id_from_path;
use crate::core::models::result::JobResult;
use rayon::prelude::*;
use std::path::Path;
use tracing::warn;

/// Typed results of one batch plus every per-molecule failure met while collecting them.
///
/// `results` holds one entry per job (or per file) in input order; entries whose score is
/// absent have exactly one matching [`Skip`] in `skips`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedResults {
    pub results: Vec<JobResult>,
    pub skips: Vec<Skip>,
}

impl CollectedResults {
    pub fn scored(&self) -> usize {
        self.results.iter().filter(|r| r.score.is_some()).count()
    }

    fn from_items(items: Vec<(JobResult, Option<Skip>)>) -> Self {
        let mut collected = Self::default();
        for (result, skip) in items {
            collected.results.push(result);
            if let Some(skip) = skip {
                warn!(
                    "Skipping molecule '{}': {}{}",
                    skip.molecule_id,
                    skip.reason,
                    skip.detail
                        .as_deref()
                        .map(|d| format!(" ({})", d))
                        .unwrap_or_default()
                );
                collected.skips.push(skip);
            }
        }
        collected
    }
}

/// Converts the outcomes of a finished batch into results. Output files are only read for
/// jobs that exited successfully.
pub fn collect_from_batch(outcomes: &[JobOutcome]) -> CollectedResults {
    let items = outcomes
        .par_iter()
        .map(|outcome| {
            let molecule_id = outcome.job.molecule_id();
            match outcome.status {
                JobStatus::Succeeded => read_result(molecule_id, outcome.job.output_path()),
                JobStatus::Failed { code } => {
                    let detail = match code {
                        Some(code) => format!("exit code {}", code),
                        None => "terminated by signal".to_string(),
                    };
                    (
                        JobResult::unscored(molecule_id),
                        Some(Skip::new(molecule_id, SkipReason::JobFailed).with_detail(detail)),
                    )
                }
                JobStatus::WaitFailed => (
                    JobResult::unscored(molecule_id),
                    Some(
                        Skip::new(molecule_id, SkipReason::JobFailed)
                            .with_detail("exit status unavailable"),
                    ),
                ),
                JobStatus::NotLaunched => (
                    JobResult::unscored(molecule_id),
                    Some(Skip::new(molecule_id, SkipReason::Cancelled)),
                ),
            }
        })
        .collect();
    CollectedResults::from_items(items)
}

/// Reads every result file with the given extension from a results directory, in file
/// name order.
pub fn collect_from_dir(dir: &Path, extension: &str) -> Result<CollectedResults, EngineError> {
    let files = list_files(dir, extension)?;
    let items = files
        .par_iter()
        .filter_map(|path| {
            let Some(molecule_id) = molecule_id_from_path(path) else {
                warn!("Ignoring result with an unusable file name: {:?}", path);
                return None;
            };
            Some(read_result(&molecule_id, path))
        })
        .collect();
    Ok(CollectedResults::from_items(items))
}

/// Parses a single result file into a [`JobResult`], classifying anything that prevents a
/// score from being read.
pub fn read_result(molecule_id: &str, path: &Path) -> (JobResult, Option<Skip>) {
    match pdbqt::read_from_path(path) {
        Ok(parsed) => from_parsed(molecule_id, path, parsed),
        Err(e) => (
            JobResult::unscored(molecule_id),
            Some(Skip::new(molecule_id, SkipReason::MissingOutput).with_detail(e.to_string())),
        ),
    }
}

fn from_parsed(molecule_id: &str, path: &Path, parsed: ParsedResult) -> (JobResult, Option<Skip>) {
    let mut skip = None;
    for issue in &parsed.issues {
        match issue {
            ParseIssue::MissingResultMarker => {
                skip = Some(
                    Skip::new(molecule_id, SkipReason::NoScore)
                        .with_detail(format!("no result record in {}", path.display())),
                );
            }
            ParseIssue::MalformedScore { line, token } => {
                skip = Some(
                    Skip::new(molecule_id, SkipReason::MalformedScore).with_detail(format!(
                        "{}:{}: unreadable affinity {:?}",
                        path.display(),
                        line,
                        token.as_deref().unwrap_or("")
                    )),
                );
            }
            ParseIssue::UnterminatedPose { start_line } => {
                warn!(
                    "Pose block starting at {}:{} of molecule '{}' is not terminated; pose dropped.",
                    path.display(),
                    start_line,
                    molecule_id
                );
            }
        }
    }

    (
        JobResult {
            molecule_id: molecule_id.to_string(),
            score: parsed.score,
            pose: parsed.pose,
        },
        skip,
    )
}
