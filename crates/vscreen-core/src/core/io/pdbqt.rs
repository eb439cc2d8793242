use crate::core::models::result::Pose;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of the record carrying the best binding affinity of a docking run.
pub const RESULT_MARKER: &str = "REMARK VINA RESULT:";
/// Whitespace-delimited field index of the affinity on a result record.
const SCORE_FIELD: usize = 3;
const MODEL_MARKER: &str = "MODEL";
const ENDMDL_MARKER: &str = "ENDMDL";

#[derive(Debug, Error)]
pub enum PdbqtError {
    #[error("I/O error for '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PdbqtError {
    pub fn is_not_found(&self) -> bool {
        match self {
            PdbqtError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
        }
    }
}

/// A recoverable defect found while reading a result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    /// No `REMARK VINA RESULT:` record in the file.
    MissingResultMarker,
    /// The first result record had no valid affinity in the expected column.
    MalformedScore { line: usize, token: Option<String> },
    /// A `MODEL` record was never closed by `ENDMDL`.
    UnterminatedPose { start_line: usize },
}

/// The typed content of one docking output file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedResult {
    pub score: Option<f64>,
    pub pose: Option<Pose>,
    pub issues: Vec<ParseIssue>,
}

enum PoseScan {
    Searching,
    Open { start_line: usize, lines: Vec<String> },
    Closed,
}

/// Reads a docking result in a single pass.
///
/// Only the first result record is used; engines list the best mode first. The first
/// `MODEL`..`ENDMDL` block is captured verbatim as the pose. Missing or malformed content is
/// reported through [`ParsedResult::issues`] instead of failing.
pub fn read_from(reader: &mut impl BufRead) -> io::Result<ParsedResult> {
    let mut parsed = ParsedResult::default();
    let mut score_seen = false;
    let mut pose = PoseScan::Searching;

    for (line_num, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_num = line_num + 1;

        if !score_seen && line.starts_with(RESULT_MARKER) {
            score_seen = true;
            match parse_score(&line) {
                Ok(score) => parsed.score = Some(score),
                Err(token) => parsed.issues.push(ParseIssue::MalformedScore {
                    line: line_num,
                    token,
                }),
            }
        }

        pose = match pose {
            PoseScan::Searching if line.starts_with(MODEL_MARKER) => PoseScan::Open {
                start_line: line_num,
                lines: vec![line],
            },
            PoseScan::Open {
                start_line,
                mut lines,
            } => {
                let closes = line.trim_end() == ENDMDL_MARKER;
                lines.push(line);
                if closes {
                    parsed.pose = Some(Pose::new(lines));
                    PoseScan::Closed
                } else {
                    PoseScan::Open { start_line, lines }
                }
            }
            other => other,
        };

        if score_seen && matches!(pose, PoseScan::Closed) {
            break;
        }
    }

    if !score_seen {
        parsed.issues.push(ParseIssue::MissingResultMarker);
    }
    if let PoseScan::Open { start_line, .. } = pose {
        parsed.issues.push(ParseIssue::UnterminatedPose { start_line });
    }

    Ok(parsed)
}

pub fn read_from_path(path: &Path) -> Result<ParsedResult, PdbqtError> {
    let to_error = |source| PdbqtError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(to_error)?;
    let mut reader = BufReader::new(file);
    read_from(&mut reader).map_err(to_error)
}

fn parse_score(line: &str) -> Result<f64, Option<String>> {
    let Some(token) = line.split_whitespace().nth(SCORE_FIELD) else {
        return Err(None);
    };
    match token.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(Some(token.to_string())),
    }
}
