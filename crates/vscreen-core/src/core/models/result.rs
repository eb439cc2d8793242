use serde::Serialize;
use std::io::{self, Write};

/// One docked geometry, kept verbatim as the block of lines between the `MODEL` and
/// `ENDMDL` records (both included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pose {
    lines: Vec<String>,
}

impl Pose {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Writes the pose block, one record per line.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        for line in &self.lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }
}

/// The typed outcome of one docking job.
///
/// A missing score is kept as `None`; it is never replaced by a numeric default, so the
/// ranking stage can tell unscored results apart from genuinely poor binders.
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub molecule_id: String,
    /// Predicted binding affinity in kcal/mol; more negative is better.
    pub score: Option<f64>,
    pub pose: Option<Pose>,
}

impl JobResult {
    pub fn unscored(molecule_id: impl Into<String>) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            score: None,
            pose: None,
        }
    }
}

/// One row of the final score report, joining both docking rounds on the molecule ID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedScoreRecord {
    pub molecule_id: String,
    pub round_one: Option<f64>,
    pub round_two: f64,
}
