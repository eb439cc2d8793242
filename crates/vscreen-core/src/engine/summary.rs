use std::collections::BTreeMap;
use std::fmt;

/// Why a molecule dropped out of a stage without aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// The docking process exited non-zero, was killed, or could not be awaited.
    JobFailed,
    /// The job finished but its result file is missing or unreadable.
    MissingOutput,
    /// The result file has no result record.
    NoScore,
    /// The result record carries no valid affinity.
    MalformedScore,
    /// The job was never launched because the batch was cancelled.
    Cancelled,
    /// The source artifact selected for copying no longer exists.
    MissingSource,
    /// The selected result has no complete pose block to extract.
    MissingPose,
    /// The converter had to guess bond orders; the pose is not trusted.
    BondOrderWarning,
    /// The converter failed without the bond-order warning.
    ConversionFailed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::JobFailed => "docking job failed",
            SkipReason::MissingOutput => "missing result file",
            SkipReason::NoScore => "no score in result",
            SkipReason::MalformedScore => "malformed score",
            SkipReason::Cancelled => "cancelled before launch",
            SkipReason::MissingSource => "missing source file",
            SkipReason::MissingPose => "missing pose",
            SkipReason::BondOrderWarning => "bond-order warning",
            SkipReason::ConversionFailed => "conversion failed",
        };
        f.write_str(text)
    }
}

/// A molecule skipped by some stage, with an optional human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub molecule_id: String,
    pub reason: SkipReason,
    pub detail: Option<String>,
}

impl Skip {
    pub fn new(molecule_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            molecule_id: molecule_id.into(),
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// End-of-stage accounting: how many items went in, how many produced a usable result,
/// which were skipped and why, and how large the final selection is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    pub selected: usize,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn record_skips<'a>(&mut self, skips: impl IntoIterator<Item = &'a Skip>) {
        for skip in skips {
            self.record_skip(skip.reason);
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} jobs completed, {} skipped",
            self.succeeded,
            self.total,
            self.skipped_total()
        )?;
        if !self.skipped.is_empty() {
            let reasons: Vec<String> = self
                .skipped
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason, count))
                .collect();
            write!(f, " ({})", reasons.join(", "))?;
        }
        write!(f, "; {} selected", self.selected)
    }
}
