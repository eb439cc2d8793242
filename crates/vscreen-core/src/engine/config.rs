use crate::core::models::job::{DockingBox, DockingParams};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_INPUT_EXTENSION: &str = "pdbqt";
pub const DEFAULT_TARGET_FORMAT: &str = "mol2";
pub const DEFAULT_TOP_POSES: usize = 10;
/// Diagnostic emitted by Open Babel when it has to guess bond orders for a pose.
pub const DEFAULT_BOND_ORDER_WARNING: &str = "Warning  in PerceiveBondOrders";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Number of logical CPUs usable by this process, used as the default concurrency ceiling.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Directory naming for a whole screening campaign.
///
/// All stage directories are derived from a base directory and a campaign tag (typically the
/// receptor code, e.g. `2bv6`), so the same layout serves every round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayout {
    base_dir: PathBuf,
    tag: String,
}

impl ScreenLayout {
    pub fn new(base_dir: impl Into<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            tag: tag.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn round(&self, round: u8) -> RoundLayout {
        RoundLayout {
            base_dir: self.base_dir.clone(),
            round,
            tag: self.tag.clone(),
        }
    }

    pub fn final_poses_dir(&self) -> PathBuf {
        self.base_dir.join(format!("final_poses_{}", self.tag))
    }

    pub fn scores_file(&self) -> PathBuf {
        self.base_dir.join(format!("scores_final_{}.txt", self.tag))
    }
}

/// Directory naming for one docking round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundLayout {
    base_dir: PathBuf,
    round: u8,
    tag: String,
}

impl RoundLayout {
    pub fn round(&self) -> u8 {
        self.round
    }

    pub fn results_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("dock{}_results_{}", self.round, self.tag))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir
            .join(format!("log_dock{}_{}", self.round, self.tag))
    }

    pub fn selection_dir(&self, top: usize) -> PathBuf {
        self.base_dir
            .join(format!("dock{}_top{}_{}", self.round, top, self.tag))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    pub params: DockingParams,
    pub layout: RoundLayout,
    pub input_dir: PathBuf,
    pub input_extension: String,
    pub max_concurrency: usize,
    /// Number of best ligands copied forward; `None` ranks without copying.
    pub select_top: Option<usize>,
}

#[derive(Default)]
pub struct RoundConfigBuilder {
    receptor: Option<PathBuf>,
    pocket: Option<DockingBox>,
    exhaustiveness: Option<u32>,
    layout: Option<RoundLayout>,
    input_dir: Option<PathBuf>,
    input_extension: Option<String>,
    max_concurrency: Option<usize>,
    select_top: Option<usize>,
}

impl RoundConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receptor(mut self, path: PathBuf) -> Self {
        self.receptor = Some(path);
        self
    }
    pub fn pocket(mut self, pocket: DockingBox) -> Self {
        self.pocket = Some(pocket);
        self
    }
    pub fn exhaustiveness(mut self, level: u32) -> Self {
        self.exhaustiveness = Some(level);
        self
    }
    pub fn layout(mut self, layout: RoundLayout) -> Self {
        self.layout = Some(layout);
        self
    }
    pub fn input_dir(mut self, path: PathBuf) -> Self {
        self.input_dir = Some(path);
        self
    }
    pub fn input_extension(mut self, extension: impl Into<String>) -> Self {
        self.input_extension = Some(extension.into());
        self
    }
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }
    pub fn select_top(mut self, n: Option<usize>) -> Self {
        self.select_top = n;
        self
    }

    pub fn build(self) -> Result<RoundConfig, ConfigError> {
        let pocket = self.pocket.ok_or(ConfigError::MissingParameter("pocket"))?;
        validate_pocket(&pocket)?;

        let exhaustiveness = self
            .exhaustiveness
            .ok_or(ConfigError::MissingParameter("exhaustiveness"))?;
        if exhaustiveness == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "exhaustiveness",
                reason: "must be at least 1".to_string(),
            });
        }

        let max_concurrency = self.max_concurrency.unwrap_or_else(default_concurrency);
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "max_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.select_top == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "select_top",
                reason: "must be at least 1 when set".to_string(),
            });
        }

        let input_extension = self
            .input_extension
            .unwrap_or_else(|| DEFAULT_INPUT_EXTENSION.to_string())
            .trim_start_matches('.')
            .to_string();

        Ok(RoundConfig {
            params: DockingParams {
                receptor: self
                    .receptor
                    .ok_or(ConfigError::MissingParameter("receptor"))?,
                pocket,
                exhaustiveness,
            },
            layout: self.layout.ok_or(ConfigError::MissingParameter("layout"))?,
            input_dir: self
                .input_dir
                .ok_or(ConfigError::MissingParameter("input_dir"))?,
            input_extension,
            max_concurrency,
            select_top: self.select_top,
        })
    }
}

fn validate_pocket(pocket: &DockingBox) -> Result<(), ConfigError> {
    if pocket.center.iter().any(|c| !c.is_finite()) {
        return Err(ConfigError::InvalidParameter {
            name: "pocket.center",
            reason: "coordinates must be finite".to_string(),
        });
    }
    if pocket.size.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(ConfigError::InvalidParameter {
            name: "pocket.size",
            reason: "box dimensions must be positive".to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub round_one_results: PathBuf,
    pub round_two_results: PathBuf,
    pub final_poses_dir: PathBuf,
    pub scores_file: PathBuf,
    pub top_poses: usize,
    pub result_extension: String,
    pub target_format: String,
    pub bond_order_warning: String,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    round_one_results: Option<PathBuf>,
    round_two_results: Option<PathBuf>,
    final_poses_dir: Option<PathBuf>,
    scores_file: Option<PathBuf>,
    top_poses: Option<usize>,
    result_extension: Option<String>,
    target_format: Option<String>,
    bond_order_warning: Option<String>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presets every path from the campaign layout; later calls may override them.
    pub fn from_layout(layout: &ScreenLayout) -> Self {
        Self::new()
            .round_one_results(layout.round(1).results_dir())
            .round_two_results(layout.round(2).results_dir())
            .final_poses_dir(layout.final_poses_dir())
            .scores_file(layout.scores_file())
    }

    pub fn round_one_results(mut self, path: PathBuf) -> Self {
        self.round_one_results = Some(path);
        self
    }
    pub fn round_two_results(mut self, path: PathBuf) -> Self {
        self.round_two_results = Some(path);
        self
    }
    pub fn final_poses_dir(mut self, path: PathBuf) -> Self {
        self.final_poses_dir = Some(path);
        self
    }
    pub fn scores_file(mut self, path: PathBuf) -> Self {
        self.scores_file = Some(path);
        self
    }
    pub fn top_poses(mut self, n: usize) -> Self {
        self.top_poses = Some(n);
        self
    }
    pub fn result_extension(mut self, extension: impl Into<String>) -> Self {
        self.result_extension = Some(extension.into());
        self
    }
    pub fn target_format(mut self, format: impl Into<String>) -> Self {
        self.target_format = Some(format.into());
        self
    }
    pub fn bond_order_warning(mut self, warning: impl Into<String>) -> Self {
        self.bond_order_warning = Some(warning.into());
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let top_poses = self.top_poses.unwrap_or(DEFAULT_TOP_POSES);
        if top_poses == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "top_poses",
                reason: "must be at least 1".to_string(),
            });
        }
        let bond_order_warning = self
            .bond_order_warning
            .unwrap_or_else(|| DEFAULT_BOND_ORDER_WARNING.to_string());
        if bond_order_warning.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "bond_order_warning",
                reason: "an empty pattern would match every conversion".to_string(),
            });
        }

        Ok(AnalysisConfig {
            round_one_results: self
                .round_one_results
                .ok_or(ConfigError::MissingParameter("round_one_results"))?,
            round_two_results: self
                .round_two_results
                .ok_or(ConfigError::MissingParameter("round_two_results"))?,
            final_poses_dir: self
                .final_poses_dir
                .ok_or(ConfigError::MissingParameter("final_poses_dir"))?,
            scores_file: self
                .scores_file
                .ok_or(ConfigError::MissingParameter("scores_file"))?,
            top_poses,
            result_extension: self
                .result_extension
                .unwrap_or_else(|| DEFAULT_INPUT_EXTENSION.to_string())
                .trim_start_matches('.')
                .to_string(),
            target_format: self
                .target_format
                .unwrap_or_else(|| DEFAULT_TARGET_FORMAT.to_string())
                .trim_start_matches('.')
                .to_string(),
            bond_order_warning,
        })
    }
}
