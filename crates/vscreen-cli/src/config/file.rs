use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileDockingConfig {
    pub engine: Option<PathBuf>,
    pub receptor: Option<PathBuf>,
    pub center: Option<[f64; 3]>,
    pub size: Option<[f64; 3]>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileRoundConfig {
    pub exhaustiveness: Option<u32>,
    pub select_top: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileAnalysisConfig {
    pub converter: Option<PathBuf>,
    pub top_poses: Option<usize>,
    pub target_format: Option<String>,
    pub bond_order_warning: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub work_dir: Option<PathBuf>,
    pub tag: Option<String>,
    pub library: Option<PathBuf>,
    pub input_extension: Option<String>,
    pub max_concurrency: Option<usize>,
    pub docking: Option<FileDockingConfig>,
    pub round_one: Option<FileRoundConfig>,
    pub round_two: Option<FileRoundConfig>,
    pub analysis: Option<FileAnalysisConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
