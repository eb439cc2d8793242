use std::path::PathBuf;
use vscreen::engine::config::{AnalysisConfig, RoundConfig};

pub struct DockConfig {
    pub engine: PathBuf,
    pub round: RoundConfig,
}

pub struct AnalyzeConfig {
    pub converter: PathBuf,
    pub analysis: AnalysisConfig,
}

pub struct ScreenConfig {
    pub engine: PathBuf,
    pub converter: PathBuf,
    pub round_one: RoundConfig,
    pub round_two: RoundConfig,
    pub analysis: AnalysisConfig,
}
