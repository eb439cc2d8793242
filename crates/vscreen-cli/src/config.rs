mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_analyze_config, build_dock_config, build_screen_config};
pub use models::{AnalyzeConfig, DockConfig, ScreenConfig};
