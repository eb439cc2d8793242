use std::path::PathBuf;
use vscreen::engine::config::{
    DEFAULT_BOND_ORDER_WARNING, DEFAULT_INPUT_EXTENSION, DEFAULT_TARGET_FORMAT, DEFAULT_TOP_POSES,
};

pub struct DefaultsConfig {
    pub work_dir: PathBuf,
    pub library: PathBuf,
    pub input_extension: String,
    pub engine: PathBuf,
    pub round_one_exhaustiveness: u32,
    pub round_two_exhaustiveness: u32,
    pub round_one_cut: usize,
    pub converter: PathBuf,
    pub top_poses: usize,
    pub target_format: String,
    pub bond_order_warning: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            library: PathBuf::from("SD_Library"),
            input_extension: DEFAULT_INPUT_EXTENSION.to_string(),
            engine: PathBuf::from("./psovina"),
            round_one_exhaustiveness: 8,
            round_two_exhaustiveness: 32,
            round_one_cut: 500,
            converter: PathBuf::from("obabel"),
            top_poses: DEFAULT_TOP_POSES,
            target_format: DEFAULT_TARGET_FORMAT.to_string(),
            bond_order_warning: DEFAULT_BOND_ORDER_WARNING.to_string(),
        }
    }
}
