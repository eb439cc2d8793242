use crate::utils::parser::parse_vec3;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "vscreen - Two-round virtual screening: bounded-parallel docking, ranking, and final pose extraction.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Maximum number of docking jobs running at once; also sizes the parsing thread pool.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the complete campaign: first docking round, refinement round, and final analysis.
    Screen(ScreenArgs),
    /// Run a single docking round over a directory of prepared ligands.
    Dock(DockArgs),
    /// Extract the best refined poses and write the combined score report.
    Analyze(AnalyzeArgs),
}

/// Options shared by every subcommand that reads the campaign configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    /// Path to the campaign configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory under which all round directories are created.
    #[arg(short = 'w', long, value_name = "PATH")]
    pub work_dir: Option<PathBuf>,

    /// Campaign tag used in directory names (e.g., the receptor code '2bv6').
    #[arg(short, long, value_name = "TAG")]
    pub tag: Option<String>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S round-one.select-top=250
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Receptor, pocket and engine overrides for docking subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct DockingArgs {
    /// Receptor file in the docking engine's input format.
    #[arg(short, long, value_name = "PATH")]
    pub receptor: Option<PathBuf>,

    /// Pocket center as 'x,y,z' in Angstroms.
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3, allow_hyphen_values = true)]
    pub center: Option<[f64; 3]>,

    /// Pocket box size as 'x,y,z' in Angstroms.
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3)]
    pub size: Option<[f64; 3]>,

    /// Docking engine executable (AutoDock Vina compatible command line).
    #[arg(short, long, value_name = "PATH")]
    pub engine: Option<PathBuf>,
}

/// Converter overrides for subcommands that extract final poses.
#[derive(Args, Debug, Clone, Default)]
pub struct ConversionArgs {
    /// Number of best refined poses to extract.
    #[arg(long, value_name = "INT")]
    pub top_poses: Option<usize>,

    /// Format converter executable (Open Babel command line).
    #[arg(long, value_name = "PATH")]
    pub converter: Option<PathBuf>,

    /// File extension of the converted poses, which also selects the output format.
    #[arg(long, value_name = "EXT")]
    pub target_format: Option<String>,
}

/// Arguments for the `screen` subcommand.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    #[command(flatten)]
    pub docking: DockingArgs,

    #[command(flatten)]
    pub conversion: ConversionArgs,

    /// Directory of prepared ligand files to screen.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Number of best first-round ligands carried into the refinement round.
    #[arg(long, value_name = "INT")]
    pub cut: Option<usize>,
}

/// Arguments for the `dock` subcommand.
#[derive(Args, Debug)]
pub struct DockArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    #[command(flatten)]
    pub docking: DockingArgs,

    /// Which round to run. Round 1 reads the ligand library; round 2 reads the round-1
    /// selection unless an input directory is given.
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub round: u8,

    /// Directory of ligand files to dock, overriding the round's default input.
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Override the search exhaustiveness of this round.
    #[arg(short = 'x', long, value_name = "INT")]
    pub exhaustiveness: Option<u32>,

    /// Copy the best N ligands of this round into its selection directory.
    #[arg(long, value_name = "INT", conflicts_with = "no_select")]
    pub select_top: Option<usize>,

    /// Rank the round without copying a selection, even if the config file asks for one.
    #[arg(long)]
    pub no_select: bool,
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    #[command(flatten)]
    pub conversion: ConversionArgs,
}
