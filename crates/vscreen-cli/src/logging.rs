use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self},
    prelude::*,
};

/// Targets whose events follow the verbosity flags. Everything else (process and runtime
/// internals) is capped at warnings.
const SCREEN_TARGETS: [&str; 2] = ["vscreen", "vscreen_cli"];

pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::ERROR
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

fn screen_targets(level: LevelFilter) -> Targets {
    SCREEN_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, level)
        })
        .with_default(LevelFilter::WARN.min(level))
}

/// Console filter: the screening crates at the requested level, third-party crates at most
/// at `WARN`.
pub fn console_filter(verbosity: u8, quiet: bool) -> Targets {
    screen_targets(level_filter(verbosity, quiet))
}

/// File filter: a log file always keeps per-job `DEBUG` records, so a long screen can be
/// audited afterwards even when the console ran quietly.
pub fn file_filter(verbosity: u8) -> Targets {
    screen_targets(level_filter(verbosity, false).max(LevelFilter::DEBUG))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(console_filter(verbosity, quiet));

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true)
                    .with_filter(file_filter(verbosity)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
