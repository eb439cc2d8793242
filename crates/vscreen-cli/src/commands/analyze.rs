use crate::cli::AnalyzeArgs;
use crate::config::build_analyze_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vscreen::engine::convert::ObabelConverter;
use vscreen::engine::progress::ProgressReporter;
use vscreen::workflows;

pub async fn run(args: AnalyzeArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Merging configuration for the final analysis...");
    let config = build_analyze_config(&args)?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let converter = ObabelConverter::new(&config.converter);

    println!(
        "Extracting the top {} pose(s) from {}...",
        config.analysis.top_poses,
        config.analysis.round_two_results.display()
    );
    info!("Invoking the analysis workflow with converter {:?}", config.converter);

    let report = tokio::task::block_in_place(|| {
        workflows::analyze::run(&config.analysis, &converter, &reporter)
    })?;

    if report.rows == 0 {
        warn!("Analysis completed but no pose survived conversion.");
        println!("Warning: no pose survived conversion; the score report has a header only.");
    }
    super::print_analysis_report(&config.analysis, &report);
    Ok(())
}
