use crate::cli::ScreenArgs;
use crate::config::build_screen_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use tokio::sync::mpsc;
use tracing::info;
use vscreen::engine::convert::ObabelConverter;
use vscreen::engine::launcher::VinaLauncher;
use vscreen::engine::progress::ProgressReporter;
use vscreen::workflows;

pub async fn run(
    args: ScreenArgs,
    jobs: Option<usize>,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    info!("Merging configuration for the screening campaign...");
    let config = build_screen_config(&args, jobs)?;

    let progress_handler = CliProgressHandler::new(ui_sender.clone());
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let cancel = super::cancel_on_interrupt(ui_sender);

    for round in [&config.round_one, &config.round_two] {
        println!(
            "Starting docking round {} (exhaustiveness {}, up to {} concurrent jobs)...",
            round.layout.round(),
            round.params.exhaustiveness,
            round.max_concurrency
        );
        let report = workflows::dock::run(
            round,
            VinaLauncher::new(&config.engine),
            Some(cancel.clone()),
            &reporter,
        )
        .await?;
        super::print_round_report(round, &report);
        super::ensure_completed(round, &report)?;
    }

    println!(
        "Extracting the top {} pose(s)...",
        config.analysis.top_poses
    );
    let converter = ObabelConverter::new(&config.converter);
    let report = tokio::task::block_in_place(|| {
        workflows::analyze::run(&config.analysis, &converter, &reporter)
    })?;
    super::print_analysis_report(&config.analysis, &report);

    Ok(())
}
