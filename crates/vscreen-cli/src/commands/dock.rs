use crate::cli::DockArgs;
use crate::config::build_dock_config;
use crate::error::Result;
use crate::ui::{CliProgressHandler, UiEvent};
use tokio::sync::mpsc;
use tracing::info;
use vscreen::engine::launcher::VinaLauncher;
use vscreen::engine::progress::ProgressReporter;
use vscreen::workflows;

pub async fn run(
    args: DockArgs,
    jobs: Option<usize>,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    info!("Merging configuration for docking round {}...", args.round);
    let config = build_dock_config(&args, jobs)?;

    let progress_handler = CliProgressHandler::new(ui_sender.clone());
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let cancel = super::cancel_on_interrupt(ui_sender);

    println!(
        "Starting docking round {} (exhaustiveness {}, up to {} concurrent jobs)...",
        config.round.layout.round(),
        config.round.params.exhaustiveness,
        config.round.max_concurrency
    );
    info!("Invoking the docking round workflow with engine {:?}", config.engine);

    let report = workflows::dock::run(
        &config.round,
        VinaLauncher::new(&config.engine),
        Some(cancel),
        &reporter,
    )
    .await?;

    super::print_round_report(&config.round, &report);
    super::ensure_completed(&config.round, &report)
}
