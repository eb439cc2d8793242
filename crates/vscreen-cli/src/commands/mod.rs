pub mod analyze;
pub mod dock;
pub mod screen;

use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use tokio::sync::{mpsc, watch};
use tracing::warn;
use vscreen::engine::config::{AnalysisConfig, RoundConfig};
use vscreen::workflows::analyze::AnalysisReport;
use vscreen::workflows::dock::RoundReport;

/// Returns a channel that turns `true` on the first Ctrl-C. A second Ctrl-C exits at once.
pub fn cancel_on_interrupt(ui_sender: mpsc::Sender<UiEvent>) -> watch::Receiver<bool> {
    let (sender, receiver) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Could not listen for Ctrl-C; the batch cannot be interrupted gracefully.");
            return;
        }
        warn!("Interrupt received; no further docking jobs will be launched.");
        ui_sender
            .send(UiEvent::Log(
                "⚠ Interrupt received: waiting for running jobs (press Ctrl-C again to abort)."
                    .to_string(),
            ))
            .await
            .ok();
        sender.send(true).ok();

        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n❌ Aborted.");
            std::process::exit(130);
        }
    });
    receiver
}

pub fn print_round_report(config: &RoundConfig, report: &RoundReport) {
    let round = config.layout.round();
    println!("Round {}: {}", round, report.summary);

    if let Some(best) = report.ranking.selection.entries().first() {
        println!(
            "  Best score: {:.1} kcal/mol ({})",
            best.score, best.molecule_id
        );
    }
    if let (Some(copied), Some(top)) = (&report.copied, config.select_top) {
        println!(
            "  Copied {} ligand(s) to {}",
            copied.copied.len(),
            config.layout.selection_dir(top).display()
        );
    }
    println!("  Results: {}", config.layout.results_dir().display());
}

pub fn print_analysis_report(config: &AnalysisConfig, report: &AnalysisReport) {
    println!("Analysis: {}", report.summary);
    println!(
        "  Wrote {} row(s) to {}",
        report.rows,
        config.scores_file.display()
    );
    println!(
        "  Kept {} converted pose(s) in {}",
        report.extraction.kept().count(),
        config.final_poses_dir.display()
    );
}

/// A cancelled round is reported and then turned into an error so the process exits non-zero.
pub fn ensure_completed(config: &RoundConfig, report: &RoundReport) -> Result<()> {
    if report.batch.cancelled {
        return Err(CliError::Interrupted(format!(
            "round {} stopped after {} of {} job(s) were launched",
            config.layout.round(),
            report.batch.launched(),
            report.batch.outcomes.len()
        )));
    }
    Ok(())
}
