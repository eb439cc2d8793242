use crate::engine::config::RoundConfig;
use crate::engine::error::EngineError;
use crate::engine::jobs::build_jobs;
use crate::engine::launcher::JobLauncher;
use crate::engine::materialize::{CopyReport, copy_selection};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{Ranking, rank};
use crate::engine::results::collect_from_batch;
use crate::engine::scheduler::{BatchOutcome, Scheduler};
use crate::engine::summary::{BatchSummary, Skip};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub batch: BatchOutcome,
    pub ranking: Ranking,
    /// Present when the round was configured to copy its selection forward.
    pub copied: Option<CopyReport>,
    /// Every per-molecule failure of the round, from docking through copying.
    pub skips: Vec<Skip>,
    pub summary: BatchSummary,
}

/// Runs one docking round: one job per input ligand, bounded-parallel execution, ranking of
/// the parsed results and, if `select_top` is set, a copy of the selected input ligands into
/// the round's selection directory.
///
/// Ranking starts only after every launched job has terminated. A cancelled batch is still
/// ranked, but nothing is copied forward from an incomplete round.
#[instrument(skip_all, name = "docking_round", fields(round = config.layout.round()))]
pub async fn run<L: JobLauncher>(
    config: &RoundConfig,
    launcher: L,
    cancel: Option<watch::Receiver<bool>>,
    reporter: &ProgressReporter<'_>,
) -> Result<RoundReport, EngineError> {
    // === Phase 1: Job preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let jobs = build_jobs(config)?;
    let mut summary = BatchSummary::new(jobs.len());
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Docking ===
    reporter.report(Progress::PhaseStart { name: "Docking" });
    let mut scheduler = Scheduler::new(launcher, config.max_concurrency);
    if let Some(cancel) = cancel {
        scheduler = scheduler.with_cancellation(cancel);
    }
    let progress = scheduler.progress();
    let batch = scheduler.run(jobs, reporter).await?;
    debug!(
        "Docking phase done: {} launched, {} completed, ceiling {}.",
        progress.launched(),
        progress.completed(),
        scheduler.max_concurrency()
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Result collection and ranking ===
    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let collected = collect_from_batch(&batch.outcomes);
    summary.succeeded = collected.scored();
    let mut skips = collected.skips;

    let limit = config.select_top.unwrap_or(collected.results.len());
    let ranking = rank(collected.results, limit);
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Selection copy ===
    let copied = match config.select_top {
        Some(top) if batch.cancelled => {
            warn!(
                "Round {} was cancelled; the top {} ligands are not copied forward.",
                config.layout.round(),
                top
            );
            None
        }
        Some(top) => {
            reporter.report(Progress::PhaseStart { name: "Selection" });
            let dest = config.layout.selection_dir(top);
            let report = copy_selection(
                &ranking.selection,
                &config.input_dir,
                &config.input_extension,
                &dest,
            )?;
            skips.extend(report.skips.iter().cloned());
            reporter.report(Progress::PhaseFinish);
            Some(report)
        }
        None => None,
    };
    // With a cut, only ligands that actually reached the selection directory count.
    summary.selected = match (&copied, config.select_top) {
        (Some(report), _) => report.copied.len(),
        (None, Some(_)) => 0,
        (None, None) => ranking.selection.len(),
    };

    summary.record_skips(&skips);
    info!("Round {} finished: {}.", config.layout.round(), summary);
    reporter.report(Progress::Message(format!(
        "Round {}: {}",
        config.layout.round(),
        summary
    )));

    Ok(RoundReport {
        batch,
        ranking,
        copied,
        skips,
        summary,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::job::{DockingBox, JobDescriptor};
    use crate::engine::config::{RoundConfigBuilder, ScreenLayout};
    use crate::engine::summary::SkipReason;
    use nalgebra::{Point3, Vector3};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::{TempDir, tempdir};
    use tokio::process::Command;

    /// Stands in for the docking engine: the "result" is the ligand file itself, so each
    /// test ligand carries the score it should dock with.
    struct CopyingEngine;

    impl JobLauncher for CopyingEngine {
        fn program(&self) -> &Path {
            Path::new("/bin/sh")
        }

        fn command(&self, job: &JobDescriptor) -> Command {
            let mut command = Command::new("/bin/sh");
            command
                .arg("-c")
                .arg("cp \"$LIG\" \"$OUT\" && echo docked > \"$LOG\"")
                .env("LIG", job.ligand_path())
                .env("OUT", job.output_path())
                .env("LOG", job.log_path());
            command
        }
    }

    /// Docks like [`CopyingEngine`] but deletes one ligand from the library afterwards.
    struct VanishingEngine {
        gone: &'static str,
    }

    impl JobLauncher for VanishingEngine {
        fn program(&self) -> &Path {
            Path::new("/bin/sh")
        }

        fn command(&self, job: &JobDescriptor) -> Command {
            let mut command = Command::new("/bin/sh");
            command
                .arg("-c")
                .arg(
                    "cp \"$LIG\" \"$OUT\" && echo docked > \"$LOG\" \
                     && if [ \"$ID\" = \"$GONE\" ]; then rm \"$LIG\"; fi",
                )
                .env("LIG", job.ligand_path())
                .env("OUT", job.output_path())
                .env("LOG", job.log_path())
                .env("ID", job.molecule_id())
                .env("GONE", self.gone);
            command
        }
    }

    fn library(dir: &TempDir, ligands: &[(&str, Option<f64>)]) -> PathBuf {
        let library = dir.path().join("library");
        fs::create_dir(&library).unwrap();
        for (id, score) in ligands {
            let content = match score {
                Some(score) => format!(
                    "MODEL 1\nREMARK VINA RESULT: {} 0.000 0.000\nATOM 1\nENDMDL\n",
                    score
                ),
                None => "ATOM 1\n".to_string(),
            };
            fs::write(library.join(format!("{}.pdbqt", id)), content).unwrap();
        }
        library
    }

    fn round_config(dir: &TempDir, input: PathBuf, select_top: Option<usize>) -> RoundConfig {
        RoundConfigBuilder::new()
            .receptor(dir.path().join("receptor.pdbqt"))
            .pocket(DockingBox::new(
                Point3::new(80.64, 2.39, 4.29),
                Vector3::new(30.0, 30.0, 30.0),
            ))
            .exhaustiveness(8)
            .layout(ScreenLayout::new(dir.path(), "test").round(1))
            .input_dir(input)
            .max_concurrency(2)
            .select_top(select_top)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn round_ranks_results_and_copies_selected_ligands() {
        let dir = tempdir().unwrap();
        let input = library(
            &dir,
            &[
                ("A", Some(-5.0)),
                ("B", Some(-9.3)),
                ("C", Some(-7.1)),
                ("D", None),
            ],
        );
        let config = round_config(&dir, input, Some(2));

        let report = run(&config, CopyingEngine, None, &ProgressReporter::new())
            .await
            .unwrap();

        assert_eq!(
            report.ranking.selection.molecule_ids().collect::<Vec<_>>(),
            vec!["B", "C"]
        );
        assert_eq!(report.ranking.unranked, vec!["D"]);

        let selection_dir = config.layout.selection_dir(2);
        assert!(selection_dir.join("B.pdbqt").exists());
        assert!(selection_dir.join("C.pdbqt").exists());
        assert!(!selection_dir.join("A.pdbqt").exists());
        assert!(config.layout.logs_dir().join("log_A.txt").exists());

        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.succeeded, 3);
        assert_eq!(report.summary.skipped_for(SkipReason::NoScore), 1);
        assert_eq!(report.summary.selected, 2);
    }

    #[tokio::test]
    async fn selected_count_reflects_ligands_actually_copied() {
        let dir = tempdir().unwrap();
        let input = library(
            &dir,
            &[("A", Some(-9.0)), ("B", Some(-8.0)), ("C", Some(-7.0))],
        );
        let config = round_config(&dir, input, Some(2));

        let report = run(
            &config,
            VanishingEngine { gone: "A" },
            None,
            &ProgressReporter::new(),
        )
        .await
        .unwrap();

        assert_eq!(report.ranking.selection.len(), 2);
        let copied = report.copied.as_ref().unwrap();
        assert_eq!(copied.copied, vec![config.layout.selection_dir(2).join("B.pdbqt")]);
        assert_eq!(report.summary.skipped_for(SkipReason::MissingSource), 1);
        assert_eq!(report.summary.selected, 1);
    }

    #[tokio::test]
    async fn round_without_cut_ranks_everything_and_copies_nothing() {
        let dir = tempdir().unwrap();
        let input = library(&dir, &[("A", Some(-6.0)), ("B", Some(-8.0))]);
        let config = round_config(&dir, input, None);

        let report = run(&config, CopyingEngine, None, &ProgressReporter::new())
            .await
            .unwrap();

        assert!(report.copied.is_none());
        assert_eq!(report.ranking.selection.len(), 2);
        assert_eq!(report.summary.selected, 2);
        assert!(
            !fs::read_dir(dir.path())
                .unwrap()
                .any(|e| e.unwrap().file_name().to_string_lossy().starts_with("dock1_top"))
        );
    }

    #[tokio::test]
    async fn cancelled_round_reports_unlaunched_jobs_and_copies_nothing() {
        let dir = tempdir().unwrap();
        let input = library(&dir, &[("A", Some(-6.0)), ("B", Some(-8.0))]);
        let config = round_config(&dir, input, Some(1));
        let (sender, receiver) = watch::channel(true);

        let report = run(&config, CopyingEngine, Some(receiver), &ProgressReporter::new())
            .await
            .unwrap();
        drop(sender);

        assert!(report.batch.cancelled);
        assert!(report.copied.is_none());
        assert_eq!(report.summary.skipped_for(SkipReason::Cancelled), 2);
        assert_eq!(report.summary.selected, 0);
        assert!(report.ranking.selection.is_empty());
    }

    #[tokio::test]
    async fn missing_input_directory_is_systemic() {
        let dir = tempdir().unwrap();
        let config = round_config(&dir, dir.path().join("absent"), Some(1));

        let result = run(&config, CopyingEngine, None, &ProgressReporter::new()).await;

        assert!(matches!(result, Err(EngineError::InputDirectory { .. })));
    }
}
