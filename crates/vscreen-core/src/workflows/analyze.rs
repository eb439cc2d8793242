use crate::core::io::pdbqt;
use crate::core::io::report::ScoreReportWriter;
use crate::engine::config::AnalysisConfig;
use crate::engine::convert::PoseConverter;
use crate::engine::error::EngineError;
use crate::engine::jobs::ensure_dir;
use crate::engine::materialize::{ExtractionReport, ExtractionSettings, extract_and_convert};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{RankedSelection, Ranking, rank};
use crate::engine::results::collect_from_dir;
use crate::engine::summary::{BatchSummary, Skip};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub ranking: Ranking,
    pub extraction: ExtractionReport,
    /// Data rows written to the score report (header excluded).
    pub rows: usize,
    pub skips: Vec<Skip>,
    pub summary: BatchSummary,
}

/// Ranks the refinement round, extracts and converts the top poses, and writes the combined
/// score report.
///
/// The report is rewritten from scratch on every call; only molecules whose pose converted
/// cleanly appear in it.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    config: &AnalysisConfig,
    converter: &impl PoseConverter,
    reporter: &ProgressReporter<'_>,
) -> Result<AnalysisReport, EngineError> {
    // === Phase 1: Rank the refinement round ===
    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let collected = collect_from_dir(&config.round_two_results, &config.result_extension)?;
    let mut summary = BatchSummary::new(collected.results.len());
    summary.succeeded = collected.scored();
    let mut skips = collected.skips;
    let ranking = rank(collected.results, config.top_poses);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Correlate with the first round ===
    let round_one_scores = round_one_scores(
        &ranking.selection,
        &config.round_one_results,
        &config.result_extension,
    );

    // === Phase 3: Pose extraction and conversion ===
    reporter.report(Progress::PhaseStart { name: "Extraction" });
    if let Some(parent) = config.scores_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let mut writer = ScoreReportWriter::create(&config.scores_file)?;
    let extraction = extract_and_convert(
        &ranking.selection,
        converter,
        ExtractionSettings {
            dest_dir: &config.final_poses_dir,
            pose_extension: &config.result_extension,
            target_format: &config.target_format,
            bond_order_warning: &config.bond_order_warning,
        },
        &round_one_scores,
        &mut writer,
    )?;
    let rows = writer.finish()?;
    reporter.report(Progress::PhaseFinish);

    skips.extend(extraction.skips.iter().cloned());
    summary.record_skips(&skips);
    summary.selected = extraction.kept().count();

    info!(
        "Analysis finished: {}. Wrote {} row(s) to {:?}.",
        summary, rows, config.scores_file
    );
    reporter.report(Progress::Message(format!("Analysis: {}", summary)));

    Ok(AnalysisReport {
        ranking,
        extraction,
        rows,
        skips,
        summary,
    })
}

/// Reads the first-round score of every selected molecule. Molecules without a readable
/// first-round score are simply absent from the map.
fn round_one_scores(
    selection: &RankedSelection,
    results_dir: &Path,
    extension: &str,
) -> HashMap<String, f64> {
    selection
        .molecule_ids()
        .filter_map(|id| {
            let path = results_dir.join(format!("{}.{}", id, extension));
            match pdbqt::read_from_path(&path).map(|parsed| parsed.score) {
                Ok(Some(score)) => Some((id.to_string(), score)),
                Ok(None) => {
                    debug!("No first-round score recorded for molecule '{}'.", id);
                    None
                }
                Err(e) if e.is_not_found() => {
                    debug!("No first-round result file for molecule '{}'.", id);
                    None
                }
                Err(e) => {
                    warn!("First-round result for molecule '{}' unreadable: {}", id, e);
                    None
                }
            }
        })
        .collect()
}
