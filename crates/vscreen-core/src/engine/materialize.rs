use super::convert::PoseConverter;
use super::error::EngineError;
use super::jobs::ensure_dir;
use super::ranking::{RankedEntry, RankedSelection};
use super::summary::{Skip, SkipReason};
use crate::core::io::report::ScoreReportWriter;
use crate::core::models::result::CombinedScoreRecord;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Infix marking the pose file written ahead of conversion.
const TRANSIENT_POSE_TAG: &str = "pose";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CopyReport {
    pub copied: Vec<PathBuf>,
    pub skips: Vec<Skip>,
}

/// Copies the original input artifact (`{source_dir}/{id}.{extension}`) of every selected
/// molecule into `dest_dir`.
///
/// A source that has vanished is skipped and reported. Failing to create or write the
/// destination aborts the copy.
pub fn copy_selection(
    selection: &RankedSelection,
    source_dir: &Path,
    extension: &str,
    dest_dir: &Path,
) -> Result<CopyReport, EngineError> {
    ensure_dir(dest_dir)?;

    let mut report = CopyReport::default();
    for entry in selection.iter() {
        let file_name = format!("{}.{}", entry.molecule_id, extension);
        let source = source_dir.join(&file_name);
        let dest = dest_dir.join(&file_name);

        match fs::copy(&source, &dest) {
            Ok(_) => {
                debug!("Copied {:?} -> {:?}", source, dest);
                report.copied.push(dest);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !source.exists() => {
                warn!(
                    "Source file for selected molecule '{}' is missing: {:?}",
                    entry.molecule_id, source
                );
                report.skips.push(
                    Skip::new(&entry.molecule_id, SkipReason::MissingSource)
                        .with_detail(source.display().to_string()),
                );
            }
            Err(e) => {
                return Err(EngineError::Write {
                    path: dest,
                    source: e,
                });
            }
        }
    }

    info!(
        "Copied {} of {} selected file(s) to {:?}.",
        report.copied.len(),
        selection.len(),
        dest_dir
    );
    Ok(report)
}

/// Settings for turning selected poses into converted structure files.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSettings<'a> {
    pub dest_dir: &'a Path,
    /// Extension of the transient pose files, matching the docking output format.
    pub pose_extension: &'a str,
    pub target_format: &'a str,
    pub bond_order_warning: &'a str,
}

/// Terminal state of one selected molecule in the extract-and-convert pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoseFate {
    /// Converted cleanly; the converted file is kept and a report row was written.
    Kept { path: PathBuf },
    /// Dropped; no artifact remains and no report row was written.
    Discarded { reason: SkipReason },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionReport {
    /// Fate of every selected molecule, in selection order.
    pub fates: Vec<(String, PoseFate)>,
    pub skips: Vec<Skip>,
}

impl ExtractionReport {
    pub fn kept(&self) -> impl Iterator<Item = &Path> {
        self.fates.iter().filter_map(|(_, fate)| match fate {
            PoseFate::Kept { path } => Some(path.as_path()),
            PoseFate::Discarded { .. } => None,
        })
    }
}

/// Writes each selected pose to a transient file, converts it, and keeps or discards the
/// result based on the converter's diagnostics.
///
/// Per molecule the pipeline runs `Selected -> PoseWritten -> Converted`. A conversion that
/// reports the bond-order warning, or fails, removes both files and writes no report row. A
/// clean conversion keeps the converted file, removes the transient pose, and appends a row
/// pairing the round-one score (if known) with the selected round-two score. Nothing is
/// retried.
pub fn extract_and_convert(
    selection: &RankedSelection,
    converter: &impl PoseConverter,
    settings: ExtractionSettings<'_>,
    round_one_scores: &HashMap<String, f64>,
    report: &mut ScoreReportWriter,
) -> Result<ExtractionReport, EngineError> {
    ensure_dir(settings.dest_dir)?;

    let mut extraction = ExtractionReport::default();
    for entry in selection.iter() {
        let fate = extract_one(entry, converter, &settings, round_one_scores, report)?;
        if let PoseFate::Discarded { reason } = &fate {
            extraction
                .skips
                .push(Skip::new(&entry.molecule_id, *reason));
        }
        extraction.fates.push((entry.molecule_id.clone(), fate));
    }

    info!(
        "Kept {} of {} selected pose(s) in {:?}.",
        extraction.kept().count(),
        selection.len(),
        settings.dest_dir
    );
    Ok(extraction)
}

fn extract_one(
    entry: &RankedEntry,
    converter: &impl PoseConverter,
    settings: &ExtractionSettings<'_>,
    round_one_scores: &HashMap<String, f64>,
    report: &mut ScoreReportWriter,
) -> Result<PoseFate, EngineError> {
    let Some(pose) = &entry.pose else {
        warn!(
            "Molecule '{}' was selected but has no complete pose; skipping.",
            entry.molecule_id
        );
        return Ok(PoseFate::Discarded {
            reason: SkipReason::MissingPose,
        });
    };

    // The transient name must never collide with the converted file, even when the target
    // format shares the pose extension.
    let pose_path = settings.dest_dir.join(format!(
        "{}.{}.{}",
        entry.molecule_id, TRANSIENT_POSE_TAG, settings.pose_extension
    ));
    let converted_path = settings.dest_dir.join(format!(
        "{}.{}",
        entry.molecule_id, settings.target_format
    ));

    write_pose(&pose_path, |writer| pose.write_to(writer))?;

    let conversion = converter.convert(&pose_path, &converted_path)?;

    let discard_reason = if conversion.diagnostics.contains(settings.bond_order_warning) {
        Some(SkipReason::BondOrderWarning)
    } else if !conversion.success {
        Some(SkipReason::ConversionFailed)
    } else {
        None
    };

    remove_if_present(&pose_path)?;

    if let Some(reason) = discard_reason {
        remove_if_present(&converted_path)?;
        warn!(
            "Discarding pose of molecule '{}': {}.",
            entry.molecule_id, reason
        );
        return Ok(PoseFate::Discarded { reason });
    }

    report.append(&CombinedScoreRecord {
        molecule_id: entry.molecule_id.clone(),
        round_one: round_one_scores.get(&entry.molecule_id).copied(),
        round_two: entry.score,
    })?;
    debug!(
        "Kept converted pose of molecule '{}' at {:?} (row {} of {:?})",
        entry.molecule_id,
        converted_path,
        report.rows(),
        report.path()
    );
    Ok(PoseFate::Kept {
        path: converted_path,
    })
}

fn write_pose(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> Result<(), EngineError> {
    let to_error = |source| EngineError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(to_error)?;
    writer.flush().map_err(to_error)
}

fn remove_if_present(path: &Path) -> Result<(), EngineError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(EngineError::Write {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
