//! # Engine Module
//!
//! The stateful layer of vscreen: everything between "a directory of ligands" and "a ranked,
//! persisted selection".
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Docking geometry, round layout and analysis settings
//! - **Job Descriptors** ([`jobs`]) - Enumerating input files into immutable job descriptors
//! - **Launchers** ([`launcher`]) - Turning a descriptor into an external docking command
//! - **Scheduling** ([`scheduler`]) - Bounded-parallel execution of external processes
//! - **Result Collection** ([`results`]) - Parsing finished jobs into typed results
//! - **Ranking** ([`ranking`]) - Stable score ordering and bounded selection
//! - **Conversion** ([`convert`]) - The external format converter seam
//! - **Materialization** ([`materialize`]) - Copying selections and extracting top poses
//! - **Accounting** ([`summary`]) - Categorized skips and the end-of-batch summary
//! - **Progress Monitoring** ([`progress`]) - Progress events for front ends
//! - **Error Handling** ([`error`]) - Systemic failures that abort a run
//!
//! Per-molecule problems (a crashed job, an unparsable result, a vanished source file, a
//! suspicious conversion) never surface as errors here; they are recorded as [`summary::Skip`]
//! values and reported alongside the success counts.

pub mod config;
pub mod convert;
pub mod error;
pub mod jobs;
pub mod launcher;
pub mod materialize;
pub mod progress;
pub mod ranking;
pub mod results;
pub mod scheduler;
pub mod summary;
