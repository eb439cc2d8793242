//! # Workflows Module
//!
//! High-level entry points that run whole stages of a screening campaign.
//!
//! ## Overview
//!
//! A campaign docks a ligand library against one receptor pocket, keeps the strongest
//! binders, re-docks them with a more thorough search, and finally extracts the best poses
//! together with a report that correlates both rounds of scores. Each workflow here wires
//! the engine components for one of those stages and returns a typed report; per-molecule
//! failures are accumulated in that report while only systemic failures are returned as
//! errors.
//!
//! ## Workflows
//!
//! - **Docking round** ([`dock`]) - builds one job per ligand, runs the batch under a
//!   concurrency ceiling, ranks the results and optionally copies the selected ligands
//!   forward.
//! - **Final analysis** ([`analyze`]) - ranks the refinement round, converts the top poses
//!   and writes the combined score report.

pub mod analyze;
pub mod dock;
