//! # vscreen Core Library
//!
//! Orchestration and result ranking for two-round virtual screening campaigns driven by an
//! external docking engine (AutoDock Vina and compatible programs such as PSOVina).
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split used throughout the project:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`JobDescriptor`, `JobResult`,
//!   `CombinedScoreRecord`) and narrow text-format I/O (the docking result parser and the
//!   combined score report writer).
//!
//! - **[`engine`]: The Logic Core.** Configuration, the job descriptor builder, the bounded
//!   process scheduler, result collection, ranking and selection, and materialization of the
//!   selected subset. Per-item failures are values here; only systemic failures are errors.
//!
//! - **[`workflows`]: The Public API.** Complete procedures built from the engine: a single
//!   docking round and the final pose analysis.

pub mod core;
pub mod engine;
pub mod workflows;
