//! # Core Module
//!
//! Data models and text-format I/O shared by every stage of a screening campaign.
//!
//! - **Job and Result Models** ([`models`]) - Job descriptors, docking geometry, parsed results
//!   and the combined score record
//! - **File I/O** ([`io`]) - The docking result (PDBQT) parser and the score report writer
//!
//! Nothing in this module spawns processes or touches more than one file at a time; the
//! [`crate::engine`] layer composes these pieces into batches.

pub mod io;
pub mod models;
