//! Text I/O for docking engine output and screening reports.
//!
//! The result parser is the only place in the crate that looks at raw docking output; the rest
//! of the pipeline works with the typed records it produces.

pub mod pdbqt;
pub mod report;
