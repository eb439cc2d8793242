pub mod job;
pub mod result;
