//! Outcome-based assessment engine.
//!
//! Raw assessment scores roll up into learning outcome (LO) percentages, LO
//! percentages roll up into program outcome (PO) percentages, and PO
//! percentages feed a per-student summary with achievement levels. Storage is
//! abstracted behind [`catalog::OutcomeStore`]; every computation re-reads the
//! store and never writes to it.

pub mod achievements;
pub mod catalog;
pub mod config;
pub mod error;
pub mod scoring;
pub mod telemetry;
