//! Core analysis engine.
//!
//! ## Module Structure
//!
//! - `dump`: declaration dump tokenizer and line classifier
//! - `exports`: authoritative export scan (scope tracker + correlator)
//! - `heuristic`: regex extraction from module source
//! - `reconcile`: set comparison of the two export sets
//! - `usage`: usage locators (fast text count, dump walk) and coverage
//! - `source`: where dumps come from (compiler, dump directory)
//! - `file_scanner`: module discovery
//! - `context`: merged configuration for one run
//! - `pipeline`: per-module validation and coverage, run in parallel

pub mod context;
pub mod dump;
pub mod exports;
pub mod file_scanner;
pub mod heuristic;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod usage;

pub use context::AnalysisContext;
pub use pipeline::{
    CoverageOptions, CoverageStatus, CoverageTotals, ExportsSource, ModuleCoverage,
    ModuleValidation, ValidationStatus,
};
