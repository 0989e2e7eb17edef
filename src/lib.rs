//! modcov - export coverage and cross-validation for C++20 module interface units
//!
//! modcov reads the compiler's declaration dump of a module interface unit to
//! find what it really exports, checks that against a fast regex extraction of
//! the module source, and reports which exports the module's tests use.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (argument parsing, commands, reporting)
//! - `config`: Configuration file loading and parsing
//! - `core`: Analysis engine (dump parsing, export scan, reconciliation, usages)
//! - `issues`: Issue type definitions and reporting
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod issues;
pub mod utils;
