//! Locating usages of exported symbols in test code.
//!
//! Two interchangeable strategies implement [`LocateUsages`]:
//!
//! - `fast`: whole-word count of qualified names (`std::name`) in the test text
//! - `tree`: walk of the test file's declaration dump, classifying each node
//!   as a call, a reference or a variable-declaration type
//!
//! Both produce a [`UsageMap`] that `coverage` turns into a report.

pub mod coverage;
pub mod fast;
pub mod tree;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::Path,
};

use anyhow::Result;
use clap::ValueEnum;
use enum_dispatch::enum_dispatch;
use serde::Serialize;

pub use coverage::{CoverageReport, CoveredSymbol};
pub use fast::FastLocator;
pub use tree::TreeLocator;

/// How a symbol was used at one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Call,
    Reference,
    Declaration,
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageKind::Call => write!(f, "call"),
            UsageKind::Reference => write!(f, "reference"),
            UsageKind::Declaration => write!(f, "declaration"),
        }
    }
}

/// One usage site found in a test file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub symbol: String,
    pub kind: UsageKind,
    pub line: u32,
    /// First few tokens of the source line. May be empty.
    pub context: String,
}

/// Usages of one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymbolUsage {
    pub count: usize,
    /// Per-site detail. Empty for the fast strategy.
    pub records: Vec<UsageRecord>,
}

impl SymbolUsage {
    pub fn push(&mut self, record: UsageRecord) {
        self.count += 1;
        self.records.push(record);
    }
}

pub type UsageMap = BTreeMap<String, SymbolUsage>;

/// The test file being searched.
#[derive(Debug, Clone, Copy)]
pub struct TestInput<'a> {
    pub path: &'a Path,
    pub source: &'a str,
    /// Declaration dump of the test file, required by the tree strategy.
    pub dump: Option<&'a str>,
}

#[enum_dispatch]
pub trait LocateUsages {
    /// Find usages of `symbols` in `input`. Every symbol gets an entry, used or not.
    fn locate(&self, symbols: &BTreeSet<String>, input: &TestInput<'_>) -> Result<UsageMap>;

    /// Whether [`TestInput::dump`] must be provided.
    fn needs_dump(&self) -> bool {
        false
    }
}

#[enum_dispatch(LocateUsages)]
#[derive(Debug, Clone)]
pub enum Locator {
    Fast(FastLocator),
    Tree(TreeLocator),
}

/// Usage strategy selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStrategy {
    /// Count qualified occurrences in the test source
    #[default]
    Fast,
    /// Walk the compiler's dump of the test file
    Tree,
}

impl fmt::Display for UsageStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageStrategy::Fast => write!(f, "fast"),
            UsageStrategy::Tree => write!(f, "tree"),
        }
    }
}

/// First `limit` whitespace-separated tokens of a 1-based source line.
pub fn line_context(source: &str, line: u32, limit: usize) -> String {
    let Some(text) = (line as usize)
        .checked_sub(1)
        .and_then(|idx| source.lines().nth(idx))
    else {
        return String::new();
    };
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}
