use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

use super::{LocateUsages, SymbolUsage, TestInput, UsageMap};

/// Counts `<namespace>::name` occurrences (including through nested
/// namespaces, e.g. `std::filesystem::path`) as whole words.
#[derive(Debug, Clone)]
pub struct FastLocator {
    pub namespace: String,
}

impl FastLocator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    fn pattern_for(&self, symbol: &str) -> Result<Regex> {
        Regex::new(&format!(
            r"\b{}::(?:\w+::)*{}\b",
            regex::escape(&self.namespace),
            regex::escape(symbol)
        ))
        .with_context(|| format!("Failed to build usage pattern for '{}'", symbol))
    }
}

impl LocateUsages for FastLocator {
    fn locate(&self, symbols: &BTreeSet<String>, input: &TestInput<'_>) -> Result<UsageMap> {
        symbols
            .iter()
            .map(|symbol| {
                let count = self.pattern_for(symbol)?.find_iter(input.source).count();
                Ok((
                    symbol.clone(),
                    SymbolUsage {
                        count,
                        records: Vec::new(),
                    },
                ))
            })
            .collect()
    }
}
