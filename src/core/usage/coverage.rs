use serde::Serialize;

use super::{UsageMap, UsageRecord};
use crate::core::exports::{ExportedSymbol, SymbolKind};

/// One exported symbol with its usages in the test file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveredSymbol {
    pub name: String,
    /// Known only when the catalog came from the declaration dump.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SymbolKind>,
    pub count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<UsageRecord>,
}

impl CoveredSymbol {
    pub fn is_used(&self) -> bool {
        self.count > 0
    }
}

/// Coverage of one module's exports by one test file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageReport {
    /// Sorted by name.
    pub symbols: Vec<CoveredSymbol>,
    pub used: usize,
    pub total: usize,
    /// `used / total`, absent when the module has no exports.
    pub ratio: Option<f64>,
}

impl CoverageReport {
    /// Build a report from located usages. `catalog` supplies kinds where available.
    pub fn new(usages: UsageMap, catalog: &[ExportedSymbol]) -> Self {
        let symbols: Vec<CoveredSymbol> = usages
            .into_iter()
            .map(|(name, usage)| CoveredSymbol {
                kind: catalog.iter().find(|s| s.name == name).map(|s| s.kind),
                name,
                count: usage.count,
                records: usage.records,
            })
            .collect();

        let used = symbols.iter().filter(|s| s.is_used()).count();
        let total = symbols.len();
        let ratio = (total > 0).then(|| used as f64 / total as f64);

        Self {
            symbols,
            used,
            total,
            ratio,
        }
    }

    pub fn percent(&self) -> Option<f64> {
        self.ratio.map(|r| r * 100.0)
    }

    pub fn unused(&self) -> impl Iterator<Item = &CoveredSymbol> {
        self.symbols.iter().filter(|s| !s.is_used())
    }
}
