//! Set comparison between the dump catalog and the heuristic name set.

use std::collections::BTreeSet;

use serde::Serialize;

/// Outcome of comparing the authoritative and heuristic export sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub authoritative: BTreeSet<String>,
    pub heuristic: BTreeSet<String>,
    pub both: BTreeSet<String>,
    pub only_authoritative: BTreeSet<String>,
    pub only_heuristic: BTreeSet<String>,
    /// |both| / max(|authoritative|, |heuristic|); 1.0 when both sets are empty.
    pub match_ratio: f64,
}

impl Reconciliation {
    pub fn compare(authoritative: &BTreeSet<String>, heuristic: &BTreeSet<String>) -> Self {
        let both: BTreeSet<String> = authoritative.intersection(heuristic).cloned().collect();
        let only_authoritative = authoritative.difference(heuristic).cloned().collect();
        let only_heuristic = heuristic.difference(authoritative).cloned().collect();

        let larger = authoritative.len().max(heuristic.len());
        let match_ratio = if larger == 0 {
            1.0
        } else {
            both.len() as f64 / larger as f64
        };

        Self {
            authoritative: authoritative.clone(),
            heuristic: heuristic.clone(),
            both,
            only_authoritative,
            only_heuristic,
            match_ratio,
        }
    }

    /// Pass iff neither side has names the other lacks. The ratio plays no part.
    pub fn is_exact(&self) -> bool {
        self.only_authoritative.is_empty() && self.only_heuristic.is_empty()
    }

    pub fn match_percent(&self) -> f64 {
        self.match_ratio * 100.0
    }
}
