//! Fast export extraction straight from module source text.
//!
//! One regex per line, no comment or string awareness: a `// using std::x;`
//! line does not match because the pattern is anchored at the start of the line,
//! but a statement-shaped line inside a `/* ... */` block does. The dump-based
//! scanner in `exports` is the ground truth this is validated against.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Extracts `using <namespace>::...::name;` declarations.
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    pattern: Regex,
}

impl HeuristicExtractor {
    pub fn new(namespace: &str) -> Result<Self> {
        // Capture group 1: last identifier of the qualified name.
        let pattern = Regex::new(&format!(
            r"^\s*using\s+{}::(?:\w+::)*(\w+)\s*;",
            regex::escape(namespace)
        ))
        .with_context(|| format!("Failed to build import pattern for namespace '{}'", namespace))?;
        Ok(Self { pattern })
    }

    pub fn extract(&self, source: &str) -> BTreeSet<String> {
        source
            .lines()
            .filter_map(|line| self.pattern.captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .collect()
    }
}
