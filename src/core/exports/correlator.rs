use std::collections::{HashSet, VecDeque};

use super::symbol::{ExportedSymbol, SymbolKind};

/// Default number of lines searched backwards for the import that introduced a shadow declaration.
pub const DEFAULT_CORRELATION_WINDOW: usize = 10;

#[derive(Debug, Clone)]
struct RecentImport {
    index: usize,
    name: String,
    line: Option<u32>,
}

/// Joins import lines to the shadow lines that reveal their kind.
///
/// Recent imports are kept in a sliding buffer bounded by the correlation
/// window, so resolving a shadow line never rescans the dump. A shadow line at
/// index `i` can only see imports at `i - 1` down to `i - (window - 1)`.
#[derive(Debug)]
pub struct Correlator {
    window: usize,
    recent: VecDeque<RecentImport>,
    seen: HashSet<String>,
    symbols: Vec<ExportedSymbol>,
}

impl Correlator {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::new(),
            seen: HashSet::new(),
            symbols: Vec::new(),
        }
    }

    pub fn record_import(&mut self, index: usize, name: &str, line: Option<u32>) {
        self.evict(index);
        self.recent.push_back(RecentImport {
            index,
            name: name.to_string(),
            line,
        });
    }

    /// Emit the symbol revealed by the shadow line at `index`.
    ///
    /// The declaration line is `None` when the originating import is outside
    /// the window or carried no line number. Returns false if the name was
    /// already in the catalog (an overload).
    pub fn resolve(&mut self, index: usize, name: &str, kind: &str) -> bool {
        self.evict(index);
        let line = self
            .recent
            .iter()
            .rev()
            .find(|import| import.name == name)
            .and_then(|import| import.line);

        if !self.seen.insert(name.to_string()) {
            return false;
        }
        self.symbols.push(ExportedSymbol {
            name: name.to_string(),
            kind: SymbolKind::from_dump_kind(kind),
            line,
        });
        true
    }

    /// Catalog in emission order.
    pub fn into_symbols(self) -> Vec<ExportedSymbol> {
        self.symbols
    }

    fn evict(&mut self, index: usize) {
        while let Some(front) = self.recent.front() {
            if index - front.index >= self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
    }
}
