//! Authoritative export extraction from a module's declaration dump.
//!
//! A single forward scan drives two pieces:
//!
//! - `tracker`: the scope state machine (outside / in export block / in a
//!   qualifying namespace) and the pending import name
//! - `correlator`: joins each pending import to the shadow declaration that
//!   reveals its kind, recovering the import's source line from a bounded window
//!
//! The dump pattern being recognized looks like:
//!
//! ```text
//! `-ExportDecl 0x... <format.cppm:12:1, line:30:1> line:12:1 in std_module.format
//!   `-NamespaceDecl 0x... <line:13:1, line:29:1> line:13:11 in std_module.format hidden std
//!     |-UsingDecl 0x... <line:15:5, col:15> col:15 in std_module.format hidden std::format
//!     |-UsingShadowDecl 0x... <col:15> col:15 hidden implicit FunctionTemplate 0x... 'format'
//! ```

pub mod correlator;
pub mod symbol;
pub mod tracker;

use std::collections::BTreeSet;

pub use correlator::{Correlator, DEFAULT_CORRELATION_WINDOW};
pub use symbol::{ExportedSymbol, SymbolKind};
pub use tracker::{NamespaceFilter, Scope, ScopeState, Step};

use crate::core::dump::{LineClass, classify, parse_dump};

/// Parameters of one export scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Module name the export block must mention (usually the file stem).
    pub module_name: String,
    pub namespaces: NamespaceFilter,
    pub window: usize,
}

/// Result of scanning one dump.
#[derive(Debug, Clone, Default)]
pub struct ExportScan {
    /// Deduplicated catalog, sorted by name.
    pub symbols: Vec<ExportedSymbol>,
    /// Number of lines carrying a node kind.
    pub node_lines: usize,
    /// Number of export blocks for this module.
    pub export_blocks: usize,
}

impl ExportScan {
    /// True when the dump contained no nodes at all: nothing can be concluded.
    pub fn is_inconclusive(&self) -> bool {
        self.node_lines == 0
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn names(&self) -> BTreeSet<String> {
        self.symbols.iter().map(|s| s.name.clone()).collect()
    }

    /// Symbols whose declaration line could not be recovered.
    pub fn gaps(&self) -> impl Iterator<Item = &ExportedSymbol> {
        self.symbols.iter().filter(|s| s.line.is_none())
    }
}

pub fn scan_exports(dump: &str, options: &ScanOptions) -> ExportScan {
    let mut state = ScopeState::new();
    let mut correlator = Correlator::new(options.window);
    let mut node_lines = 0;
    let mut export_blocks = 0;

    for line in parse_dump(dump) {
        if !line.is_node() {
            continue;
        }
        node_lines += 1;

        let class = classify(&line, &options.module_name, &options.namespaces.namespace);
        if let LineClass::ExportMarker { own: true } = class {
            export_blocks += 1;
        }

        match state.advance(&line, &class, &options.namespaces) {
            Step::Skip => {}
            Step::Import { name, line: decl_line } => {
                correlator.record_import(line.index, name, decl_line);
            }
            Step::Resolve { name, kind } => {
                correlator.resolve(line.index, name, kind);
            }
        }
    }

    let mut symbols = correlator.into_symbols();
    symbols.sort_by(|a, b| a.name.cmp(&b.name));

    ExportScan {
        symbols,
        node_lines,
        export_blocks,
    }
}
