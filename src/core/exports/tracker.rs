use crate::core::dump::{DumpLine, LineClass};

/// Where the scan currently is relative to the module's export block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Outside,
    InExportBlock,
    /// Inside the export block and inside a qualifying namespace.
    InQualifyingNamespace,
}

/// Namespaces whose `using` declarations are collected.
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    pub namespace: String,
    pub nested: Vec<String>,
}

impl NamespaceFilter {
    pub fn accepts(&self, name: &str) -> bool {
        name == self.namespace || self.nested.iter().any(|n| n == name)
    }
}

/// What the scanner should do with the line it just fed to [`ScopeState::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<'a> {
    Skip,
    /// An import inside the qualifying namespace; `name` is now pending.
    Import { name: &'a str, line: Option<u32> },
    /// The shadow declaration for the pending name was found.
    Resolve { name: &'a str, kind: &'a str },
}

/// Transient state of one export scan.
#[derive(Debug, Default)]
pub struct ScopeState {
    scope: Scope,
    /// Depth of the `ExportDecl` line that opened the current block.
    export_depth: usize,
    /// Name seen in an import line, waiting for its shadow declaration.
    pending: Option<String>,
}

impl ScopeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn advance<'a>(
        &mut self,
        line: &DumpLine<'a>,
        class: &LineClass<'a>,
        namespaces: &NamespaceFilter,
    ) -> Step<'a> {
        if let LineClass::ExportMarker { own: true } = class {
            self.reset();
            self.scope = Scope::InExportBlock;
            self.export_depth = line.depth;
            return Step::Skip;
        }

        // A sibling of the ExportDecl (or anything shallower) ends the block.
        if self.scope != Scope::Outside && line.is_node() && line.depth <= self.export_depth {
            self.reset();
            return Step::Skip;
        }

        match (self.scope, class) {
            (Scope::Outside, _) => Step::Skip,
            (_, LineClass::NamespaceMarker { name: Some(name) }) if namespaces.accepts(name) => {
                self.scope = Scope::InQualifyingNamespace;
                Step::Skip
            }
            (Scope::InQualifyingNamespace, LineClass::ImportLine { name, line }) => {
                self.pending = Some((*name).to_string());
                Step::Import {
                    name: *name,
                    line: *line,
                }
            }
            (Scope::InQualifyingNamespace, LineClass::ShadowLine { kind, name })
                if self.pending.as_deref() == Some(*name) =>
            {
                self.pending = None;
                Step::Resolve {
                    name: *name,
                    kind: *kind,
                }
            }
            _ => Step::Skip,
        }
    }

    fn reset(&mut self) {
        self.scope = Scope::Outside;
        self.export_depth = 0;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dump::classify;

    fn filter() -> NamespaceFilter {
        NamespaceFilter {
            namespace: "std".to_string(),
            nested: vec!["filesystem".to_string(), "ranges".to_string()],
        }
    }

    fn feed<'a>(state: &mut ScopeState, index: usize, raw: &'a str) -> Step<'a> {
        let line = DumpLine::parse(index, raw);
        let class = classify(&line, "format", "std");
        state.advance(&line, &class, &filter())
    }

    #[test]
    fn test_starts_outside() {
        let state = ScopeState::new();
        assert_eq!(state.scope(), Scope::Outside);
        assert_eq!(state.pending(), None);
    }

    #[test]
    fn test_imports_outside_export_block_are_ignored() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "|-NamespaceDecl 0x1 <line:1:1, line:5:1> line:1:11 std");
        let step = feed(&mut state, 1, "| |-UsingDecl 0x2 <line:2:1, col:12> col:12 std::format");
        assert_eq!(step, Step::Skip);
        assert_eq!(state.scope(), Scope::Outside);
    }

    #[test]
    fn test_enter_export_then_namespace() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "`-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        assert_eq!(state.scope(), Scope::InExportBlock);
        feed(&mut state, 1, "  `-NamespaceDecl 0x2 <line:13:1, line:29:1> line:13:11 hidden std");
        assert_eq!(state.scope(), Scope::InQualifyingNamespace);
    }

    #[test]
    fn test_unrelated_namespace_does_not_qualify() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "`-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        feed(&mut state, 1, "  `-NamespaceDecl 0x2 <line:13:1, line:29:1> line:13:11 detail");
        assert_eq!(state.scope(), Scope::InExportBlock);
        let step = feed(&mut state, 2, "    |-UsingDecl 0x3 <line:15:5, col:15> col:15 std::format");
        assert_eq!(step, Step::Skip);
    }

    #[test]
    fn test_import_then_shadow_resolves() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "`-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        feed(&mut state, 1, "  `-NamespaceDecl 0x2 <line:13:1, line:29:1> line:13:11 hidden std");
        let step = feed(&mut state, 2, "    |-UsingDecl 0x3 <line:15:5, col:15> col:15 hidden std::format");
        assert_eq!(
            step,
            Step::Import {
                name: "format",
                line: Some(15)
            }
        );
        assert_eq!(state.pending(), Some("format"));

        let step = feed(&mut state, 3, "    |-UsingShadowDecl 0x4 <col:15> col:15 hidden implicit FunctionTemplate 0x5 'format'");
        assert_eq!(
            step,
            Step::Resolve {
                name: "format",
                kind: "FunctionTemplate"
            }
        );
        assert_eq!(state.pending(), None);
    }

    #[test]
    fn test_shadow_for_other_name_is_ignored() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "`-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        feed(&mut state, 1, "  `-NamespaceDecl 0x2 <line:13:1, line:29:1> line:13:11 hidden std");
        feed(&mut state, 2, "    |-UsingDecl 0x3 <line:15:5, col:15> col:15 hidden std::format");
        let step = feed(&mut state, 3, "    |-UsingShadowDecl 0x4 <col:15> col:15 implicit Function 0x5 'vformat'");
        assert_eq!(step, Step::Skip);
        assert_eq!(state.pending(), Some("format"));
    }

    #[test]
    fn test_last_sibling_closes_block_without_namespace() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "|-ExportDecl 0x1 <format.cppm:12:1, line:14:1> line:12:1 in std_module.format");
        assert_eq!(state.scope(), Scope::InExportBlock);
        feed(&mut state, 1, "`-FunctionDecl 0x2 <line:20:1, col:14> col:6 helper 'void ()'");
        assert_eq!(state.scope(), Scope::Outside);
    }

    #[test]
    fn test_closing_clears_namespace_and_pending() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "|-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        feed(&mut state, 1, "| `-NamespaceDecl 0x2 <line:13:1, line:29:1> line:13:11 hidden std");
        feed(&mut state, 2, "|   `-UsingDecl 0x3 <line:15:5, col:15> col:15 hidden std::format");
        feed(&mut state, 3, "`-NamespaceDecl 0x4 <line:40:1, line:45:1> line:40:11 std");
        assert_eq!(state.scope(), Scope::Outside);
        assert_eq!(state.pending(), None);

        // The namespace after the block must not re-qualify anything.
        let step = feed(&mut state, 4, "  |-UsingDecl 0x5 <line:41:5, col:15> col:15 std::vformat");
        assert_eq!(step, Step::Skip);
    }

    #[test]
    fn test_foreign_export_at_same_depth_closes_block() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "|-ExportDecl 0x1 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format");
        feed(&mut state, 1, "|-ExportDecl 0x2 <vector.cppm:1:1, line:3:1> line:1:1 in std_module.vector");
        assert_eq!(state.scope(), Scope::Outside);
    }

    #[test]
    fn test_nested_allow_listed_namespace_qualifies() {
        let mut state = ScopeState::new();
        feed(&mut state, 0, "`-ExportDecl 0x1 <filesystem.cppm:3:1, line:30:1> line:3:1 in std_module.format");
        feed(&mut state, 1, "  `-NamespaceDecl 0x2 <line:4:1, line:29:1> line:4:11 hidden std");
        feed(&mut state, 2, "    `-NamespaceDecl 0x3 <line:5:1, line:28:1> line:5:11 hidden filesystem");
        let step = feed(&mut state, 3, "      |-UsingDecl 0x4 <line:6:5, col:28> col:28 hidden std::filesystem::path");
        assert_eq!(
            step,
            Step::Import {
                name: "path",
                line: Some(6)
            }
        );
    }
}
