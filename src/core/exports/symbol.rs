use std::fmt;

use serde::Serialize;

/// Kind of an exported symbol, as revealed by its shadow declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    Function,
    FunctionTemplate,
    Class,
    ClassTemplate,
    Struct,
    TypeAlias,
    Variable,
    Namespace,
    Unknown,
}

impl SymbolKind {
    /// Map a dump node kind token (`FunctionTemplate`, `CXXRecord`, `Var`, ...)
    /// onto the closed set. Anything unrecognized becomes [`SymbolKind::Unknown`].
    pub fn from_dump_kind(token: &str) -> Self {
        match token {
            "Function" | "CXXMethod" | "CXXConversion" => SymbolKind::Function,
            "FunctionTemplate" => SymbolKind::FunctionTemplate,
            "CXXRecord" | "Record" | "Class" => SymbolKind::Class,
            "ClassTemplate" | "ClassTemplateSpecialization" => SymbolKind::ClassTemplate,
            "Struct" => SymbolKind::Struct,
            "TypeAlias" | "TypeAliasTemplate" | "Typedef" => SymbolKind::TypeAlias,
            "Var" | "VarTemplate" | "Variable" => SymbolKind::Variable,
            "Namespace" | "NamespaceAlias" => SymbolKind::Namespace,
            _ => SymbolKind::Unknown,
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolKind::Function => write!(f, "function"),
            SymbolKind::FunctionTemplate => write!(f, "function-template"),
            SymbolKind::Class => write!(f, "class"),
            SymbolKind::ClassTemplate => write!(f, "class-template"),
            SymbolKind::Struct => write!(f, "struct"),
            SymbolKind::TypeAlias => write!(f, "type-alias"),
            SymbolKind::Variable => write!(f, "variable"),
            SymbolKind::Namespace => write!(f, "namespace"),
            SymbolKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// A symbol re-exported by a module interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Line of the import declaration in the module source.
    /// `None` when it could not be recovered within the correlation window.
    pub line: Option<u32>,
}
