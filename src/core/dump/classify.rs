use regex::Regex;
use std::sync::LazyLock;

use super::line::DumpLine;

pub const EXPORT_DECL: &str = "ExportDecl";
pub const NAMESPACE_DECL: &str = "NamespaceDecl";
pub const USING_DECL: &str = "UsingDecl";
pub const USING_SHADOW_DECL: &str = "UsingShadowDecl";

// |-UsingShadowDecl 0x... <col:5, col:16> col:16 implicit FunctionTemplate 0x... 'format'
// Capture group 1: target kind, group 2: first quoted identifier after it.
static SHADOW_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bimplicit\s+(\w+)\s+.*?'(\w+)'").unwrap());

/// What a dump line means to the export scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// `ExportDecl`. `own` is true when the line names the module being scanned.
    ExportMarker { own: bool },
    /// `NamespaceDecl` with its name (anonymous namespaces have none).
    NamespaceMarker { name: Option<&'a str> },
    /// `UsingDecl` importing `<namespace>::...::name`.
    ImportLine { name: &'a str, line: Option<u32> },
    /// Implicit `UsingShadowDecl` revealing the kind of `name`.
    ShadowLine { kind: &'a str, name: &'a str },
    Other,
}

/// Classify a single dump line for the module `module_name`, whose imports
/// are qualified by `namespace`.
pub fn classify<'a>(line: &DumpLine<'a>, module_name: &str, namespace: &str) -> LineClass<'a> {
    match line.kind {
        Some(EXPORT_DECL) => LineClass::ExportMarker {
            own: owned_by(line, module_name),
        },
        Some(NAMESPACE_DECL) => LineClass::NamespaceMarker {
            name: namespace_name(line),
        },
        Some(USING_DECL) => import_line(line, namespace).unwrap_or(LineClass::Other),
        Some(USING_SHADOW_DECL) => SHADOW_REGEX
            .captures(line.rest)
            .and_then(|caps| Some((caps.get(1)?, caps.get(2)?)))
            .map_or(LineClass::Other, |(kind, name)| LineClass::ShadowLine {
                kind: kind.as_str(),
                name: name.as_str(),
            }),
        _ => LineClass::Other,
    }
}

/// The `in <module>` owner token names `module_name`, either exactly or as the
/// last dotted segment (`std_module.format` for `format`).
fn owned_by(line: &DumpLine<'_>, module_name: &str) -> bool {
    let Some(owner) = line.rest.split_whitespace().skip_while(|t| *t != "in").nth(1) else {
        return false;
    };
    owner == module_name
        || owner
            .strip_suffix(module_name)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn namespace_name<'a>(line: &DumpLine<'a>) -> Option<&'a str> {
    let mut tokens = line.rest.split_whitespace().rev();
    let last = tokens.next()?;
    // inline namespaces print the flag after the name
    let name = if last == "inline" { tokens.next()? } else { last };
    is_identifier(name).then_some(name)
}

fn import_line<'a>(line: &DumpLine<'a>, namespace: &str) -> Option<LineClass<'a>> {
    let qualified = line.trailing_name()?;
    let tail = qualified.strip_prefix(namespace)?.strip_prefix("::")?;
    let name = tail.rsplit("::").next()?;
    is_identifier(name).then_some(LineClass::ImportLine {
        name,
        line: line.line_number(),
    })
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
