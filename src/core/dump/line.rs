use regex::Regex;
use std::sync::LazyLock;

/// Root node of every dump.
pub const ROOT_KIND: &str = "TranslationUnitDecl";

/// Characters the compiler uses to draw the tree in front of each node.
const TREE_GLYPHS: &[char] = &[' ', '|', '`', '-'];

// Source locations printed in a node header, in the compiler's elided form:
// - <invalid sloc>
// - line:15:3        (same file as the previous location, new line)
// - col:7            (same file and line as the previous location)
// - format.cppm:12:1 (file changed)
// Alternatives are ordered so `line:`/`col:` win over the file form.
static LOCATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<invalid sloc>|\bline:(\d+):(\d+)|\bcol:(\d+)|([^\s<>,']+):(\d+):(\d+)").unwrap()
});

static QUALIFIED_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_]\w*(?:::[A-Za-z_~]\w*)*$").unwrap()
});

static QUOTED_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'([^']*)'").unwrap());

/// A source location as printed by the dumper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLoc<'a> {
    Invalid,
    File { path: &'a str, line: u32, col: u32 },
    Line { line: u32, col: u32 },
    Col { col: u32 },
}

impl SourceLoc<'_> {
    pub fn line(&self) -> Option<u32> {
        match self {
            SourceLoc::File { line, .. } | SourceLoc::Line { line, .. } => Some(*line),
            SourceLoc::Invalid | SourceLoc::Col { .. } => None,
        }
    }
}

/// One line of a declaration dump.
///
/// Borrowed from the dump text; nothing is allocated except the location list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpLine<'a> {
    /// Zero-based index of the line in the dump.
    pub index: usize,
    pub raw: &'a str,
    /// Nesting depth derived from the tree-drawing prefix (two glyphs per level).
    pub depth: usize,
    /// True when the prefix ends in `` `- ``, i.e. the node is the last child of its parent.
    pub last_sibling: bool,
    /// Node kind token (`ExportDecl`, `UsingDecl`, ...). Only set when the token is
    /// followed by a node address, or is the root. `None` for `<<<NULL>>>`, compiler
    /// diagnostics and address-less detail lines.
    pub kind: Option<&'a str>,
    /// Everything after the node kind token.
    pub rest: &'a str,
    /// Locations found in the header (the part of `rest` before the first quote).
    pub locations: Vec<SourceLoc<'a>>,
}

impl<'a> DumpLine<'a> {
    pub fn parse(index: usize, raw: &'a str) -> Self {
        let body = raw.trim_start_matches(TREE_GLYPHS);
        let prefix = &raw[..raw.len() - body.len()];

        let kind_len = body
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_alphanumeric() || *c == '_') || (*i == 0 && c.is_ascii_digit()))
            .map_or(body.len(), |(i, _)| i);

        let (kind, rest) = match body.split_at(kind_len) {
            (kind, rest) if kind == ROOT_KIND || (!kind.is_empty() && has_address(rest)) => {
                (Some(kind), rest)
            }
            _ => (None, body),
        };

        let header = rest.split('\'').next().unwrap_or(rest);
        let locations = LOCATION_REGEX
            .captures_iter(header)
            .filter_map(|caps| {
                let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
                if let (Some(line), Some(col)) = (num(1), num(2)) {
                    Some(SourceLoc::Line { line, col })
                } else if let Some(col) = num(3) {
                    Some(SourceLoc::Col { col })
                } else if let (Some(path), Some(line), Some(col)) = (caps.get(4), num(5), num(6)) {
                    Some(SourceLoc::File {
                        path: path.as_str(),
                        line,
                        col,
                    })
                } else {
                    Some(SourceLoc::Invalid)
                }
            })
            .collect();

        Self {
            index,
            raw,
            depth: prefix.len() / 2,
            last_sibling: prefix.ends_with("`-"),
            kind,
            rest,
            locations,
        }
    }

    pub fn is_node(&self) -> bool {
        self.kind.is_some()
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.kind == Some(kind)
    }

    /// First line number embedded in the header (`line:<N>` or `<file>:<N>:<col>`).
    pub fn line_number(&self) -> Option<u32> {
        self.locations.iter().find_map(SourceLoc::line)
    }

    /// Last whitespace-separated token of the line, if it is a (possibly qualified) name.
    pub fn trailing_name(&self) -> Option<&'a str> {
        let token = self.rest.split_whitespace().next_back()?;
        QUALIFIED_NAME_REGEX.is_match(token).then_some(token)
    }

    /// Contents of the first single-quoted string after the node kind.
    pub fn first_quoted(&self) -> Option<&'a str> {
        QUOTED_REGEX
            .captures(self.rest)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// A node header continues with ` 0x<hex>` after its kind.
fn has_address(rest: &str) -> bool {
    let trimmed = rest.trim_start();
    trimmed.len() < rest.len()
        && trimmed
            .strip_prefix("0x")
            .is_some_and(|hex| hex.starts_with(|c: char| c.is_ascii_hexdigit()))
}

/// Lazily split a dump into lines. An empty dump yields an empty sequence.
pub fn parse_dump(dump: &str) -> impl Iterator<Item = DumpLine<'_>> {
    dump.lines()
        .enumerate()
        .map(|(index, raw)| DumpLine::parse(index, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_line() {
        let line = DumpLine::parse(0, "TranslationUnitDecl 0x5581 <<invalid sloc>> <invalid sloc>");
        assert_eq!(line.depth, 0);
        assert!(!line.last_sibling);
        assert_eq!(line.kind, Some("TranslationUnitDecl"));
        assert_eq!(line.locations, vec![SourceLoc::Invalid, SourceLoc::Invalid]);
        assert_eq!(line.line_number(), None);
    }

    #[test]
    fn test_export_decl_line() {
        let line = DumpLine::parse(
            7,
            "`-ExportDecl 0x55d0 <format.cppm:12:1, line:30:1> line:12:1 in std_module.format",
        );
        assert_eq!(line.index, 7);
        assert_eq!(line.depth, 1);
        assert!(line.last_sibling);
        assert_eq!(line.kind, Some("ExportDecl"));
        assert_eq!(
            line.locations,
            vec![
                SourceLoc::File {
                    path: "format.cppm",
                    line: 12,
                    col: 1
                },
                SourceLoc::Line { line: 30, col: 1 },
                SourceLoc::Line { line: 12, col: 1 },
            ]
        );
        assert_eq!(line.line_number(), Some(12));
        assert_eq!(line.trailing_name(), None);
    }

    #[test]
    fn test_using_decl_line() {
        let line = DumpLine::parse(
            3,
            "    |-UsingDecl 0x55d1 <line:15:5, col:15> col:15 in std_module.format hidden std::format",
        );
        assert_eq!(line.depth, 3);
        assert!(!line.last_sibling);
        assert_eq!(line.kind, Some("UsingDecl"));
        assert_eq!(line.line_number(), Some(15));
        assert_eq!(line.trailing_name(), Some("std::format"));
    }

    #[test]
    fn test_quoted_text_is_not_a_location() {
        let line = DumpLine::parse(
            0,
            "| `-VarDecl 0x1 <col:3, col:20> col:20 used v 'std::map<int, int>':'x:1:2'",
        );
        assert_eq!(
            line.locations,
            vec![
                SourceLoc::Col { col: 3 },
                SourceLoc::Col { col: 20 },
                SourceLoc::Col { col: 20 }
            ]
        );
        assert_eq!(line.first_quoted(), Some("std::map<int, int>"));
    }

    #[test]
    fn test_line_without_kind() {
        let line = DumpLine::parse(0, "| | `-<<<NULL>>>");
        assert_eq!(line.depth, 3);
        assert!(line.last_sibling);
        assert!(!line.is_node());
    }

    #[test]
    fn test_empty_dump_yields_nothing() {
        assert_eq!(parse_dump("").count(), 0);
    }

    #[test]
    fn test_parse_dump_indexes_lines() {
        let lines: Vec<_> = parse_dump("A 0x1\n|-B 0x2\n`-C 0x3").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].index, 2);
        assert_eq!(lines[2].kind, Some("C"));
    }

    #[test]
    fn test_diagnostics_are_not_nodes() {
        for raw in [
            "error: module 'std_module.base' not found",
            "1 error generated.",
            "In file included from format.cppm:1:",
            "| `-TemplateArgument type 'int'",
            "Function 0x",
        ] {
            assert!(!DumpLine::parse(0, raw).is_node(), "{}", raw);
        }
    }

    #[test]
    fn test_root_without_address_is_a_node() {
        assert!(DumpLine::parse(0, "TranslationUnitDecl <<invalid sloc>>").is_node());
    }
}
