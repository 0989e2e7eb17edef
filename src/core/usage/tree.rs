use std::{collections::BTreeSet, path::Path, sync::LazyLock};

use anyhow::{Result, bail};
use regex::Regex;

use super::{LocateUsages, SymbolUsage, TestInput, UsageKind, UsageMap, UsageRecord, line_context};
use crate::core::dump::{DumpLine, SourceLoc, parse_dump};

/// Node kinds whose first child subtree is the callee.
const CALL_KINDS: &[&str] = &["CallExpr", "CXXMemberCallExpr", "CXXOperatorCallExpr"];
const DECL_REF_EXPR: &str = "DeclRefExpr";
const MEMBER_EXPR: &str = "MemberExpr";
const UNRESOLVED_LOOKUP_EXPR: &str = "UnresolvedLookupExpr";
const UNRESOLVED_MEMBER_EXPR: &str = "UnresolvedMemberExpr";
const DEPENDENT_MEMBER_EXPR: &str = "CXXDependentScopeMemberExpr";
const VAR_DECL: &str = "VarDecl";

/// Default number of source tokens kept as usage context.
pub const DEFAULT_CONTEXT_TOKENS: usize = 10;

// ... lvalue Function 0x55d0c8a02000 'format' 'std::string (...)'
// Capture group 1: the referenced declaration's name.
static DECL_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\w*\s+0x[0-9a-fA-F]+\s+'([^']+)'").unwrap());

// ... '<bound member function type>' .push_back 0x55d0c8a02000
static MEMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.|->)([A-Za-z_~]\w*)\s+0x[0-9a-fA-F]+").unwrap());

// ... '<overloaded function type>' lvalue (ADL) = 'format' 0x55d0c8a02000
static UNRESOLVED_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"=\s*'([^']+)'").unwrap());

// ... '<dependent type>' lvalue .push_back
static DEPENDENT_MEMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.|->)([A-Za-z_~]\w*)\s*$").unwrap());

const TYPE_QUALIFIERS: &[&str] = &["const ", "volatile ", "struct ", "class ", "enum ", "union "];

/// Classifies usages by walking the declaration dump of the test file.
#[derive(Debug, Clone)]
pub struct TreeLocator {
    pub context_tokens: usize,
}

impl Default for TreeLocator {
    fn default() -> Self {
        Self {
            context_tokens: DEFAULT_CONTEXT_TOKENS,
        }
    }
}

impl LocateUsages for TreeLocator {
    fn locate(&self, symbols: &BTreeSet<String>, input: &TestInput<'_>) -> Result<UsageMap> {
        let Some(dump) = input.dump else {
            bail!(
                "No declaration dump available for {}",
                input.path.display()
            );
        };

        let mut usages: UsageMap = symbols
            .iter()
            .map(|s| (s.clone(), SymbolUsage::default()))
            .collect();
        let mut cursor = LocationCursor::default();
        let mut calls: Vec<CallFrame> = Vec::new();

        for line in parse_dump(dump) {
            let Some(kind) = line.kind else {
                continue;
            };
            let node_loc = cursor.advance(&line.locations);

            while calls.last().is_some_and(|frame| frame.depth >= line.depth) {
                calls.pop();
            }

            let Some((name, usage_kind)) = classify_node(kind, &line, &mut calls) else {
                continue;
            };
            let Some(loc) = node_loc.filter(|loc| loc.is_in(input.path)) else {
                continue;
            };
            if let Some(entry) = usages.get_mut(name) {
                let site = loc.line.unwrap_or(0);
                entry.push(UsageRecord {
                    symbol: name.to_string(),
                    kind: usage_kind,
                    line: site,
                    context: line_context(input.source, site, self.context_tokens),
                });
            }
        }

        Ok(usages)
    }

    fn needs_dump(&self) -> bool {
        true
    }
}

#[derive(Debug)]
struct CallFrame {
    depth: usize,
    /// Direct children seen so far. The first child's subtree is the callee.
    children: usize,
    callee_seen: bool,
}

impl CallFrame {
    fn new(depth: usize) -> Self {
        Self {
            depth,
            children: 0,
            callee_seen: false,
        }
    }

    /// Account for a node inside this call and report whether it is still in
    /// callee position with no callee named yet.
    fn enter(&mut self, depth: usize) -> bool {
        if depth == self.depth + 1 {
            self.children += 1;
        }
        self.children == 1 && !self.callee_seen
    }
}

/// Update the open call frames for this node and decide what, if anything, it uses.
fn classify_node<'a>(
    kind: &str,
    line: &DumpLine<'a>,
    calls: &mut Vec<CallFrame>,
) -> Option<(&'a str, UsageKind)> {
    let in_callee = calls.last_mut().is_some_and(|frame| frame.enter(line.depth));

    if CALL_KINDS.contains(&kind) {
        // A call in callee position: the outer callee is whatever this call returns.
        if in_callee && let Some(parent) = calls.last_mut() {
            parent.callee_seen = true;
        }
        calls.push(CallFrame::new(line.depth));
        return None;
    }

    let name = match kind {
        DECL_REF_EXPR => referenced_name(line),
        UNRESOLVED_LOOKUP_EXPR => unresolved_name(line),
        MEMBER_EXPR => member_name(line),
        UNRESOLVED_MEMBER_EXPR | DEPENDENT_MEMBER_EXPR => {
            unresolved_name(line).or_else(|| dependent_member_name(line))
        }
        VAR_DECL => {
            return Some((outer_type_name(line.first_quoted()?)?, UsageKind::Declaration));
        }
        _ => return None,
    };

    if in_callee && let Some(frame) = calls.last_mut() {
        frame.callee_seen = true;
        return Some((name?, UsageKind::Call));
    }
    match kind {
        // Member accesses outside callee position are field reads, not symbol uses.
        MEMBER_EXPR | UNRESOLVED_MEMBER_EXPR | DEPENDENT_MEMBER_EXPR => None,
        _ => Some((name?, UsageKind::Reference)),
    }
}

fn referenced_name<'a>(line: &DumpLine<'a>) -> Option<&'a str> {
    let name = DECL_REF_REGEX.captures(line.rest)?.get(1)?.as_str();
    name.rsplit("::").next()
}

fn member_name<'a>(line: &DumpLine<'a>) -> Option<&'a str> {
    MEMBER_REGEX
        .captures(line.rest)?
        .get(1)
        .map(|m| m.as_str())
}

fn unresolved_name<'a>(line: &DumpLine<'a>) -> Option<&'a str> {
    let name = UNRESOLVED_REGEX.captures(line.rest)?.get(1)?.as_str();
    name.rsplit("::").next()
}

fn dependent_member_name<'a>(line: &DumpLine<'a>) -> Option<&'a str> {
    DEPENDENT_MEMBER_REGEX
        .captures(line.rest)?
        .get(1)
        .map(|m| m.as_str())
}

/// Outermost named type of a type spelling:
/// `const std::vector<int> &` -> `vector`.
fn outer_type_name(spelling: &str) -> Option<&str> {
    let mut ty = spelling.trim();
    while let Some(rest) = TYPE_QUALIFIERS.iter().find_map(|q| ty.strip_prefix(q)) {
        ty = rest;
    }
    let base = ty
        .split('<')
        .next()?
        .trim_end_matches(|c: char| c == '&' || c == '*' || c.is_whitespace());
    let name = base.rsplit("::").next()?.trim();
    (!name.is_empty()).then_some(name)
}

/// Location of one node after resolving the dumper's elisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeLoc<'a> {
    file: Option<&'a str>,
    line: Option<u32>,
}

impl NodeLoc<'_> {
    fn is_in(&self, path: &Path) -> bool {
        self.file.is_some_and(|file| same_file(file, path))
    }
}

/// Tracks the last printed file and line. The dumper only prints a file when it
/// changes and a line when it changes, so every location depends on the ones before it.
#[derive(Debug, Default)]
struct LocationCursor<'a> {
    file: Option<&'a str>,
    line: Option<u32>,
}

impl<'a> LocationCursor<'a> {
    /// Consume a node's locations and return where the node itself begins.
    fn advance(&mut self, locations: &[SourceLoc<'a>]) -> Option<NodeLoc<'a>> {
        let mut begin = None;
        for (i, loc) in locations.iter().enumerate() {
            match *loc {
                SourceLoc::Invalid | SourceLoc::Col { .. } => {}
                SourceLoc::File { path, line, .. } => {
                    self.file = Some(path);
                    self.line = Some(line);
                }
                SourceLoc::Line { line, .. } => self.line = Some(line),
            }
            if i == 0 && *loc != SourceLoc::Invalid {
                begin = Some(NodeLoc {
                    file: self.file,
                    line: self.line,
                });
            }
        }
        begin
    }
}

fn same_file(dumped: &str, path: &Path) -> bool {
    let dumped = Path::new(dumped);
    dumped == path || (dumped.file_name().is_some() && dumped.file_name() == path.file_name())
}
