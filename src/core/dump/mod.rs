//! Declaration-tree dump parsing.
//!
//! The compiler's `-ast-dump` output is a flat stream of lines, one node per line,
//! with nesting drawn by a `|-` / `` `- `` prefix. This module never builds a tree:
//! it tokenizes each line into a [`DumpLine`] and classifies it into a small tagged
//! variant ([`LineClass`]) that the export scanner's state machine consumes.
//!
//! ## Module Structure
//!
//! - `line`: line tokenizer (depth, node kind, locations, trailing name)
//! - `classify`: line classification predicates

pub mod classify;
pub mod line;

pub use classify::{LineClass, classify};
pub use line::{DumpLine, SourceLoc, parse_dump};
