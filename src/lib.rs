//! dslkit: building blocks for hand-written recursive-descent scanners and
//! parsers.
//!
//! A language is described by two plain functions: a scan rule that turns
//! characters into one [`Token`] at a time, and a parse rule that consumes
//! tokens and builds an [`Ast`]. [`parse`] wires them together over an input
//! and returns the tree along with every [`ParseError`] found.
//!
//! ```
//! use dslkit::grammars::json;
//!
//! let out = json::GRAMMAR.parse_str(r#"{"key": [1, true, null]}"#);
//! assert!(out.is_ok());
//! println!("{}", out.ast);
//! ```

pub use crate::ast::{Ast, NodeId, NodeKind, NodeRef, NodeSet};
pub use crate::config::{ParseConfig, DEFAULT_LOOP_LIMIT};
pub use crate::diagnostics::{DslError, ErrorKind, ParseError, Span};
pub use crate::options::{MatchOptions, Outcome};
pub use crate::parser::{
    ExpectNotToken, ExpectToken, ParseFn, ParseOutput, ParseRule, ParseState, Parser, PeekToken,
    TokenBranch,
};
pub use crate::scanner::{
    Candidate, ExpectNotRune, ExpectRune, ScanFn, ScanRule, Scanner,
};
pub use crate::source::{trace_to_file, CharSource, EOF_RUNE};
pub use crate::token::{Position, Token, TokenKind, TokenSet};
pub use crate::trace::{NullSink, TraceBuffer, TraceSink, TracingSink, WriterSink};

use std::path::Path;

pub mod ast;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod grammars;
pub mod options;
pub mod parser;
pub mod scanner;
pub mod source;
pub mod stream;
pub mod token;
pub mod trace;

/// Wraps a function as a [`ScanRule`] named after it.
#[macro_export]
macro_rules! scan_rule {
    ($rule:ident) => {
        $crate::scanner::ScanRule::new(stringify!($rule), &$rule)
    };
}

/// Wraps a function as a [`ParseRule`] named after it.
#[macro_export]
macro_rules! parse_rule {
    ($rule:ident) => {
        $crate::parser::ParseRule::new(stringify!($rule), &$rule)
    };
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses `source` with the given rules.
///
/// The parse rule receives a fresh [`Parser`] over the scanner and must end
/// with [`Parser::exit`]. The result always carries the tree built so far,
/// even when errors were found.
pub fn parse(
    parse_fn: ParseFn,
    scan_fn: ScanFn,
    source: impl Into<CharSource>,
    config: ParseConfig,
) -> ParseOutput {
    let parser = Parser::new(scan_fn, source.into(), config);
    parse_fn(parser)
}

/// [`parse`] with the default configuration.
pub fn parse_str(parse_fn: ParseFn, scan_fn: ScanFn, source: &str) -> ParseOutput {
    parse(parse_fn, scan_fn, source, ParseConfig::default())
}

/// A named pair of scan and parse rules.
#[derive(Clone, Copy)]
pub struct Grammar {
    pub name: &'static str,
    pub parse: ParseFn,
    pub scan: ScanFn,
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Grammar({})", self.name)
    }
}

impl Grammar {
    pub fn parse_str(&self, source: &str) -> ParseOutput {
        parse_str(self.parse, self.scan, source)
    }

    pub fn parse_with(&self, source: impl Into<CharSource>, config: ParseConfig) -> ParseOutput {
        parse(self.parse, self.scan, source, config)
    }

    /// Parses the file at `path`.
    pub fn parse_file(
        &self,
        path: impl AsRef<Path>,
        config: ParseConfig,
    ) -> Result<ParseOutput, DslError> {
        let source = CharSource::open(path)?;
        Ok(self.parse_with(source, config))
    }
}
