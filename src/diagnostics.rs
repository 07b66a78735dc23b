//! Diagnostics produced while scanning and parsing.
//!
//! A [`ParseError`] is plain data: what went wrong, where it started, where
//! scanning or parsing gave up, and the source lines in between. It renders
//! itself as a caret snippet via [`ParseError::render`] and also implements
//! [`miette::Diagnostic`] for callers that prefer miette's reports.
//!
//! Failures at the toolkit boundary (files, kind registration) are reported
//! separately as [`DslError`].

use crate::token::Position;
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use unicode_width::UnicodeWidthChar;

// ============================================================================
// ERROR KINDS
// ============================================================================

/// Stable classification of every error the toolkit reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A non-optional scanner expectation matched no character.
    RuneExpectedNotFound,
    /// A non-optional parser expectation matched no token, or a token kind
    /// was not declared in the configured token set.
    TokenExpectedNotFound,
    /// The same input position was revisited too many times in a row.
    InfiniteLoopDetected,
    /// A node kind was not declared in the configured node set.
    NodeNotInNodeSet,
    FileNotFound,
    CouldNotCreateFile,
}

impl ErrorKind {
    /// Error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::RuneExpectedNotFound => "rune_expected_not_found",
            Self::TokenExpectedNotFound => "token_expected_not_found",
            Self::InfiniteLoopDetected => "infinite_loop_detected",
            Self::NodeNotInNodeSet => "node_not_in_node_set",
            Self::FileNotFound => "file_not_found",
            Self::CouldNotCreateFile => "could_not_create_file",
        }
    }

    /// Whether the parse is abandoned once this error is recorded.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InfiniteLoopDetected)
    }

    fn label(&self) -> &'static str {
        match self {
            Self::RuneExpectedNotFound => "unexpected character",
            Self::TokenExpectedNotFound => "unexpected token",
            Self::InfiniteLoopDetected => "no progress past here",
            Self::NodeNotInNodeSet => "undeclared node kind",
            Self::FileNotFound => "file not found",
            Self::CouldNotCreateFile => "could not create file",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RuneExpectedNotFound => "RuneExpectedNotFound",
            Self::TokenExpectedNotFound => "TokenExpectedNotFound",
            Self::InfiniteLoopDetected => "InfiniteLoopDetected",
            Self::NodeNotInNodeSet => "NodeNotInNodeSet",
            Self::FileNotFound => "FileNotFound",
            Self::CouldNotCreateFile => "CouldNotCreateFile",
        };
        f.write_str(name)
    }
}

// ============================================================================
// PARSE ERRORS
// ============================================================================

/// Start and end of an error, inclusive, as 1-based positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub const fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub const fn is_multiline(&self) -> bool {
        self.end.line > self.start.line
    }
}

/// A single structured, position-annotated failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {}, column {}: {message}", .span.start.line, .span.start.column)]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// The source text of every line from the start line to the end line,
    /// joined by `'\n'`.
    pub source_lines: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(
        kind: ErrorKind,
        message: impl Into<String>,
        source_lines: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source_lines: source_lines.into(),
            span,
        }
    }

    pub fn start_line(&self) -> usize {
        self.span.start.line
    }

    pub fn start_column(&self) -> usize {
        self.span.start.column
    }

    pub fn end_line(&self) -> usize {
        self.span.end.line
    }

    pub fn end_column(&self) -> usize {
        self.span.end.column
    }

    /// Renders the error as a header, the offending source line(s), and a
    /// caret line under each.
    ///
    /// ```text
    /// TokenExpectedNotFound at line 1, column 3: found [VARIABLE "error"], expected any of [ASSIGN, OPEN_PAREN]
    /// a error := 1 * 5 + 7
    ///   ^-----^
    /// ```
    ///
    /// A span covering several lines shows the first line with a caret run to
    /// its end, then the last line with a run ending at the end column.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self);
        let lines: Vec<&str> = self.source_lines.split('\n').collect();
        let first = lines.first().copied().unwrap_or("");

        if !self.span.is_multiline() {
            out.push_str(first);
            out.push('\n');
            out.push_str(&caret_line(first, self.start_column(), self.end_column()));
            out.push('\n');
            return out;
        }

        let first_len = first.chars().count();
        out.push_str(first);
        out.push('\n');
        out.push_str(&caret_line(
            first,
            self.start_column(),
            first_len.max(self.start_column()),
        ));
        out.push('\n');

        let last = lines.last().copied().unwrap_or("");
        out.push_str(last);
        out.push('\n');
        out.push_str(&closing_run(self.end_column()));
        out.push('\n');
        out
    }

    /// Byte offset into `source_lines` of a position inside the span.
    fn offset_of(&self, at: Position) -> usize {
        let target = at.line.saturating_sub(self.span.start.line);
        let mut offset = 0;
        for (index, line) in self.source_lines.split('\n').enumerate() {
            if index == target {
                let column = at.column.saturating_sub(1);
                return offset
                    + line
                        .char_indices()
                        .nth(column)
                        .map(|(i, _)| i)
                        .unwrap_or(line.len());
            }
            offset += line.len() + 1;
        }
        self.source_lines.len()
    }
}

/// Padding up to `start` (tabs kept so the caret lines up), then `^`, a run
/// of `-`, and a closing `^` at `end`. Wide characters get as many cells as
/// they occupy on screen.
fn caret_line(line: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    let cells = |column: usize| match chars.get(column.wrapping_sub(1)) {
        Some('\t') | None => 1,
        Some(c) => c.width().unwrap_or(1),
    };

    let mut s = String::new();
    for column in 1..start {
        if chars.get(column - 1) == Some(&'\t') {
            s.push('\t');
        } else {
            s.push_str(&" ".repeat(cells(column)));
        }
    }
    s.push('^');
    if end > start {
        s.push_str(&"-".repeat(cells(start).saturating_sub(1)));
        for column in start + 1..end {
            s.push_str(&"-".repeat(cells(column)));
        }
        s.push('^');
    }
    s
}

fn closing_run(end: usize) -> String {
    let mut s = "-".repeat(end.saturating_sub(1));
    s.push('^');
    s
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("dslkit::{}", self.kind.code_suffix())))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let start = self.offset_of(self.span.start);
        let end = self.offset_of(self.span.end).max(start);
        let span = SourceSpan::from(start..end);
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.kind.label().to_string()),
            span,
        ))))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_lines)
    }
}

// ============================================================================
// BOUNDARY ERRORS
// ============================================================================

/// Errors raised outside a parse: file handling and grammar registration.
#[derive(Debug, Error)]
pub enum DslError {
    #[error("could not open {}: {source}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not create {}: {source}", .path.display())]
    CouldNotCreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("kind {kind} is declared more than once")]
    DuplicateKind { kind: String },
}

impl DslError {
    /// The closest diagnostic kind, for callers that report both families
    /// uniformly.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::FileNotFound { .. } => Some(ErrorKind::FileNotFound),
            Self::CouldNotCreateFile { .. } => Some(ErrorKind::CouldNotCreateFile),
            Self::DuplicateKind { .. } => None,
        }
    }
}

// ============================================================================
// TEXT HELPERS
// ============================================================================

/// Makes control characters printable for messages and traces.
///
/// With `whitespace` set, a lone space becomes `WS` as well.
pub fn sanitize(text: &str, whitespace: bool) -> String {
    if whitespace && text == " " {
        return "WS".to_string();
    }
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push_str("NL"),
            '\r' => out.push_str("CR"),
            '\t' => out.push_str("TAB"),
            '\u{0b}' => out.push_str("VTAB"),
            '\u{07}' => out.push_str("BELL"),
            '\0' => out.push_str("EOF"),
            c => out.push(c),
        }
    }
    out
}
