//! Tokens, token kinds, and source positions.

use crate::diagnostics::DslError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;

/// A 1-based line/column location in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An open, grammar-defined token tag.
///
/// Grammars declare their kinds as constants with [`TokenKind::from_static`];
/// `UNKNOWN` and `EOF` are reserved by the toolkit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenKind(Cow<'static, str>);

impl TokenKind {
    /// Produced when a scan rule commits no token.
    pub const UNKNOWN: TokenKind = TokenKind::from_static("UNKNOWN");
    /// Produced once the input is exhausted.
    pub const EOF: TokenKind = TokenKind::from_static("EOF");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scanned lexeme with its kind and the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "ID")]
    pub kind: TokenKind,
    #[serde(rename = "Literal")]
    pub literal: String,
    #[serde(rename = "Line")]
    pub line: usize,
    #[serde(rename = "Position")]
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, at: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            line: at.line,
            column: at.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::EOF
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} at {}",
            self.kind,
            self.literal,
            self.position()
        )
    }
}

/// The declared token kinds of a grammar.
///
/// Supplying a set through the parse configuration turns on kind validation:
/// branches naming an undeclared kind, and scanned tokens of an undeclared
/// kind, become errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    kinds: BTreeSet<TokenKind>,
}

impl TokenSet {
    /// Builds a set from `kinds`. `UNKNOWN` and `EOF` are always members and
    /// must not be listed; any kind listed twice is rejected.
    pub fn new<I>(kinds: I) -> Result<Self, DslError>
    where
        I: IntoIterator<Item = TokenKind>,
    {
        let mut set = BTreeSet::from([TokenKind::UNKNOWN, TokenKind::EOF]);
        for kind in kinds {
            if !set.insert(kind.clone()) {
                return Err(DslError::DuplicateKind {
                    kind: kind.to_string(),
                });
            }
        }
        Ok(Self { kinds: set })
    }

    pub fn contains(&self, kind: &TokenKind) -> bool {
        self.kinds.contains(kind)
    }

    /// Every member, reserved kinds included, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TokenKind> {
        self.kinds.iter()
    }
}
