//! JSON: objects, arrays, strings, numbers, `true`, `false` and `null`.
//!
//! Members become `MEMBER` nodes carrying the key; every scalar becomes a
//! `VALUE` node. String tokens hold the text between the quotes with escape
//! sequences left as written.
//!
//! ```text
//! {"key1": "value1", "key2": 42}
//!
//! └── ROOT -
//!     └── OBJECT -
//!         ├── MEMBER - key1,
//!         │   └── VALUE - value1,
//!         └── MEMBER - key2,
//!             └── VALUE - 42,
//! ```

use crate::ast::{NodeKind, NodeSet};
use crate::diagnostics::DslError;
use crate::parser::{ExpectToken, ParseOutput, Parser, TokenBranch};
use crate::scanner::{Candidate, ExpectNotRune, ExpectRune, Scanner};
use crate::source::EOF_RUNE;
use crate::token::{Token, TokenKind, TokenSet};
use crate::{parse_rule, scan_rule, Grammar};

pub const STRING: TokenKind = TokenKind::from_static("STRING");
pub const NUMBER: TokenKind = TokenKind::from_static("NUMBER");
pub const TRUE: TokenKind = TokenKind::from_static("TRUE");
pub const FALSE: TokenKind = TokenKind::from_static("FALSE");
pub const NULL: TokenKind = TokenKind::from_static("NULL");
pub const LBRACE: TokenKind = TokenKind::from_static("LBRACE");
pub const RBRACE: TokenKind = TokenKind::from_static("RBRACE");
pub const LBRACKET: TokenKind = TokenKind::from_static("LBRACKET");
pub const RBRACKET: TokenKind = TokenKind::from_static("RBRACKET");
pub const COLON: TokenKind = TokenKind::from_static("COLON");
pub const COMMA: TokenKind = TokenKind::from_static("COMMA");

pub const OBJECT: NodeKind = NodeKind::from_static("OBJECT");
pub const ARRAY: NodeKind = NodeKind::from_static("ARRAY");
pub const MEMBER: NodeKind = NodeKind::from_static("MEMBER");
pub const VALUE: NodeKind = NodeKind::from_static("VALUE");

pub const GRAMMAR: Grammar = Grammar {
    name: "json",
    parse,
    scan,
};

pub fn token_set() -> Result<TokenSet, DslError> {
    TokenSet::new([
        STRING, NUMBER, TRUE, FALSE, NULL, LBRACE, RBRACE, LBRACKET, RBRACKET, COLON, COMMA,
    ])
}

pub fn node_set() -> Result<NodeSet, DslError> {
    NodeSet::new([OBJECT, ARRAY, MEMBER, VALUE])
}

// ============================================================================
// SCANNER
// ============================================================================

pub fn scan(s: &mut Scanner) -> Token {
    s.expect(ExpectRune::new().runes(" \t\r\n").multiple().optional().skip());
    s.expect(
        ExpectRune::new()
            .runes("{}[]:,")
            .rune(EOF_RUNE)
            .rune_then('"', scan_rule!(string))
            .rune_then('-', scan_rule!(negative))
            .range_then('0', '9', scan_rule!(number))
            .range_then('a', 'z', scan_rule!(keyword)),
    );
    s.match_token(&[
        Candidate::new("{", LBRACE),
        Candidate::new("}", RBRACE),
        Candidate::new("[", LBRACKET),
        Candidate::new("]", RBRACKET),
        Candidate::new(":", COLON),
        Candidate::new(",", COMMA),
    ]);
    s.exit()
}

fn string(s: &mut Scanner) {
    s.skip_rune();
    s.call(scan_rule!(characters));
    s.expect(ExpectRune::new().rune('"'));
    s.skip_rune();
    s.match_token(&[Candidate::any(STRING)]);
}

/// String body up to the closing quote. A backslash always takes the next
/// character with it.
fn characters(s: &mut Scanner) {
    s.expect_not(ExpectNotRune::new("\"\\").multiple().optional());
    let escape = s.expect(ExpectRune::new().rune('\\').optional());
    if escape.matched() {
        s.expect_not(ExpectNotRune::new(""));
        s.call(scan_rule!(characters));
    }
}

fn negative(s: &mut Scanner) {
    s.expect(ExpectRune::new().range_then('0', '9', scan_rule!(number)));
}

fn number(s: &mut Scanner) {
    s.expect(ExpectRune::new().range('0', '9').multiple().optional());
    s.expect(ExpectRune::new().rune_then('.', scan_rule!(digits)).optional());
    s.expect(
        ExpectRune::new()
            .rune_then('e', scan_rule!(exponent))
            .rune_then('E', scan_rule!(exponent))
            .optional(),
    );
    s.match_token(&[Candidate::any(NUMBER)]);
}

fn exponent(s: &mut Scanner) {
    s.expect(ExpectRune::new().runes("+-").optional());
    s.call(scan_rule!(digits));
}

fn digits(s: &mut Scanner) {
    s.expect(ExpectRune::new().range('0', '9').multiple());
}

fn keyword(s: &mut Scanner) {
    s.expect(ExpectRune::new().range('a', 'z').multiple().optional());
    s.match_token(&[
        Candidate::new("true", TRUE),
        Candidate::new("false", FALSE),
        Candidate::new("null", NULL),
    ]);
}

// ============================================================================
// PARSER
// ============================================================================

pub fn parse(mut p: Parser) -> ParseOutput {
    p.expect(ExpectToken::new([
        TokenBranch::to(LBRACE, parse_rule!(object)),
        TokenBranch::to(LBRACKET, parse_rule!(array)),
    ]));
    p.expect(ExpectToken::kind(TokenKind::EOF));
    p.exit()
}

fn values() -> ExpectToken<'static> {
    ExpectToken::new([
        TokenBranch::to(STRING, parse_rule!(add_value)),
        TokenBranch::to(NUMBER, parse_rule!(add_value)),
        TokenBranch::to(TRUE, parse_rule!(add_value)),
        TokenBranch::to(FALSE, parse_rule!(add_value)),
        TokenBranch::to(NULL, parse_rule!(add_value)),
        TokenBranch::to(LBRACE, parse_rule!(object)),
        TokenBranch::to(LBRACKET, parse_rule!(array)),
    ])
}

fn object(p: &mut Parser) {
    p.skip_token();
    p.add_node(OBJECT);
    let first = p.expect(ExpectToken::new([TokenBranch::to(STRING, parse_rule!(member))]).optional());
    if first.matched() {
        p.expect(
            ExpectToken::new([TokenBranch::to(COMMA, parse_rule!(next_member))])
                .multiple()
                .optional()
                .skip(),
        );
    }
    p.expect(ExpectToken::new([TokenBranch::to(RBRACE, parse_rule!(close))]));
}

fn next_member(p: &mut Parser) {
    p.expect(ExpectToken::new([TokenBranch::to(STRING, parse_rule!(member))]));
}

fn member(p: &mut Parser) {
    p.add_node(MEMBER);
    p.add_tokens();
    p.expect(ExpectToken::kind(COLON).skip());
    p.call(parse_rule!(value));
    p.walk_up();
}

fn value(p: &mut Parser) {
    p.expect(values());
}

fn array(p: &mut Parser) {
    p.skip_token();
    p.add_node(ARRAY);
    let first = p.expect(values().optional());
    if first.matched() {
        p.expect(
            ExpectToken::new([TokenBranch::to(COMMA, parse_rule!(value))])
                .multiple()
                .optional()
                .skip(),
        );
    }
    p.expect(ExpectToken::new([TokenBranch::to(RBRACKET, parse_rule!(close))]));
}

fn add_value(p: &mut Parser) {
    p.add_node(VALUE);
    p.add_tokens();
    p.walk_up();
}

fn close(p: &mut Parser) {
    p.skip_token();
    p.walk_up();
}
