//! A line-oriented calculator language.
//!
//! ```text
//! a := 1 * 5 + 7
//! b := 3.45 * 44.21 / (4 + a) 'A Simple Expression
//! double(a + b)
//! ```
//!
//! Each line is an assignment or a call, optionally followed by a comment
//! introduced with `'`. Expressions nest to the right: an operator becomes
//! an `EXPRESSION` node holding the operand that follows it, and a
//! parenthesised group becomes an `EXPRESSION` holding `(`.
//!
//! A bad parenthesised group is reported once, then the rest of the line is
//! skipped so that later lines still parse.

use crate::ast::{NodeKind, NodeSet};
use crate::diagnostics::DslError;
use crate::parser::{ExpectToken, ParseOutput, Parser, PeekToken, TokenBranch};
use crate::scanner::{Candidate, ExpectNotRune, ExpectRune, Scanner};
use crate::source::EOF_RUNE;
use crate::token::{Token, TokenKind, TokenSet};
use crate::{parse_rule, scan_rule, Grammar};

pub const LITERAL: TokenKind = TokenKind::from_static("LITERAL");
pub const PLUS: TokenKind = TokenKind::from_static("PLUS");
pub const MINUS: TokenKind = TokenKind::from_static("MINUS");
pub const MULTIPLY: TokenKind = TokenKind::from_static("MULTIPLY");
pub const DIVIDE: TokenKind = TokenKind::from_static("DIVIDE");
pub const OPEN_PAREN: TokenKind = TokenKind::from_static("OPEN_PAREN");
pub const CLOSE_PAREN: TokenKind = TokenKind::from_static("CLOSE_PAREN");
pub const ASSIGN: TokenKind = TokenKind::from_static("ASSIGN");
pub const VARIABLE: TokenKind = TokenKind::from_static("VARIABLE");
pub const COMMENT: TokenKind = TokenKind::from_static("COMMENT");
pub const NL: TokenKind = TokenKind::from_static("NL");
pub const WS: TokenKind = TokenKind::from_static("WS");

pub const ASSIGNMENT: NodeKind = NodeKind::from_static("ASSIGNMENT");
pub const CALL: NodeKind = NodeKind::from_static("CALL");
pub const EXPRESSION: NodeKind = NodeKind::from_static("EXPRESSION");
pub const TERMINAL: NodeKind = NodeKind::from_static("TERMINAL");
pub const COMMENT_NODE: NodeKind = NodeKind::from_static("COMMENT");

pub const GRAMMAR: Grammar = Grammar {
    name: "calc",
    parse,
    scan,
};

pub fn token_set() -> Result<TokenSet, DslError> {
    TokenSet::new([
        LITERAL,
        PLUS,
        MINUS,
        MULTIPLY,
        DIVIDE,
        OPEN_PAREN,
        CLOSE_PAREN,
        ASSIGN,
        VARIABLE,
        COMMENT,
        NL,
        WS,
    ])
}

pub fn node_set() -> Result<NodeSet, DslError> {
    NodeSet::new([ASSIGNMENT, CALL, EXPRESSION, TERMINAL, COMMENT_NODE])
}

// ============================================================================
// SCANNER
// ============================================================================

/// While the parser recovers, the rest of the line comes back as one
/// `UNKNOWN` token. The line break itself still scans as `NL`.
pub fn scan(s: &mut Scanner) -> Token {
    if s.is_recovering() {
        let rest = s.expect_not(ExpectNotRune::new("\n").multiple().optional());
        if rest.matched() {
            s.match_token(&[Candidate::any(TokenKind::UNKNOWN)]);
            return s.exit();
        }
    }

    let indent = s.expect(ExpectRune::new().runes(" \t").multiple().optional());
    if indent.matched() {
        s.match_token(&[Candidate::any(WS)]);
        return s.exit();
    }

    s.expect(
        ExpectRune::new()
            .runes("-+*/()\n")
            .rune(EOF_RUNE)
            .rune_then(':', scan_rule!(assign))
            .rune_then('\'', scan_rule!(comment))
            .rune_then('"', scan_rule!(string))
            .range_then('0', '9', scan_rule!(number))
            .range_then('A', 'Z', scan_rule!(variable))
            .range_then('a', 'z', scan_rule!(variable)),
    );
    s.match_token(&[
        Candidate::new("-", MINUS),
        Candidate::new("+", PLUS),
        Candidate::new("*", MULTIPLY),
        Candidate::new("/", DIVIDE),
        Candidate::new("(", OPEN_PAREN),
        Candidate::new(")", CLOSE_PAREN),
        Candidate::new("\n", NL),
    ]);
    // Trailing blanks belong to the token just scanned.
    s.expect(ExpectRune::new().runes(" \t").multiple().optional());
    s.exit()
}

fn assign(s: &mut Scanner) {
    s.expect(ExpectRune::new().rune('='));
    s.match_token(&[Candidate::new(":=", ASSIGN)]);
}

fn comment(s: &mut Scanner) {
    s.skip_rune();
    s.expect_not(ExpectNotRune::new("\n").multiple().optional());
    s.match_token(&[Candidate::any(COMMENT)]);
}

fn string(s: &mut Scanner) {
    s.skip_rune();
    s.expect_not(ExpectNotRune::new("\"\n").multiple().optional());
    s.expect(ExpectRune::new().rune('"'));
    s.skip_rune();
    s.match_token(&[Candidate::any(LITERAL)]);
}

fn number(s: &mut Scanner) {
    s.expect(ExpectRune::new().range('0', '9').multiple().optional());
    s.expect(ExpectRune::new().rune_then('.', scan_rule!(fraction)).optional());
    s.match_token(&[Candidate::any(LITERAL)]);
}

fn fraction(s: &mut Scanner) {
    s.expect(ExpectRune::new().range('0', '9').multiple());
}

fn variable(s: &mut Scanner) {
    s.expect(
        ExpectRune::new()
            .rune('_')
            .range('A', 'Z')
            .range('a', 'z')
            .multiple()
            .optional(),
    );
    s.match_token(&[Candidate::any(VARIABLE)]);
}

// ============================================================================
// PARSER
// ============================================================================

pub fn parse(mut p: Parser) -> ParseOutput {
    p.expect(
        ExpectToken::new([
            TokenBranch::to(WS, parse_rule!(skip_whitespace)),
            TokenBranch::to(VARIABLE, parse_rule!(assignment_or_call)),
            TokenBranch::new(TokenKind::EOF),
        ])
        .multiple(),
    );
    p.exit()
}

fn whitespace() -> ExpectToken<'static> {
    ExpectToken::kind(WS).optional().skip()
}

fn operands() -> ExpectToken<'static> {
    ExpectToken::new([
        TokenBranch::to(VARIABLE, parse_rule!(operator)),
        TokenBranch::to(LITERAL, parse_rule!(operator)),
        TokenBranch::to(OPEN_PAREN, parse_rule!(paren_expression)),
    ])
}

fn skip_whitespace(p: &mut Parser) {
    p.skip_token();
}

fn assignment_or_call(p: &mut Parser) {
    p.expect(whitespace());
    p.expect(ExpectToken::new([
        TokenBranch::to(ASSIGN, parse_rule!(assignment)),
        TokenBranch::to(OPEN_PAREN, parse_rule!(call)),
    ]));
    p.expect(whitespace());
    p.expect(ExpectToken::new([TokenBranch::to(COMMENT, parse_rule!(add_comment))]).optional());
    p.expect(ExpectToken::new([TokenBranch::new(NL), TokenBranch::new(TokenKind::EOF)]).skip());
    // A recovered line can leave the cursor anywhere in the expression.
    p.walk_to_root();
}

fn assignment(p: &mut Parser) {
    p.skip_token();
    p.add_node(ASSIGNMENT);
    p.add_tokens();
    p.expect(whitespace());
    p.expect(operands());
}

fn call(p: &mut Parser) {
    p.skip_token();
    p.add_node(CALL);
    p.add_tokens();
    p.expect(whitespace());
    p.expect(operands());
    p.expect(whitespace());
    p.expect(ExpectToken::new([TokenBranch::to(CLOSE_PAREN, parse_rule!(close_call))]));
}

fn close_call(p: &mut Parser) {
    p.skip_token();
    p.walk_up();
}

fn expression(p: &mut Parser) {
    p.add_node(EXPRESSION);
    p.add_tokens();
    p.expect(whitespace());
    let mut accepted = operands();
    accepted
        .branches
        .push(TokenBranch::to(CLOSE_PAREN, parse_rule!(operator)));
    p.expect(accepted);
}

fn operator(p: &mut Parser) {
    p.add_node(TERMINAL);
    p.add_tokens();
    p.walk_up();
    p.expect(whitespace());
    p.expect(
        ExpectToken::new([
            TokenBranch::to(PLUS, parse_rule!(expression)),
            TokenBranch::to(MINUS, parse_rule!(expression)),
            TokenBranch::to(DIVIDE, parse_rule!(expression)),
            TokenBranch::to(MULTIPLY, parse_rule!(expression)),
            TokenBranch::to(OPEN_PAREN, parse_rule!(paren_expression)),
        ])
        .optional(),
    );
    p.walk_up();
}

fn paren_expression(p: &mut Parser) {
    p.peek(&[PeekToken::new([], parse_rule!(expression))]);
    p.expect(whitespace());
    p.expect(ExpectToken::new([TokenBranch::to(CLOSE_PAREN, parse_rule!(operator))]));
    p.recover(parse_rule!(skip_until_line_break));
}

fn add_comment(p: &mut Parser) {
    p.add_node(COMMENT_NODE);
    p.add_tokens();
    p.walk_up();
}

/// Drops everything up to the line break, including tokens the parser had
/// already looked ahead at before the error.
fn skip_until_line_break(p: &mut Parser) {
    p.set_recovering(true);
    p.expect(
        ExpectToken::new([TokenBranch::new(NL), TokenBranch::new(TokenKind::EOF)])
            .invert()
            .multiple()
            .optional()
            .skip(),
    );
    p.set_recovering(false);
}
