//! The token-level parsing engine.
//!
//! A grammar's parse rule receives the [`Parser`] and describes the language
//! as nested [`Parser::expect`] calls. Each matched branch runs its own rule,
//! so the grammar's call stack mirrors the shape of the input. Rules build
//! the tree as they go with [`Parser::add_node`], [`Parser::add_tokens`] and
//! [`Parser::walk_up`].
//!
//! The first failed expectation sets an error flag. While it is set every
//! further `expect` is a silent no-op, which lets the rule stack unwind to a
//! [`Parser::recover`] call placed where the grammar knows how to
//! resynchronise.

use crate::ast::{Ast, NodeKind, NodeSet};
use crate::config::ParseConfig;
use crate::diagnostics::{sanitize, ErrorKind, ParseError, Span};
use crate::options::{option_builders, MatchOptions, Outcome};
use crate::scanner::{ScanFn, Scanned, Scanner};
use crate::source::CharSource;
use crate::stream::{PushbackStream, Source};
use crate::token::{Position, Token, TokenKind, TokenSet};
use crate::trace::{Indent, SharedTracer};
use std::fmt;

/// A grammar's top-level parse rule. It owns the parser and finishes with
/// [`Parser::exit`].
pub type ParseFn = fn(Parser) -> ParseOutput;

// ============================================================================
// RULES AND BRANCHES
// ============================================================================

/// A named parse rule, run when its branch matches.
///
/// Build one with [`parse_rule!`](crate::parse_rule), which records the
/// function's name for traces.
#[derive(Clone, Copy)]
pub struct ParseRule<'a> {
    name: &'static str,
    run: &'a dyn Fn(&mut Parser),
}

impl<'a> ParseRule<'a> {
    pub fn new(name: &'static str, run: &'a dyn Fn(&mut Parser)) -> Self {
        Self { name, run }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ParseRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParseRule({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct TokenBranch<'a> {
    pub kind: TokenKind,
    pub rule: Option<ParseRule<'a>>,
}

impl<'a> TokenBranch<'a> {
    pub fn new(kind: TokenKind) -> Self {
        Self { kind, rule: None }
    }

    /// Matches `kind` and then runs `rule`.
    pub fn to(kind: TokenKind, rule: ParseRule<'a>) -> Self {
        Self {
            kind,
            rule: Some(rule),
        }
    }
}

/// Token kinds accepted by one [`Parser::expect`] call.
#[derive(Debug, Clone, Default)]
pub struct ExpectToken<'a> {
    pub branches: Vec<TokenBranch<'a>>,
    pub options: MatchOptions,
}

impl<'a> ExpectToken<'a> {
    pub fn new(branches: impl IntoIterator<Item = TokenBranch<'a>>) -> Self {
        Self {
            branches: branches.into_iter().collect(),
            options: MatchOptions::default(),
        }
    }

    /// Shorthand for a single branch without a rule.
    pub fn kind(kind: TokenKind) -> Self {
        Self::new([TokenBranch::new(kind)])
    }

    /// Accepts every kind no branch names, except `EOF`.
    pub fn invert(mut self) -> Self {
        self.options.invert = true;
        self
    }

    fn select(&self, kind: &TokenKind) -> Option<Option<ParseRule<'a>>> {
        let hit = self.branches.iter().find(|b| &b.kind == kind).map(|b| b.rule);
        if !self.options.invert {
            return hit;
        }
        match hit {
            Some(_) => None,
            None if *kind == TokenKind::EOF => None,
            None => Some(None),
        }
    }

    fn describe(&self) -> String {
        let list = join_kinds(self.branches.iter().map(|b| &b.kind));
        if self.options.invert {
            format!("anything except {list}")
        } else {
            list
        }
    }
}

option_builders!(ExpectToken);

/// Token kinds rejected by one [`Parser::expect_not`] call. `EOF` is never
/// accepted.
#[derive(Debug, Clone, Default)]
pub struct ExpectNotToken<'a> {
    pub kinds: Vec<TokenKind>,
    pub rule: Option<ParseRule<'a>>,
    pub options: MatchOptions,
}

impl<'a> ExpectNotToken<'a> {
    pub fn new(kinds: impl IntoIterator<Item = TokenKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn then(mut self, rule: ParseRule<'a>) -> Self {
        self.rule = Some(rule);
        self
    }

    fn select(&self, kind: &TokenKind) -> Option<Option<ParseRule<'a>>> {
        if *kind == TokenKind::EOF || self.kinds.contains(kind) {
            None
        } else {
            Some(self.rule)
        }
    }

    fn describe(&self) -> String {
        format!("anything except {}", join_kinds(self.kinds.iter()))
    }
}

option_builders!(ExpectNotToken);

/// A sequence of kinds to look ahead for. An empty sequence always matches.
#[derive(Debug, Clone)]
pub struct PeekToken<'a> {
    pub kinds: Vec<TokenKind>,
    pub rule: Option<ParseRule<'a>>,
}

impl<'a> PeekToken<'a> {
    pub fn new(kinds: impl IntoIterator<Item = TokenKind>, rule: ParseRule<'a>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
            rule: Some(rule),
        }
    }
}

/// Where a mismatched token ends for diagnostics. A token ending in a line
/// break stops just past the break instead of on the next line.
fn mismatch_end(scanned: &Scanned) -> Position {
    let Some(body) = scanned.token.literal.strip_suffix('\n') else {
        return scanned.end;
    };
    let mut end = scanned.token.position();
    for rune in body.chars() {
        if rune == '\n' {
            end.line += 1;
            end.column = 1;
        } else {
            end.column += 1;
        }
    }
    end.column += 1;
    end
}

fn join_kinds<'k>(kinds: impl Iterator<Item = &'k TokenKind>) -> String {
    kinds.map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// TOKEN SOURCE
// ============================================================================

/// Runs the scan rule on demand. Once an `EOF` token has been produced it is
/// handed out for every later read.
struct TokenSource {
    scanner: Scanner,
    rule: ScanFn,
    finished: Option<Scanned>,
}

impl Source for TokenSource {
    type Item = Scanned;

    fn pull(&mut self) -> Option<Scanned> {
        if self.finished.is_some() {
            return None;
        }
        let scanned = self.scanner.scan(self.rule);
        if scanned.token.is_eof() {
            self.finished = Some(scanned.clone());
        }
        Some(scanned)
    }

    fn sentinel(&self) -> Scanned {
        match &self.finished {
            Some(eof) => eof.clone(),
            None => {
                let at = self.scanner.position();
                Scanned {
                    token: Token::new(TokenKind::EOF, "", at),
                    end: at,
                    error: None,
                }
            }
        }
    }
}

// ============================================================================
// LOOP GUARD
// ============================================================================

/// Counts consecutive rule invocations at one input position.
#[derive(Debug)]
struct LoopGuard {
    last: Option<Position>,
    repeats: usize,
    limit: usize,
}

impl LoopGuard {
    fn new(limit: usize) -> Self {
        Self {
            last: None,
            repeats: 0,
            limit,
        }
    }

    /// Records an invocation at `at`; true once the limit is exceeded.
    fn visit(&mut self, at: Position) -> bool {
        if self.last == Some(at) {
            self.repeats += 1;
        } else {
            self.last = Some(at);
            self.repeats = 0;
        }
        self.repeats > self.limit
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Where a parse stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    /// No pending error.
    Clean,
    /// An error was recorded and has not been recovered from.
    Erroring,
    /// `EOF` has been read; rules are no longer invoked.
    Done,
    /// The loop guard fired; nothing more happens.
    Aborted,
}

/// The tree and every error of a finished parse.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct Parser {
    tokens: PushbackStream<TokenSource>,
    ast: Ast,
    pending: Vec<Token>,
    peeked: Vec<(Token, bool)>,
    errors: Vec<ParseError>,
    erroring: bool,
    done: bool,
    aborted: bool,
    token_set: Option<TokenSet>,
    node_set: Option<NodeSet>,
    guard: LoopGuard,
    trace: SharedTracer,
}

impl Parser {
    pub fn new(scan: ScanFn, source: CharSource, config: ParseConfig) -> Self {
        let trace = SharedTracer::new(config.trace);
        let scanner = Scanner::new(source, trace.clone());
        Self {
            tokens: PushbackStream::new(TokenSource {
                scanner,
                rule: scan,
                finished: None,
            }),
            ast: Ast::new(),
            pending: Vec::new(),
            peeked: Vec::new(),
            errors: Vec::new(),
            erroring: false,
            done: false,
            aborted: false,
            token_set: config.token_set,
            node_set: config.node_set,
            guard: LoopGuard::new(config.loop_limit),
            trace,
        }
    }

    pub fn state(&self) -> ParseState {
        if self.aborted {
            ParseState::Aborted
        } else if self.erroring {
            ParseState::Erroring
        } else if self.done {
            ParseState::Done
        } else {
            ParseState::Clean
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Consumes tokens accepted by `expect`, running each matched branch's
    /// rule before the next token is read.
    ///
    /// A non-optional call that matches nothing records a
    /// `TokenExpectedNotFound` error spanning the offending token.
    pub fn expect(&mut self, expect: ExpectToken<'_>) -> Outcome {
        if self.trace.enabled() {
            self.trace
                .log(&format!("Expect Token [{}] ", expect.describe()), Indent::Newline);
        }
        let kinds: Vec<&TokenKind> = expect.branches.iter().map(|b| &b.kind).collect();
        self.expect_with(
            expect.options,
            &kinds,
            |kind| expect.select(kind),
            || expect.describe(),
        )
    }

    /// Consumes tokens whose kind is *not* listed in `expect`.
    pub fn expect_not(&mut self, expect: ExpectNotToken<'_>) -> Outcome {
        if self.trace.enabled() {
            self.trace
                .log(&format!("Expect Token [{}] ", expect.describe()), Indent::Newline);
        }
        let kinds: Vec<&TokenKind> = expect.kinds.iter().collect();
        self.expect_with(
            expect.options,
            &kinds,
            |kind| expect.select(kind),
            || expect.describe(),
        )
    }

    fn expect_with<'a>(
        &mut self,
        options: MatchOptions,
        kinds: &[&TokenKind],
        select: impl Fn(&TokenKind) -> Option<Option<ParseRule<'a>>>,
        describe: impl FnOnce() -> String,
    ) -> Outcome {
        if self.aborted || self.erroring {
            self.trace
                .log("Skipping Expect as error already found.", Indent::Newline);
            return Outcome::Suppressed;
        }
        if let Some(kind) = self.undeclared(kinds.iter().copied()) {
            let at = self.next_position();
            let message = format!("expected token [{kind}] is not in the token set");
            self.fail(ErrorKind::TokenExpectedNotFound, message, Span::point(at));
            return Outcome::Failed;
        }

        let mut count = 0;
        let mut missed = None;
        loop {
            let mut scanned = self.tokens.read();
            if let Some(error) = scanned.error.take() {
                // The token carrying a scan error is dropped.
                self.peeked.clear();
                self.record(error);
                return Outcome::Failed;
            }
            if scanned.token.is_eof() {
                self.done = true;
            }
            if let Some(kind) = self.undeclared([&scanned.token.kind]) {
                self.tokens.unread();
                let message = format!("scanned token [{kind}] is not in the token set");
                self.fail(
                    ErrorKind::TokenExpectedNotFound,
                    message,
                    Span::new(scanned.token.position(), scanned.end),
                );
                return Outcome::Failed;
            }
            let Some(rule) = select(&scanned.token.kind) else {
                self.tokens.unread();
                missed = Some(scanned);
                break;
            };

            let at = scanned.token.position();
            let kind = scanned.token.kind.clone();
            if self.trace.enabled() {
                self.trace.log(
                    &format!("Found: {} {}", scanned.token.kind, sanitize(&scanned.token.literal, true)),
                    Indent::Newline,
                );
            }
            if options.peek {
                self.peeked.push((scanned.token, options.skip));
            } else {
                self.fold_peeked();
                if !options.skip {
                    self.pending.push(scanned.token);
                }
            }
            count += 1;
            match rule {
                Some(rule) => self.invoke(rule, at),
                None => self.visit_match(&kind, at),
            }
            if !options.multiple || self.done || self.erroring || self.aborted {
                break;
            }
        }

        if count > 0 {
            return Outcome::Matched(count);
        }
        if !options.peek {
            self.push_back_peeked();
        }
        if options.optional {
            return Outcome::Empty;
        }
        let Some(missed) = missed else {
            return Outcome::Failed;
        };
        let message = format!(
            "found [{} {:?}], expected any of [{}]",
            missed.token.kind,
            sanitize(&missed.token.literal, false),
            describe()
        );
        self.fail(
            ErrorKind::TokenExpectedNotFound,
            message,
            Span::new(missed.token.position(), mismatch_end(&missed)),
        );
        Outcome::Failed
    }

    /// Looks ahead without consuming anything. The first branch whose kinds
    /// match the upcoming tokens runs its rule.
    pub fn peek(&mut self, branches: &[PeekToken<'_>]) -> Outcome {
        if self.aborted {
            return Outcome::Suppressed;
        }
        if self.trace.enabled() {
            let described: Vec<String> = branches
                .iter()
                .map(|b| format!("[{}]", join_kinds(b.kinds.iter())))
                .collect();
            self.trace
                .log(&format!("Peek: {}", described.join(" ")), Indent::Newline);
        }
        for branch in branches {
            let mut reads = 0;
            let mut matched = true;
            for kind in &branch.kinds {
                let scanned = self.tokens.read();
                reads += 1;
                if &scanned.token.kind != kind {
                    matched = false;
                    break;
                }
            }
            self.tokens.unread_many(reads);
            if matched {
                if let Some(rule) = branch.rule {
                    let at = self.next_position();
                    self.invoke(rule, at);
                }
                return Outcome::Matched(1);
            }
        }
        Outcome::Empty
    }

    /// Runs `rule` unconditionally.
    pub fn call(&mut self, rule: ParseRule<'_>) {
        if self.aborted {
            return;
        }
        self.trace.log("Call", Indent::Newline);
        let at = self.next_position();
        self.invoke(rule, at);
    }

    /// Clears the error flag and runs `rule` to resynchronise. Does nothing
    /// when no error is pending.
    pub fn recover(&mut self, rule: ParseRule<'_>) -> Outcome {
        if self.aborted {
            return Outcome::Suppressed;
        }
        if !self.erroring {
            return Outcome::Empty;
        }
        self.trace.log("Recovering....", Indent::Newline);
        self.erroring = false;
        let at = self.next_position();
        self.invoke(rule, at);
        Outcome::Matched(1)
    }

    /// Appends a node under the cursor and moves onto it.
    pub fn add_node(&mut self, kind: NodeKind) {
        self.trace
            .log(&format!("AST Add Node: {kind}"), Indent::Newline);
        let undeclared = self
            .node_set
            .as_ref()
            .is_some_and(|set| !set.contains(&kind));
        if undeclared {
            let at = self.next_position();
            let message = format!("node kind [{kind}] is not in the node set");
            self.fail(ErrorKind::NodeNotInNodeSet, message, Span::point(at));
        }
        self.ast.add_node(kind);
    }

    /// Moves every pending matched token onto the node under the cursor.
    pub fn add_tokens(&mut self) {
        if self.pending.is_empty() {
            self.trace.log("Warning: No Tokens to Add", Indent::Error);
            return;
        }
        if self.trace.enabled() {
            let listed: Vec<String> = self
                .pending
                .iter()
                .map(|t| format!("{} - {}", t.kind, sanitize(&t.literal, false)))
                .collect();
            self.trace
                .log(&format!("AST Add Tokens: {}", listed.join(", ")), Indent::Newline);
        }
        let tokens = std::mem::take(&mut self.pending);
        self.ast.add_tokens(tokens);
    }

    /// Discards the most recently matched pending token.
    pub fn skip_token(&mut self) {
        match self.pending.pop() {
            Some(token) => self.trace.log(
                &format!("AST Skip Token: {} - {}", token.kind, sanitize(&token.literal, true)),
                Indent::Newline,
            ),
            None => self.trace.log("Warning: No Tokens to Skip", Indent::Error),
        }
    }

    /// The most recently matched pending token.
    pub fn get_token(&self) -> Option<Token> {
        let token = self.pending.last().cloned();
        if token.is_none() {
            self.trace.log("Error: No tokens to get.", Indent::Error);
        }
        token
    }

    pub fn walk_up(&mut self) {
        self.trace.log("AST Walk Up", Indent::Newline);
        self.ast.walk_up();
    }

    /// Moves the cursor back to the root, typically at a statement boundary
    /// after recovering from an error deep inside an expression.
    pub fn walk_to_root(&mut self) {
        self.trace.log("AST Walk To Root", Indent::Newline);
        self.ast.walk_to_root();
    }

    /// Switches the scan rule into (or out of) its recovery mode. Affects
    /// tokens scanned from now on, not ones already looked ahead at.
    pub fn set_recovering(&mut self, recovering: bool) {
        self.tokens
            .source_mut()
            .scanner
            .set_recovering(recovering);
    }

    /// Ends the parse, returning the tree and every recorded error.
    pub fn exit(self) -> ParseOutput {
        self.trace.flush();
        ParseOutput {
            ast: self.ast,
            errors: self.errors,
        }
    }

    fn invoke(&mut self, rule: ParseRule<'_>, at: Position) {
        if self.aborted || self.done {
            return;
        }
        if self.guard.visit(at) {
            let what = format!("rule {} was entered", rule.name);
            self.abort(&what, at);
            return;
        }
        self.trace
            .log(&format!("Parsing: {}", rule.name), Indent::Increment);
        (rule.run)(self);
        self.trace
            .log(&format!("Returning: {}", rule.name), Indent::Decrement);
    }

    /// A match without a rule counts towards the loop guard too, so a scan
    /// rule that keeps returning empty tokens cannot stall a `multiple` loop.
    fn visit_match(&mut self, kind: &TokenKind, at: Position) {
        if self.aborted || self.done {
            return;
        }
        if self.guard.visit(at) {
            let what = format!("token {kind} was matched");
            self.abort(&what, at);
        }
    }

    fn abort(&mut self, what: &str, at: Position) {
        self.aborted = true;
        let message = format!(
            "{what} more than {} times in a row at {at} without consuming input",
            self.guard.limit
        );
        tracing::warn!(line = at.line, column = at.column, %message, "parse aborted by loop guard");
        let source_lines = self.scanner_mut().source_lines(at.line, at.line);
        self.trace.log(&message, Indent::Error);
        self.errors.push(ParseError::new(
            ErrorKind::InfiniteLoopDetected,
            message,
            source_lines,
            Span::point(at),
        ));
    }

    /// Records an error and sets the error flag. While the flag is already
    /// set nothing new is recorded.
    fn fail(&mut self, kind: ErrorKind, message: String, span: Span) {
        if self.erroring {
            return;
        }
        let source_lines = self.scanner_mut().source_lines(span.start.line, span.end.line);
        self.record(ParseError::new(kind, message, source_lines, span));
    }

    fn record(&mut self, error: ParseError) {
        tracing::debug!(kind = %error.kind, line = error.start_line(), column = error.start_column(), "parse error");
        self.trace.log(&error.message, Indent::Error);
        self.erroring = true;
        self.errors.push(error);
    }

    fn undeclared<'k>(&self, kinds: impl IntoIterator<Item = &'k TokenKind>) -> Option<TokenKind> {
        let set = self.token_set.as_ref()?;
        kinds.into_iter().find(|k| !set.contains(k)).cloned()
    }

    /// Where the next token starts, or the scanner's cursor when nothing has
    /// been looked ahead at. Never runs the scan rule, so a recovery rule can
    /// still switch scanning modes before the next token is produced.
    fn next_position(&self) -> Position {
        match self.tokens.upcoming() {
            Some(scanned) => scanned.token.position(),
            None => self.tokens.source().scanner.position(),
        }
    }

    fn fold_peeked(&mut self) {
        for (token, skip) in std::mem::take(&mut self.peeked) {
            if !skip {
                self.pending.push(token);
            }
        }
    }

    fn push_back_peeked(&mut self) {
        let count = self.peeked.len();
        self.peeked.clear();
        self.tokens.unread_many(count);
    }

    fn scanner_mut(&mut self) -> &mut Scanner {
        &mut self.tokens.source_mut().scanner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Candidate, ExpectRune};
    use crate::{parse_rule, parse_str};

    const WORD: TokenKind = TokenKind::from_static("WORD");
    const COMMA: TokenKind = TokenKind::from_static("COMMA");
    const LIST: NodeKind = NodeKind::from_static("LIST");

    fn scan(s: &mut crate::Scanner) -> Token {
        s.expect(ExpectRune::new().rune(' ').multiple().optional().skip());
        let comma = s.expect(ExpectRune::new().rune(',').optional());
        if comma.matched() {
            s.match_token(&[Candidate::any(COMMA)]);
            return s.exit();
        }
        s.expect(ExpectRune::new().range('a', 'z').multiple().optional());
        s.match_token(&[Candidate::any(WORD)]);
        s.exit()
    }

    fn list(mut p: Parser) -> ParseOutput {
        p.add_node(LIST);
        let first = p.expect(ExpectToken::kind(WORD));
        if first.matched() {
            p.expect(
                ExpectToken::new([TokenBranch::to(COMMA, parse_rule!(next_word))])
                    .multiple()
                    .optional()
                    .skip(),
            );
        }
        p.add_tokens();
        p.expect(ExpectToken::kind(TokenKind::EOF));
        p.exit()
    }

    fn next_word(p: &mut Parser) {
        p.expect(ExpectToken::kind(WORD));
    }

    #[test]
    fn test_multiple_collects_every_item() {
        let out = parse_str(list, scan, "a, b,c");
        assert!(out.is_ok(), "{:?}", out.errors);
        let node = out.ast.root().child(0).unwrap();
        assert_eq!(node.literals(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_missing_token_spans_the_offending_token() {
        let out = parse_str(list, scan, "a, ,");
        assert_eq!(out.errors.len(), 1);
        let error = &out.errors[0];
        assert_eq!(error.kind, ErrorKind::TokenExpectedNotFound);
        assert_eq!(error.span, Span::new(Position::new(1, 4), Position::new(1, 5)));
        assert_eq!(error.source_lines, "a, ,");
    }

    #[test]
    fn test_expect_is_suppressed_while_erroring() {
        fn parse(mut p: Parser) -> ParseOutput {
            assert_eq!(p.expect(ExpectToken::kind(COMMA)), Outcome::Failed);
            assert_eq!(p.state(), ParseState::Erroring);
            assert_eq!(p.expect(ExpectToken::kind(WORD)), Outcome::Suppressed);
            p.exit()
        }
        let out = parse_str(parse, scan, "word");
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn test_recover_clears_the_flag_and_runs_the_rule() {
        fn skip_rest(p: &mut Parser) {
            p.expect(ExpectToken::new([]).invert().multiple().optional().skip());
        }
        fn parse(mut p: Parser) -> ParseOutput {
            p.expect(ExpectToken::kind(COMMA));
            assert_eq!(p.recover(parse_rule!(skip_rest)), Outcome::Matched(1));
            // skip_rest read up to EOF before stopping
            assert_eq!(p.state(), ParseState::Done);
            assert_eq!(p.expect(ExpectToken::kind(TokenKind::EOF)), Outcome::Matched(1));
            assert_eq!(p.recover(parse_rule!(skip_rest)), Outcome::Empty);
            p.exit()
        }
        let out = parse_str(parse, scan, "a b, c");
        assert_eq!(out.errors.len(), 1);
    }

    #[test]
    fn test_peek_does_not_consume() {
        fn word(p: &mut Parser) {
            p.expect(ExpectToken::kind(WORD));
            p.add_node(LIST);
            p.add_tokens();
        }
        fn parse(mut p: Parser) -> ParseOutput {
            let miss = p.peek(&[PeekToken::new([WORD, WORD], parse_rule!(word))]);
            assert_eq!(miss, Outcome::Empty);
            let hit = p.peek(&[
                PeekToken::new([COMMA], parse_rule!(word)),
                PeekToken::new([WORD, COMMA], parse_rule!(word)),
            ]);
            assert_eq!(hit, Outcome::Matched(1));
            p.exit()
        }
        let out = parse_str(parse, scan, "x,");
        assert!(out.is_ok());
        assert_eq!(out.ast.root().child(0).unwrap().literals(), vec!["x"]);
    }

    #[test]
    fn test_skip_get_and_walk() {
        fn parse(mut p: Parser) -> ParseOutput {
            p.expect(ExpectToken::kind(WORD));
            p.expect(ExpectToken::kind(COMMA));
            assert_eq!(p.get_token().map(|t| t.kind), Some(COMMA));
            p.skip_token();
            assert_eq!(p.get_token().map(|t| t.literal), Some("a".to_string()));
            p.add_node(LIST);
            p.add_tokens();
            p.add_tokens();
            p.walk_up();
            p.walk_up();
            assert_eq!(p.ast().cursor().id(), p.ast().root().id());
            p.exit()
        }
        let out = parse_str(parse, scan, "a,");
        assert_eq!(out.ast.root().child(0).unwrap().literals(), vec!["a"]);
    }

    #[test]
    fn test_peek_option_holds_tokens_until_a_real_match() {
        fn parse(mut p: Parser) -> ParseOutput {
            p.expect(ExpectToken::kind(WORD).peek());
            assert!(p.get_token().is_none());
            p.expect(ExpectToken::kind(COMMA));
            p.add_node(LIST);
            p.add_tokens();
            p.exit()
        }
        let out = parse_str(parse, scan, "a,");
        assert!(out.is_ok());
        assert_eq!(out.ast.root().child(0).unwrap().literals(), vec!["a", ","]);
    }

    #[test]
    fn test_peeked_tokens_return_when_next_expect_misses() {
        fn parse(mut p: Parser) -> ParseOutput {
            p.expect(ExpectToken::kind(WORD).peek());
            assert_eq!(p.expect(ExpectToken::kind(WORD).optional()), Outcome::Empty);
            assert_eq!(p.expect(ExpectToken::kind(WORD)), Outcome::Matched(1));
            p.exit()
        }
        assert!(parse_str(parse, scan, "a,").is_ok());
    }

    #[test]
    fn test_undeclared_node_kind_is_reported() {
        fn parse(mut p: Parser) -> ParseOutput {
            p.add_node(NodeKind::new("MYSTERY"));
            p.exit()
        }
        let config = ParseConfig::default().with_node_set(NodeSet::new([LIST]).unwrap());
        let out = crate::parse(parse, scan, "a", config);
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].kind, ErrorKind::NodeNotInNodeSet);
        assert_eq!(out.ast.root().child_count(), 1);
    }

    #[test]
    fn test_undeclared_token_kinds_are_reported() {
        let tokens = TokenSet::new([WORD]).unwrap();
        let out = crate::parse(list, scan, "a, b", ParseConfig::default().with_token_set(tokens));
        assert_eq!(out.errors.len(), 1);
        assert_eq!(out.errors[0].kind, ErrorKind::TokenExpectedNotFound);
        assert!(out.errors[0].message.contains("COMMA"));
    }

    #[test]
    fn test_loop_guard_counts_only_repeats() {
        let mut guard = LoopGuard::new(2);
        let here = Position::new(1, 1);
        assert!(!guard.visit(here));
        assert!(!guard.visit(here));
        assert!(!guard.visit(Position::new(1, 2)));
        assert!(!guard.visit(here));
        assert!(!guard.visit(here));
        assert!(!guard.visit(here));
        assert!(guard.visit(here));
    }
}
