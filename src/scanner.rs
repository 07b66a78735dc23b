//! The character-level scanning engine.
//!
//! A grammar supplies a scan rule, a plain function taking the [`Scanner`]
//! and returning a [`Token`]. The rule describes one token by calling
//! [`Scanner::expect`] and [`Scanner::expect_not`] with sets of acceptable
//! characters, commits the accumulated literal with
//! [`Scanner::match_token`], and hands the result back with
//! [`Scanner::exit`]:
//!
//! ```
//! use dslkit::scanner::{Candidate, ExpectRune, Scanner};
//! use dslkit::{Token, TokenKind};
//!
//! const NUMBER: TokenKind = TokenKind::from_static("NUMBER");
//!
//! fn scan(s: &mut Scanner) -> Token {
//!     s.expect(ExpectRune::new().range('0', '9').multiple());
//!     s.match_token(&[Candidate::any(NUMBER)]);
//!     s.exit()
//! }
//! ```
//!
//! The scanner tracks line and column for every consumed character and
//! keeps the text of finished lines so that errors can quote the source.

use crate::diagnostics::{sanitize, ErrorKind, ParseError, Span};
use crate::options::{option_builders, MatchOptions, Outcome};
use crate::source::{CharSource, EOF_RUNE};
use crate::stream::PushbackStream;
use crate::token::{Position, Token, TokenKind};
use crate::trace::{Indent, SharedTracer};
use std::fmt;

/// A grammar's top-level scan rule.
pub type ScanFn = fn(&mut Scanner) -> Token;

// ============================================================================
// RULES AND BRANCHES
// ============================================================================

/// A named nested scan rule, run when its branch matches.
///
/// Build one with [`scan_rule!`](crate::scan_rule), which records the
/// function's name for traces.
#[derive(Clone, Copy)]
pub struct ScanRule<'a> {
    name: &'static str,
    run: &'a dyn Fn(&mut Scanner),
}

impl<'a> ScanRule<'a> {
    pub fn new(name: &'static str, run: &'a dyn Fn(&mut Scanner)) -> Self {
        Self { name, run }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ScanRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScanRule({})", self.name)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RuneBranch<'a> {
    pub rune: char,
    pub rule: Option<ScanRule<'a>>,
}

/// An inclusive character range. Ranges never match the end-of-input
/// sentinel.
#[derive(Debug, Clone, Copy)]
pub struct RuneRange<'a> {
    pub first: char,
    pub last: char,
    pub rule: Option<ScanRule<'a>>,
}

impl RuneRange<'_> {
    fn contains(&self, rune: char) -> bool {
        rune != EOF_RUNE && (self.first..=self.last).contains(&rune)
    }
}

/// Characters accepted by one [`Scanner::expect`] call.
#[derive(Debug, Clone, Default)]
pub struct ExpectRune<'a> {
    pub branches: Vec<RuneBranch<'a>>,
    pub ranges: Vec<RuneRange<'a>>,
    pub options: MatchOptions,
}

impl<'a> ExpectRune<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rune(mut self, rune: char) -> Self {
        self.branches.push(RuneBranch { rune, rule: None });
        self
    }

    /// Accepts each character of `runes`.
    pub fn runes(mut self, runes: &str) -> Self {
        self.branches
            .extend(runes.chars().map(|rune| RuneBranch { rune, rule: None }));
        self
    }

    /// Accepts `rune` and runs `rule` right after consuming it.
    pub fn rune_then(mut self, rune: char, rule: ScanRule<'a>) -> Self {
        self.branches.push(RuneBranch {
            rune,
            rule: Some(rule),
        });
        self
    }

    pub fn range(mut self, first: char, last: char) -> Self {
        self.ranges.push(RuneRange {
            first,
            last,
            rule: None,
        });
        self
    }

    pub fn range_then(mut self, first: char, last: char, rule: ScanRule<'a>) -> Self {
        self.ranges.push(RuneRange {
            first,
            last,
            rule: Some(rule),
        });
        self
    }

    /// Accepts every character that no branch or range names.
    pub fn invert(mut self) -> Self {
        self.options.invert = true;
        self
    }

    /// The branch accepting `rune`, if any: `Some(rule)` when matched.
    fn select(&self, rune: char) -> Option<Option<ScanRule<'a>>> {
        let hit = self
            .branches
            .iter()
            .find(|b| b.rune == rune)
            .map(|b| b.rule)
            .or_else(|| self.ranges.iter().find(|r| r.contains(rune)).map(|r| r.rule));
        if !self.options.invert {
            return hit;
        }
        match hit {
            Some(_) => None,
            None if rune == EOF_RUNE => None,
            None => Some(None),
        }
    }

    fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .branches
            .iter()
            .map(|b| sanitize(&b.rune.to_string(), true))
            .collect();
        parts.extend(
            self.ranges
                .iter()
                .map(|r| format!("{}-{}", sanitize(&r.first.to_string(), true), sanitize(&r.last.to_string(), true))),
        );
        let list = parts.join(", ");
        if self.options.invert {
            format!("anything except {list}")
        } else {
            list
        }
    }
}

option_builders!(ExpectRune);

/// Characters rejected by one [`Scanner::expect_not`] call; anything else is
/// accepted, except the end-of-input sentinel.
#[derive(Debug, Clone, Default)]
pub struct ExpectNotRune<'a> {
    pub runes: Vec<char>,
    pub ranges: Vec<(char, char)>,
    pub rule: Option<ScanRule<'a>>,
    pub options: MatchOptions,
}

impl<'a> ExpectNotRune<'a> {
    pub fn new(runes: &str) -> Self {
        Self {
            runes: runes.chars().collect(),
            ..Self::default()
        }
    }

    pub fn range(mut self, first: char, last: char) -> Self {
        self.ranges.push((first, last));
        self
    }

    /// Runs `rule` after each accepted character.
    pub fn then(mut self, rule: ScanRule<'a>) -> Self {
        self.rule = Some(rule);
        self
    }

    fn select(&self, rune: char) -> Option<Option<ScanRule<'a>>> {
        let excluded = rune == EOF_RUNE
            || self.runes.contains(&rune)
            || self.ranges.iter().any(|(a, b)| (*a..=*b).contains(&rune));
        if excluded {
            None
        } else {
            Some(self.rule)
        }
    }

    fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .runes
            .iter()
            .map(|r| sanitize(&r.to_string(), true))
            .collect();
        parts.extend(self.ranges.iter().map(|(a, b)| format!("{a}-{b}")));
        format!("anything except {}", parts.join(", "))
    }
}

option_builders!(ExpectNotRune);

/// One way to commit the accumulated literal as a token. An empty literal
/// matches anything.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub literal: &'a str,
    pub kind: TokenKind,
}

impl<'a> Candidate<'a> {
    pub fn new(literal: &'a str, kind: TokenKind) -> Self {
        Self { literal, kind }
    }

    /// Commits whatever has been accumulated.
    pub fn any(kind: TokenKind) -> Self {
        Self { literal: "", kind }
    }
}

// ============================================================================
// SCANNER
// ============================================================================

/// A token together with where its scan ended and any error raised on the
/// way.
#[derive(Debug, Clone)]
pub struct Scanned {
    pub token: Token,
    pub end: Position,
    pub error: Option<ParseError>,
}

/// Scanner state. One scan rule invocation produces one token.
pub struct Scanner {
    stream: PushbackStream<CharSource>,
    trace: SharedTracer,
    position: Position,
    line_text: String,
    lines: Vec<String>,
    literal: Vec<(char, Position)>,
    peeked: Vec<(char, bool)>,
    first_consumed: Option<Position>,
    token: Option<Token>,
    error: Option<ParseError>,
    recovering: bool,
}

impl Scanner {
    pub fn new(source: CharSource, trace: SharedTracer) -> Self {
        Self {
            stream: PushbackStream::new(source),
            trace,
            position: Position::START,
            line_text: String::new(),
            lines: Vec::new(),
            literal: Vec::new(),
            peeked: Vec::new(),
            first_consumed: None,
            token: None,
            error: None,
            recovering: false,
        }
    }

    /// The position of the next character to be consumed.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The literal accumulated so far in this scan.
    pub fn literal(&self) -> String {
        self.literal.iter().map(|(c, _)| c).collect()
    }

    /// Set by the parser while a grammar recovers from an error, so that the
    /// scan rule can switch to a resynchronising mode.
    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    pub(crate) fn set_recovering(&mut self, recovering: bool) {
        self.recovering = recovering;
    }

    /// Runs `rule` once to produce the next token.
    pub fn scan(&mut self, rule: ScanFn) -> Scanned {
        self.token = None;
        self.literal.clear();
        self.peeked.clear();
        self.first_consumed = None;
        self.error = None;

        let token = rule(self);
        self.push_back_peeked();
        Scanned {
            token,
            end: self.position,
            error: self.error.take(),
        }
    }

    /// Consumes characters accepted by `expect`.
    ///
    /// Each accepted character runs its branch rule, if any, before the next
    /// one is read. A non-optional call that accepts nothing records a
    /// `RuneExpectedNotFound` error; after that every call in this scan is
    /// suppressed.
    pub fn expect(&mut self, expect: ExpectRune<'_>) -> Outcome {
        if self.trace.enabled() {
            self.trace
                .log(&format!("Expect [{}] ", expect.describe()), Indent::Newline);
        }
        self.expect_with(expect.options, |rune| expect.select(rune), || expect.describe())
    }

    /// Consumes characters *not* named by `expect`.
    pub fn expect_not(&mut self, expect: ExpectNotRune<'_>) -> Outcome {
        if self.trace.enabled() {
            self.trace
                .log(&format!("Expect [{}] ", expect.describe()), Indent::Newline);
        }
        self.expect_with(expect.options, |rune| expect.select(rune), || expect.describe())
    }

    fn expect_with<'a>(
        &mut self,
        options: MatchOptions,
        select: impl Fn(char) -> Option<Option<ScanRule<'a>>>,
        describe: impl FnOnce() -> String,
    ) -> Outcome {
        if self.error.is_some() {
            return Outcome::Suppressed;
        }

        let mut count = 0;
        let mut found;
        loop {
            let rune = self.stream.read();
            found = rune;
            let Some(rule) = select(rune) else {
                self.stream.unread();
                break;
            };
            if self.trace.enabled() {
                self.trace.log(
                    &format!("Found: {} at {} ", sanitize(&rune.to_string(), true), self.position),
                    Indent::None,
                );
            }
            if options.peek {
                self.peeked.push((rune, options.skip));
            } else {
                self.fold_peeked();
                self.consume(rune, options.skip);
            }
            count += 1;
            if let Some(rule) = rule {
                self.call(rule);
            }
            if !options.multiple || rune == EOF_RUNE || self.error.is_some() {
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
        let message = format!(
            "found [{}], expected any of [{}]",
            sanitize(&found.to_string(), true),
            describe()
        );
        self.fail(message);
        Outcome::Failed
    }

    /// Runs a nested rule unconditionally.
    pub fn call(&mut self, rule: ScanRule<'_>) {
        self.trace
            .log(&format!("Scanning: {}", rule.name), Indent::Increment);
        (rule.run)(self);
        self.trace
            .log(&format!("Returning: {}", rule.name), Indent::Decrement);
    }

    /// Commits the accumulated literal as a token of the first candidate that
    /// matches it. Only the first successful call in a scan has any effect,
    /// and an empty literal at the end of input is left for [`Scanner::exit`]
    /// to report as `EOF`.
    pub fn match_token(&mut self, candidates: &[Candidate<'_>]) {
        if self.token.is_some() || (self.literal.is_empty() && self.at_end()) {
            return;
        }
        let text = self.literal();
        let Some(candidate) = candidates
            .iter()
            .find(|c| c.literal.is_empty() || c.literal == text)
        else {
            return;
        };
        let at = self.literal.first().map_or(self.position, |(_, p)| *p);
        if self.trace.enabled() {
            self.trace.log(
                &format!("Matched: {} - {}", candidate.kind, sanitize(&text, true)),
                Indent::Newline,
            );
        }
        self.token = Some(Token::new(candidate.kind.clone(), text, at));
    }

    /// Drops the most recently accumulated character from the literal. The
    /// position is unaffected.
    pub fn skip_rune(&mut self) {
        match self.literal.pop() {
            Some((rune, _)) => self.trace.log(
                &format!("Skip Rune: {}", sanitize(&rune.to_string(), true)),
                Indent::Newline,
            ),
            None => self.trace.log("Warning: No Runes to Skip", Indent::Error),
        }
    }

    /// Finishes the scan: the committed token, an `EOF` token once input is
    /// exhausted and nothing was accumulated, or an `UNKNOWN` token at the
    /// current position.
    pub fn exit(&mut self) -> Token {
        self.push_back_peeked();
        if let Some(token) = &self.token {
            return token.clone();
        }
        if self.literal.is_empty() && self.at_end() {
            return Token::new(TokenKind::EOF, "", self.position);
        }
        Token::new(TokenKind::UNKNOWN, self.literal(), self.position)
    }

    /// Source text of lines `from..=to`. The current line is completed by
    /// reading ahead; everything read is pushed back.
    pub(crate) fn source_lines(&mut self, from: usize, to: usize) -> String {
        let mut out = Vec::new();
        for line in from..=to {
            if line < self.position.line {
                out.push(self.lines.get(line - 1).cloned().unwrap_or_default());
            } else if line == self.position.line {
                out.push(self.current_line());
                break;
            }
        }
        out.join("\n")
    }

    fn current_line(&mut self) -> String {
        let mut text = self.line_text.clone();
        for (rune, _) in &self.peeked {
            if *rune == '\n' {
                return text;
            }
            text.push(*rune);
        }
        let mut reads = 0;
        loop {
            let rune = self.stream.read();
            reads += 1;
            if rune == '\n' || rune == EOF_RUNE {
                break;
            }
            text.push(rune);
        }
        self.stream.unread_many(reads);
        text
    }

    fn at_end(&mut self) -> bool {
        let rune = self.stream.read();
        self.stream.unread();
        rune == EOF_RUNE
    }

    fn consume(&mut self, rune: char, skip: bool) {
        if rune == EOF_RUNE {
            return;
        }
        if !skip {
            self.first_consumed.get_or_insert(self.position);
            self.literal.push((rune, self.position));
        }
        if rune == '\n' {
            self.lines.push(std::mem::take(&mut self.line_text));
            self.position.line += 1;
            self.position.column = 1;
            if self.trace.enabled() {
                self.trace
                    .log(&format!("Line {}:", self.position.line), Indent::StartLine);
            }
        } else {
            self.line_text.push(rune);
            self.position.column += 1;
        }
    }

    fn fold_peeked(&mut self) {
        for (rune, skip) in std::mem::take(&mut self.peeked) {
            self.consume(rune, skip);
        }
    }

    fn push_back_peeked(&mut self) {
        let count = self.peeked.len();
        self.peeked.clear();
        self.stream.unread_many(count);
    }

    /// Records the first error of this scan; later ones are dropped.
    fn fail(&mut self, message: String) {
        if self.error.is_some() {
            return;
        }
        let start = self.first_consumed.unwrap_or(self.position);
        let end = self.position;
        let source_lines = self.source_lines(start.line, end.line);
        self.trace.log(&message, Indent::Error);
        tracing::debug!(line = start.line, column = start.column, %message, "scan error");
        self.error = Some(ParseError::new(
            ErrorKind::RuneExpectedNotFound,
            message,
            source_lines,
            Span::new(start, end),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORD: TokenKind = TokenKind::from_static("WORD");
    const NUMBER: TokenKind = TokenKind::from_static("NUMBER");

    fn scanner(input: &str) -> Scanner {
        Scanner::new(CharSource::from(input), SharedTracer::default())
    }

    fn words(s: &mut Scanner) -> Token {
        s.expect(ExpectRune::new().runes(" \n").multiple().optional().skip());
        s.expect(ExpectRune::new().range('a', 'z').multiple().optional());
        s.match_token(&[Candidate::any(WORD)]);
        s.exit()
    }

    #[test]
    fn test_positions_track_lines_and_columns() {
        let mut s = scanner("ab\n  cd");
        let first = s.scan(words).token;
        assert_eq!(first, Token::new(WORD, "ab", Position::new(1, 1)));
        let second = s.scan(words).token;
        assert_eq!(second, Token::new(WORD, "cd", Position::new(2, 3)));
        assert_eq!(s.position(), Position::new(2, 5));
    }

    #[test]
    fn test_exit_reports_eof_once_input_is_exhausted() {
        let mut s = scanner("ab");
        s.scan(words);
        let scanned = s.scan(words);
        assert!(scanned.token.is_eof());
        assert_eq!(scanned.token.position(), Position::new(1, 3));
        assert!(scanned.error.is_none());
    }

    #[test]
    fn test_exit_without_match_is_unknown_at_cursor() {
        fn nothing(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('x').optional());
            s.exit()
        }
        let mut s = scanner("q");
        let token = s.scan(nothing).token;
        assert_eq!(token.kind, TokenKind::UNKNOWN);
        assert_eq!(token.position(), Position::START);
    }

    #[test]
    fn test_inverted_expect_takes_only_unnamed_runes() {
        fn text(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune(';').range('0', '9').invert().multiple());
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }

        let mut s = scanner("ab c;");
        let scanned = s.scan(text);
        assert_eq!(scanned.token, Token::new(WORD, "ab c", Position::START));
        assert!(scanned.error.is_none());

        let error = s.scan(text).error.unwrap();
        assert_eq!(error.kind, ErrorKind::RuneExpectedNotFound);
        assert_eq!(
            error.message,
            "found [;], expected any of [anything except ;, 0-9]"
        );

        // The sentinel is never taken, so the run stops cleanly at the end.
        let mut s = scanner("xy");
        let scanned = s.scan(text);
        assert_eq!(scanned.token.literal, "xy");
        assert!(scanned.error.is_none());
        assert_eq!(s.position(), Position::new(1, 3));

        let last = s.scan(text);
        assert!(last.token.is_eof());
        assert!(last.error.unwrap().message.starts_with("found [EOF]"));
    }

    #[test]
    fn test_first_exact_match_wins_over_later_wildcard() {
        fn keyword(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().range('a', 'z').multiple());
            s.match_token(&[Candidate::new("null", NUMBER), Candidate::any(WORD)]);
            s.match_token(&[Candidate::any(NUMBER)]);
            s.exit()
        }
        assert_eq!(scanner("null").scan(keyword).token.kind, NUMBER);
        assert_eq!(scanner("nul").scan(keyword).token.kind, WORD);
    }

    #[test]
    fn test_failed_expect_records_one_error_and_suppresses_the_rest() {
        fn digits(s: &mut Scanner) -> Token {
            let first = s.expect(ExpectRune::new().range('0', '9'));
            let second = s.expect(ExpectRune::new().range('0', '9'));
            assert_eq!(first, Outcome::Failed);
            assert_eq!(second, Outcome::Suppressed);
            s.exit()
        }
        let scanned = scanner("x1").scan(digits);
        let error = scanned.error.unwrap();
        assert_eq!(error.kind, ErrorKind::RuneExpectedNotFound);
        assert_eq!(error.span, Span::point(Position::START));
        assert_eq!(error.source_lines, "x1");
        assert_eq!(error.message, "found [x], expected any of [0-9]");
    }

    #[test]
    fn test_skip_option_consumes_without_accumulating() {
        fn quoted(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('\'').skip());
            s.expect_not(ExpectNotRune::new("'").multiple());
            s.expect(ExpectRune::new().rune('\'').skip());
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }
        let mut s = scanner("'hi there'");
        let token = s.scan(quoted).token;
        assert_eq!(token.literal, "hi there");
        assert_eq!(token.column, 2);
        assert_eq!(s.position(), Position::new(1, 11));
    }

    #[test]
    fn test_skip_rune_drops_last_character() {
        fn quoted(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('"'));
            s.skip_rune();
            s.expect(ExpectRune::new().range('a', 'z').multiple());
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }
        let token = scanner("\"abc").scan(quoted).token;
        assert_eq!(token.literal, "abc");
        assert_eq!(token.column, 2);
    }

    #[test]
    fn test_expect_not_never_takes_end_of_input() {
        fn rest(s: &mut Scanner) -> Token {
            let outcome = s.expect_not(ExpectNotRune::new("\"").multiple());
            assert_eq!(outcome, Outcome::Matched(3));
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }
        assert_eq!(scanner("abc").scan(rest).token.literal, "abc");
    }

    #[test]
    fn test_peeked_runes_fold_into_literal_on_next_match() {
        fn signed(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('-').peek().optional());
            s.expect(ExpectRune::new().range('0', '9').multiple());
            s.match_token(&[Candidate::any(NUMBER)]);
            s.exit()
        }
        let mut s = scanner("-42");
        let token = s.scan(signed).token;
        assert_eq!(token.literal, "-42");
        assert_eq!(token.column, 1);
    }

    #[test]
    fn test_peeked_runes_are_pushed_back_when_nothing_follows() {
        fn minus_then_digit(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('-').peek());
            let digits = s.expect(ExpectRune::new().range('0', '9').optional());
            assert_eq!(digits, Outcome::Empty);
            s.expect(ExpectRune::new().rune('-'));
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }
        let mut s = scanner("-x");
        let token = s.scan(minus_then_digit).token;
        assert_eq!(token.literal, "-");
        assert_eq!(s.position(), Position::new(1, 2));
    }

    #[test]
    fn test_branch_rule_runs_after_its_character() {
        fn tail(s: &mut Scanner) {
            s.expect(ExpectRune::new().range('a', 'z').multiple().optional());
        }
        fn ident(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune_then('$', crate::scan_rule!(tail)));
            s.match_token(&[Candidate::any(WORD)]);
            s.exit()
        }
        assert_eq!(scanner("$abc!").scan(ident).token.literal, "$abc");
    }

    #[test]
    fn test_multiline_error_quotes_every_spanned_line() {
        fn string(s: &mut Scanner) -> Token {
            s.expect(ExpectRune::new().rune('"'));
            s.expect_not(ExpectNotRune::new("\"").multiple().optional());
            s.expect(ExpectRune::new().rune('"'));
            s.exit()
        }
        let scanned = scanner("\"ab\ncd").scan(string);
        let error = scanned.error.unwrap();
        assert_eq!(error.span.start, Position::new(1, 1));
        assert_eq!(error.span.end, Position::new(2, 3));
        assert_eq!(error.source_lines, "\"ab\ncd");
        assert_eq!(scanned.token.kind, TokenKind::UNKNOWN);
    }
}
