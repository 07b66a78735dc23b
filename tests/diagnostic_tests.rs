//! Golden master tests for rendered diagnostics.
//!
//! Each error comes from a real parse so the snapshot covers the message,
//! the quoted source lines and the caret line together.

mod common;

use common::{calc, json};
use dslkit::{ErrorKind, ParseError, Position, Span};

fn only_error(errors: Vec<ParseError>) -> ParseError {
    assert_eq!(errors.len(), 1, "{errors:?}");
    errors.into_iter().next().unwrap()
}

#[test]
fn test_single_line_span() {
    let error = only_error(calc("a error := 1 * 5 + 7\nb := 2").errors);

    let expected = r#"TokenExpectedNotFound at line 1, column 3: found [VARIABLE "error"], expected any of [ASSIGN, OPEN_PAREN]
a error := 1 * 5 + 7
  ^-----^
"#;
    assert_eq!(error.render(), expected);
}

#[test]
fn test_line_break_token_stays_on_its_line() {
    let out = calc("a := (1 + )\nb := 3\n");
    let error = only_error(out.errors);

    assert_eq!(
        error.span,
        Span::new(Position::new(1, 12), Position::new(1, 13))
    );
    let expected = r#"TokenExpectedNotFound at line 1, column 12: found [NL "NL"], expected any of [CLOSE_PAREN]
a := (1 + )
           ^^
"#;
    assert_eq!(error.render(), expected);
}

#[test]
fn test_caret_keeps_tab_indentation() {
    let error = only_error(calc("\tx := (4;").errors);

    let expected = "RuneExpectedNotFound at line 1, column 9: found [;], expected any of \
[-, +, *, /, (, ), NL, EOF, :, ', \", 0-9, A-Z, a-z]
\tx := (4;
\t       ^
";
    assert_eq!(error.render(), expected);
}

#[test]
fn test_multi_line_span() {
    let error = only_error(json("{\"key\": \"abc\ndef").errors);
    assert_eq!(error.span, Span::new(Position::new(1, 9), Position::new(2, 4)));

    let expected = r#"RuneExpectedNotFound at line 1, column 9: found [EOF], expected any of ["]
{"key": "abc
        ^--^
def
---^
"#;
    assert_eq!(error.render(), expected);
}

#[test]
fn test_diagnostic_code_and_label() {
    use miette::Diagnostic;

    let error = only_error(calc("a error := 1").errors);
    assert_eq!(error.kind, ErrorKind::TokenExpectedNotFound);
    assert_eq!(
        error.code().map(|c| c.to_string()),
        Some("dslkit::token_expected_not_found".to_string())
    );
    let labels: Vec<_> = error.labels().into_iter().flatten().collect();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].offset(), 2);
}

#[test]
fn test_report_renders_through_miette() {
    let error = only_error(calc("_ := 1").errors);
    let report = format!("{:?}", miette::Report::new(error));
    assert!(report.contains("RuneExpectedNotFound"), "{report}");
}
