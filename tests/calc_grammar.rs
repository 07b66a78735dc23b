//! End-to-end tests for the bundled calc grammar.

mod common;

use common::{calc, leaf, to_value, token, CALC_PROGRAM};
use dslkit::grammars::calc::CALL;
use dslkit::{ErrorKind, Position, Span};
use serde_json::{json, Value};

fn node(kind: &str, token: Value, children: Vec<Value>) -> Value {
    json!({"type": kind, "tokens": [token], "children": children})
}

#[test]
fn test_program_builds_expected_tree() {
    let out = calc(CALC_PROGRAM);
    assert!(out.is_ok(), "{:?}", out.errors);

    let expected = json!({
        "type": "ROOT",
        "tokens": null,
        "children": [
            node("ASSIGNMENT", token("VARIABLE", "a", 1, 1), vec![
                leaf("TERMINAL", token("LITERAL", "1", 1, 6)),
                node("EXPRESSION", token("MULTIPLY", "*", 1, 8), vec![
                    leaf("TERMINAL", token("LITERAL", "5", 1, 10)),
                    node("EXPRESSION", token("PLUS", "+", 1, 12), vec![
                        leaf("TERMINAL", token("LITERAL", "7", 1, 14)),
                    ]),
                ]),
            ]),
            node("ASSIGNMENT", token("VARIABLE", "b", 2, 1), vec![
                leaf("TERMINAL", token("LITERAL", "3.45", 2, 6)),
                node("EXPRESSION", token("MULTIPLY", "*", 2, 11), vec![
                    leaf("TERMINAL", token("LITERAL", "44.21", 2, 13)),
                    node("EXPRESSION", token("DIVIDE", "/", 2, 19), vec![
                        node("EXPRESSION", token("OPEN_PAREN", "(", 2, 21), vec![
                            leaf("TERMINAL", token("LITERAL", "4", 2, 22)),
                            node("EXPRESSION", token("PLUS", "+", 2, 24), vec![
                                leaf("TERMINAL", token("VARIABLE", "a", 2, 26)),
                            ]),
                        ]),
                        leaf("TERMINAL", token("CLOSE_PAREN", ")", 2, 27)),
                    ]),
                ]),
            ]),
            leaf("COMMENT", token("COMMENT", "A Simple Expression", 2, 30)),
            node("CALL", token("VARIABLE", "double", 3, 1), vec![
                leaf("TERMINAL", token("VARIABLE", "a", 3, 8)),
                node("EXPRESSION", token("PLUS", "+", 3, 10), vec![
                    leaf("TERMINAL", token("VARIABLE", "b", 3, 12)),
                ]),
            ]),
        ]
    });
    assert_eq!(to_value(out.ast.root()), expected);
    assert_eq!(
        serde_json::to_value(&out.ast).unwrap(),
        json!({ "root": expected })
    );
}

#[test]
fn test_unexpected_token_stops_the_parse() {
    let out = calc("a error := 1 * 5 + 7\nb := 2\ndouble(a + b)  ");
    assert_eq!(out.errors.len(), 1);
    let error = &out.errors[0];
    assert_eq!(error.kind, ErrorKind::TokenExpectedNotFound);
    assert_eq!((error.start_line(), error.start_column()), (1, 3));
    assert_eq!((error.end_line(), error.end_column()), (1, 9));
}

#[test]
fn test_unknown_character_at_start() {
    let out = calc("_ := 1 * 5 + 7\nb := 2");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].kind, ErrorKind::RuneExpectedNotFound);
    assert_eq!(out.errors[0].span, Span::point(Position::START));
}

#[test]
fn test_recovery_skips_rest_of_line() {
    let broken = CALC_PROGRAM.replace("(4 + a)", "(4; + a)");
    let out = calc(&broken);

    assert_eq!(out.errors.len(), 1, "{:?}", out.errors);
    assert_eq!(out.errors[0].kind, ErrorKind::RuneExpectedNotFound);
    assert_eq!(out.errors[0].span, Span::point(Position::new(2, 23)));

    // The comment went with the skipped line; the call after it is intact.
    let root = out.ast.root();
    let kinds: Vec<&str> = root.children().map(|n| n.kind().as_str()).collect();
    assert_eq!(kinds, vec!["ASSIGNMENT", "ASSIGNMENT", "CALL"]);

    let valid = calc(CALC_PROGRAM);
    let expected_call = valid.ast.root().child(3).unwrap();
    assert_eq!(expected_call.kind(), &CALL);
    assert_eq!(to_value(root.child(2).unwrap()), to_value(expected_call));
}

#[test]
fn test_recovery_after_unexpected_token_in_group() {
    let out = calc("a := (1 2)\nb := 3\n");

    assert_eq!(out.errors.len(), 1, "{:?}", out.errors);
    assert_eq!(out.errors[0].kind, ErrorKind::TokenExpectedNotFound);
    assert_eq!(
        out.errors[0].message,
        r#"found [LITERAL "2"], expected any of [CLOSE_PAREN]"#
    );
    assert_eq!(out.errors[0].span.start, Position::new(1, 9));

    let root = out.ast.root();
    let kinds: Vec<&str> = root.children().map(|n| n.kind().as_str()).collect();
    assert_eq!(kinds, vec!["ASSIGNMENT", "ASSIGNMENT"]);
    let second = root.child(1).unwrap();
    assert_eq!(second.tokens()[0].position(), Position::new(2, 1));
    assert_eq!(second.child(0).unwrap().literals(), vec!["3"]);
}

#[test]
fn test_each_line_reports_its_own_error() {
    let broken = CALC_PROGRAM
        .replace("(4 + a)", "(4; + a)")
        .replace("double(a + b)", "double((a + b)");
    let out = calc(&broken);

    let spans: Vec<(ErrorKind, Span)> = out.errors.iter().map(|e| (e.kind, e.span)).collect();
    assert_eq!(
        spans,
        vec![
            (ErrorKind::RuneExpectedNotFound, Span::point(Position::new(2, 23))),
            (ErrorKind::TokenExpectedNotFound, Span::point(Position::new(3, 15))),
        ]
    );
}

#[test]
fn test_indented_lines_keep_their_columns() {
    let out = calc("a := 1\n\t\tb := 2\n  show(b)");
    assert!(out.is_ok(), "{:?}", out.errors);
    let b = out.ast.root().child(1).unwrap();
    assert_eq!(b.tokens()[0].position(), Position::new(2, 3));
    let show = out.ast.root().child(2).unwrap();
    assert_eq!(show.tokens()[0].position(), Position::new(3, 3));
}

#[test]
fn test_tree_drawing() {
    let out = calc("x := (1 + y) 'note");
    let expected = "\
└── ROOT -
    ├── ASSIGNMENT - x,
    │   ├── EXPRESSION - (,
    │   │   ├── TERMINAL - 1,
    │   │   └── EXPRESSION - +,
    │   │       └── TERMINAL - y,
    │   └── TERMINAL - ),
    └── COMMENT - note,
";
    assert_eq!(out.ast.to_string(), expected);
}
