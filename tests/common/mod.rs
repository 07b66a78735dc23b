//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use dslkit::{NodeRef, ParseOutput};
use serde_json::Value;

/// Three well-formed calc statements: two assignments (the second with a
/// trailing comment) and a call.
pub const CALC_PROGRAM: &str = "a := 1 * 5 + 7
b := 3.45 * 44.21 / (4 + a) 'A Simple Expression
double(a + b)";

pub fn calc(source: &str) -> ParseOutput {
    dslkit::grammars::calc::GRAMMAR.parse_str(source)
}

pub fn json(source: &str) -> ParseOutput {
    dslkit::grammars::json::GRAMMAR.parse_str(source)
}

/// A node in its serialized form, for structural comparisons.
pub fn to_value(node: NodeRef<'_>) -> Value {
    serde_json::to_value(node).expect("node serializes")
}

/// A serialized token, `{"ID", "Literal", "Line", "Position"}`.
pub fn token(kind: &str, literal: &str, line: usize, column: usize) -> Value {
    serde_json::json!({"ID": kind, "Literal": literal, "Line": line, "Position": column})
}

/// A serialized leaf node holding one token.
pub fn leaf(node: &str, token: Value) -> Value {
    serde_json::json!({"type": node, "tokens": [token], "children": null})
}
