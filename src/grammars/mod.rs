//! Grammars bundled with the crate.
//!
//! Both are small enough to read in one sitting and double as worked
//! examples of the scanner and parser protocols. The CLI selects between
//! them by name.

pub mod calc;
pub mod json;

use crate::Grammar;

/// Every bundled grammar.
pub const ALL: [Grammar; 2] = [calc::GRAMMAR, json::GRAMMAR];

/// The bundled grammar called `name`.
pub fn find(name: &str) -> Option<Grammar> {
    ALL.into_iter().find(|g| g.name == name)
}
