//! Box-drawing rendering of a tree, one node per line:
//!
//! ```text
//! └── ROOT -
//!     └── OBJECT -
//!         ├── MEMBER - key1,
//!         │   └── VALUE - value1,
//!         └── MEMBER - key2,
//!             └── VALUE - 42,
//! ```

use super::{Ast, NodeRef};
use crate::diagnostics::sanitize;
use std::fmt;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const CONTINUE: &str = "│   ";
const BLANK: &str = "    ";

fn write_node(
    f: &mut fmt::Formatter<'_>,
    node: NodeRef<'_>,
    prefix: &str,
    is_tail: bool,
) -> fmt::Result {
    write!(
        f,
        "{prefix}{}{} -",
        if is_tail { LAST_BRANCH } else { BRANCH },
        node.kind()
    )?;
    for token in node.tokens() {
        write!(f, " {},", sanitize(&token.literal, false))?;
    }
    writeln!(f)?;

    let child_prefix = format!("{prefix}{}", if is_tail { BLANK } else { CONTINUE });
    let count = node.child_count();
    for (index, child) in node.children().enumerate() {
        write_node(f, child, &child_prefix, index + 1 == count)?;
    }
    Ok(())
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self.root(), "", true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Ast, NodeKind};
    use crate::token::{Position, Token, TokenKind};

    #[test]
    fn test_display_draws_branches_and_tokens() {
        let mut ast = Ast::new();
        ast.add_node(NodeKind::new("CALL"));
        ast.add_tokens([Token::new(TokenKind::new("VARIABLE"), "f", Position::START)]);
        ast.add_node(NodeKind::new("TERMINAL"));
        ast.walk_up();
        ast.add_node(NodeKind::new("TERMINAL"));
        ast.add_tokens([Token::new(TokenKind::new("NL"), "\n", Position::START)]);

        let expected = "\
└── ROOT -
    └── CALL - f,
        ├── TERMINAL -
        └── TERMINAL - NL,
";
        assert_eq!(ast.to_string(), expected);
    }
}
