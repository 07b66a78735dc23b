//! User-facing output for the CLI.
//!
//! Trees go to stdout, diagnostics to stderr. Caret snippets are colored
//! through `termcolor` when the terminal supports it.

use crate::ast::Ast;
use crate::diagnostics::ParseError;
use crate::Grammar;
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

// ============================================================================
// TREES
// ============================================================================

pub fn print_tree(ast: &Ast, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", ast.to_json()?);
    } else {
        print!("{ast}");
    }
    Ok(())
}

pub fn print_grammars(grammars: &[Grammar]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for grammar in grammars {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = write!(stdout, "{}", grammar.name);
        let _ = stdout.reset();
        let _ = writeln!(stdout);
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Prints every error to stderr as a caret snippet, falling back to plain
/// text if colored output fails.
pub fn print_diagnostics_to_stderr(errors: &[ParseError]) {
    let mut stderr = StandardStream::stderr(ColorChoice::Auto);
    for error in errors {
        if print_diagnostic_colored(&mut stderr, error).is_err() {
            eprint!("{}", error.render());
        }
    }
}

/// Prints every error to stderr as a miette report.
pub fn print_reports_to_stderr(errors: &[ParseError]) {
    for error in errors {
        eprintln!("{:?}", miette::Report::new(error.clone()));
    }
}

/// Writes one caret snippet: the header in bold red, source lines as they
/// are, caret lines in red.
pub fn print_diagnostic_colored(writer: &mut impl WriteColor, error: &ParseError) -> io::Result<()> {
    let rendered = error.render();
    let mut lines = rendered.lines();

    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
    write!(writer, "error")?;
    writer.reset()?;
    writeln!(writer, ": {}", lines.next().unwrap_or_default())?;

    // Source and caret lines alternate.
    for (index, line) in lines.enumerate() {
        if index % 2 == 1 {
            writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(writer, "{line}")?;
            writer.reset()?;
        } else {
            writeln!(writer, "{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ErrorKind, Span};
    use crate::token::Position;
    use termcolor::Buffer;

    #[test]
    fn test_plain_buffer_gets_header_and_snippet() {
        let error = ParseError::new(
            ErrorKind::RuneExpectedNotFound,
            "found [;], expected any of [)]",
            "x := (4;",
            Span::point(Position::new(1, 8)),
        );
        let mut buffer = Buffer::no_color();
        print_diagnostic_colored(&mut buffer, &error).unwrap();
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert_eq!(
            text,
            "error: RuneExpectedNotFound at line 1, column 8: found [;], expected any of [)]\n\
             x := (4;\n       ^\n"
        );
    }
}
