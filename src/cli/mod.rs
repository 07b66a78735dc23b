//! The dslkit command-line interface.
//!
//! Parses a file with one of the bundled grammars and prints the tree or the
//! errors found. Exits with status 1 when the file does not parse.

use crate::cli::args::{Command, DslArgs};
use crate::diagnostics::{DslError, ParseError};
use crate::source::trace_to_file;
use crate::{grammars, Grammar, ParseConfig};
use clap::Parser;
use std::path::Path;
use std::process;
use thiserror::Error;

pub mod args;
pub mod output;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Dsl(#[from] DslError),
    #[error("unknown grammar '{0}' (try `dslkit grammars`)")]
    UnknownGrammar(String),
    #[error("could not serialize the tree: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{file}: {count} error(s) found")]
    Invalid { file: String, count: usize },
}

/// The main entry point for the CLI.
pub fn run() {
    let args = DslArgs::parse();

    let result = match args.command {
        Command::Ast {
            file,
            grammar,
            json,
            trace,
        } => handle_ast(&file, grammar.as_deref(), json, trace.as_deref()),
        Command::Check {
            file,
            grammar,
            fancy,
        } => handle_check(&file, grammar.as_deref(), fancy),
        Command::Grammars => {
            output::print_grammars(&grammars::ALL);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn handle_ast(
    file: &Path,
    grammar: Option<&str>,
    json: bool,
    trace: Option<&Path>,
) -> Result<(), CliError> {
    let grammar = select_grammar(file, grammar)?;
    let mut config = ParseConfig::default();
    if let Some(path) = trace {
        config = config.with_trace(trace_to_file(path)?);
    }
    let out = grammar.parse_file(file, config)?;
    output::print_tree(&out.ast, json)?;
    report(file, &out.errors, false)
}

fn handle_check(file: &Path, grammar: Option<&str>, fancy: bool) -> Result<(), CliError> {
    let grammar = select_grammar(file, grammar)?;
    let out = grammar.parse_file(file, ParseConfig::default())?;
    if out.is_ok() {
        println!("{}: ok", file.display());
    }
    report(file, &out.errors, fancy)
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

/// The named grammar, or the one matching the file extension (`.json`
/// files use `json`, everything else `calc`).
fn select_grammar(file: &Path, name: Option<&str>) -> Result<Grammar, CliError> {
    let name = match name {
        Some(name) => name,
        None if file.extension().is_some_and(|ext| ext == "json") => "json",
        None => "calc",
    };
    grammars::find(name).ok_or_else(|| CliError::UnknownGrammar(name.to_string()))
}

fn report(file: &Path, errors: &[ParseError], fancy: bool) -> Result<(), CliError> {
    if errors.is_empty() {
        return Ok(());
    }
    if fancy {
        output::print_reports_to_stderr(errors);
    } else {
        output::print_diagnostics_to_stderr(errors);
    }
    Err(CliError::Invalid {
        file: file.display().to_string(),
        count: errors.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_follows_extension_unless_named() {
        let json = Path::new("data/config.json");
        let calc = Path::new("script.calc");
        assert_eq!(select_grammar(json, None).unwrap().name, "json");
        assert_eq!(select_grammar(calc, None).unwrap().name, "calc");
        assert_eq!(select_grammar(calc, Some("json")).unwrap().name, "json");
        assert!(matches!(
            select_grammar(calc, Some("toml")),
            Err(CliError::UnknownGrammar(name)) if name == "toml"
        ));
    }
}
