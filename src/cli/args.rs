//! Command-line arguments for the `dslkit` binary.
//!
//! Uses `clap` derive; every subcommand takes the file to parse and an
//! optional grammar name. Without one the grammar is picked from the file
//! extension.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "dslkit",
    version,
    about = "Parse files with the grammars bundled in dslkit."
)]
pub struct DslArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the syntax tree built for a file.
    Ast {
        /// The file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Bundled grammar to use (`calc` or `json`).
        #[arg(short, long)]
        grammar: Option<String>,
        /// Print the tree as JSON instead of a drawing.
        #[arg(long)]
        json: bool,
        /// Write a trace of every scanner and parser step to this file.
        #[arg(long, value_name = "PATH")]
        trace: Option<PathBuf>,
    },
    /// Parse a file and report every error found.
    Check {
        /// The file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Bundled grammar to use (`calc` or `json`).
        #[arg(short, long)]
        grammar: Option<String>,
        /// Render errors as miette reports.
        #[arg(long)]
        fancy: bool,
    },
    /// List the bundled grammars.
    Grammars,
}
