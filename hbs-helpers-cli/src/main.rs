//! Lists the helpers a Handlebars template calls
//!
//! Usage:
//!   hbs-helpers [FILE]             - Print the helpers and their count (FILE defaults to demo.hbs)
//!   hbs-helpers [FILE] --tokens    - Dump the token stream
//!   hbs-helpers [FILE] --ast       - Print the syntax tree
//!   hbs-helpers [FILE] --format json
mod error;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use hbs_helpers::{helpers, parse, print_ast, tokenize};
use log::{debug, info};
use serde::Serialize;

use crate::error::{CliError, Result};

#[derive(Parser, Debug)]
#[command(name = "hbs-helpers", version)]
#[command(about = "List the helpers a Handlebars template calls")]
struct Args {
    /// Path to the template
    #[arg(default_value = "demo.hbs")]
    file: PathBuf,

    /// Print the token stream instead of the helpers
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the syntax tree instead of the helpers
    #[arg(long)]
    ast: bool,

    /// Output format for the helper list
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Don't print the elapsed time
    #[arg(long)]
    no_timing: bool,

    /// Log parse and collection progress
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    helpers: &'a [String],
    count: usize,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn render(args: &Args, source: &str) -> Result<String> {
    if args.tokens {
        return Ok(tokenize(source)
            .iter()
            .map(|token| format!(" {token}\n"))
            .collect());
    }
    if args.ast {
        return Ok(print_ast(&parse(source)?));
    }

    let found = helpers(source)?;
    match args.format {
        Format::Text => Ok(format!("[{}] {}\n", found.join(" "), found.len())),
        Format::Json => {
            let report = Report {
                helpers: &found,
                count: found.len(),
            };
            Ok(serde_json::to_string_pretty(&report)? + "\n")
        }
    }
}

fn run(args: &Args) -> Result<String> {
    let source = fs::read_to_string(&args.file).map_err(|source| CliError::Read {
        path: args.file.clone(),
        source,
    })?;
    info!("read {} bytes from {}", source.len(), args.file.display());
    render(args, &source)
}

/// The single line written to stderr when a run fails
fn failure_message(e: &CliError) -> String {
    format!("Error: {e}")
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let start = Instant::now();
    match run(&args) {
        Ok(output) => {
            print!("{output}");
            if !args.no_timing && args.format == Format::Text {
                println!("\n{:?}", start.elapsed());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("{e:?}");
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}
