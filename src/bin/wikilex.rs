//! Command-line interface for wikilex
//! Dumps the tokens of a wiki document, mostly for debugging grammar changes.
//!
//! Usage:
//!   wikilex [`<path>`] [--format debug|json|yaml] [--block]   - Print the tokens of a file (or stdin)
//!   wikilex [`<path>`] --escape                             - Print the escaped source
//!
//! Logging is controlled with `WIKILEX_LOG` (e.g. `WIKILEX_LOG=wikilex=trace`).

use clap::{Arg, ArgAction, Command};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;
use wikilex::wiki::{Lexer, Token};

fn main() {
    let matches = Command::new("wikilex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for inspecting how wiki markup is tokenized")
        .arg(
            Arg::new("path")
                .help("Path to the wiki file (reads stdin when omitted)")
                .index(1),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format")
                .value_parser(["debug", "json", "yaml"])
                .default_value("debug"),
        )
        .arg(
            Arg::new("escape")
                .long("escape")
                .help("Print the escaped source instead of tokens")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("block")
                .long("block")
                .help("Tokenize as a single block, without quote resolution")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging();

    let source = match read_source(matches.get_one::<String>("path")) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading input: {}", e);
            std::process::exit(1);
        }
    };

    let lexer = Lexer::new();
    if matches.get_flag("escape") {
        println!("{}", lexer.escape(&source));
        return;
    }

    let tokens: Vec<Token> = if matches.get_flag("block") {
        lexer.tokenize_block(&source).collect()
    } else {
        lexer.tokenize(&source).collect()
    };
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("debug");

    if let Err(e) = print_tokens(&tokens, format) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("WIKILEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_source(path: Option<&String>) -> io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn print_tokens(tokens: &[Token], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut out, tokens)?;
            writeln!(out)?;
        }
        "yaml" => serde_yaml::to_writer(&mut out, tokens)?,
        _ => {
            for token in tokens {
                writeln!(out, "{}", token)?;
            }
        }
    }
    Ok(())
}
