//! Karst Programming Language - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use karst::util::logger::{self, LogLevel};
use karst::{NAME, VERSION};
use std::path::PathBuf;

/// A small statically typed language compiled to an in-memory IR
#[derive(Parser, Debug)]
#[command(name = "karst")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a Karst source file
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Parse a source file and dump the AST as JSON
    Parse {
        /// Source file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compile a source file and dump the textual IR
    EmitIr {
        /// Source file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let args = Args::parse();

    logger::init_with_level(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    });

    match args.command {
        Commands::Run { file } => {
            let code = karst::run_file(&file)
                .with_context(|| format!("Failed to run: {}", file.display()))?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Commands::Parse { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read: {}", file.display()))?;
            let (program, errors) = karst::parse_source(&source);
            for error in &errors {
                eprintln!("parse error: {error}");
            }
            println!("{}", serde_json::to_string_pretty(&program)?);
        }
        Commands::EmitIr { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read: {}", file.display()))?;
            print!("{}", karst::emit_ir(&source)?);
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
        }
    }

    Ok(())
}
