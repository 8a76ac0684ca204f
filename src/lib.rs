//! Karst Programming Language
//!
//! A small statically typed imperative language: a hand-written lexer, a
//! Pratt parser, and a single-pass code generator that lowers the AST into
//! an in-memory LLVM-shaped IR executed by a small VM.
//!
//! # Example
//!
//! ```no_run
//! use karst::{run, Result};
//!
//! fn main() -> Result<()> {
//!     let code = r#"
//!         let x: int = 5;
//!         printf("x = %d", x);
//!     "#;
//!     run(code)?;
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

// Public modules
pub mod frontend;
pub mod middle;
pub mod vm;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use frontend::parser::ast::Program;
use frontend::parser::{ParseError, Parser};
use middle::codegen::{CompileError, Compiler};
use tracing::debug;
use vm::ir::Module;
use vm::VM;

/// Language version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language name
pub const NAME: &str = "Karst";

/// Parse source text, returning the program together with the ordered list
/// of parse diagnostics
pub fn parse_source(source: &str) -> (Program, Vec<ParseError>) {
    Parser::from_source(source).parse_program()
}

/// Compile source text to a module plus its compile diagnostics
///
/// A non-empty parse-diagnostic list is fatal here; compile diagnostics are
/// handed back to the caller instead.
pub fn compile_source(source: &str) -> Result<(Module, Vec<CompileError>)> {
    let (program, parse_errors) = parse_source(source);
    if !parse_errors.is_empty() {
        let rendered = parse_errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        anyhow::bail!("parsing failed:\n{rendered}");
    }
    debug!("parsed {} top-level statements", program.statements.len());
    Ok(Compiler::new().compile(&program))
}

/// Compile and execute source text, returning the program's exit code
pub fn run(source: &str) -> Result<i32> {
    let (module, compile_errors) = compile_source(source)?;
    // compile diagnostics are reported but do not gate execution
    for error in &compile_errors {
        tracing::warn!("{error}");
    }

    let mut vm = VM::new();
    debug!("executing module `{}`", module.name);
    let code = vm.execute_module(&module)?;
    print!("{}", vm.output());
    Ok(code)
}

use std::fs;
use std::path::Path;

/// Compile and execute a source file
pub fn run_file(path: &Path) -> Result<i32> {
    debug!("reading {}", path.display());
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    run(&source)
}

/// Compile source text and render the module's textual IR
pub fn emit_ir(source: &str) -> Result<String> {
    let (module, _compile_errors) = compile_source(source)?;
    Ok(module.to_string())
}
