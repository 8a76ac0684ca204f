//! Code generator
//!
//! A single pass over the AST. Every top-level statement lowers into an
//! implicit `main` function; `fn` statements additionally declare and fill
//! their own functions. Types are inferred structurally while lowering -
//! there is no separate checking pass, and the only diagnosed failure is an
//! assignment to an undeclared name. Everything else that cannot be lowered
//! simply produces no value.

pub mod intrinsics;

mod expr;
mod stmt;


use crate::frontend::parser::ast::Program;
use crate::middle::scope::ScopeStack;
use crate::vm::builder::IrBuilder;
use crate::vm::ir::{Module, Ty, Value};
use thiserror::Error;
use tracing::debug;

/// Compile diagnostic
///
/// Recorded in order; none of these halts the compilation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("identifier `{name}` has not been declared before assignment")]
    UndeclaredAssignment { name: String },
}

/// The code generator
///
/// Owns the builder, the scope chain and the diagnostic list for the
/// duration of exactly one compilation.
pub struct Compiler {
    pub(crate) builder: IrBuilder,
    pub(crate) scopes: ScopeStack,
    pub(crate) errors: Vec<CompileError>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            builder: IrBuilder::new("main"),
            scopes: ScopeStack::new(),
            errors: Vec::new(),
        }
    }

    /// Lower a whole program into a compiled module, returning it together
    /// with the ordered list of compile diagnostics
    pub fn compile(mut self, program: &Program) -> (Module, Vec<CompileError>) {
        debug!("lowering {} top-level statements", program.statements.len());

        let main = self.builder.declare_function("main", Vec::new(), Ty::I32);
        let entry = self.builder.append_basic_block(main, "main_entry");
        self.builder.position_at_end(main, entry);

        for stmt in &program.statements {
            self.compile_statement(stmt);
        }

        self.builder.build_ret(Some(Value::ConstI32(0)));

        (self.builder.finish(), self.errors)
    }
}
