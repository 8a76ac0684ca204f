//! Statement lowering

use super::{CompileError, Compiler};
use crate::frontend::parser::ast::{Block, ElseArm, Expr, Param, Stmt};
use crate::vm::ir::{Ty, Value};
use tracing::debug;

impl Compiler {
    pub(crate) fn compile_statement(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => match expr {
                Expr::If {
                    condition,
                    consequence,
                    alternative,
                } => self.compile_if(condition, consequence, alternative.as_deref()),
                // value computed for its side effects and discarded
                _ => {
                    self.resolve_value(expr);
                }
            },
            Stmt::Let { name, ty: _, value } => self.compile_let(name, value),
            Stmt::Assign { name, value } => self.compile_assign(name, value),
            Stmt::Return { value } => self.compile_return(value),
            Stmt::Function {
                name,
                params,
                return_type,
                body,
            } => self.compile_function(name, params, return_type, body),
        }
    }

    /// Lower a block's statements in sequence, in the surrounding scope
    pub(crate) fn compile_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.compile_statement(stmt);
        }
    }

    /// `let` allocates and defines a fresh name; a name already visible
    /// anywhere in the chain turns this into a plain re-store into the
    /// existing storage, not a redeclaration error. The declared type is
    /// not consulted - storage is sized for the resolved type.
    fn compile_let(&mut self, name: &str, value: &Expr) {
        let resolved = self.resolve_value(value);
        let existing = self.scopes.lookup(name).map(|s| s.value);

        match existing {
            None => {
                if let Some((value, ty)) = resolved {
                    let ptr = self.builder.build_alloca(ty);
                    self.builder.build_store(ptr, value);
                    self.scopes.define(name, ptr, ty);
                }
            }
            Some(ptr) => {
                if let Some((value, _ty)) = resolved {
                    self.builder.build_store(ptr, value);
                }
            }
        }
    }

    /// Assignment to an undeclared name is the one diagnosed compile
    /// failure; it is recorded and compilation carries on.
    fn compile_assign(&mut self, name: &str, value: &Expr) {
        let resolved = self.resolve_value(value);
        let target = self.scopes.lookup(name).map(|s| s.value);

        match target {
            None => self.errors.push(CompileError::UndeclaredAssignment {
                name: name.to_string(),
            }),
            Some(ptr) => {
                if let Some((value, _ty)) = resolved {
                    self.builder.build_store(ptr, value);
                }
            }
        }
    }

    /// `return` emits whatever the value resolves to; nothing checks it
    /// against the enclosing function's declared return type
    fn compile_return(&mut self, value: &Expr) {
        if let Some((value, _ty)) = self.resolve_value(value) {
            self.builder.build_ret(Some(value));
        }
    }

    fn compile_function(&mut self, name: &str, params: &[Param], return_type: &str, body: &Block) {
        debug!("lowering function `{name}`");

        let param_tys: Vec<Ty> = params.iter().map(|p| Ty::from_name(&p.ty)).collect();
        let ret = Ty::from_name(return_type);

        let func = self.builder.declare_function(name, param_tys.clone(), ret);
        let entry = self
            .builder
            .append_basic_block(func, &format!("{name}_entry"));

        let saved = self.builder.insert_block();
        self.builder.position_at_end(func, entry);
        self.scopes.push_scope();

        // spill incoming arguments into allocated storage so parameters
        // resolve like any other name
        for (i, (param, &ty)) in params.iter().zip(&param_tys).enumerate() {
            let ptr = self.builder.build_alloca(ty);
            self.builder.build_store(ptr, Value::Param(i));
            self.scopes.define(param.name.clone(), ptr, ty);
        }

        self.compile_block(body);

        // The function's own name becomes visible only now: first in the
        // body scope about to be discarded, then in the restored outer
        // scope. A call to itself inside the body does not resolve.
        self.scopes.define(name, Value::Function(func), ret);
        self.scopes.pop_scope();

        if let Some((saved_func, saved_block)) = saved {
            self.builder.position_at_end(saved_func, saved_block);
        }
        self.scopes.define(name, Value::Function(func), ret);
    }

    /// Statement-level conditional: one-armed without an alternative,
    /// two-armed with one; the elif chain recurses through the else arm.
    /// Produces no value.
    pub(crate) fn compile_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&ElseArm>,
    ) {
        // the condition is structurally expected to be i1; nothing verifies
        // that here
        let cond = match self.resolve_value(condition) {
            Some((value, _ty)) => value,
            None => return,
        };
        let func = match self.builder.insert_block() {
            Some((func, _block)) => func,
            None => return,
        };

        match alternative {
            None => {
                let then_block = self.builder.append_basic_block(func, "if_then");
                let merge_block = self.builder.append_basic_block(func, "if_end");
                self.builder.build_cond_br(cond, then_block, merge_block);

                self.builder.position_at_end(func, then_block);
                self.compile_block(consequence);
                self.builder.build_br(merge_block);

                self.builder.position_at_end(func, merge_block);
            }
            Some(arm) => {
                let then_block = self.builder.append_basic_block(func, "if_then");
                let else_block = self.builder.append_basic_block(func, "if_else");
                let merge_block = self.builder.append_basic_block(func, "if_end");
                self.builder.build_cond_br(cond, then_block, else_block);

                self.builder.position_at_end(func, then_block);
                self.compile_block(consequence);
                self.builder.build_br(merge_block);

                self.builder.position_at_end(func, else_block);
                match arm {
                    ElseArm::Elif(nested) => {
                        if let Expr::If {
                            condition,
                            consequence,
                            alternative,
                        } = nested
                        {
                            self.compile_if(condition, consequence, alternative.as_deref());
                        }
                    }
                    ElseArm::Else(block) => self.compile_block(block),
                }
                self.builder.build_br(merge_block);

                self.builder.position_at_end(func, merge_block);
            }
        }
    }
}
