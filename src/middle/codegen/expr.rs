//! Expression lowering
//!
//! `resolve_value` is the single recursive evaluator used everywhere a value
//! is needed. It either yields a value and its inferred type, or nothing:
//! an unresolvable expression (unknown name, mixed-class operands, the
//! unlowered `^` operator) is not an error here - it just produces nothing.

use super::{intrinsics, Compiler};
use crate::frontend::parser::ast::{BinOp, Expr};
use crate::vm::ir::{BinaryOp, FloatPredicate, IntPredicate, Ty, Value};

impl Compiler {
    pub(crate) fn resolve_value(&mut self, expr: &Expr) -> Option<(Value, Ty)> {
        match expr {
            Expr::Int(v) => Some((Value::ConstI32(*v as i32), Ty::I32)),
            Expr::Float(v) => Some((Value::ConstF32(*v as f32), Ty::F32)),
            Expr::Bool(v) => Some((Value::ConstBool(*v), Ty::I1)),
            Expr::Str(s) => Some(self.build_string_literal(s)),
            Expr::Ident(name) => {
                let symbol = self.scopes.lookup(name)?.clone();
                let value = self.builder.build_load(symbol.ty, symbol.value);
                Some((value, symbol.ty))
            }
            Expr::Infix { left, op, right } => self.resolve_infix(left, *op, right),
            Expr::Call { callee, args } => self.compile_call(callee, args),
            // statement-level control flow; yields no value
            Expr::If { .. } => None,
        }
    }

    /// Both operands must resolve to the same numeric class; any other
    /// combination (mixed int/float included) yields no value and no type.
    /// Comparisons produce `i1` regardless of the operand class.
    fn resolve_infix(&mut self, left: &Expr, op: BinOp, right: &Expr) -> Option<(Value, Ty)> {
        let (lhs, left_ty) = self.resolve_value(left)?;
        let (rhs, right_ty) = self.resolve_value(right)?;

        match (left_ty, right_ty) {
            (Ty::I32, Ty::I32) => {
                let binary = match op {
                    BinOp::Add => BinaryOp::Add,
                    BinOp::Sub => BinaryOp::Sub,
                    BinOp::Mul => BinaryOp::Mul,
                    BinOp::Div => BinaryOp::SDiv,
                    BinOp::Mod => BinaryOp::SRem,
                    BinOp::Eq => {
                        let v = self.builder.build_icmp(IntPredicate::Eq, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Neq => {
                        let v = self.builder.build_icmp(IntPredicate::Ne, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Lt => {
                        let v = self.builder.build_icmp(IntPredicate::Slt, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Le => {
                        let v = self.builder.build_icmp(IntPredicate::Sle, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Gt => {
                        let v = self.builder.build_icmp(IntPredicate::Sgt, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Ge => {
                        let v = self.builder.build_icmp(IntPredicate::Sge, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    // `^` is parsed and precedence-assigned but has no
                    // lowering
                    BinOp::Pow => return None,
                };
                Some((self.builder.build_binary(binary, lhs, rhs), Ty::I32))
            }
            (Ty::F32, Ty::F32) => {
                let binary = match op {
                    BinOp::Add => BinaryOp::FAdd,
                    BinOp::Sub => BinaryOp::FSub,
                    BinOp::Mul => BinaryOp::FMul,
                    BinOp::Div => BinaryOp::FDiv,
                    BinOp::Mod => BinaryOp::FRem,
                    BinOp::Eq => {
                        let v = self.builder.build_fcmp(FloatPredicate::Oeq, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Neq => {
                        let v = self.builder.build_fcmp(FloatPredicate::One, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Lt => {
                        let v = self.builder.build_fcmp(FloatPredicate::Olt, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Le => {
                        let v = self.builder.build_fcmp(FloatPredicate::Ole, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Gt => {
                        let v = self.builder.build_fcmp(FloatPredicate::Ogt, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Ge => {
                        let v = self.builder.build_fcmp(FloatPredicate::Oge, lhs, rhs);
                        return Some((v, Ty::I1));
                    }
                    BinOp::Pow => return None,
                };
                Some((self.builder.build_binary(binary, lhs, rhs), Ty::F32))
            }
            _ => None,
        }
    }

    /// Arguments are resolved positionally and passed through as-is; there
    /// is no arity or type validation against the callee's signature.
    pub(crate) fn compile_call(&mut self, name: &str, args: &[Expr]) -> Option<(Value, Ty)> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let (value, _ty) = self.resolve_value(arg)?;
            values.push(value);
        }

        if let Some(sig) = intrinsics::signature(name) {
            // declare-if-missing: the external signature enters the module
            // the first time the intrinsic is referenced
            let func = match self.builder.get_function(name) {
                Some(func) => func,
                None if sig.is_varargs => {
                    self.builder
                        .declare_varargs_function(name, sig.params.clone(), sig.ret)
                }
                None => self
                    .builder
                    .declare_function(name, sig.params.clone(), sig.ret),
            };
            let result = self.builder.build_call(Value::Function(func), values);
            Some((result, sig.ret))
        } else {
            let symbol = self.scopes.lookup(name)?.clone();
            let result = self.builder.build_call(symbol.value, values);
            Some((result, symbol.ty))
        }
    }

    /// A string literal becomes a fresh read-only global (value bytes plus a
    /// terminating zero) seen through a pointer-to-byte value. One global
    /// per occurrence; nothing is pooled.
    fn build_string_literal(&mut self, s: &str) -> (Value, Ty) {
        let mut data = s.as_bytes().to_vec();
        data.push(0);
        let global = self.builder.add_global(data);
        let ptr = self.builder.build_bitcast(global, Ty::Ptr);
        (ptr, Ty::Ptr)
    }
}
