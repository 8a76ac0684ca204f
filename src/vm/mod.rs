//! Execution engine
//!
//! A direct interpreter over the in-memory IR. `execute_module` lays out the
//! module's globals, runs `main`, and leaves the machine state intact so
//! individual functions can still be called afterwards (the way a JIT keeps
//! symbols resolvable after loading a module).
//!
//! Storage model: `alloca` storage lives in typed cells, string data and
//! `malloc` results live in one flat byte memory. Instruction results are
//! recorded by arena id; re-executing an instruction simply overwrites its
//! previous result.

pub mod builder;
pub mod ir;

use ir::{BinaryOp, FloatPredicate, FuncId, Inst, InstId, IntPredicate, Module, Ty, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Runtime value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RtValue {
    I32(i32),
    F32(f32),
    Bool(bool),
    /// Pointer to a typed storage cell
    CellPtr(usize),
    /// Pointer into byte memory
    BytePtr(usize),
    Func(FuncId),
    Unit,
}

/// Execution failure
///
/// Structurally malformed modules (the silent compile gaps) surface here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("unknown external function `{0}`")]
    UnknownExternal(String),
    #[error("use of an unresolved value")]
    UnresolvedValue,
    #[error("block fell through without a terminator")]
    MissingTerminator,
    #[error("invalid pointer operand")]
    InvalidPointer,
    #[error("branch condition is not a boolean")]
    InvalidCondition,
    #[error("operand type mismatch in {0}")]
    TypeMismatch(&'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("call target is not a function")]
    NotCallable,
}

/// The virtual machine
#[derive(Debug, Default)]
pub struct VM {
    /// Result of each executed instruction, keyed by arena id
    values: HashMap<InstId, RtValue>,
    /// Typed storage cells created by `alloca`
    cells: Vec<RtValue>,
    /// Flat byte memory: globals first, then `malloc` results
    heap: Vec<u8>,
    global_addrs: Vec<usize>,
    /// Incoming-argument frames, one per active call
    params: Vec<Vec<RtValue>>,
    /// Captured `printf` output
    output: Vec<u8>,
}

impl VM {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything `printf` wrote during execution
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Reset state, lay out globals and run `main`, returning its exit code
    pub fn execute_module(&mut self, module: &Module) -> Result<i32, ExecError> {
        self.values.clear();
        self.cells.clear();
        self.heap.clear();
        self.global_addrs.clear();
        self.params.clear();
        self.output.clear();

        for global in &module.globals {
            self.global_addrs.push(self.heap.len());
            self.heap.extend_from_slice(&global.data);
        }

        match self.call_function(module, "main", &[])? {
            RtValue::I32(code) => Ok(code),
            _ => Ok(0),
        }
    }

    /// Call a function by name; module state from `execute_module` stays
    /// live, so functions defined by the program remain callable
    pub fn call_function(
        &mut self,
        module: &Module,
        name: &str,
        args: &[RtValue],
    ) -> Result<RtValue, ExecError> {
        let func = module
            .get_function(name)
            .ok_or_else(|| ExecError::UnknownFunction(name.to_string()))?;
        self.exec_function(module, func, args)
    }

    fn exec_function(
        &mut self,
        module: &Module,
        func: FuncId,
        args: &[RtValue],
    ) -> Result<RtValue, ExecError> {
        if module.functions[func].is_external() {
            let name = module.functions[func].name.clone();
            return self.exec_external(&name, args);
        }

        self.params.push(args.to_vec());
        let result = self.exec_blocks(module, func);
        self.params.pop();
        result
    }

    fn exec_blocks(&mut self, module: &Module, func: FuncId) -> Result<RtValue, ExecError> {
        let function = &module.functions[func];
        let mut block = 0usize;

        'blocks: loop {
            for &id in &function.blocks[block].insts {
                match &module.insts[id] {
                    Inst::Alloca { ty } => {
                        let cell = self.cells.len();
                        self.cells.push(Self::zero_value(*ty));
                        self.values.insert(id, RtValue::CellPtr(cell));
                    }
                    Inst::Load { ty: _, ptr } => {
                        let value = match self.resolve(ptr)? {
                            RtValue::CellPtr(cell) => self
                                .cells
                                .get(cell)
                                .copied()
                                .ok_or(ExecError::InvalidPointer)?,
                            _ => return Err(ExecError::InvalidPointer),
                        };
                        self.values.insert(id, value);
                    }
                    Inst::Store { ptr, value } => {
                        let value = self.resolve(value)?;
                        match self.resolve(ptr)? {
                            RtValue::CellPtr(cell) if cell < self.cells.len() => {
                                self.cells[cell] = value;
                            }
                            _ => return Err(ExecError::InvalidPointer),
                        }
                    }
                    Inst::Binary { op, lhs, rhs } => {
                        let lhs = self.resolve(lhs)?;
                        let rhs = self.resolve(rhs)?;
                        let value = Self::eval_binary(*op, lhs, rhs)?;
                        self.values.insert(id, value);
                    }
                    Inst::ICmp { pred, lhs, rhs } => {
                        let lhs = self.resolve(lhs)?;
                        let rhs = self.resolve(rhs)?;
                        let value = Self::eval_icmp(*pred, lhs, rhs)?;
                        self.values.insert(id, value);
                    }
                    Inst::FCmp { pred, lhs, rhs } => {
                        let lhs = self.resolve(lhs)?;
                        let rhs = self.resolve(rhs)?;
                        let value = Self::eval_fcmp(*pred, lhs, rhs)?;
                        self.values.insert(id, value);
                    }
                    Inst::Bitcast { value, ty: _ } => {
                        let value = self.resolve(value)?;
                        self.values.insert(id, value);
                    }
                    Inst::Call { callee, args } => {
                        let mut arg_values = Vec::with_capacity(args.len());
                        for arg in args {
                            arg_values.push(self.resolve(arg)?);
                        }
                        let result = match self.resolve(callee)? {
                            RtValue::Func(callee) => {
                                self.exec_function(module, callee, &arg_values)?
                            }
                            _ => return Err(ExecError::NotCallable),
                        };
                        self.values.insert(id, result);
                    }
                    Inst::Br { dest } => {
                        block = *dest;
                        continue 'blocks;
                    }
                    Inst::CondBr {
                        cond,
                        then_dest,
                        else_dest,
                    } => {
                        block = match self.resolve(cond)? {
                            RtValue::Bool(true) => *then_dest,
                            RtValue::Bool(false) => *else_dest,
                            _ => return Err(ExecError::InvalidCondition),
                        };
                        continue 'blocks;
                    }
                    Inst::Ret { value } => {
                        return match value {
                            Some(value) => self.resolve(value),
                            None => Ok(RtValue::Unit),
                        };
                    }
                }
            }
            return Err(ExecError::MissingTerminator);
        }
    }

    fn resolve(&self, value: &Value) -> Result<RtValue, ExecError> {
        match value {
            Value::ConstI32(v) => Ok(RtValue::I32(*v)),
            Value::ConstF32(v) => Ok(RtValue::F32(*v)),
            Value::ConstBool(v) => Ok(RtValue::Bool(*v)),
            Value::Inst(id) => self
                .values
                .get(id)
                .copied()
                .ok_or(ExecError::UnresolvedValue),
            Value::Param(i) => self
                .params
                .last()
                .and_then(|frame| frame.get(*i))
                .copied()
                .ok_or(ExecError::UnresolvedValue),
            Value::Global(g) => self
                .global_addrs
                .get(*g)
                .map(|&addr| RtValue::BytePtr(addr))
                .ok_or(ExecError::InvalidPointer),
            Value::Function(f) => Ok(RtValue::Func(*f)),
        }
    }

    fn zero_value(ty: Ty) -> RtValue {
        match ty {
            Ty::I32 => RtValue::I32(0),
            Ty::F32 => RtValue::F32(0.0),
            Ty::I1 => RtValue::Bool(false),
            Ty::Ptr => RtValue::BytePtr(0),
            Ty::Void => RtValue::Unit,
        }
    }

    fn eval_binary(op: BinaryOp, lhs: RtValue, rhs: RtValue) -> Result<RtValue, ExecError> {
        use RtValue::{F32, I32};
        match (op, lhs, rhs) {
            (BinaryOp::Add, I32(a), I32(b)) => Ok(I32(a.wrapping_add(b))),
            (BinaryOp::Sub, I32(a), I32(b)) => Ok(I32(a.wrapping_sub(b))),
            (BinaryOp::Mul, I32(a), I32(b)) => Ok(I32(a.wrapping_mul(b))),
            (BinaryOp::SDiv, I32(_), I32(0)) => Err(ExecError::DivisionByZero),
            (BinaryOp::SDiv, I32(a), I32(b)) => Ok(I32(a.wrapping_div(b))),
            (BinaryOp::SRem, I32(_), I32(0)) => Err(ExecError::DivisionByZero),
            (BinaryOp::SRem, I32(a), I32(b)) => Ok(I32(a.wrapping_rem(b))),
            (BinaryOp::FAdd, F32(a), F32(b)) => Ok(F32(a + b)),
            (BinaryOp::FSub, F32(a), F32(b)) => Ok(F32(a - b)),
            (BinaryOp::FMul, F32(a), F32(b)) => Ok(F32(a * b)),
            (BinaryOp::FDiv, F32(a), F32(b)) => Ok(F32(a / b)),
            (BinaryOp::FRem, F32(a), F32(b)) => Ok(F32(a % b)),
            _ => Err(ExecError::TypeMismatch("binary operation")),
        }
    }

    fn eval_icmp(pred: IntPredicate, lhs: RtValue, rhs: RtValue) -> Result<RtValue, ExecError> {
        let (a, b) = match (lhs, rhs) {
            (RtValue::I32(a), RtValue::I32(b)) => (a, b),
            _ => return Err(ExecError::TypeMismatch("integer comparison")),
        };
        let result = match pred {
            IntPredicate::Eq => a == b,
            IntPredicate::Ne => a != b,
            IntPredicate::Slt => a < b,
            IntPredicate::Sle => a <= b,
            IntPredicate::Sgt => a > b,
            IntPredicate::Sge => a >= b,
        };
        Ok(RtValue::Bool(result))
    }

    fn eval_fcmp(pred: FloatPredicate, lhs: RtValue, rhs: RtValue) -> Result<RtValue, ExecError> {
        let (a, b) = match (lhs, rhs) {
            (RtValue::F32(a), RtValue::F32(b)) => (a, b),
            _ => return Err(ExecError::TypeMismatch("float comparison")),
        };
        // ordered predicates: false whenever either side is NaN
        let ordered = !a.is_nan() && !b.is_nan();
        let result = match pred {
            FloatPredicate::Oeq => ordered && a == b,
            FloatPredicate::One => ordered && a != b,
            FloatPredicate::Olt => ordered && a < b,
            FloatPredicate::Ole => ordered && a <= b,
            FloatPredicate::Ogt => ordered && a > b,
            FloatPredicate::Oge => ordered && a >= b,
        };
        Ok(RtValue::Bool(result))
    }

    // ===== externally-linked functions =====

    fn exec_external(&mut self, name: &str, args: &[RtValue]) -> Result<RtValue, ExecError> {
        match name {
            "printf" => self.intrinsic_printf(args),
            "malloc" => self.intrinsic_malloc(args),
            "memcpy" => self.intrinsic_memcpy(args),
            "concat" => self.intrinsic_concat(args),
            other => Err(ExecError::UnknownExternal(other.to_string())),
        }
    }

    fn read_cstr(&self, addr: usize) -> Result<Vec<u8>, ExecError> {
        if addr > self.heap.len() {
            return Err(ExecError::InvalidPointer);
        }
        let tail = &self.heap[addr..];
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(ExecError::InvalidPointer)?;
        Ok(tail[..end].to_vec())
    }

    fn alloc_bytes(&mut self, data: &[u8]) -> RtValue {
        let addr = self.heap.len();
        self.heap.extend_from_slice(data);
        RtValue::BytePtr(addr)
    }

    /// `%d` `%f` `%s` `%%`; everything else passes through untouched
    fn intrinsic_printf(&mut self, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let fmt = match args.first() {
            Some(RtValue::BytePtr(addr)) => self.read_cstr(*addr)?,
            _ => return Err(ExecError::InvalidPointer),
        };
        let fmt = String::from_utf8_lossy(&fmt).into_owned();

        let mut out = String::new();
        let mut next_arg = 1usize;
        let mut chars = fmt.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('d') => {
                    match args.get(next_arg) {
                        Some(RtValue::I32(v)) => out.push_str(&v.to_string()),
                        Some(RtValue::Bool(v)) => out.push_str(if *v { "1" } else { "0" }),
                        _ => return Err(ExecError::TypeMismatch("printf %d")),
                    }
                    next_arg += 1;
                }
                Some('f') => {
                    match args.get(next_arg) {
                        Some(RtValue::F32(v)) => out.push_str(&format!("{v:.6}")),
                        _ => return Err(ExecError::TypeMismatch("printf %f")),
                    }
                    next_arg += 1;
                }
                Some('s') => {
                    match args.get(next_arg) {
                        Some(RtValue::BytePtr(addr)) => {
                            let bytes = self.read_cstr(*addr)?;
                            out.push_str(&String::from_utf8_lossy(&bytes));
                        }
                        _ => return Err(ExecError::TypeMismatch("printf %s")),
                    }
                    next_arg += 1;
                }
                Some('%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }

        self.output.extend_from_slice(out.as_bytes());
        Ok(RtValue::I32(out.len() as i32))
    }

    fn intrinsic_malloc(&mut self, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let size = match args.first() {
            Some(RtValue::I32(n)) if *n >= 0 => *n as usize,
            _ => return Err(ExecError::TypeMismatch("malloc")),
        };
        Ok(self.alloc_bytes(&vec![0u8; size]))
    }

    fn intrinsic_memcpy(&mut self, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let (dst, src, len) = match args {
            [RtValue::BytePtr(dst), RtValue::BytePtr(src), RtValue::I32(len)] if *len >= 0 => {
                (*dst, *src, *len as usize)
            }
            _ => return Err(ExecError::TypeMismatch("memcpy")),
        };
        if src + len > self.heap.len() || dst + len > self.heap.len() {
            return Err(ExecError::InvalidPointer);
        }
        let bytes = self.heap[src..src + len].to_vec();
        self.heap[dst..dst + len].copy_from_slice(&bytes);
        Ok(RtValue::BytePtr(dst))
    }

    /// NUL-terminated concatenation into a fresh buffer
    fn intrinsic_concat(&mut self, args: &[RtValue]) -> Result<RtValue, ExecError> {
        let (a, b) = match args {
            [RtValue::BytePtr(a), RtValue::BytePtr(b)] => (*a, *b),
            _ => return Err(ExecError::TypeMismatch("concat")),
        };
        let mut data = self.read_cstr(a)?;
        data.extend_from_slice(&self.read_cstr(b)?);
        data.push(0);
        Ok(self.alloc_bytes(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::builder::IrBuilder;
    use super::ir::{BinaryOp, Ty, Value};
    use super::{RtValue, VM};

    #[test]
    fn executes_arithmetic_in_main() {
        let mut builder = IrBuilder::new("test");
        let main = builder.declare_function("main", Vec::new(), Ty::I32);
        let entry = builder.append_basic_block(main, "main_entry");
        builder.position_at_end(main, entry);
        let sum = builder.build_binary(BinaryOp::Add, Value::ConstI32(2), Value::ConstI32(3));
        builder.build_ret(Some(sum));

        let module = builder.finish();
        let mut vm = VM::new();
        assert_eq!(vm.execute_module(&module), Ok(5));
    }

    #[test]
    fn calls_survive_module_execution() {
        let mut builder = IrBuilder::new("test");
        let main = builder.declare_function("main", Vec::new(), Ty::I32);
        let entry = builder.append_basic_block(main, "main_entry");

        let double = builder.declare_function("double", vec![Ty::I32], Ty::I32);
        let double_entry = builder.append_basic_block(double, "double_entry");
        builder.position_at_end(double, double_entry);
        let result = builder.build_binary(BinaryOp::Mul, Value::Param(0), Value::ConstI32(2));
        builder.build_ret(Some(result));

        builder.position_at_end(main, entry);
        builder.build_ret(Some(Value::ConstI32(0)));

        let module = builder.finish();
        let mut vm = VM::new();
        assert_eq!(vm.execute_module(&module), Ok(0));
        assert_eq!(
            vm.call_function(&module, "double", &[RtValue::I32(21)]),
            Ok(RtValue::I32(42))
        );
    }

    #[test]
    fn printf_formats_and_captures() {
        let mut builder = IrBuilder::new("test");
        let main = builder.declare_function("main", Vec::new(), Ty::I32);
        let entry = builder.append_basic_block(main, "main_entry");
        builder.position_at_end(main, entry);

        let printf = builder.declare_varargs_function("printf", vec![Ty::Ptr], Ty::I32);
        let fmt = builder.add_global(b"x = %d\0".to_vec());
        let fmt = builder.build_bitcast(fmt, Ty::Ptr);
        builder.build_call(Value::Function(printf), vec![fmt, Value::ConstI32(7)]);
        builder.build_ret(Some(Value::ConstI32(0)));

        let module = builder.finish();
        let mut vm = VM::new();
        assert_eq!(vm.execute_module(&module), Ok(0));
        assert_eq!(vm.output(), "x = 7");
    }

    #[test]
    fn concat_joins_two_strings() {
        let mut builder = IrBuilder::new("test");
        let main = builder.declare_function("main", Vec::new(), Ty::I32);
        let entry = builder.append_basic_block(main, "main_entry");
        builder.position_at_end(main, entry);

        let concat = builder.declare_function("concat", vec![Ty::Ptr, Ty::Ptr], Ty::Ptr);
        let printf = builder.declare_varargs_function("printf", vec![Ty::Ptr], Ty::I32);

        let a = builder.add_global(b"kar\0".to_vec());
        let a = builder.build_bitcast(a, Ty::Ptr);
        let b = builder.add_global(b"st\0".to_vec());
        let b = builder.build_bitcast(b, Ty::Ptr);
        let joined = builder.build_call(Value::Function(concat), vec![a, b]);

        let fmt = builder.add_global(b"%s\0".to_vec());
        let fmt = builder.build_bitcast(fmt, Ty::Ptr);
        builder.build_call(Value::Function(printf), vec![fmt, joined]);
        builder.build_ret(Some(Value::ConstI32(0)));

        let module = builder.finish();
        let mut vm = VM::new();
        assert_eq!(vm.execute_module(&module), Ok(0));
        assert_eq!(vm.output(), "karst");
    }
}
