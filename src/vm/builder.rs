//! IR Builder
//!
//! Owns the module under construction and an insertion point. Every
//! `build_*` method appends one instruction at the insertion point and
//! returns the value naming its result. The code generator drives this and
//! nothing else; the builder is the whole emitter contract:
//! function declaration, block creation and positioning, stack storage with
//! load/store, binary arithmetic and comparison for both numeric classes,
//! conditional control flow, external declarations, read-only globals,
//! bitcast, call, and return.

use super::ir::{
    BasicBlock, BinaryOp, BlockId, FloatPredicate, FuncId, Function, Global, Inst, IntPredicate,
    Module, Ty, Value,
};

/// Positional builder over a [`Module`]
#[derive(Debug)]
pub struct IrBuilder {
    module: Module,
    func: Option<FuncId>,
    block: Option<BlockId>,
}

impl IrBuilder {
    /// Create a builder around a fresh module
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            func: None,
            block: None,
        }
    }

    /// The module built so far
    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Give up the builder and keep the module
    pub fn finish(self) -> Module {
        self.module
    }

    // ===== functions and blocks =====

    /// Declare a function with a typed signature; a function stays an
    /// external declaration until it gets a block
    pub fn declare_function(&mut self, name: &str, params: Vec<Ty>, ret: Ty) -> FuncId {
        self.declare_function_inner(name, params, ret, false)
    }

    /// Declare an externally-linked variadic function
    pub fn declare_varargs_function(&mut self, name: &str, params: Vec<Ty>, ret: Ty) -> FuncId {
        self.declare_function_inner(name, params, ret, true)
    }

    fn declare_function_inner(
        &mut self,
        name: &str,
        params: Vec<Ty>,
        ret: Ty,
        is_varargs: bool,
    ) -> FuncId {
        self.module.functions.push(Function {
            name: name.to_string(),
            params,
            ret,
            is_varargs,
            blocks: Vec::new(),
        });
        self.module.functions.len() - 1
    }

    /// Look up an already-declared function by name
    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.module.get_function(name)
    }

    /// Append a new basic block to a function
    pub fn append_basic_block(&mut self, func: FuncId, label: &str) -> BlockId {
        let blocks = &mut self.module.functions[func].blocks;
        blocks.push(BasicBlock {
            label: label.to_string(),
            insts: Vec::new(),
        });
        blocks.len() - 1
    }

    /// Move the insertion point to the end of a block
    pub fn position_at_end(&mut self, func: FuncId, block: BlockId) {
        self.func = Some(func);
        self.block = Some(block);
    }

    /// Current insertion point, if any
    pub fn insert_block(&self) -> Option<(FuncId, BlockId)> {
        Some((self.func?, self.block?))
    }

    // ===== globals =====

    /// Create anonymous read-only global data
    pub fn add_global(&mut self, data: Vec<u8>) -> Value {
        self.module.globals.push(Global { data });
        Value::Global(self.module.globals.len() - 1)
    }

    // ===== instructions =====

    fn push(&mut self, inst: Inst) -> Value {
        let id = self.module.insts.len();
        self.module.insts.push(inst);
        if let (Some(func), Some(block)) = (self.func, self.block) {
            self.module.functions[func].blocks[block].insts.push(id);
        }
        Value::Inst(id)
    }

    pub fn build_alloca(&mut self, ty: Ty) -> Value {
        self.push(Inst::Alloca { ty })
    }

    pub fn build_load(&mut self, ty: Ty, ptr: Value) -> Value {
        self.push(Inst::Load { ty, ptr })
    }

    pub fn build_store(&mut self, ptr: Value, value: Value) {
        self.push(Inst::Store { ptr, value });
    }

    pub fn build_binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        self.push(Inst::Binary { op, lhs, rhs })
    }

    pub fn build_icmp(&mut self, pred: IntPredicate, lhs: Value, rhs: Value) -> Value {
        self.push(Inst::ICmp { pred, lhs, rhs })
    }

    pub fn build_fcmp(&mut self, pred: FloatPredicate, lhs: Value, rhs: Value) -> Value {
        self.push(Inst::FCmp { pred, lhs, rhs })
    }

    pub fn build_bitcast(&mut self, value: Value, ty: Ty) -> Value {
        self.push(Inst::Bitcast { value, ty })
    }

    pub fn build_call(&mut self, callee: Value, args: Vec<Value>) -> Value {
        self.push(Inst::Call { callee, args })
    }

    pub fn build_br(&mut self, dest: BlockId) {
        self.push(Inst::Br { dest });
    }

    pub fn build_cond_br(&mut self, cond: Value, then_dest: BlockId, else_dest: BlockId) {
        self.push(Inst::CondBr {
            cond,
            then_dest,
            else_dest,
        });
    }

    pub fn build_ret(&mut self, value: Option<Value>) {
        self.push(Inst::Ret { value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_function_is_external_until_it_gets_a_block() {
        let mut builder = IrBuilder::new("test");
        let func = builder.declare_function("f", vec![Ty::I32], Ty::I32);
        assert!(builder.module().functions[func].is_external());

        builder.append_basic_block(func, "f_entry");
        assert!(!builder.module().functions[func].is_external());
    }

    #[test]
    fn instructions_land_in_the_positioned_block() {
        let mut builder = IrBuilder::new("test");
        let func = builder.declare_function("f", vec![], Ty::I32);
        let entry = builder.append_basic_block(func, "f_entry");
        let other = builder.append_basic_block(func, "f_other");

        builder.position_at_end(func, entry);
        builder.build_ret(Some(Value::ConstI32(1)));
        builder.position_at_end(func, other);
        builder.build_ret(Some(Value::ConstI32(2)));

        let module = builder.finish();
        assert_eq!(module.functions[func].blocks[entry].insts.len(), 1);
        assert_eq!(module.functions[func].blocks[other].insts.len(), 1);
    }

    #[test]
    fn get_function_finds_by_name() {
        let mut builder = IrBuilder::new("test");
        builder.declare_function("printf", vec![Ty::Ptr], Ty::I32);
        assert_eq!(builder.get_function("printf"), Some(0));
        assert_eq!(builder.get_function("missing"), None);
    }
}
