//! Intermediate Representation
//!
//! An in-memory, LLVM-shaped module: typed functions made of basic blocks,
//! anonymous read-only global data, and an instruction arena. This is the
//! whole surface the code generator builds against; everything else
//! (execution, dumping) consumes it read-only.

use std::fmt;

/// Instruction id into the module-wide arena
pub type InstId = usize;
/// Basic-block index within its owning function
pub type BlockId = usize;
/// Function index within the module
pub type FuncId = usize;
/// Global index within the module
pub type GlobalId = usize;

/// Value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    /// 32-bit signed integer
    I32,
    /// 32-bit float
    F32,
    /// 1-bit boolean
    I1,
    /// Pointer to bytes (string buffers)
    Ptr,
    Void,
}

impl Ty {
    /// Map a surface type name onto the fixed type set
    pub fn from_name(name: &str) -> Ty {
        match name {
            "float" => Ty::F32,
            // `int` and anything unknown land on the integer class
            _ => Ty::I32,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ty::I32 => "i32",
            Ty::F32 => "f32",
            Ty::I1 => "i1",
            Ty::Ptr => "ptr",
            Ty::Void => "void",
        };
        f.write_str(name)
    }
}

/// An SSA-ish value: a constant or a reference to something the module owns
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    ConstI32(i32),
    ConstF32(f32),
    ConstBool(bool),
    /// Result of an instruction
    Inst(InstId),
    /// Incoming argument of the function being built
    Param(usize),
    /// Read-only global data
    Global(GlobalId),
    /// A declared or defined function
    Function(FuncId),
}

/// Binary arithmetic, one opcode per operation and numeric class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
}

/// Signed integer comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

/// Ordered float comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    Oeq,
    One,
    Olt,
    Ole,
    Ogt,
    Oge,
}

/// Instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// Allocate storage for one value of `ty`; yields a pointer
    Alloca { ty: Ty },
    Load { ty: Ty, ptr: Value },
    Store { ptr: Value, value: Value },
    Binary { op: BinaryOp, lhs: Value, rhs: Value },
    ICmp { pred: IntPredicate, lhs: Value, rhs: Value },
    FCmp { pred: FloatPredicate, lhs: Value, rhs: Value },
    /// Pointer reinterpretation (string globals to `ptr`)
    Bitcast { value: Value, ty: Ty },
    Call { callee: Value, args: Vec<Value> },
    Br { dest: BlockId },
    CondBr { cond: Value, then_dest: BlockId, else_dest: BlockId },
    Ret { value: Option<Value> },
}

/// Basic block: a label and an ordered run of instruction ids
#[derive(Debug, Clone, Default)]
pub struct BasicBlock {
    pub label: String,
    pub insts: Vec<InstId>,
}

/// Function: typed signature plus blocks; no blocks means an external
/// declaration
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub is_varargs: bool,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    pub fn is_external(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Anonymous read-only global data (value bytes, NUL included for strings)
#[derive(Debug, Clone)]
pub struct Global {
    pub data: Vec<u8>,
}

/// Compiled module: functions, globals and the instruction arena
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
    pub insts: Vec<Inst>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Look up a function by name
    pub fn get_function(&self, name: &str) -> Option<FuncId> {
        self.functions.iter().position(|f| f.name == name)
    }

    fn fmt_value(&self, value: &Value) -> String {
        match value {
            Value::ConstI32(v) => v.to_string(),
            Value::ConstF32(v) => format!("{v:?}"),
            Value::ConstBool(v) => v.to_string(),
            Value::Inst(id) => format!("%{id}"),
            Value::Param(i) => format!("%arg{i}"),
            Value::Global(id) => format!("@g{id}"),
            Value::Function(id) => match self.functions.get(*id) {
                Some(f) => format!("@{}", f.name),
                None => format!("@f{id}"),
            },
        }
    }

    fn fmt_inst(&self, f: &mut fmt::Formatter<'_>, id: InstId, inst: &Inst) -> fmt::Result {
        match inst {
            Inst::Alloca { ty } => writeln!(f, "  %{id} = alloca {ty}"),
            Inst::Load { ty, ptr } => {
                writeln!(f, "  %{id} = load {ty}, {}", self.fmt_value(ptr))
            }
            Inst::Store { ptr, value } => {
                writeln!(f, "  store {}, {}", self.fmt_value(value), self.fmt_value(ptr))
            }
            Inst::Binary { op, lhs, rhs } => {
                let name = match op {
                    BinaryOp::Add => "add",
                    BinaryOp::Sub => "sub",
                    BinaryOp::Mul => "mul",
                    BinaryOp::SDiv => "sdiv",
                    BinaryOp::SRem => "srem",
                    BinaryOp::FAdd => "fadd",
                    BinaryOp::FSub => "fsub",
                    BinaryOp::FMul => "fmul",
                    BinaryOp::FDiv => "fdiv",
                    BinaryOp::FRem => "frem",
                };
                writeln!(
                    f,
                    "  %{id} = {name} {}, {}",
                    self.fmt_value(lhs),
                    self.fmt_value(rhs)
                )
            }
            Inst::ICmp { pred, lhs, rhs } => {
                let name = match pred {
                    IntPredicate::Eq => "eq",
                    IntPredicate::Ne => "ne",
                    IntPredicate::Slt => "slt",
                    IntPredicate::Sle => "sle",
                    IntPredicate::Sgt => "sgt",
                    IntPredicate::Sge => "sge",
                };
                writeln!(
                    f,
                    "  %{id} = icmp {name} {}, {}",
                    self.fmt_value(lhs),
                    self.fmt_value(rhs)
                )
            }
            Inst::FCmp { pred, lhs, rhs } => {
                let name = match pred {
                    FloatPredicate::Oeq => "oeq",
                    FloatPredicate::One => "one",
                    FloatPredicate::Olt => "olt",
                    FloatPredicate::Ole => "ole",
                    FloatPredicate::Ogt => "ogt",
                    FloatPredicate::Oge => "oge",
                };
                writeln!(
                    f,
                    "  %{id} = fcmp {name} {}, {}",
                    self.fmt_value(lhs),
                    self.fmt_value(rhs)
                )
            }
            Inst::Bitcast { value, ty } => {
                writeln!(f, "  %{id} = bitcast {} to {ty}", self.fmt_value(value))
            }
            Inst::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|a| self.fmt_value(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                writeln!(f, "  %{id} = call {}({args})", self.fmt_value(callee))
            }
            Inst::Br { dest } => writeln!(f, "  br .bb{dest}"),
            Inst::CondBr {
                cond,
                then_dest,
                else_dest,
            } => writeln!(
                f,
                "  br {}, .bb{then_dest}, .bb{else_dest}",
                self.fmt_value(cond)
            ),
            Inst::Ret { value: Some(v) } => writeln!(f, "  ret {}", self.fmt_value(v)),
            Inst::Ret { value: None } => writeln!(f, "  ret void"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;

        for (id, global) in self.globals.iter().enumerate() {
            let mut bytes = String::new();
            for b in &global.data {
                match b {
                    0x20..=0x7e if *b != b'"' && *b != b'\\' => bytes.push(*b as char),
                    b => bytes.push_str(&format!("\\{b:02x}")),
                }
            }
            writeln!(f, "@g{id} = constant [{} x i8] \"{bytes}\"", global.data.len())?;
        }

        for func in &self.functions {
            let params = func
                .params
                .iter()
                .map(Ty::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let params = if func.is_varargs {
                if params.is_empty() {
                    "...".to_string()
                } else {
                    format!("{params}, ...")
                }
            } else {
                params
            };

            if func.is_external() {
                writeln!(f, "declare {} @{}({params})", func.ret, func.name)?;
                continue;
            }

            writeln!(f, "define {} @{}({params}) {{", func.ret, func.name)?;
            for (bid, block) in func.blocks.iter().enumerate() {
                writeln!(f, ".bb{bid}: ; {}", block.label)?;
                for &id in &block.insts {
                    if let Some(inst) = self.insts.get(id) {
                        self.fmt_inst(f, id, inst)?;
                    }
                }
            }
            writeln!(f, "}}")?;
        }

        Ok(())
    }
}
