//! Abstract Syntax Tree types
//!
//! A closed set of statement and expression variants. Every node owns its
//! children exclusively; the tree is strict (no sharing, no cycles).

use serde::Serialize;
use std::fmt;

/// A parsed program: an ordered sequence of statements
#[derive(Debug, Clone, Default, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone, Serialize)]
pub enum Stmt {
    /// Bare expression in statement position (also carries `if`, which the
    /// expression parser produces as a prefix form)
    Expression(Expr),
    /// `let name: type = value;`
    Let { name: String, ty: String, value: Expr },
    /// `name = value`
    Assign { name: String, value: Expr },
    /// `return value;`
    Return { value: Expr },
    /// `fn name(params) -> type { body }`
    Function {
        name: String,
        params: Vec<Param>,
        return_type: String,
        body: Block,
    },
}

/// Typed function parameter
#[derive(Debug, Clone, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

/// Block statement: an ordered sequence of statements between braces
#[derive(Debug, Clone, Default, Serialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

/// Expression
#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Ident(String),
    Infix {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `callee(args)` - the callee is a plain name
    Call { callee: String, args: Vec<Expr> },
    /// `if cond { ... } [elif ...]* [else { ... }]?`
    ///
    /// The alternative forms a singly-linked elif/else chain terminated by
    /// either absence or a plain block.
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Box<ElseArm>>,
    },
}

/// The alternative arm of an `if`
#[derive(Debug, Clone, Serialize)]
pub enum ElseArm {
    /// `elif ...` - always a nested `Expr::If`
    Elif(Expr),
    /// `else { ... }`
    Else(Block),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// Source-level operator text
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Eq => "==",
            BinOp::Neq => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }

    /// True for the six comparison operators
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Neq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
