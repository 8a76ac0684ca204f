//! Middle end: scope resolution and AST-to-IR code generation

pub mod codegen;
pub mod scope;
