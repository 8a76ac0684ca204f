//! Compilation through the public pipeline API

use karst::compile_source;
use karst::vm::ir::{Inst, Ty};
use proptest::prelude::*;

fn alloca_types(source: &str) -> Vec<Ty> {
    let (module, errors) = compile_source(source).expect("source must parse");
    assert!(errors.is_empty(), "unexpected compile errors: {errors:?}");
    module
        .insts
        .iter()
        .filter_map(|inst| match inst {
            Inst::Alloca { ty } => Some(*ty),
            _ => None,
        })
        .collect()
}

#[test]
fn parse_failures_gate_compilation() {
    // driver policy: a non-empty parse-diagnostic list is fatal before
    // compilation is attempted
    let result = compile_source("let = 5;");
    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("parsing failed"));
}

#[test]
fn compile_diagnostics_do_not_gate_the_module() {
    let (module, errors) = compile_source("y = 3; let x: int = 1;").expect("parses cleanly");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("`y`"));
    // the module still came out the other side
    assert!(module.get_function("main").is_some());
}

#[test]
fn whole_program_compiles_with_zero_diagnostics() {
    let source = "let x: int = 5; let y: int = 10; fn add() -> int { return x + y; }";
    let (module, errors) = compile_source(source).expect("parses cleanly");
    assert!(errors.is_empty());
    assert!(module.get_function("add").is_some());
}

proptest! {
    /// Every integer-literal-only infix chain resolves to the 32-bit
    /// integer class
    #[test]
    fn integer_only_chains_type_as_i32(values in prop::collection::vec(0i32..100, 2..6), ops in prop::collection::vec(prop::sample::select(vec!["+", "-", "*"]), 5)) {
        let mut source = format!("let x: int = {}", values[0]);
        for (value, op) in values[1..].iter().zip(&ops) {
            source.push_str(&format!(" {op} {value}"));
        }
        source.push(';');
        prop_assert_eq!(alloca_types(&source), vec![Ty::I32]);
    }

    /// Every float-literal-only infix chain resolves to the float class
    #[test]
    fn float_only_chains_type_as_f32(values in prop::collection::vec(0u32..100, 2..6), ops in prop::collection::vec(prop::sample::select(vec!["+", "-", "*"]), 5)) {
        let mut source = format!("let x: float = {}.5", values[0]);
        for (value, op) in values[1..].iter().zip(&ops) {
            source.push_str(&format!(" {op} {value}.5"));
        }
        source.push(';');
        prop_assert_eq!(alloca_types(&source), vec![Ty::F32]);
    }

    /// A mixed int/float chain resolves to no value and allocates nothing
    #[test]
    fn mixed_chains_type_as_nothing(int_first in any::<bool>()) {
        let source = if int_first {
            "let x: int = 1 + 2.5;"
        } else {
            "let x: int = 2.5 + 1;"
        };
        prop_assert_eq!(alloca_types(source), Vec::<Ty>::new());
    }
}
