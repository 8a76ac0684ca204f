//! End-to-end: source text through the VM

use karst::compile_source;
use karst::vm::{RtValue, VM};

fn run_capturing(source: &str) -> (i32, String) {
    let (module, errors) = compile_source(source).expect("source must parse");
    assert!(errors.is_empty(), "unexpected compile errors: {errors:?}");
    let mut vm = VM::new();
    let code = vm.execute_module(&module).expect("execution must succeed");
    (code, vm.output())
}

#[test]
fn globals_feed_a_function_body() {
    let source = "let x: int = 5; let y: int = 10; fn add() -> int { return x + y; }";
    let (module, errors) = compile_source(source).expect("parses cleanly");
    assert!(errors.is_empty());

    let mut vm = VM::new();
    assert_eq!(vm.execute_module(&module), Ok(0));
    assert_eq!(
        vm.call_function(&module, "add", &[]),
        Ok(RtValue::I32(15))
    );
}

#[test]
fn arguments_pass_positionally() {
    let source = r#"
        fn sub(a: int, b: int) -> int { return a - b; }
        let r: int = sub(50, 8);
        printf("%d", r);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "42");
}

#[test]
fn float_arithmetic_round_trips() {
    let source = r#"
        let half: float = 1.0 / 2.0;
        printf("%f", half);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "0.500000");
}

#[test]
fn if_picks_the_consequence() {
    let source = r#"
        let x: int = 0;
        if 1 < 2 { x = 10; } else { x = 20; }
        printf("%d", x);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "10");
}

#[test]
fn elif_chain_picks_the_middle_arm() {
    let source = r#"
        let x: int = 5;
        let label: int = 0;
        if x < 3 { label = 1; } elif x < 10 { label = 2; } else { label = 3; }
        printf("%d", label);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "2");
}

#[test]
fn else_arm_runs_when_all_conditions_fail() {
    let source = r#"
        let x: int = 50;
        let label: int = 0;
        if x < 3 { label = 1; } elif x < 10 { label = 2; } else { label = 3; }
        printf("%d", label);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "3");
}

#[test]
fn modulus_lowers_to_the_remainder_operation() {
    let source = r#"printf("%d", 17 % 5);"#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "2");
}

#[test]
fn redeclared_let_overwrites_in_place() {
    let source = r#"
        let x: int = 5;
        let x: int = 6;
        printf("%d", x);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "6");
}

#[test]
fn concat_builds_a_fresh_string() {
    let source = r#"printf("%s", concat("kar", "st"));"#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "karst");
}

#[test]
fn memcpy_copies_into_allocated_memory() {
    let source = r#"printf("%s", memcpy(malloc(3), "hi", 3));"#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "hi");
}

#[test]
fn printf_interleaves_literals_and_values() {
    let source = r#"
        let a: int = 1;
        let b: int = 2;
        printf("a=%d b=%d sum=%d", a, b, a + b);
    "#;
    let (_, output) = run_capturing(source);
    assert_eq!(output, "a=1 b=2 sum=3");
}

#[test]
fn main_exits_zero() {
    let (code, _) = run_capturing("let x: int = 1;");
    assert_eq!(code, 0);
}

#[test]
fn demo_program_runs_from_disk() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("set by cargo");
    let path = std::path::Path::new(&manifest_dir).join("demos/fizz.ka");
    let source = std::fs::read_to_string(&path).expect("demo program exists");

    let (_, output) = run_capturing(&source);
    assert_eq!(output, "3 -> 1, 5 -> 2, 15 -> 3, 7 -> 0");
}
