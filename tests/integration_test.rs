use std::{cell::RefCell, rc::Rc};

use oizys::{
    interpreter::{ExecutionErrorKind, Interpreter},
    lines::BlockError,
};

fn run_program(source: &str) -> (Result<(), ExecutionErrorKind>, String) {
    let output = Rc::new(RefCell::new(Vec::new()));
    let mut interpreter = Interpreter::new(output.clone());
    let result = interpreter.interpret(source).map_err(|e| match e {
        oizys::interpreter::ExecutionError::Execution { kind, .. } => kind,
    });
    let output = String::from_utf8(output.take()).expect("Output should be valid UTF-8");
    (result, output)
}

fn test_valid_program(source: &str, expected_output: &str) {
    let (result, output) = run_program(source);
    if let Err(e) = result {
        panic!("Interpret should work on valid program, failed with {e}");
    }
    assert_eq!(output, expected_output);
}

#[test]
fn test_if_else() {
    let source = "if 1>2:\n out \"a\"\n done\n else:\n out \"b\"\n done";
    test_valid_program(source, "b\n");
}

#[test]
fn test_if_without_else() {
    let source = r#"
    if 0:
        out 1
        done
    out 2
    if 3:
        out 4
        done
    "#;
    test_valid_program(source, "2\n4\n");
}

#[test]
fn test_else_before_done() {
    let source = r#"
    if 0:
        out "then"
    else:
        out "else"
        done
    "#;
    test_valid_program(source, "else\n");
}

#[test]
fn test_while_counts() {
    let source = r#"
    # count to three
    i = 0
    while i < 3:
        out i
        i = i + 1
        done
    "#;
    test_valid_program(source, "i = 0\n0\ni = 1\n1\ni = 2\n2\ni = 3\n");
}

#[test]
fn test_while_false_skips_body() {
    let source = "while 0:\nout 1\ndone\nout 2";
    test_valid_program(source, "2\n");
}

#[test]
fn test_factorial_program() {
    let source = r#"
    const n = 5
    out n!
    out 6!!
    out 7!!!
    out 25!
    "#;
    test_valid_program(
        source,
        "n (constant) = 5\n120\n48\n28\n15511210043330985984000000\n",
    );
}

#[test]
fn test_arithmetic_output() {
    let source = r#"
    out 10/4
    out 10/5
    out 2^3^2
    out 1/3
    out "total: " + 3/2
    out 1 < 2 < 3
    "#;
    test_valid_program(
        source,
        "2.5\n2\n512\n0.3333333333333333\ntotal: 1.5\nTrue\n",
    );
}

#[test]
fn test_strings() {
    let source = r#"
    greeting = "hello"
    out greeting + ", " + 'world'
    out 'it\'s'
    out "ab" * 3
    "#;
    test_valid_program(
        source,
        "greeting = hello\nhello, world\nit's\nababab\n",
    );
}

#[test]
fn test_expression_statement_is_silent() {
    test_valid_program("a = 2\na + 1\na == 2", "a = 2\n");
}

#[test]
fn test_constant_reassignment() {
    let (result, output) = run_program("const pi = 3\npi = 4");
    assert!(matches!(
        result,
        Err(ExecutionErrorKind::ConstantReassignment(name)) if name == "pi"
    ));
    assert_eq!(output, "pi (constant) = 3\n");

    test_valid_program("const pi = 3\ndel pi\npi = 4", "pi (constant) = 3\npi = 4\n");
}

#[test]
fn test_null_is_silent_and_unbinds() {
    let (result, output) = run_program("a = 1\nnull a\nnull a\nout a");
    assert!(matches!(
        result,
        Err(ExecutionErrorKind::UndefinedVariable(name)) if name == "a"
    ));
    assert_eq!(output, "a = 1\n");
}

#[test]
fn test_del_unbound_fails() {
    let (result, _) = run_program("del a");
    assert!(matches!(result, Err(ExecutionErrorKind::NotBound(_))));
}

#[test]
fn test_reset_and_clear() {
    let (result, output) = run_program("a = 1\nconst b = 2\nCLEAR\nRESET\nout b");
    assert!(matches!(
        result,
        Err(ExecutionErrorKind::UndefinedVariable(_))
    ));
    assert_eq!(
        output,
        "a = 1\nb (constant) = 2\n\x1b[2J\x1b[H\x1b[2J\x1b[HEnvironment reset\n"
    );
}

#[test]
fn test_help() {
    let (result, output) = run_program("help while\nhelp nothing");
    assert!(result.is_ok());
    assert!(output.starts_with("Usage:\n  while condition:"));
    assert!(output.ends_with("No help available for 'nothing'\n"));

    let (_, output) = run_program("help");
    assert!(output.contains("and or not"));
}

#[test]
fn test_failing_statement_stops_script() {
    let (result, output) = run_program("out 1\nout 1/0\nout 2");
    assert!(matches!(result, Err(ExecutionErrorKind::DivisionByZero)));
    assert_eq!(output, "1\n");
}

#[test]
fn test_invalid_names() {
    let (result, _) = run_program("a1 = 3");
    assert!(matches!(result, Err(ExecutionErrorKind::InvalidName(_))));
    let (result, _) = run_program("while = 3");
    assert!(matches!(result, Err(ExecutionErrorKind::ReservedName(_))));
    let (result, _) = run_program("const x");
    assert!(matches!(result, Err(ExecutionErrorKind::Statement(_))));
}

// Bodies are captured flat and nested headers re-read the remaining program lines, so
// the inner `if` here takes `out "after"` as its body.
#[test]
fn test_nested_block_reads_outer_lines() {
    let source = r#"
    if 1:
        if 1:
            out "inner"
            done
        done
    out "after"
    done
    "#;
    test_valid_program(source, "after\ninner\n");
}

#[test]
fn test_nested_block_at_end_of_program_is_unterminated() {
    let source = r#"
    i = 0
    while i < 2:
        if i == 0:
            out "zero"
            done
        i = i + 1
        done
    "#;
    let (result, output) = run_program(source);
    assert!(matches!(
        result,
        Err(ExecutionErrorKind::Block(BlockError::Unterminated))
    ));
    assert_eq!(output, "i = 0\n");
}
