//! Optimizer integration tests.

use bumpalo::Bump;
use jsa_ir::{generate, Opcode, Operand, Quadruple};
use jsa_optimizer::{optimize, Optimizer};
use jsa_parser::parse;
use jsa_scanner::tokenize;

fn generate_source(source: &str) -> Vec<Quadruple> {
    let arena = Bump::new();
    let lexed = tokenize(source);
    let parsed = parse(&arena, &lexed.tokens);
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected syntax errors in {:?}: {:?}",
        source,
        parsed.diagnostics
    );
    generate(&parsed.program).expect("generation should succeed")
}

fn render(quad: &Quadruple) -> String {
    let mut line = quad.op.to_string();
    for slot in [&quad.arg1, &quad.arg2] {
        if !slot.is_empty() {
            line.push(' ');
            line.push_str(&slot.to_string());
        }
    }
    if !quad.res.is_empty() {
        line.push_str(" -> ");
        line.push_str(&quad.res.to_string());
    }
    line
}

fn optimized_lines(source: &str) -> Vec<String> {
    optimize(&generate_source(source)).iter().map(render).collect()
}

fn quad(op: Opcode, arg1: Operand, arg2: Operand, res: Operand) -> Quadruple {
    Quadruple::new(op, arg1, arg2, res)
}

fn call(callee: &str, temp: u32) -> Quadruple {
    quad(Opcode::Call, Operand::name(callee), Operand::Args(vec![]), Operand::Temp(temp))
}

fn ret() -> Quadruple {
    quad(Opcode::Return, Operand::Empty, Operand::Empty, Operand::Empty)
}

fn goto(label: u32) -> Quadruple {
    quad(Opcode::Goto, Operand::Label(label), Operand::Empty, Operand::Empty)
}

fn jump_if_false(condition: &str, label: u32) -> Quadruple {
    quad(Opcode::JumpIfFalse, Operand::name(condition), Operand::Label(label), Operand::Empty)
}

// ============================================================================
// Constant folding
// ============================================================================

#[test]
fn test_folds_constant_arithmetic() {
    assert_eq!(optimized_lines("const a = 2 + 3;"), vec!["ASSIGN 5 -> a"]);
    assert_eq!(optimized_lines("const x = 2 * 3 + 4;"), vec!["ASSIGN 10 -> x"]);
}

#[test]
fn test_does_not_fold_division_by_zero() {
    assert_eq!(
        optimized_lines("let d = 1 / 0;"),
        vec!["DIV 1 0 -> t1", "ASSIGN t1 -> d"]
    );
}

#[test]
fn test_folds_template_concatenation() {
    assert_eq!(
        optimized_lines("const s = `n=${1 + 1}`;"),
        vec!["ASSIGN \"n=2\" -> s"]
    );
}

#[test]
fn test_propagates_into_call_arguments() {
    assert_eq!(optimized_lines("f(1 + 2);"), vec!["CALL f (3) -> t2"]);
}

#[test]
fn test_keeps_unfoldable_operations() {
    assert_eq!(
        optimized_lines("let y = x + 1;"),
        vec!["ADD x 1 -> t1", "ASSIGN t1 -> y"]
    );
}

#[test]
fn test_constant_conditions() {
    assert_eq!(optimized_lines("if (true) { f(); }"), vec!["CALL f () -> t1"]);
    assert_eq!(
        optimized_lines("if (1 > 2) { f(); } g();"),
        vec![
            "JUMP_IF_FALSE false L1",
            "CALL f () -> t2",
            "LABEL -> L1",
            "CALL g () -> t3",
        ]
    );
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_removes_code_after_return() {
    assert_eq!(
        optimized_lines("function f() { return 1; g(); }"),
        vec!["FUNCTION L1 -> f", "HALT", "LABEL f -> L1", "RETURN 1"]
    );
}

#[test]
fn test_merges_consecutive_labels() {
    assert_eq!(
        optimized_lines("if (a) { if (b) { f(); } }"),
        vec![
            "JUMP_IF_FALSE a L2",
            "JUMP_IF_FALSE b L2",
            "CALL f () -> t1",
            "LABEL -> L2",
        ]
    );
}

#[test]
fn test_collapses_jump_chains() {
    let code = vec![
        jump_if_false("c", 1),
        call("f", 1),
        ret(),
        Quadruple::label(1),
        goto(2),
        Quadruple::label(3),
        call("g", 2),
        Quadruple::label(2),
        call("h", 3),
        ret(),
    ];
    let optimized: Vec<String> = optimize(&code).iter().map(render).collect();
    assert_eq!(
        optimized,
        vec![
            "JUMP_IF_FALSE c L2",
            "CALL f () -> t1",
            "RETURN",
            "LABEL -> L2",
            "CALL h () -> t3",
            "RETURN",
        ]
    );
}

#[test]
fn test_jump_cycles_terminate() {
    let code = vec![
        jump_if_false("c", 1),
        ret(),
        Quadruple::label(1),
        goto(2),
        Quadruple::label(2),
        goto(1),
    ];
    let outcome = Optimizer::default().run(&code);
    assert!(outcome.converged);
    assert!(outcome.code.len() <= code.len());
    assert!(outcome.code.iter().any(|q| q.op == Opcode::Goto));
    assert_eq!(optimize(&outcome.code), outcome.code);
}

#[test]
fn test_entry_labels_are_kept() {
    let code = generate_source("class A { m() { return 1; } n() { return 2; } }");
    let optimized = optimize(&code);
    let entries = optimized.iter().filter(|q| q.is_entry_label()).count();
    assert_eq!(entries, 2);
}

// ============================================================================
// Properties
// ============================================================================

const CALCULATOR: &str = r#"
class Calculator {
  constructor() {
    this.history = [];
    this.precision = 2;
  }

  add(a, b) {
    const result = a + b;
    this.history.push(`${a} + ${b} = ${result}`);
    return parseFloat(result.toFixed(this.precision));
  }

  divide(a, b) {
    if (b === 0) {
      console.warn("Division by zero");
      return Infinity;
    }
    return a / b;
  }
}

const calc = new Calculator();
const sum = calc.add(10, 5);
const division = calc.divide(10, 0);

console.log(undeclaredVariable);
"#;

const PROGRAMS: &[&str] = &[
    CALCULATOR,
    "",
    "let x = 1; x = x + 2 * 3;",
    "let r = a || f(); let s = a && b;",
    "let m = c ? 1 + 1 : 2; if (m) { g(m); } else { h(); }",
    "function f(a, b) { if (a) { return b; } else { return 0; } return 1; }",
    "const o = { k: 1 + 2, j: [1, 2 * 2] }; o.k += 1; o.k++;",
    "if (false) { f(); } else if (true) { g(); } else { h(); }",
];

#[test]
fn test_never_longer_than_input() {
    for source in PROGRAMS {
        let code = generate_source(source);
        assert!(optimize(&code).len() <= code.len(), "source: {}", source);
    }
}

#[test]
fn test_idempotent() {
    for source in PROGRAMS {
        let once = optimize(&generate_source(source));
        let twice = optimize(&once);
        assert_eq!(once, twice, "source: {}", source);
    }
}

#[test]
fn test_indices_are_renumbered() {
    let optimized = optimize(&generate_source(CALCULATOR));
    assert!(!optimized.is_empty());
    for (i, quad) in optimized.iter().enumerate() {
        assert_eq!(quad.index, i);
    }
}

#[test]
fn test_calls_keep_their_order() {
    let code = generate_source(CALCULATOR);
    let calls = |code: &[Quadruple]| -> Vec<String> {
        code.iter()
            .filter(|q| q.op == Opcode::Call)
            .map(|q| q.arg1.to_string())
            .collect()
    };
    assert_eq!(calls(&optimize(&code)), calls(&code));
}

#[test]
fn test_zero_passes_leaves_code_unchanged() {
    let code = generate_source("const a = 2 + 3;");
    let outcome = Optimizer::new(0).run(&code);
    assert!(!outcome.converged);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(outcome.code, code);
}
