//! Semantic analyzer integration tests.
//!
//! Tests the parse -> analyze pipeline and verifies scopes, symbols and
//! semantic diagnostics.

use bumpalo::Bump;
use jsa_ast::{Expression, NodeId, Statement};
use jsa_parser::parse;
use jsa_scanner::tokenize;
use jsa_semantic::{analyze, ScopeKind, SemanticOptions, SemanticResult, SymbolKind};

/// Helper: parse (asserting the source is syntactically valid) and analyze.
fn analyze_with(source: &str, options: &SemanticOptions) -> SemanticResult {
    let arena = Bump::new();
    let lexed = tokenize(source);
    let parsed = parse(&arena, &lexed.tokens);
    assert!(
        parsed.diagnostics.is_empty(),
        "unexpected syntax errors in {:?}: {:?}",
        source,
        parsed.diagnostics
    );
    analyze(&parsed.program, options)
}

fn analyze_source(source: &str) -> SemanticResult {
    analyze_with(source, &SemanticOptions::default())
}

fn semantic_codes(source: &str) -> Vec<u32> {
    analyze_source(source).diagnostics.iter().map(|d| d.code).collect()
}

fn assert_clean(source: &str) {
    let codes = semantic_codes(source);
    assert!(codes.is_empty(), "source: {} produced {:?}", source, codes);
}

// ============================================================================
// Name resolution
// ============================================================================

#[test]
fn test_undeclared_identifier() {
    let result = analyze_source("console.log(undeclaredVariable);");
    assert_eq!(result.error_count(), 1);
    let diagnostic = &result.diagnostics.diagnostics()[0];
    assert_eq!(diagnostic.code, 2001);
    assert_eq!(diagnostic.message_text, "Undeclared identifier 'undeclaredVariable'.");
    assert_eq!((diagnostic.line(), diagnostic.column()), (1, 13));
}

#[test]
fn test_bare_reference_is_undeclared() {
    assert_eq!(semantic_codes("foo;"), vec![2001]);
}

#[test]
fn test_declared_names_resolve() {
    assert_clean("const a = 1; console.log(a);");
    assert_clean("Math.max(1, 2); JSON.stringify({}); undefined;");
}

#[test]
fn test_use_before_declaration() {
    assert_eq!(semantic_codes("x; let x = 1;"), vec![2001]);
}

#[test]
fn test_function_declarations_are_hoisted() {
    assert_clean("f(); function f() {}");
}

#[test]
fn test_shadowing_in_nested_scope_is_legal() {
    assert_clean("let a = 1; { let a = 2; console.log(a); } a;");
}

#[test]
fn test_methods_are_not_lexically_visible() {
    assert_eq!(
        semantic_codes("class A { m() { return 1; } n() { return m(); } }"),
        vec![2001]
    );
    assert_clean("class A { m() { return 1; } n() { return this.m(); } }");
}

#[test]
fn test_extra_globals() {
    let options = SemanticOptions {
        globals: vec!["myGlobal".to_string()],
        ..SemanticOptions::default()
    };
    assert!(analyze_with("myGlobal();", &options).diagnostics.is_empty());
    assert_eq!(semantic_codes("myGlobal();"), vec![2001]);
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_redeclaration_is_a_warning() {
    let result = analyze_source("let a = 1; let a = 2; a;");
    let codes: Vec<u32> = result.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![2002]);
    assert_eq!(result.error_count(), 0);
    assert_eq!(result.warning_count(), 1);
}

#[test]
fn test_constant_reassignment() {
    assert_eq!(semantic_codes("const c = 1; c = 2;"), vec![2007]);
    assert_eq!(semantic_codes("const c = 1; c++;"), vec![2007]);
    assert_clean("let c = 1; c += 2;");
}

#[test]
fn test_return_outside_function() {
    assert_eq!(semantic_codes("return 1;"), vec![2008]);
    assert_eq!(semantic_codes("{ return 1; }"), vec![2008]);
    assert_clean("function f() { { return 1; } }");
    assert_clean("function f() { return 1; }");
}

// ============================================================================
// Heuristic warnings
// ============================================================================

#[test]
fn test_division_by_zero_is_a_warning() {
    let result = analyze_source("let x = 10 / 0;");
    assert_eq!(result.error_count(), 0);
    assert_eq!(result.warning_count(), 1);
    assert_eq!(result.diagnostics.diagnostics()[0].code, 2004);

    assert_eq!(semantic_codes("let y = 10 % 0;"), vec![2005]);
    assert_eq!(semantic_codes("let z = 1; z /= 0;"), vec![2004]);
    assert_clean("let w = 10 / 2;");
}

#[test]
fn test_zero_passed_to_divisor_parameter() {
    let result = analyze_source("function div(a, b) { return a / b; } div(1, 0); div(0, 1);");
    let messages: Vec<&str> = result
        .diagnostics
        .iter()
        .map(|d| d.message_text.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["Argument 2 of 'div' is used as a divisor; passing 0 divides by zero."]
    );
}

// ============================================================================
// Reachability
// ============================================================================

#[test]
fn test_unreachable_after_return() {
    let result = analyze_source("function f() {\n  return 1;\n  let a = 2;\n  a;\n}");
    let diagnostics = result.diagnostics.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, 2003);
    assert_eq!((diagnostics[0].line(), diagnostics[0].column()), (3, 3));
}

#[test]
fn test_unreachable_reported_once_per_block() {
    assert_eq!(semantic_codes("function f() { return 1; f(); f(); }"), vec![2003]);
}

#[test]
fn test_unreachable_after_exhaustive_if() {
    assert_eq!(
        semantic_codes("function f(a) { if (a) { return 1; } else { return 2; } f(a); }"),
        vec![2003]
    );
    assert_clean("function f(a) { if (a) { return 1; } return 2; }");
}

// ============================================================================
// Unused bindings
// ============================================================================

#[test]
fn test_unused_local_variable() {
    assert_eq!(semantic_codes("function f() { let unused = 1; }"), vec![2009]);
    assert_eq!(semantic_codes("function f() { let a; a = 1; }"), vec![2009]);
    assert_clean("let top = 1;");
    assert_clean("function f(a) {}");
}

#[test]
fn test_unused_warnings_can_be_disabled() {
    let options = SemanticOptions {
        report_unused_variables: false,
        ..SemanticOptions::default()
    };
    let result = analyze_with("function f() { let unused = 1; }", &options);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_diagnostics_are_in_source_order() {
    assert_eq!(
        semantic_codes("function f() { let u = 1; return 1 / 0; }"),
        vec![2009, 2004]
    );
}

// ============================================================================
// Semantic model
// ============================================================================

#[test]
fn test_scope_tree_and_symbols() {
    let result = analyze_source("class Calculator { add(a, b) { return a + b; } }");
    let model = &result.model;

    let kinds: Vec<ScopeKind> = model.scopes().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![ScopeKind::Program, ScopeKind::Class, ScopeKind::Method]);
    assert_eq!(model.scopes()[2].name.as_deref(), Some("Calculator.add"));
    assert_eq!(model.depth(model.scopes()[2].id), 2);

    let symbols: Vec<(&str, SymbolKind)> = model
        .symbols()
        .iter()
        .map(|s| (s.name.as_str(), s.kind))
        .collect();
    assert_eq!(
        symbols,
        vec![
            ("Calculator", SymbolKind::Class),
            ("add", SymbolKind::Method),
            ("a", SymbolKind::Parameter),
            ("b", SymbolKind::Parameter),
        ]
    );
    assert_eq!(model.symbols()[2].reads, 1);
    assert_eq!(model.resolution_count(), 2);
}

#[test]
fn test_lookup_walks_the_scope_chain() {
    let result = analyze_source("let outer = 1; function f() { let inner = outer; return inner; }");
    let model = &result.model;
    let function_scope = model
        .scopes()
        .iter()
        .find(|s| s.kind == ScopeKind::Function)
        .expect("function scope");
    assert!(model.lookup(function_scope.id, "inner").is_some());
    assert!(model.lookup(function_scope.id, "outer").is_some());
    assert!(model.lookup(jsa_semantic::ScopeId::PROGRAM, "inner").is_none());
}

#[test]
fn test_references_resolve_to_their_declaration() {
    let arena = Bump::new();
    let lexed = tokenize("let total = 1; total; missing;");
    let parsed = parse(&arena, &lexed.tokens);
    let result = analyze(&parsed.program, &SemanticOptions::default());

    let references: Vec<NodeId> = parsed
        .program
        .statements
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::ExpressionStatement(n) => match n.expression {
                Expression::Identifier(id) => Some(id.data.id),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(references.len(), 2);

    let symbol = result.model.resolved_symbol(references[0]).expect("resolved");
    assert_eq!(symbol.name, "total");
    assert_eq!(symbol.kind, SymbolKind::Variable);
    assert!(result.model.resolved_symbol(references[1]).is_none());
    assert_eq!(result.model.resolution_count(), 1);
}

// ============================================================================
// Sample program
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

#[test]
fn test_sample_program() {
    let result = analyze_source(CALCULATOR);
    let codes: Vec<u32> = result.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![2006, 2001]);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.warning_count(), 1);
    assert!(result.diagnostics.diagnostics()[1]
        .message_text
        .contains("undeclaredVariable"));
}
