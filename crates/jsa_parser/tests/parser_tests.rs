//! Parser integration tests.
//!
//! Verifies that the parser builds the expected AST shapes and recovers from
//! malformed input with one diagnostic per independent error.

use bumpalo::Bump;
use jsa_ast::node::*;
use jsa_ast::types::{BinaryOperator, UpdateOperator, VariableKind};
use jsa_parser::parse;
use jsa_scanner::tokenize;

/// Helper: parse source text and hand the program and syntax diagnostic
/// codes to `check`.
fn with_program(source: &str, check: impl FnOnce(&Program<'_>, &[u32])) {
    let arena = Bump::new();
    let lexed = tokenize(source);
    let result = parse(&arena, &lexed.tokens);
    let codes: Vec<u32> = result.diagnostics.iter().map(|d| d.code).collect();
    check(&result.program, &codes);
}

fn statement_count(source: &str) -> usize {
    let mut count = 0;
    with_program(source, |program, _| count = program.statements.len());
    count
}

fn syntax_codes(source: &str) -> Vec<u32> {
    let mut result = Vec::new();
    with_program(source, |_, codes| result = codes.to_vec());
    result
}

fn syntax_messages(source: &str) -> Vec<String> {
    let arena = Bump::new();
    let lexed = tokenize(source);
    let result = parse(&arena, &lexed.tokens);
    result
        .diagnostics
        .iter()
        .map(|d| d.message_text.clone())
        .collect()
}

/// Helper: assert that parsing produces the expected number of top-level statements.
fn assert_statement_count(source: &str, expected: usize) {
    assert_eq!(statement_count(source), expected, "source: {}", source);
}

fn assert_clean(source: &str) {
    assert!(syntax_codes(source).is_empty(), "source: {}", source);
}

fn initializer<'p, 'a>(program: &'p Program<'a>, index: usize) -> &'p Expression<'a> {
    match &program.statements[index] {
        Statement::VariableStatement(stmt) => stmt.declarations[0]
            .initializer
            .expect("declaration has an initializer"),
        other => panic!("expected a variable statement, got {:?}", other.kind()),
    }
}

fn expression_of<'p, 'a>(program: &'p Program<'a>, index: usize) -> &'p Expression<'a> {
    match &program.statements[index] {
        Statement::ExpressionStatement(stmt) => stmt.expression,
        other => panic!("expected an expression statement, got {:?}", other.kind()),
    }
}

// ============================================================================
// Empty input
// ============================================================================

#[test]
fn test_parse_empty_source() {
    with_program("", |program, codes| {
        assert!(program.statements.is_empty());
        assert!(codes.is_empty());
    });
    assert_statement_count("  // only a comment\n", 0);
}

// ============================================================================
// Variable Declarations
// ============================================================================

#[test]
fn test_parse_const_declaration() {
    with_program("const x = 42;", |program, codes| {
        assert!(codes.is_empty());
        let Statement::VariableStatement(stmt) = &program.statements[0] else {
            panic!("expected a variable statement");
        };
        assert_eq!(stmt.kind, VariableKind::Const);
        assert_eq!(stmt.declarations[0].name.name, "x");
        let value = initializer(program, 0);
        assert!(matches!(
            value,
            Expression::Literal(Literal { value: LiteralValue::Number(n), .. }) if *n == 42.0
        ));
        assert_eq!((value.position().line, value.position().column), (1, 11));
    });
}

#[test]
fn test_parse_multiple_declarations() {
    assert_statement_count("const a = 1; let b = 2; var c = 3;", 3);
    with_program("let a = 1, b;", |program, codes| {
        assert!(codes.is_empty());
        let Statement::VariableStatement(stmt) = &program.statements[0] else {
            panic!("expected a variable statement");
        };
        assert_eq!(stmt.declarations.len(), 2);
        assert!(stmt.declarations[1].initializer.is_none());
    });
}

#[test]
fn test_const_requires_initializer() {
    assert_eq!(syntax_codes("const x;"), vec![1109]);
    assert_clean("let x;");
}

// ============================================================================
// Functions and classes
// ============================================================================

#[test]
fn test_parse_function_declaration() {
    with_program("function add(a, b) { return a + b; }", |program, codes| {
        assert!(codes.is_empty());
        let Statement::FunctionDeclaration(func) = &program.statements[0] else {
            panic!("expected a function declaration");
        };
        assert_eq!(func.name.name, "add");
        let names: Vec<&str> = func.parameters.iter().map(|p| p.name.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(matches!(
            &func.body.statements[0],
            Statement::ReturnStatement(ReturnStatement { expression: Some(Expression::Binary(b)), .. })
                if b.operator == BinaryOperator::Add
        ));
    });
}

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
fn test_parse_sample_program() {
    with_program(CALCULATOR, |program, codes| {
        assert!(codes.is_empty(), "unexpected diagnostics: {:?}", codes);
        assert_eq!(program.statements.len(), 5);

        let Statement::ClassDeclaration(class) = &program.statements[0] else {
            panic!("expected a class declaration");
        };
        assert_eq!(class.name.name, "Calculator");
        assert!(class.heritage.is_none());
        let methods: Vec<(&str, bool)> = class
            .members
            .iter()
            .map(|m| match m {
                ClassElement::Method(m) => (m.name.name, m.is_constructor()),
                ClassElement::Error(_) => ("<error>", false),
            })
            .collect();
        assert_eq!(
            methods,
            vec![("constructor", true), ("add", false), ("divide", false)]
        );
    });
}

#[test]
fn test_parse_static_method_and_extends() {
    with_program(
        "class B extends A { static create() { return new B(); } static() {} }",
        |program, codes| {
            assert!(codes.is_empty());
            let Statement::ClassDeclaration(class) = &program.statements[0] else {
                panic!("expected a class declaration");
            };
            assert!(matches!(class.heritage, Some(Expression::Identifier(id)) if id.name == "A"));
            let ClassElement::Method(create) = &class.members[0] else {
                panic!("expected a method");
            };
            assert!(create.is_static);
            let ClassElement::Method(named_static) = &class.members[1] else {
                panic!("expected a method");
            };
            assert!(!named_static.is_static);
            assert_eq!(named_static.name.name, "static");
        },
    );
}

#[test]
fn test_unsupported_class_members_recover() {
    let source = "class A {\n  x = 1;\n  get y() { return 1; }\n  m() {}\n}";
    with_program(source, |program, codes| {
        assert_eq!(codes, &[1106, 1106]);
        let Statement::ClassDeclaration(class) = &program.statements[0] else {
            panic!("expected a class declaration");
        };
        assert_eq!(class.members.len(), 3);
        assert!(matches!(class.members[0], ClassElement::Error(_)));
        assert!(matches!(&class.members[2], ClassElement::Method(m) if m.name.name == "m"));
    });
}

// ============================================================================
// Statements
// ============================================================================

#[test]
fn test_parse_if_else() {
    with_program("if (a) b(); else { c(); }", |program, codes| {
        assert!(codes.is_empty());
        let Statement::IfStatement(stmt) = &program.statements[0] else {
            panic!("expected an if statement");
        };
        assert!(matches!(stmt.then_statement, Statement::ExpressionStatement(_)));
        assert!(matches!(stmt.else_statement, Some(Statement::Block(_))));
    });
}

#[test]
fn test_return_without_value_before_line_break() {
    assert_statement_count("return\n1", 2);
    assert_clean("return\n1");
}

#[test]
fn test_automatic_semicolons() {
    assert_clean("let a = 1\nlet b = 2");
    assert_clean("function f() { return 1 }");
    assert_statement_count("let a = 1\nlet b = 2", 2);
}

#[test]
fn test_empty_statements() {
    assert_statement_count(";;", 2);
    assert_clean(";;");
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_operator_precedence() {
    with_program("x = 1 + 2 * 3;", |program, _| {
        let Expression::Assignment(assign) = expression_of(program, 0) else {
            panic!("expected an assignment");
        };
        let Expression::Binary(add) = assign.value else {
            panic!("expected a binary expression");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
        assert!(matches!(add.right, Expression::Binary(m) if m.operator == BinaryOperator::Multiply));
    });

    with_program("a || b && c;", |program, _| {
        let Expression::Binary(or) = expression_of(program, 0) else {
            panic!("expected a binary expression");
        };
        assert_eq!(or.operator, BinaryOperator::LogicalOr);
        assert!(matches!(or.right, Expression::Binary(and) if and.operator == BinaryOperator::LogicalAnd));
    });

    with_program("a - b - c;", |program, _| {
        let Expression::Binary(outer) = expression_of(program, 0) else {
            panic!("expected a binary expression");
        };
        assert!(matches!(outer.left, Expression::Binary(_)));
        assert!(matches!(outer.right, Expression::Identifier(id) if id.name == "c"));
    });
}

#[test]
fn test_chained_member_calls() {
    with_program("this.history.push(1);", |program, codes| {
        assert!(codes.is_empty());
        let Expression::Call(call) = expression_of(program, 0) else {
            panic!("expected a call");
        };
        assert_eq!(call.arguments.len(), 1);
        let Expression::PropertyAccess(push) = call.expression else {
            panic!("expected a property access");
        };
        assert_eq!(push.name.name, "push");
        let Expression::PropertyAccess(history) = push.expression else {
            panic!("expected a property access");
        };
        assert_eq!(history.name.name, "history");
        assert!(matches!(history.expression, Expression::This(_)));
    });
}

#[test]
fn test_parse_new_expression() {
    with_program("new a.b.C(1, 2); new D;", |program, codes| {
        assert!(codes.is_empty());
        let Expression::New(first) = expression_of(program, 0) else {
            panic!("expected a new expression");
        };
        assert_eq!(first.arguments.len(), 2);
        assert!(matches!(first.expression, Expression::PropertyAccess(p) if p.name.name == "C"));
        let Expression::New(second) = expression_of(program, 1) else {
            panic!("expected a new expression");
        };
        assert!(second.arguments.is_empty());
    });
}

#[test]
fn test_parse_template_literal() {
    with_program("`${a} + ${b} = ${result}`;", |program, codes| {
        assert!(codes.is_empty());
        let Expression::Template(template) = expression_of(program, 0) else {
            panic!("expected a template");
        };
        assert_eq!(template.head, "");
        let literals: Vec<&str> = template.spans.iter().map(|s| s.literal).collect();
        assert_eq!(literals, vec![" + ", " = ", ""]);
    });
}

#[test]
fn test_parse_object_and_array_literals() {
    with_program("const o = { a: 1, b, 'c': [1, 2], if: null };", |program, codes| {
        assert!(codes.is_empty());
        let Expression::ObjectLiteral(object) = initializer(program, 0) else {
            panic!("expected an object literal");
        };
        let keys: Vec<&str> = object.properties.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec!["a", "b", "c", "if"]);
        assert!(object.properties[1].is_shorthand);
        assert!(matches!(
            &object.properties[2].initializer,
            Expression::ArrayLiteral(array) if array.elements.len() == 2
        ));
    });
}

#[test]
fn test_parse_update_and_unary() {
    with_program("i++; --j; x = -y; typeof z;", |program, codes| {
        assert!(codes.is_empty());
        assert!(matches!(
            expression_of(program, 0),
            Expression::Update(u) if !u.prefix && u.operator == UpdateOperator::Increment
        ));
        assert!(matches!(
            expression_of(program, 1),
            Expression::Update(u) if u.prefix && u.operator == UpdateOperator::Decrement
        ));
        assert!(matches!(expression_of(program, 3), Expression::PrefixUnary(_)));
    });
}

#[test]
fn test_parse_conditional_and_compound_assignment() {
    with_program("total += a > b ? a : b;", |program, codes| {
        assert!(codes.is_empty());
        let Expression::Assignment(assign) = expression_of(program, 0) else {
            panic!("expected an assignment");
        };
        assert!(matches!(assign.value, Expression::Conditional(_)));
    });
}

#[test]
fn test_parenthesized_expression_has_no_node() {
    with_program("(a + b) * c;", |program, _| {
        let Expression::Binary(mul) = expression_of(program, 0) else {
            panic!("expected a binary expression");
        };
        assert_eq!(mul.operator, BinaryOperator::Multiply);
        assert!(matches!(mul.left, Expression::Binary(add) if add.operator == BinaryOperator::Add));
    });
}

#[test]
fn test_invalid_assignment_targets() {
    assert_eq!(syntax_codes("1 = x;"), vec![1108]);
    assert_eq!(syntax_codes("5++;"), vec![1112]);
    assert_clean("a.b = 1; a[0] = 2;");
}

// ============================================================================
// Error recovery
// ============================================================================

#[test]
fn test_missing_semicolon_on_same_line() {
    let source = "let a = 1 let b = 2;";
    assert_eq!(syntax_messages(source), vec!["';' expected.".to_string()]);
    assert_statement_count(source, 2);

    let arena = Bump::new();
    let lexed = tokenize(source);
    let result = parse(&arena, &lexed.tokens);
    let diagnostic = &result.diagnostics.diagnostics()[0];
    assert_eq!((diagnostic.line(), diagnostic.column()), (1, 11));
}

#[test]
fn test_multiple_independent_errors() {
    let source = "let = 1;\nlet y = ;\nlet z = 3;";
    assert_eq!(syntax_codes(source), vec![1103, 1102]);
    assert_statement_count(source, 3);
}

#[test]
fn test_error_node_keeps_arity() {
    with_program("let a = 1 +;\nlet b = 2;", |program, codes| {
        assert_eq!(codes, &[1102]);
        let Expression::Binary(binary) = initializer(program, 0) else {
            panic!("expected a binary expression");
        };
        assert!(matches!(binary.right, Expression::Error(_)));
        assert_eq!(program.statements.len(), 2);
    });
}

#[test]
fn test_invalid_token_is_unexpected() {
    assert_eq!(syntax_messages("let a = #;"), vec!["Unexpected token '#'.".to_string()]);
}

#[test]
fn test_unterminated_string_keeps_parsing() {
    let source = "let s = \"abc\nlet t = 1;";
    assert_eq!(syntax_codes(source), vec![1105]);
    with_program(source, |program, _| {
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(
            &program.statements[1],
            Statement::VariableStatement(v) if v.declarations[0].name.name == "t"
        ));
    });
}

#[test]
fn test_stray_close_brace() {
    assert_eq!(syntax_codes("} let a = 1;"), vec![1105]);
    assert_statement_count("} let a = 1;", 2);
}

// ============================================================================
// Unsupported syntax
// ============================================================================

#[test]
fn test_unsupported_statement_is_skipped() {
    let source = "while (x) { y(); }\nlet a = 1;";
    with_program(source, |program, codes| {
        assert_eq!(codes, &[1106]);
        assert_eq!(program.statements.len(), 2);
        assert!(program.statements[0].is_error());
    });
    assert_eq!(
        syntax_messages("for (;;) {}"),
        vec!["Unsupported syntax: 'for' statements.".to_string()]
    );
}

#[test]
fn test_unsupported_statement_with_else_and_catch() {
    assert_statement_count("try { a(); } catch (e) { b(); } finally { c(); }\nd();", 2);
    assert_statement_count("do { a(); } while (x);\nb();", 2);
}

#[test]
fn test_arrow_function_is_unsupported() {
    assert_eq!(
        syntax_messages("const f = (a) => a + 1;"),
        vec!["Unsupported syntax: arrow functions.".to_string()]
    );
    assert_eq!(syntax_codes("const g = x => { return x; };"), vec![1106]);
}

#[test]
fn test_unsupported_operators() {
    let messages = syntax_messages("x = 2 ** 3;");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("'**'"));
    assert_eq!(syntax_codes("a?.b;"), vec![1106]);
    assert_eq!(syntax_codes("x = a & b;"), vec![1106]);
    assert_eq!(syntax_codes("let r = /ab+c/;"), vec![1106]);
}

#[test]
fn test_spread_and_destructuring_are_unsupported() {
    assert_eq!(syntax_codes("f(...args);"), vec![1106]);
    assert_eq!(syntax_codes("const { a } = o;"), vec![1106]);
    assert_eq!(syntax_codes("function f(...rest) {}"), vec![1106]);
}

#[test]
fn test_deep_nesting_is_reported_once() {
    // Runs on a thread with a generous stack so the guard, not the OS, stops it.
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let source = format!("{}1{};", "(".repeat(1000), ")".repeat(1000));
            syntax_codes(&source)
        })
        .unwrap();
    assert_eq!(handle.join().unwrap(), vec![1110]);
}

#[test]
fn test_node_ids_are_unique() {
    with_program("let a = b + c; f(a);", |program, _| {
        struct Collect(Vec<u32>);
        impl<'a> jsa_ast::visitor::AstVisitor<'a> for Collect {
            fn visit_identifier(&mut self, node: &Identifier<'a>) {
                self.0.push(node.data.id.0);
            }
        }
        let mut ids = Collect(Vec::new());
        jsa_ast::visitor::AstVisitor::visit_program(&mut ids, program);
        let mut sorted = ids.0.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.0.len());
        assert!(!ids.0.is_empty());
    });
}
