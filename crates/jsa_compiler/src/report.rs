//! Human-readable stage reports.
//!
//! Every report is a pure function of its stage output, so identical input
//! always yields identical text.

use jsa_ast::node::*;
use jsa_ast::types::TokenClass;
use jsa_ast::visitor::{walk_statement, AstVisitor};
use jsa_diagnostics::DiagnosticCollection;
use jsa_parser::ParseResult;
use jsa_scanner::LexResult;
use jsa_semantic::{ScopeKind, SemanticResult};
use std::fmt::Write;

/// Token count, per-class breakdown and lexical diagnostics.
pub fn lexical_report(lexed: &LexResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Tokens: {}", lexed.token_count());
    for class in TokenClass::ALL {
        let count = lexed
            .tokens
            .iter()
            .filter(|t| t.class() == Some(class))
            .count();
        if count > 0 {
            let _ = writeln!(out, "  {:<12} {}", class, count);
        }
    }
    write_diagnostics(&mut out, "Lexical errors", &lexed.diagnostics);
    out
}

/// Declaration outline and syntax diagnostics.
pub fn syntactic_report(parsed: &ParseResult<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Statements: {}", parsed.program.statements.len());
    let mut outline = Outline::default();
    outline.visit_program(&parsed.program);
    if !outline.lines.is_empty() {
        out.push_str("Outline:\n");
        for line in &outline.lines {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    write_diagnostics(&mut out, "Syntax errors", &parsed.diagnostics);
    out
}

/// Semantic diagnostics followed by the scope tree with its symbols.
pub fn semantic_report(semantic: &SemanticResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Errors: {}, warnings: {}",
        semantic.error_count(),
        semantic.warning_count()
    );
    for diagnostic in &semantic.diagnostics {
        let _ = writeln!(out, "  {}", diagnostic);
    }

    let model = &semantic.model;
    out.push_str("Scopes:\n");
    for scope in model.scopes() {
        let indent = "  ".repeat(model.depth(scope.id) + 1);
        match (&scope.name, scope.kind) {
            (_, ScopeKind::Program) | (None, _) => {
                let _ = writeln!(out, "{}{}", indent, scope.kind);
            }
            (Some(name), kind) => {
                let _ = writeln!(out, "{}{} {}", indent, kind, name);
            }
        }
        for symbol in model.symbols_in(scope.id) {
            let _ = writeln!(
                out,
                "{}  - {}: {}, line {}, {} read{}",
                indent,
                symbol.name,
                symbol.kind,
                symbol.line(),
                symbol.reads,
                if symbol.reads == 1 { "" } else { "s" }
            );
        }
    }
    out
}

fn write_diagnostics(out: &mut String, title: &str, diagnostics: &DiagnosticCollection) {
    let _ = writeln!(out, "{}: {}", title, diagnostics.error_count());
    for diagnostic in diagnostics {
        let _ = writeln!(out, "  {}", diagnostic);
    }
}

/// Collects one line per declaration, indented by nesting.
#[derive(Default)]
struct Outline {
    lines: Vec<String>,
    depth: usize,
}

impl Outline {
    fn push(&mut self, text: String, line: u32) {
        self.lines
            .push(format!("{}{} (line {})", "  ".repeat(self.depth), text, line));
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }
}

fn parameter_list(parameters: &[Parameter<'_>]) -> String {
    let names: Vec<&str> = parameters.iter().map(|p| p.name.name).collect();
    format!("({})", names.join(", "))
}

impl<'a> AstVisitor<'a> for Outline {
    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        if let Statement::VariableStatement(node) = stmt {
            for decl in node.declarations.iter() {
                self.push(
                    format!("{} {}", node.kind.as_str(), decl.name.name),
                    decl.data.position.line,
                );
            }
            return;
        }
        walk_statement(self, stmt);
    }

    fn visit_function_declaration(&mut self, node: &FunctionDeclaration<'a>) {
        self.push(
            format!("function {}{}", node.name.name, parameter_list(node.parameters)),
            node.data.position.line,
        );
        self.nested(|outline| outline.visit_block(&node.body));
    }

    fn visit_class_declaration(&mut self, node: &ClassDeclaration<'a>) {
        let extends = if node.heritage.is_some() { " extends ..." } else { "" };
        self.push(
            format!("class {}{}", node.name.name, extends),
            node.data.position.line,
        );
        self.nested(|outline| {
            for member in node.members.iter() {
                match member {
                    ClassElement::Method(method) => outline.visit_method_declaration(method),
                    ClassElement::Error(error) => outline.visit_error_node(error),
                }
            }
        });
    }

    fn visit_method_declaration(&mut self, node: &MethodDeclaration<'a>) {
        let text = if node.is_constructor() {
            format!("constructor{}", parameter_list(node.parameters))
        } else {
            let prefix = if node.is_static { "static method" } else { "method" };
            format!("{} {}{}", prefix, node.name.name, parameter_list(node.parameters))
        };
        self.push(text, node.data.position.line);
        self.nested(|outline| outline.visit_block(&node.body));
    }

    fn visit_error_node(&mut self, node: &ErrorNode) {
        self.push("<error>".to_string(), node.data.position.line);
    }

    fn visit_expression(&mut self, _expr: &Expression<'a>) {}
}
