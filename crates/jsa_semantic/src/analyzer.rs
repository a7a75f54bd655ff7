//! The semantic analyzer.
//!
//! Walks the tree with a scope stack mirroring its lexical nesting
//! (program, class, function or method, block). Handles:
//! - Declaration tracking and redeclaration warnings
//! - Resolution of identifier references through the scope chain
//! - Function declaration hoisting
//! - Constant reassignment and `return` placement
//! - Division-by-zero heuristics, including zero passed to a divisor parameter
//! - Unreachable statements after an unconditional `return`
//! - Unused local bindings

use crate::globals::is_builtin_global;
use crate::model::SemanticModel;
use crate::scope::{Scope, ScopeId, ScopeKind};
use crate::symbol::{Symbol, SymbolFlags, SymbolId, SymbolKind};
use jsa_ast::node::*;
use jsa_ast::types::*;
use jsa_ast::visitor::{walk_expression, AstVisitor};
use jsa_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use rustc_hash::FxHashMap;

/// Settings that change which names resolve and which warnings are issued.
#[derive(Debug, Clone)]
pub struct SemanticOptions {
    /// Extra names treated as declared in the program scope.
    pub globals: Vec<String>,
    /// Warn about `var`/`let`/`const` bindings in function and block scopes
    /// that are never read.
    pub report_unused_variables: bool,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            globals: Vec::new(),
            report_unused_variables: true,
        }
    }
}

/// How a reference uses the referenced binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    ReadWrite,
}

/// The analyzer builds a [`SemanticModel`] and semantic diagnostics.
pub struct Analyzer<'o> {
    options: &'o SemanticOptions,
    model: SemanticModel,
    current_scope: ScopeId,
    /// Callable name to the parameter positions it divides by.
    divisor_parameters: FxHashMap<String, Vec<usize>>,
    diagnostics: DiagnosticCollection,
}

impl<'o> Analyzer<'o> {
    pub fn new(options: &'o SemanticOptions) -> Self {
        let mut model = SemanticModel::default();
        model.scopes.push(Scope::new(
            ScopeId::PROGRAM,
            ScopeKind::Program,
            None,
            NodeId::INVALID,
        ));
        Self {
            options,
            model,
            current_scope: ScopeId::PROGRAM,
            divisor_parameters: FxHashMap::default(),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Take diagnostics from the analyzer, ordered by source position.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.sort_by_position();
        diagnostics
    }

    pub fn into_model(self) -> SemanticModel {
        self.model
    }

    // ========================================================================
    // Program
    // ========================================================================

    pub fn analyze_program(&mut self, program: &Program<'_>) {
        if let Some(scope) = self.model.scopes.get_mut(ScopeId::PROGRAM.index()) {
            scope.node = program.data.id;
        }
        self.divisor_parameters = collect_divisor_parameters(program);
        self.analyze_statements(program.statements);
    }

    /// Analyze a statement list, reporting the first statement that follows
    /// one that always returns.
    fn analyze_statements(&mut self, statements: &[Statement<'_>]) {
        self.hoist_declarations(statements);

        let mut terminated = false;
        let mut reported = false;
        for stmt in statements {
            if terminated && !reported && can_be_unreachable(stmt) {
                self.report(stmt.data(), &messages::UNREACHABLE_CODE_DETECTED, &[]);
                reported = true;
            }
            self.analyze_statement(stmt);
            terminated |= always_returns(stmt);
        }
    }

    /// Declare function declarations ahead of the statements of their scope.
    fn hoist_declarations(&mut self, statements: &[Statement<'_>]) {
        for stmt in statements {
            if let Statement::FunctionDeclaration(func) = stmt {
                self.declare(&func.name, SymbolKind::Function, SymbolFlags::HOISTED, func.data.id);
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn analyze_statement(&mut self, stmt: &Statement<'_>) {
        match stmt {
            Statement::VariableStatement(n) => self.analyze_variable_statement(n),
            Statement::FunctionDeclaration(n) => self.analyze_function_declaration(n),
            Statement::ClassDeclaration(n) => self.analyze_class_declaration(n),
            Statement::Block(n) => {
                self.push_scope(ScopeKind::Block, n.data.id, None);
                self.analyze_statements(n.statements);
                self.pop_scope();
            }
            Statement::ExpressionStatement(n) => self.analyze_expression(n.expression),
            Statement::IfStatement(n) => {
                self.analyze_expression(n.condition);
                self.analyze_statement(n.then_statement);
                if let Some(else_stmt) = n.else_statement {
                    self.analyze_statement(else_stmt);
                }
            }
            Statement::ReturnStatement(n) => {
                if !self.in_function() {
                    self.report(&n.data, &messages::RETURN_OUTSIDE_FUNCTION, &[]);
                }
                if let Some(expr) = n.expression {
                    self.analyze_expression(expr);
                }
            }
            Statement::EmptyStatement(_) | Statement::Error(_) => {}
        }
    }

    fn analyze_variable_statement(&mut self, node: &VariableStatement<'_>) {
        let flags = match node.kind {
            VariableKind::Var => SymbolFlags::NONE,
            VariableKind::Let => SymbolFlags::BLOCK_SCOPED,
            VariableKind::Const => SymbolFlags::BLOCK_SCOPED | SymbolFlags::CONST,
        };
        for decl in node.declarations.iter() {
            // The initializer is evaluated before the name is in scope.
            if let Some(init) = decl.initializer {
                self.analyze_expression(init);
            }
            self.declare(&decl.name, SymbolKind::Variable, flags, decl.data.id);
        }
    }

    fn analyze_function_declaration(&mut self, node: &FunctionDeclaration<'_>) {
        // The name itself was hoisted.
        let name = (!node.name.name.is_empty()).then(|| node.name.name.to_string());
        self.push_scope(ScopeKind::Function, node.data.id, name);
        self.analyze_function_body(node.parameters, &node.body);
        self.pop_scope();
    }

    fn analyze_function_body(&mut self, parameters: &[Parameter<'_>], body: &Block<'_>) {
        for param in parameters {
            self.declare(&param.name, SymbolKind::Parameter, SymbolFlags::NONE, param.data.id);
        }
        self.analyze_statements(body.statements);
    }

    /// Whether the current scope is nested in a function or method body.
    fn in_function(&self) -> bool {
        let mut current = self.model.scope(self.current_scope);
        while let Some(scope) = current {
            if scope.kind.is_function_like() {
                return true;
            }
            current = scope.parent.and_then(|p| self.model.scope(p));
        }
        false
    }

    fn analyze_class_declaration(&mut self, node: &ClassDeclaration<'_>) {
        self.declare(&node.name, SymbolKind::Class, SymbolFlags::NONE, node.data.id);
        if let Some(heritage) = node.heritage {
            self.analyze_expression(heritage);
        }

        let class_name = node.name.name;
        self.push_scope(ScopeKind::Class, node.data.id, Some(class_name.to_string()));

        for member in node.members.iter() {
            if let ClassElement::Method(method) = member {
                if !method.is_constructor() {
                    let flags = if method.is_static {
                        SymbolFlags::STATIC
                    } else {
                        SymbolFlags::NONE
                    };
                    self.declare(&method.name, SymbolKind::Method, flags, method.data.id);
                }
            }
        }

        for member in node.members.iter() {
            if let ClassElement::Method(method) = member {
                let scope_name = format!("{}.{}", class_name, method.name.name);
                self.push_scope(ScopeKind::Method, method.data.id, Some(scope_name));
                self.analyze_function_body(method.parameters, &method.body);
                self.pop_scope();
            }
        }

        self.pop_scope();
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn analyze_expression(&mut self, expr: &Expression<'_>) {
        match expr {
            Expression::Identifier(id) => {
                self.reference(id, Access::Read);
            }
            Expression::Literal(_) | Expression::This(_) | Expression::Error(_) => {}
            Expression::Template(n) => {
                for span in n.spans.iter() {
                    self.analyze_expression(&span.expression);
                }
            }
            Expression::ArrayLiteral(n) => {
                for element in n.elements.iter() {
                    self.analyze_expression(element);
                }
            }
            Expression::ObjectLiteral(n) => {
                for prop in n.properties.iter() {
                    self.analyze_expression(&prop.initializer);
                }
            }
            Expression::PropertyAccess(n) => self.analyze_expression(n.expression),
            Expression::ElementAccess(n) => {
                self.analyze_expression(n.expression);
                self.analyze_expression(n.argument);
            }
            Expression::Call(n) => {
                self.analyze_expression(n.expression);
                for arg in n.arguments.iter() {
                    self.analyze_expression(arg);
                }
                self.check_zero_divisor_arguments(n);
            }
            Expression::New(n) => {
                self.analyze_expression(n.expression);
                for arg in n.arguments.iter() {
                    self.analyze_expression(arg);
                }
            }
            Expression::PrefixUnary(n) => self.analyze_expression(n.operand),
            Expression::Update(n) => self.analyze_write_target(n.operand, Access::ReadWrite),
            Expression::Binary(n) => {
                self.analyze_expression(n.left);
                self.analyze_expression(n.right);
                self.check_zero_divisor(n.operator, n.right);
            }
            Expression::Assignment(n) => {
                let access = if n.operator == AssignmentOperator::Assign {
                    Access::Write
                } else {
                    Access::ReadWrite
                };
                self.analyze_write_target(n.target, access);
                self.analyze_expression(n.value);
                if let Some(operator) = n.operator.binary_operator() {
                    self.check_zero_divisor(operator, n.value);
                }
            }
            Expression::Conditional(n) => {
                self.analyze_expression(n.condition);
                self.analyze_expression(n.when_true);
                self.analyze_expression(n.when_false);
            }
        }
    }

    /// The target of an assignment or update.
    fn analyze_write_target(&mut self, target: &Expression<'_>, access: Access) {
        let Expression::Identifier(id) = target else {
            self.analyze_expression(target);
            return;
        };
        let Some(symbol_id) = self.reference(id, access) else {
            return;
        };
        if self.model.symbol(symbol_id).is_some_and(Symbol::is_const) {
            self.report(&id.data, &messages::CANNOT_ASSIGN_TO_CONSTANT_0, &[id.name]);
        }
    }

    fn check_zero_divisor(&mut self, operator: BinaryOperator, divisor: &Expression<'_>) {
        if !divisor.is_zero_literal() {
            return;
        }
        match operator {
            BinaryOperator::Divide => self.report(divisor.data(), &messages::DIVISION_BY_ZERO, &[]),
            BinaryOperator::Remainder => {
                self.report(divisor.data(), &messages::REMAINDER_BY_ZERO, &[])
            }
            _ => {}
        }
    }

    /// Warn when a literal zero is passed in a position the callee divides by.
    fn check_zero_divisor_arguments(&mut self, call: &CallExpression<'_>) {
        let callee = match call.expression {
            Expression::Identifier(id) => id.name,
            Expression::PropertyAccess(access) => access.name.name,
            _ => return,
        };
        let Some(positions) = self.divisor_parameters.get(callee) else {
            return;
        };
        let zero_arguments: Vec<(usize, NodeData)> = positions
            .iter()
            .filter_map(|&i| call.arguments.get(i).map(|arg| (i, arg)))
            .filter(|(_, arg)| arg.is_zero_literal())
            .map(|(i, arg)| (i, *arg.data()))
            .collect();
        for (index, data) in zero_arguments {
            let ordinal = (index + 1).to_string();
            self.report(&data, &messages::ZERO_PASSED_AS_DIVISOR_0_1, &[ordinal.as_str(), callee]);
        }
    }

    // ========================================================================
    // Symbol and scope management
    // ========================================================================

    /// Resolve an identifier reference and record the use. Reports names that
    /// are neither declared nor global.
    fn reference(&mut self, id: &Identifier<'_>, access: Access) -> Option<SymbolId> {
        if id.name.is_empty() {
            return None;
        }
        let Some(symbol_id) = self.model.lookup(self.current_scope, id.name).map(|s| s.id) else {
            if !self.is_global(id.name) {
                self.report(&id.data, &messages::UNDECLARED_IDENTIFIER_0, &[id.name]);
            }
            return None;
        };
        self.model.resolutions.insert(id.data.id, symbol_id);
        if let Some(symbol) = self.model.symbols.get_mut(symbol_id.index()) {
            match access {
                Access::Read => symbol.reads += 1,
                Access::Write => symbol.writes += 1,
                Access::ReadWrite => {
                    symbol.reads += 1;
                    symbol.writes += 1;
                }
            }
        }
        Some(symbol_id)
    }

    fn is_global(&self, name: &str) -> bool {
        is_builtin_global(name) || self.options.globals.iter().any(|g| g == name)
    }

    /// Declare `name` in the current scope. A second declaration of the same
    /// name in one scope is a warning and keeps the first symbol.
    fn declare(
        &mut self,
        name: &Identifier<'_>,
        kind: SymbolKind,
        flags: SymbolFlags,
        declaration: NodeId,
    ) -> Option<SymbolId> {
        if name.name.is_empty() {
            return None;
        }
        let scope_index = self.current_scope.index();
        let existing = self.model.scopes.get(scope_index)?.get(name.name);
        if let Some(existing) = existing {
            self.report(&name.data, &messages::DUPLICATE_DECLARATION_0, &[name.name]);
            return Some(existing);
        }

        let id = SymbolId(self.model.symbols.len() as u32);
        self.model.symbols.push(Symbol {
            id,
            name: name.name.to_string(),
            kind,
            flags,
            scope: self.current_scope,
            declaration,
            span: name.data.range.to_span(),
            position: name.data.position,
            reads: 0,
            writes: 0,
        });
        if let Some(scope) = self.model.scopes.get_mut(scope_index) {
            scope.names.insert(name.name.to_string(), id);
        }
        Some(id)
    }

    fn push_scope(&mut self, kind: ScopeKind, node: NodeId, name: Option<String>) {
        let id = ScopeId(self.model.scopes.len() as u32);
        let mut scope = Scope::new(id, kind, Some(self.current_scope), node);
        scope.name = name;
        self.model.scopes.push(scope);
        self.current_scope = id;
    }

    /// Leave the current scope, checking its bindings first.
    fn pop_scope(&mut self) {
        let Some(scope) = self.model.scope(self.current_scope) else {
            return;
        };
        let parent = scope.parent;
        let checks_unused = self.options.report_unused_variables
            && matches!(scope.kind, ScopeKind::Function | ScopeKind::Method | ScopeKind::Block);

        if checks_unused {
            let unused: Vec<Diagnostic> = self
                .model
                .symbols_in(self.current_scope)
                .filter(|s| s.kind == SymbolKind::Variable && s.reads == 0)
                .map(|s| {
                    Diagnostic::new(&messages::UNUSED_VARIABLE_0, &[s.name.as_str()], s.span, s.position)
                })
                .collect();
            for diagnostic in unused {
                self.diagnostics.add(diagnostic);
            }
        }

        if let Some(parent) = parent {
            self.current_scope = parent;
        }
    }

    fn report(&mut self, node: &NodeData, message: &DiagnosticMessage, args: &[&str]) {
        self.diagnostics.add(Diagnostic::new(
            message,
            args,
            node.range.to_span(),
            node.position,
        ));
    }
}

/// Whether control never continues past `stmt`.
fn always_returns(stmt: &Statement<'_>) -> bool {
    match stmt {
        Statement::ReturnStatement(_) => true,
        Statement::Block(block) => block.statements.iter().any(always_returns),
        Statement::IfStatement(n) => {
            always_returns(n.then_statement) && n.else_statement.is_some_and(always_returns)
        }
        _ => false,
    }
}

/// Statements worth an unreachable-code warning. Hoisted declarations and
/// placeholders are not.
fn can_be_unreachable(stmt: &Statement<'_>) -> bool {
    !matches!(
        stmt,
        Statement::EmptyStatement(_) | Statement::FunctionDeclaration(_) | Statement::Error(_)
    )
}

// ============================================================================
// Divisor parameters
// ============================================================================

/// Map each function and method name to the positions of the parameters its
/// body uses directly as a divisor (`x / p`, `x % p`, `x /= p`).
fn collect_divisor_parameters(program: &Program<'_>) -> FxHashMap<String, Vec<usize>> {
    let mut collector = DivisorCollector::default();
    collector.visit_program(program);
    collector.found
}

#[derive(Default)]
struct DivisorCollector {
    found: FxHashMap<String, Vec<usize>>,
}

impl DivisorCollector {
    fn record<'a>(&mut self, name: &str, parameters: &[Parameter<'a>], body: &Block<'a>) {
        if name.is_empty() || parameters.is_empty() {
            return;
        }
        let mut uses = DivisorUses {
            parameters,
            positions: Vec::new(),
        };
        uses.visit_block(body);
        if uses.positions.is_empty() {
            return;
        }
        let entry = self.found.entry(name.to_string()).or_default();
        for position in uses.positions {
            if !entry.contains(&position) {
                entry.push(position);
            }
        }
        entry.sort_unstable();
    }
}

impl<'a> AstVisitor<'a> for DivisorCollector {
    fn visit_function_declaration(&mut self, node: &FunctionDeclaration<'a>) {
        self.record(node.name.name, node.parameters, &node.body);
        self.visit_block(&node.body);
    }

    fn visit_method_declaration(&mut self, node: &MethodDeclaration<'a>) {
        if !node.is_constructor() {
            self.record(node.name.name, node.parameters, &node.body);
        }
        self.visit_block(&node.body);
    }
}

struct DivisorUses<'p, 'a> {
    parameters: &'p [Parameter<'a>],
    positions: Vec<usize>,
}

impl<'p, 'a> AstVisitor<'a> for DivisorUses<'p, 'a> {
    fn visit_expression(&mut self, expr: &Expression<'a>) {
        let divisor = match expr {
            Expression::Binary(n) if n.operator.is_division() => Some(n.right),
            Expression::Assignment(n)
                if n.operator.binary_operator().is_some_and(BinaryOperator::is_division) =>
            {
                Some(n.value)
            }
            _ => None,
        };
        if let Some(Expression::Identifier(id)) = divisor {
            if let Some(position) = self.parameters.iter().position(|p| p.name.name == id.name) {
                if !self.positions.contains(&position) {
                    self.positions.push(position);
                }
            }
        }
        walk_expression(self, expr);
    }
}
