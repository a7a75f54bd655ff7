//! AST visitor trait for traversing the syntax tree.
//!
//! Default implementations walk into children in source order. Override the
//! hooks you need; an override that still wants the children visited calls
//! the matching `walk_*` function.

use crate::node::*;

pub trait AstVisitor<'a> {
    fn visit_program(&mut self, node: &Program<'a>) {
        for stmt in node.statements.iter() {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement<'a>) {
        walk_statement(self, stmt);
    }

    // -- Statements --

    fn visit_variable_declaration(&mut self, node: &VariableDeclaration<'a>) {
        if let Some(init) = node.initializer {
            self.visit_expression(init);
        }
    }

    fn visit_function_declaration(&mut self, node: &FunctionDeclaration<'a>) {
        self.visit_block(&node.body);
    }

    fn visit_class_declaration(&mut self, node: &ClassDeclaration<'a>) {
        if let Some(heritage) = node.heritage {
            self.visit_expression(heritage);
        }
        for member in node.members.iter() {
            if let ClassElement::Method(method) = member {
                self.visit_method_declaration(method);
            }
        }
    }

    fn visit_method_declaration(&mut self, node: &MethodDeclaration<'a>) {
        self.visit_block(&node.body);
    }

    fn visit_block(&mut self, node: &Block<'a>) {
        for stmt in node.statements.iter() {
            self.visit_statement(stmt);
        }
    }

    fn visit_if_statement(&mut self, node: &IfStatement<'a>) {
        self.visit_expression(node.condition);
        self.visit_statement(node.then_statement);
        if let Some(else_stmt) = node.else_statement {
            self.visit_statement(else_stmt);
        }
    }

    fn visit_return_statement(&mut self, node: &ReturnStatement<'a>) {
        if let Some(expr) = node.expression {
            self.visit_expression(expr);
        }
    }

    fn visit_error_node(&mut self, _node: &ErrorNode) {}

    // -- Expressions --

    fn visit_expression(&mut self, expr: &Expression<'a>) {
        walk_expression(self, expr);
    }

    fn visit_identifier(&mut self, _node: &Identifier<'a>) {}

    fn visit_binary_expression(&mut self, node: &BinaryExpression<'a>) {
        self.visit_expression(node.left);
        self.visit_expression(node.right);
    }

    fn visit_call_expression(&mut self, node: &CallExpression<'a>) {
        self.visit_expression(node.expression);
        for arg in node.arguments.iter() {
            self.visit_expression(arg);
        }
    }
}

/// Dispatch a statement to the visitor hooks.
pub fn walk_statement<'a, V: AstVisitor<'a> + ?Sized>(visitor: &mut V, stmt: &Statement<'a>) {
    match stmt {
        Statement::VariableStatement(n) => {
            for decl in n.declarations.iter() {
                visitor.visit_variable_declaration(decl);
            }
        }
        Statement::FunctionDeclaration(n) => visitor.visit_function_declaration(n),
        Statement::ClassDeclaration(n) => visitor.visit_class_declaration(n),
        Statement::Block(n) => visitor.visit_block(n),
        Statement::EmptyStatement(_) => {}
        Statement::ExpressionStatement(n) => visitor.visit_expression(n.expression),
        Statement::IfStatement(n) => visitor.visit_if_statement(n),
        Statement::ReturnStatement(n) => visitor.visit_return_statement(n),
        Statement::Error(n) => visitor.visit_error_node(n),
    }
}

/// Dispatch an expression to the visitor hooks, walking into children.
pub fn walk_expression<'a, V: AstVisitor<'a> + ?Sized>(visitor: &mut V, expr: &Expression<'a>) {
    match expr {
        Expression::Identifier(n) => visitor.visit_identifier(n),
        Expression::Literal(_) | Expression::This(_) => {}
        Expression::Template(n) => {
            for span in n.spans.iter() {
                visitor.visit_expression(&span.expression);
            }
        }
        Expression::ArrayLiteral(n) => {
            for element in n.elements.iter() {
                visitor.visit_expression(element);
            }
        }
        Expression::ObjectLiteral(n) => {
            for prop in n.properties.iter() {
                visitor.visit_expression(&prop.initializer);
            }
        }
        Expression::PropertyAccess(n) => visitor.visit_expression(n.expression),
        Expression::ElementAccess(n) => {
            visitor.visit_expression(n.expression);
            visitor.visit_expression(n.argument);
        }
        Expression::Call(n) => visitor.visit_call_expression(n),
        Expression::New(n) => {
            visitor.visit_expression(n.expression);
            for arg in n.arguments.iter() {
                visitor.visit_expression(arg);
            }
        }
        Expression::PrefixUnary(n) => visitor.visit_expression(n.operand),
        Expression::Update(n) => visitor.visit_expression(n.operand),
        Expression::Binary(n) => visitor.visit_binary_expression(n),
        Expression::Assignment(n) => {
            visitor.visit_expression(n.target);
            visitor.visit_expression(n.value);
        }
        Expression::Conditional(n) => {
            visitor.visit_expression(n.condition);
            visitor.visit_expression(n.when_true);
            visitor.visit_expression(n.when_false);
        }
        Expression::Error(n) => visitor.visit_error_node(n),
    }
}
