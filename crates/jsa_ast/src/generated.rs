//! Accessor helpers for node enums.

use crate::node::*;
use crate::syntax_kind::SyntaxKind;
use jsa_core::text::Position;

impl<'a> Statement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::VariableStatement(n) => &n.data,
            Statement::FunctionDeclaration(n) => &n.data,
            Statement::ClassDeclaration(n) => &n.data,
            Statement::Block(n) => &n.data,
            Statement::EmptyStatement(d) => d,
            Statement::ExpressionStatement(n) => &n.data,
            Statement::IfStatement(n) => &n.data,
            Statement::ReturnStatement(n) => &n.data,
            Statement::Error(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn position(&self) -> Position {
        self.data().position
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Statement::Error(_))
    }
}

impl<'a> Expression<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expression::Identifier(n) => &n.data,
            Expression::Literal(n) => &n.data,
            Expression::Template(n) => &n.data,
            Expression::ArrayLiteral(n) => &n.data,
            Expression::ObjectLiteral(n) => &n.data,
            Expression::PropertyAccess(n) => &n.data,
            Expression::ElementAccess(n) => &n.data,
            Expression::Call(n) => &n.data,
            Expression::New(n) => &n.data,
            Expression::This(d) => d,
            Expression::PrefixUnary(n) => &n.data,
            Expression::Update(n) => &n.data,
            Expression::Binary(n) => &n.data,
            Expression::Assignment(n) => &n.data,
            Expression::Conditional(n) => &n.data,
            Expression::Error(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn position(&self) -> Position {
        self.data().position
    }

    /// Whether this expression is the numeric literal zero.
    pub fn is_zero_literal(&self) -> bool {
        matches!(self, Expression::Literal(Literal { value: LiteralValue::Number(n), .. }) if *n == 0.0)
    }

    /// Whether this expression may appear on the left of `=` or as the
    /// operand of `++`/`--`.
    pub fn is_assignment_target(&self) -> bool {
        matches!(
            self,
            Expression::Identifier(_) | Expression::PropertyAccess(_) | Expression::ElementAccess(_)
        )
    }
}

impl<'a> ClassElement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            ClassElement::Method(n) => &n.data,
            ClassElement::Error(n) => &n.data,
        }
    }
}
