//! Syntax tree node definitions.
//!
//! Nodes are allocated in a `bumpalo` arena owned by the caller of the
//! parser; children are arena references and lists are arena slices. Every
//! node embeds a [`NodeData`] with its kind, source range and 1-based
//! position.

use crate::syntax_kind::SyntaxKind;
use crate::types::*;
use jsa_core::text::{Position, TextRange};

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// Common data shared by all nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeData {
    pub kind: SyntaxKind,
    pub range: TextRange,
    /// Line and column of the node's first token.
    pub position: Position,
    pub id: NodeId,
}

impl NodeData {
    pub fn new(kind: SyntaxKind, id: NodeId, range: TextRange, position: Position) -> Self {
        Self {
            kind,
            range,
            position,
            id,
        }
    }
}

/// A list of nodes, allocated in the arena.
pub type NodeList<'a, T> = &'a [T];

/// Placeholder left where recovery discarded a malformed construct.
#[derive(Debug, Clone, Copy)]
pub struct ErrorNode {
    pub data: NodeData,
}

// ============================================================================
// Program
// ============================================================================

#[derive(Debug)]
pub struct Program<'a> {
    pub data: NodeData,
    pub statements: NodeList<'a, Statement<'a>>,
}

// ============================================================================
// Identifier
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Identifier<'a> {
    pub data: NodeData,
    pub name: &'a str,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug)]
pub enum Statement<'a> {
    VariableStatement(VariableStatement<'a>),
    FunctionDeclaration(FunctionDeclaration<'a>),
    ClassDeclaration(ClassDeclaration<'a>),
    Block(Block<'a>),
    EmptyStatement(NodeData),
    ExpressionStatement(ExpressionStatement<'a>),
    IfStatement(IfStatement<'a>),
    ReturnStatement(ReturnStatement<'a>),
    Error(ErrorNode),
}

#[derive(Debug)]
pub struct VariableStatement<'a> {
    pub data: NodeData,
    pub kind: VariableKind,
    pub declarations: NodeList<'a, VariableDeclaration<'a>>,
}

#[derive(Debug)]
pub struct VariableDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub initializer: Option<&'a Expression<'a>>,
}

#[derive(Debug)]
pub struct FunctionDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub parameters: NodeList<'a, Parameter<'a>>,
    pub body: Block<'a>,
}

#[derive(Debug)]
pub struct Parameter<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
}

#[derive(Debug)]
pub struct ClassDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    /// The `extends` expression, if any.
    pub heritage: Option<&'a Expression<'a>>,
    pub members: NodeList<'a, ClassElement<'a>>,
}

#[derive(Debug)]
pub enum ClassElement<'a> {
    Method(MethodDeclaration<'a>),
    Error(ErrorNode),
}

/// A method or constructor. Constructors have kind `SyntaxKind::Constructor`.
#[derive(Debug)]
pub struct MethodDeclaration<'a> {
    pub data: NodeData,
    pub name: Identifier<'a>,
    pub is_static: bool,
    pub parameters: NodeList<'a, Parameter<'a>>,
    pub body: Block<'a>,
}

impl MethodDeclaration<'_> {
    pub fn is_constructor(&self) -> bool {
        self.data.kind == SyntaxKind::Constructor
    }
}

#[derive(Debug)]
pub struct Block<'a> {
    pub data: NodeData,
    pub statements: NodeList<'a, Statement<'a>>,
}

#[derive(Debug)]
pub struct ExpressionStatement<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct IfStatement<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub then_statement: &'a Statement<'a>,
    pub else_statement: Option<&'a Statement<'a>>,
}

#[derive(Debug)]
pub struct ReturnStatement<'a> {
    pub data: NodeData,
    pub expression: Option<&'a Expression<'a>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub enum Expression<'a> {
    Identifier(Identifier<'a>),
    Literal(Literal<'a>),
    Template(TemplateExpression<'a>),
    ArrayLiteral(ArrayLiteralExpression<'a>),
    ObjectLiteral(ObjectLiteralExpression<'a>),
    PropertyAccess(PropertyAccessExpression<'a>),
    ElementAccess(ElementAccessExpression<'a>),
    Call(CallExpression<'a>),
    New(NewExpression<'a>),
    This(NodeData),
    PrefixUnary(PrefixUnaryExpression<'a>),
    Update(UpdateExpression<'a>),
    Binary(BinaryExpression<'a>),
    Assignment(AssignmentExpression<'a>),
    Conditional(ConditionalExpression<'a>),
    Error(ErrorNode),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue<'a> {
    Number(f64),
    String(&'a str),
    Boolean(bool),
    Null,
}

#[derive(Debug)]
pub struct Literal<'a> {
    pub data: NodeData,
    pub value: LiteralValue<'a>,
}

/// A template literal: `head${expr}literal${expr}literal`. A template
/// without substitutions has no spans.
#[derive(Debug)]
pub struct TemplateExpression<'a> {
    pub data: NodeData,
    pub head: &'a str,
    pub spans: NodeList<'a, TemplateSpan<'a>>,
}

#[derive(Debug)]
pub struct TemplateSpan<'a> {
    pub expression: Expression<'a>,
    /// Cooked text following the substitution.
    pub literal: &'a str,
}

#[derive(Debug)]
pub struct ArrayLiteralExpression<'a> {
    pub data: NodeData,
    pub elements: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct ObjectLiteralExpression<'a> {
    pub data: NodeData,
    pub properties: NodeList<'a, PropertyAssignment<'a>>,
}

/// `key: value`, or the shorthand `key` whose initializer is an identifier.
#[derive(Debug)]
pub struct PropertyAssignment<'a> {
    pub data: NodeData,
    pub key: &'a str,
    pub initializer: Expression<'a>,
    pub is_shorthand: bool,
}

#[derive(Debug)]
pub struct PropertyAccessExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
    pub name: Identifier<'a>,
}

#[derive(Debug)]
pub struct ElementAccessExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
    pub argument: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct CallExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct NewExpression<'a> {
    pub data: NodeData,
    pub expression: &'a Expression<'a>,
    pub arguments: NodeList<'a, Expression<'a>>,
}

#[derive(Debug)]
pub struct PrefixUnaryExpression<'a> {
    pub data: NodeData,
    pub operator: UnaryOperator,
    pub operand: &'a Expression<'a>,
}

/// `++x`, `x++`, `--x`, `x--`.
#[derive(Debug)]
pub struct UpdateExpression<'a> {
    pub data: NodeData,
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub operand: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct BinaryExpression<'a> {
    pub data: NodeData,
    pub left: &'a Expression<'a>,
    pub operator: BinaryOperator,
    pub right: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct AssignmentExpression<'a> {
    pub data: NodeData,
    pub target: &'a Expression<'a>,
    pub operator: AssignmentOperator,
    pub value: &'a Expression<'a>,
}

#[derive(Debug)]
pub struct ConditionalExpression<'a> {
    pub data: NodeData,
    pub condition: &'a Expression<'a>,
    pub when_true: &'a Expression<'a>,
    pub when_false: &'a Expression<'a>,
}
