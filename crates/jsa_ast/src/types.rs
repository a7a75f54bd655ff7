//! Flag types, ids and operator enums shared by the tree and its consumers.

use crate::syntax_kind::SyntaxKind;
use std::fmt;

bitflags::bitflags! {
    /// Flags recorded on scanned tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u16 {
        const NONE                   = 0;
        const PRECEDING_LINE_BREAK   = 1 << 0;
        const UNTERMINATED           = 1 << 1;
        const SCIENTIFIC             = 1 << 2;
        const HEX_SPECIFIER          = 1 << 3;
        const CONTAINS_INVALID_ESCAPE = 1 << 4;
        const UNICODE_ESCAPE         = 1 << 5;
    }
}

/// Unique id of a syntax node within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);
}

/// User-facing token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenClass {
    Keyword,
    Identifier,
    Literal,
    Operator,
    Punctuation,
    Comment,
    Invalid,
}

impl TokenClass {
    pub const ALL: [TokenClass; 7] = [
        TokenClass::Keyword,
        TokenClass::Identifier,
        TokenClass::Literal,
        TokenClass::Operator,
        TokenClass::Punctuation,
        TokenClass::Comment,
        TokenClass::Invalid,
    ];
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenClass::Keyword => "keyword",
            TokenClass::Identifier => "identifier",
            TokenClass::Literal => "literal",
            TokenClass::Operator => "operator",
            TokenClass::Punctuation => "punctuation",
            TokenClass::Comment => "comment",
            TokenClass::Invalid => "invalid",
        };
        f.write_str(name)
    }
}

/// The keyword that introduced a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LogicalAnd,
    LogicalOr,
}

impl BinaryOperator {
    /// Map an operator token to the binary operator it denotes.
    pub fn from_token(kind: SyntaxKind) -> Option<Self> {
        let op = match kind {
            SyntaxKind::PlusToken => BinaryOperator::Add,
            SyntaxKind::MinusToken => BinaryOperator::Subtract,
            SyntaxKind::AsteriskToken => BinaryOperator::Multiply,
            SyntaxKind::SlashToken => BinaryOperator::Divide,
            SyntaxKind::PercentToken => BinaryOperator::Remainder,
            SyntaxKind::EqualsEqualsToken => BinaryOperator::Equals,
            SyntaxKind::ExclamationEqualsToken => BinaryOperator::NotEquals,
            SyntaxKind::EqualsEqualsEqualsToken => BinaryOperator::StrictEquals,
            SyntaxKind::ExclamationEqualsEqualsToken => BinaryOperator::StrictNotEquals,
            SyntaxKind::LessThanToken => BinaryOperator::LessThan,
            SyntaxKind::GreaterThanToken => BinaryOperator::GreaterThan,
            SyntaxKind::LessThanEqualsToken => BinaryOperator::LessThanOrEqual,
            SyntaxKind::GreaterThanEqualsToken => BinaryOperator::GreaterThanOrEqual,
            SyntaxKind::AmpersandAmpersandToken => BinaryOperator::LogicalAnd,
            SyntaxKind::BarBarToken => BinaryOperator::LogicalOr,
            _ => return None,
        };
        Some(op)
    }

    pub fn text(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::StrictEquals => "===",
            BinaryOperator::StrictNotEquals => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LogicalAnd => "&&",
            BinaryOperator::LogicalOr => "||",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr)
    }

    /// Whether a literal zero right operand divides by zero.
    pub fn is_division(self) -> bool {
        matches!(self, BinaryOperator::Divide | BinaryOperator::Remainder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    RemainderAssign,
}

impl AssignmentOperator {
    pub fn from_token(kind: SyntaxKind) -> Option<Self> {
        let op = match kind {
            SyntaxKind::EqualsToken => AssignmentOperator::Assign,
            SyntaxKind::PlusEqualsToken => AssignmentOperator::AddAssign,
            SyntaxKind::MinusEqualsToken => AssignmentOperator::SubtractAssign,
            SyntaxKind::AsteriskEqualsToken => AssignmentOperator::MultiplyAssign,
            SyntaxKind::SlashEqualsToken => AssignmentOperator::DivideAssign,
            SyntaxKind::PercentEqualsToken => AssignmentOperator::RemainderAssign,
            _ => return None,
        };
        Some(op)
    }

    /// The arithmetic operator a compound assignment applies, or None for `=`.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubtractAssign => Some(BinaryOperator::Subtract),
            AssignmentOperator::MultiplyAssign => Some(BinaryOperator::Multiply),
            AssignmentOperator::DivideAssign => Some(BinaryOperator::Divide),
            AssignmentOperator::RemainderAssign => Some(BinaryOperator::Remainder),
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubtractAssign => "-=",
            AssignmentOperator::MultiplyAssign => "*=",
            AssignmentOperator::DivideAssign => "/=",
            AssignmentOperator::RemainderAssign => "%=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    TypeOf,
}

impl UnaryOperator {
    pub fn from_token(kind: SyntaxKind) -> Option<Self> {
        let op = match kind {
            SyntaxKind::MinusToken => UnaryOperator::Minus,
            SyntaxKind::PlusToken => UnaryOperator::Plus,
            SyntaxKind::ExclamationToken => UnaryOperator::Not,
            SyntaxKind::TypeOfKeyword => UnaryOperator::TypeOf,
            _ => return None,
        };
        Some(op)
    }

    pub fn text(self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::TypeOf => "typeof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    pub fn text(self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }

    pub fn binary_operator(self) -> BinaryOperator {
        match self {
            UpdateOperator::Increment => BinaryOperator::Add,
            UpdateOperator::Decrement => BinaryOperator::Subtract,
        }
    }
}
