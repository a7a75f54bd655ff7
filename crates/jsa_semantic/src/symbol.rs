//! Symbol definitions.

use crate::scope::ScopeId;
use jsa_ast::types::NodeId;
use jsa_core::text::{Position, TextSpan};
use std::fmt;

/// Index of a symbol in the [`SemanticModel`](crate::SemanticModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a declared name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Method,
    Class,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
        };
        f.write_str(name)
    }
}

bitflags::bitflags! {
    /// Declaration modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SymbolFlags: u8 {
        const NONE   = 0;
        /// Declared with `const`.
        const CONST  = 1 << 0;
        /// Declared with `let` or `const`.
        const BLOCK_SCOPED = 1 << 1;
        const STATIC = 1 << 2;
        /// Declared ahead of its statement (function declarations).
        const HOISTED = 1 << 3;
    }
}

/// A declared name.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    pub flags: SymbolFlags,
    /// The scope the name is declared in.
    pub scope: ScopeId,
    /// The declaring node.
    pub declaration: NodeId,
    /// Location of the declared name.
    pub span: TextSpan,
    pub position: Position,
    /// Number of references that read the value.
    pub reads: u32,
    /// Number of references that only write the value.
    pub writes: u32,
}

impl Symbol {
    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(SymbolFlags::CONST)
    }

    /// Whether a bare identifier can refer to this symbol. Methods are only
    /// reachable through `this` or an instance.
    pub fn is_lexically_visible(&self) -> bool {
        self.kind != SymbolKind::Method
    }
}
