//! Scope tree.

use crate::symbol::SymbolId;
use indexmap::IndexMap;
use jsa_ast::types::NodeId;
use std::fmt;

/// Index of a scope in the [`SemanticModel`](crate::SemanticModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The program scope is always created first.
    pub const PROGRAM: ScopeId = ScopeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Program,
    Class,
    Function,
    Method,
    Block,
}

impl ScopeKind {
    /// Function and method scopes are where `return` is allowed.
    pub fn is_function_like(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Method)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Program => "program",
            ScopeKind::Class => "class",
            ScopeKind::Function => "function",
            ScopeKind::Method => "method",
            ScopeKind::Block => "block",
        };
        f.write_str(name)
    }
}

/// A lexical scope. Scopes outlive their traversal so that reports can list
/// every declaration.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Display name: the class, function or `Class.method` that owns it.
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    /// The node that opened the scope (the program node for the root).
    pub node: NodeId,
    /// Declared names in declaration order.
    pub names: IndexMap<String, SymbolId>,
}

impl Scope {
    pub fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, node: NodeId) -> Self {
        Self {
            id,
            kind,
            name: None,
            parent,
            node,
            names: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    pub fn symbols(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.names.values().copied()
    }
}
