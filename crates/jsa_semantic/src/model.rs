//! The semantic model: the side table the analyzer attaches to a tree.

use crate::scope::{Scope, ScopeId};
use crate::symbol::{Symbol, SymbolId};
use jsa_ast::types::NodeId;
use rustc_hash::FxHashMap;

/// Scopes, symbols and identifier resolutions for one analyzed program.
/// The tree itself is left untouched; consumers look nodes up by id.
#[derive(Debug, Clone, Default)]
pub struct SemanticModel {
    pub(crate) scopes: Vec<Scope>,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) resolutions: FxHashMap<NodeId, SymbolId>,
}

impl SemanticModel {
    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// The symbol an identifier reference resolved to. Builtin globals and
    /// undeclared names have no entry.
    pub fn resolved_symbol(&self, node: NodeId) -> Option<&Symbol> {
        self.resolutions
            .get(&node)
            .and_then(|id| self.symbol(*id))
    }

    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    /// Symbols declared directly in `scope`, in declaration order.
    pub fn symbols_in(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> + '_ {
        self.scope(scope)
            .into_iter()
            .flat_map(|s| s.symbols())
            .filter_map(move |id| self.symbol(id))
    }

    /// Find a symbol by name, searching `scope` and then its ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut current = self.scope(scope);
        while let Some(s) = current {
            if let Some(symbol) = s
                .get(name)
                .and_then(|id| self.symbol(id))
                .filter(|sym| sym.is_lexically_visible())
            {
                return Some(symbol);
            }
            current = s.parent.and_then(|p| self.scope(p));
        }
        None
    }

    /// Nesting depth of a scope; the program scope has depth 0.
    pub fn depth(&self, scope: ScopeId) -> usize {
        let mut depth = 0;
        let mut current = self.scope(scope).and_then(|s| s.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.scope(parent).and_then(|s| s.parent);
        }
        depth
    }
}
