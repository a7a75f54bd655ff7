//! jsa_semantic: Scope analysis and semantic checks.
//!
//! The analyzer walks the syntax tree, builds a tree of lexical scopes with
//! their symbols, resolves every identifier reference, and reports semantic
//! errors and warnings. The tree is not modified; resolution results live in
//! the returned [`SemanticModel`].

mod analyzer;
mod globals;
mod model;
mod scope;
mod symbol;

pub use analyzer::{Analyzer, SemanticOptions};
pub use globals::{is_builtin_global, BUILTIN_GLOBALS};
pub use model::SemanticModel;
pub use scope::{Scope, ScopeId, ScopeKind};
pub use symbol::{Symbol, SymbolFlags, SymbolId, SymbolKind};

use jsa_ast::node::Program;
use jsa_diagnostics::DiagnosticCollection;
use tracing::debug;

/// Output of the semantic stage.
#[derive(Debug, Clone)]
pub struct SemanticResult {
    pub model: SemanticModel,
    pub diagnostics: DiagnosticCollection,
}

impl SemanticResult {
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.warning_count()
    }
}

/// Analyze a parsed program.
pub fn analyze(program: &Program<'_>, options: &SemanticOptions) -> SemanticResult {
    let mut analyzer = Analyzer::new(options);
    analyzer.analyze_program(program);
    let diagnostics = analyzer.take_diagnostics();
    let model = analyzer.into_model();
    debug!(
        scopes = model.scopes().len(),
        symbols = model.symbols().len(),
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        "semantic analysis complete"
    );
    SemanticResult { model, diagnostics }
}
