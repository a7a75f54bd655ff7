//! jsa_scanner: Lexer for the analyzed JavaScript subset.
//!
//! Produces a flat token list (terminated by `EndOfFileToken`) with 1-based
//! positions, plus lexical diagnostics. Malformed input never aborts the
//! scan: it becomes an `InvalidToken` and a diagnostic.

mod char_codes;
mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{parse_numeric_literal, Token};

use jsa_diagnostics::DiagnosticCollection;
use tracing::debug;

/// Output of the lexical stage.
#[derive(Debug, Clone)]
pub struct LexResult {
    /// All tokens, always ending with exactly one `EndOfFileToken`.
    pub tokens: Vec<Token>,
    pub diagnostics: DiagnosticCollection,
}

impl LexResult {
    /// Number of tokens, excluding comments and the end-of-file marker.
    pub fn token_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| !t.is_comment() && t.kind != jsa_ast::SyntaxKind::EndOfFileToken)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

/// Tokenize `source`, skipping comments.
pub fn tokenize(source: &str) -> LexResult {
    scan_source(Scanner::new(source))
}

/// Tokenize `source`, keeping comments as tokens.
pub fn tokenize_with_comments(source: &str) -> LexResult {
    scan_source(Scanner::new(source).with_comments(true))
}

fn scan_source(mut scanner: Scanner) -> LexResult {
    let tokens = scanner.scan_all();
    let diagnostics = scanner.take_diagnostics();
    debug!(
        tokens = tokens.len(),
        errors = diagnostics.error_count(),
        "scan complete"
    );
    LexResult { tokens, diagnostics }
}
