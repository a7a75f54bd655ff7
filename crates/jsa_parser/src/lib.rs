//! jsa_parser: Recursive descent parser for the analyzed JavaScript subset.
//!
//! Parses the scanner's token list into an arena-allocated AST. Constructs
//! outside the supported subset are reported as unsupported syntax and
//! replaced by error nodes, so the tree keeps its shape.

mod parser;
mod precedence;

pub use parser::Parser;
pub use precedence::{get_binary_operator_precedence, OperatorPrecedence};

use bumpalo::Bump;
use jsa_ast::node::Program;
use jsa_diagnostics::DiagnosticCollection;
use jsa_scanner::Token;
use tracing::debug;

/// Output of the syntactic stage.
#[derive(Debug)]
pub struct ParseResult<'a> {
    pub program: Program<'a>,
    pub diagnostics: DiagnosticCollection,
}

impl ParseResult<'_> {
    pub fn error_count(&self) -> usize {
        self.diagnostics.error_count()
    }
}

/// Parse a token list (as produced by `jsa_scanner::tokenize`) into a
/// program allocated in `arena`.
pub fn parse<'a>(arena: &'a Bump, tokens: &[Token]) -> ParseResult<'a> {
    let mut parser = Parser::new(arena, tokens);
    let program = parser.parse_program();
    let diagnostics = parser.into_diagnostics();
    debug!(
        statements = program.statements.len(),
        errors = diagnostics.error_count(),
        "parse complete"
    );
    ParseResult {
        program,
        diagnostics,
    }
}
