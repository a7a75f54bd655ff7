//! jsa_diagnostics: Diagnostic messages and error reporting infrastructure.
//!
//! Every stage of the pipeline reports problems in the analyzed source as
//! [`Diagnostic`] values collected into a [`DiagnosticCollection`] that the
//! stage returns to its caller. Messages come from the static catalog in
//! [`messages`].

use jsa_core::text::{Position, TextSpan};
use serde::Serialize;
use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::Warning => write!(f, "warning"),
            DiagnosticCategory::Error => write!(f, "error"),
        }
    }
}

/// The pipeline phase that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticPhase {
    Lexical,
    Syntactic,
    Semantic,
}

impl fmt::Display for DiagnosticPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticPhase::Lexical => write!(f, "lexical"),
            DiagnosticPhase::Syntactic => write!(f, "syntactic"),
            DiagnosticPhase::Semantic => write!(f, "semantic"),
        }
    }
}

/// A diagnostic message template with a code, phase and category.
#[derive(Debug, Clone)]
pub struct DiagnosticMessage {
    /// The diagnostic code (e.g., 1002, 2001).
    pub code: u32,
    pub phase: DiagnosticPhase,
    pub category: DiagnosticCategory,
    /// The message template string. May contain `{0}`, `{1}`, etc. placeholders.
    pub message: &'static str,
}

/// A realized diagnostic with location information and resolved message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub phase: DiagnosticPhase,
    #[serde(rename = "severity")]
    pub category: DiagnosticCategory,
    pub code: u32,
    #[serde(rename = "message")]
    pub message_text: String,
    /// 1-based line and column of the start of `span`.
    #[serde(flatten)]
    pub position: Position,
    pub span: TextSpan,
}

impl Diagnostic {
    pub fn new(
        message: &DiagnosticMessage,
        args: &[&str],
        span: TextSpan,
        position: Position,
    ) -> Self {
        Self {
            phase: message.phase,
            category: message.category,
            code: message.code,
            message_text: format_message(message.message, args),
            position,
            span,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    pub fn is_warning(&self) -> bool {
        self.category == DiagnosticCategory::Warning
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} JS{}: {}",
            self.position, self.category, self.code, self.message_text
        )
    }
}

/// Format a diagnostic message template by replacing `{0}`, `{1}`, etc. with arguments.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{}}}", i), arg);
    }
    result
}

/// An ordered collection of diagnostics accumulated by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticCollection {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollection {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    /// Count diagnostics of one phase and category.
    pub fn count(&self, phase: DiagnosticPhase, category: DiagnosticCategory) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.phase == phase && d.category == category)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Append another collection, keeping both orders.
    pub fn extend(&mut self, other: DiagnosticCollection) {
        self.diagnostics.extend(other.diagnostics);
    }

    /// Stable sort by source position; diagnostics at the same offset keep
    /// their reporting order.
    pub fn sort_by_position(&mut self) {
        self.diagnostics.sort_by_key(|d| d.span.start);
    }
}

impl<'a> IntoIterator for &'a DiagnosticCollection {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

// ============================================================================
// Diagnostic Messages
// ============================================================================

pub mod messages {
    use super::*;

    macro_rules! diag {
        ($code:expr, $phase:ident, Error, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                phase: DiagnosticPhase::$phase,
                category: DiagnosticCategory::Error,
                message: $msg,
            }
        };
        ($code:expr, $phase:ident, Warning, $msg:expr) => {
            DiagnosticMessage {
                code: $code,
                phase: DiagnosticPhase::$phase,
                category: DiagnosticCategory::Warning,
                message: $msg,
            }
        };
    }

    // ========================================================================
    // Lexical errors (1000-1099)
    // ========================================================================
    pub const INVALID_CHARACTER_0: DiagnosticMessage = diag!(1001, Lexical, Error, "Invalid character '{0}'.");
    pub const UNTERMINATED_STRING_LITERAL: DiagnosticMessage = diag!(1002, Lexical, Error, "Unterminated string literal.");
    pub const UNTERMINATED_TEMPLATE_LITERAL: DiagnosticMessage = diag!(1003, Lexical, Error, "Unterminated template literal.");
    pub const ASTERISK_SLASH_EXPECTED: DiagnosticMessage = diag!(1004, Lexical, Error, "'*/' expected.");
    pub const HEXADECIMAL_DIGIT_EXPECTED: DiagnosticMessage = diag!(1005, Lexical, Error, "Hexadecimal digit expected.");
    pub const DIGIT_EXPECTED: DiagnosticMessage = diag!(1006, Lexical, Error, "Digit expected.");

    // ========================================================================
    // Syntax errors (1100-1199)
    // ========================================================================
    pub const _0_EXPECTED: DiagnosticMessage = diag!(1101, Syntactic, Error, "'{0}' expected.");
    pub const EXPRESSION_EXPECTED: DiagnosticMessage = diag!(1102, Syntactic, Error, "Expression expected.");
    pub const IDENTIFIER_EXPECTED: DiagnosticMessage = diag!(1103, Syntactic, Error, "Identifier expected.");
    pub const DECLARATION_OR_STATEMENT_EXPECTED: DiagnosticMessage = diag!(1104, Syntactic, Error, "Declaration or statement expected.");
    pub const UNEXPECTED_TOKEN_0: DiagnosticMessage = diag!(1105, Syntactic, Error, "Unexpected token '{0}'.");
    pub const UNSUPPORTED_SYNTAX_0: DiagnosticMessage = diag!(1106, Syntactic, Error, "Unsupported syntax: {0}.");
    pub const METHOD_OR_CONSTRUCTOR_EXPECTED: DiagnosticMessage = diag!(1107, Syntactic, Error, "Method or constructor declaration expected.");
    pub const INVALID_ASSIGNMENT_TARGET: DiagnosticMessage = diag!(1108, Syntactic, Error, "Invalid left-hand side in assignment.");
    pub const CONST_DECLARATIONS_MUST_BE_INITIALIZED: DiagnosticMessage = diag!(1109, Syntactic, Error, "'const' declarations must be initialized.");
    pub const EXPRESSION_NESTED_TOO_DEEPLY: DiagnosticMessage = diag!(1110, Syntactic, Error, "Expression is nested too deeply.");
    pub const PROPERTY_ASSIGNMENT_EXPECTED: DiagnosticMessage = diag!(1111, Syntactic, Error, "Property assignment expected.");
    pub const INVALID_UPDATE_TARGET: DiagnosticMessage = diag!(1112, Syntactic, Error, "Invalid operand for '{0}'; expected a variable or property access.");

    // ========================================================================
    // Semantic diagnostics (2000-2999)
    // ========================================================================
    pub const UNDECLARED_IDENTIFIER_0: DiagnosticMessage = diag!(2001, Semantic, Error, "Undeclared identifier '{0}'.");
    pub const DUPLICATE_DECLARATION_0: DiagnosticMessage = diag!(2002, Semantic, Warning, "'{0}' is already declared in this scope.");
    pub const UNREACHABLE_CODE_DETECTED: DiagnosticMessage = diag!(2003, Semantic, Warning, "Unreachable code detected.");
    pub const DIVISION_BY_ZERO: DiagnosticMessage = diag!(2004, Semantic, Warning, "Division by zero produces Infinity or NaN.");
    pub const REMAINDER_BY_ZERO: DiagnosticMessage = diag!(2005, Semantic, Warning, "Remainder by zero produces NaN.");
    pub const ZERO_PASSED_AS_DIVISOR_0_1: DiagnosticMessage = diag!(2006, Semantic, Warning, "Argument {0} of '{1}' is used as a divisor; passing 0 divides by zero.");
    pub const CANNOT_ASSIGN_TO_CONSTANT_0: DiagnosticMessage = diag!(2007, Semantic, Error, "Cannot assign to '{0}' because it is a constant.");
    pub const RETURN_OUTSIDE_FUNCTION: DiagnosticMessage = diag!(2008, Semantic, Error, "A 'return' statement can only be used within a function body.");
    pub const UNUSED_VARIABLE_0: DiagnosticMessage = diag!(2009, Semantic, Warning, "'{0}' is declared but its value is never read.");
}
