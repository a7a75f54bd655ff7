//! Tokens produced by the scanner.

use jsa_ast::syntax_kind::SyntaxKind;
use jsa_ast::types::{TokenClass, TokenFlags};
use jsa_core::text::{Position, TextSpan};

/// A scanned token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: SyntaxKind,
    /// The raw source text of the token.
    pub text: String,
    /// The cooked value: unescaped contents for strings and template chunks,
    /// the name for identifiers and keywords, the raw text otherwise.
    pub value: String,
    pub span: TextSpan,
    /// 1-based line and column of the first character.
    pub position: Position,
    pub flags: TokenFlags,
}

impl Token {
    pub fn class(&self) -> Option<TokenClass> {
        self.kind.token_class()
    }

    pub fn line(&self) -> u32 {
        self.position.line
    }

    pub fn column(&self) -> u32 {
        self.position.column
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    /// Numeric value of a numeric literal token. Returns `None` for other
    /// kinds and for malformed literals.
    pub fn numeric_value(&self) -> Option<f64> {
        if self.kind != SyntaxKind::NumericLiteral {
            return None;
        }
        parse_numeric_literal(&self.text)
    }
}

/// Parse the text of a numeric literal (decimal, exponent or `0x` hex).
pub fn parse_numeric_literal(text: &str) -> Option<f64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    text.parse::<f64>().ok()
}
