//! The scanner.
//!
//! Converts source text into tokens, one `scan()` call per token, with one
//! or two characters of lookahead. Problems are recorded as lexical
//! diagnostics and surfaced as `InvalidToken`s; scanning always continues.

use crate::char_codes::*;
use crate::token::Token;
use jsa_ast::syntax_kind::SyntaxKind;
use jsa_ast::types::TokenFlags;
use jsa_core::text::{LineMap, TextSpan};
use jsa_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};

/// An open `${ ... }` substitution inside a template literal.
#[derive(Debug, Clone, Copy)]
struct TemplateFrame {
    /// Unmatched `{` seen inside the substitution so far.
    brace_depth: u32,
    /// Offset of the template's opening backtick.
    start: usize,
}

pub struct Scanner {
    /// The source text being scanned.
    text: Vec<char>,
    /// Current position in the text.
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    token: SyntaxKind,
    /// Cooked value of the current string, template or comment token.
    token_value: String,
    token_flags: TokenFlags,
    template_stack: Vec<TemplateFrame>,
    /// Emit comments as tokens instead of skipping them.
    preserve_comments: bool,
    line_map: LineMap,
    diagnostics: DiagnosticCollection,
}

impl Scanner {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            pos: 0,
            token_start: 0,
            token: SyntaxKind::InvalidToken,
            token_value: String::new(),
            token_flags: TokenFlags::NONE,
            template_stack: Vec::new(),
            preserve_comments: false,
            line_map: LineMap::new(text),
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Emit comments as `SingleLineComment`/`MultiLineComment` tokens.
    pub fn with_comments(mut self, preserve: bool) -> Self {
        self.preserve_comments = preserve;
        self
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Build a [`Token`] for the current token.
    pub fn token_info(&self) -> Token {
        let text = self.chars_to_string(self.token_start, self.pos);
        let value = match self.token {
            SyntaxKind::StringLiteral
            | SyntaxKind::NoSubstitutionTemplateLiteral
            | SyntaxKind::TemplateHead
            | SyntaxKind::TemplateMiddle
            | SyntaxKind::TemplateTail => self.token_value.clone(),
            _ => text.clone(),
        };
        Token {
            kind: self.token,
            text,
            value,
            span: TextSpan::from_bounds(self.token_start as u32, self.pos as u32),
            position: self.line_map.position_of(self.token_start as u32),
            flags: self.token_flags,
        }
    }

    /// Scan every token up to and including `EndOfFileToken`.
    pub fn scan_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let kind = self.scan();
            tokens.push(self.token_info());
            if kind == SyntaxKind::EndOfFileToken {
                break;
            }
        }
        tokens
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos).copied()
    }

    /// Look at the character at position pos + offset.
    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get(self.pos + offset).copied()
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn chars_to_string(&self, start: usize, end: usize) -> String {
        self.text[start..end].iter().collect()
    }

    /// Offset of the first line break at or after `from`, or the end of text.
    fn end_of_line(&self, from: usize) -> usize {
        self.text[from..]
            .iter()
            .position(|&ch| is_line_break(ch))
            .map_or(self.text.len(), |offset| from + offset)
    }

    fn error_at(&mut self, message: &DiagnosticMessage, args: &[&str], start: usize, length: usize) {
        let span = TextSpan::new(start as u32, length as u32);
        let position = self.line_map.position_of(start as u32);
        self.diagnostics.add(Diagnostic::new(message, args, span, position));
    }

    /// Skip whitespace and comments, recording preceding line breaks. When
    /// comments are preserved, stops at a comment and returns its kind.
    fn skip_trivia(&mut self) -> Option<SyntaxKind> {
        while let Some(ch) = self.current_char() {
            match ch {
                c if is_line_break(c) => {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.pos += 1;
                }
                c if is_white_space_single_line(c) => {
                    self.pos += 1;
                }
                '/' if self.char_at(1) == Some('/') => {
                    let start = self.pos;
                    self.pos = self.end_of_line(self.pos);
                    if self.preserve_comments {
                        self.token_start = start;
                        self.token_value = self.chars_to_string(start, self.pos);
                        return Some(SyntaxKind::SingleLineComment);
                    }
                }
                '/' if self.char_at(1) == Some('*') => {
                    let start = self.pos;
                    self.scan_multi_line_comment();
                    if self.preserve_comments {
                        self.token_start = start;
                        self.token_value = self.chars_to_string(start, self.pos);
                        return Some(SyntaxKind::MultiLineComment);
                    }
                }
                _ => return None,
            }
        }
        None
    }

    fn scan_multi_line_comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        while !self.is_eof() {
            let ch = self.text[self.pos];
            if ch == '*' && self.char_at(1) == Some('/') {
                self.pos += 2;
                return;
            }
            if is_line_break(ch) {
                self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
            }
            self.pos += 1;
        }
        self.error_at(&messages::ASTERISK_SLASH_EXPECTED, &[], start, 2);
    }

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;
        self.token_value.clear();

        if let Some(comment) = self.skip_trivia() {
            self.token = comment;
            return self.token;
        }
        self.token_start = self.pos;

        let Some(ch) = self.current_char() else {
            if let Some(frame) = self.template_stack.first().copied() {
                self.error_at(&messages::UNTERMINATED_TEMPLATE_LITERAL, &[], frame.start, 1);
                self.template_stack.clear();
            }
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        };

        self.token = match ch {
            '(' => { self.pos += 1; SyntaxKind::OpenParenToken }
            ')' => { self.pos += 1; SyntaxKind::CloseParenToken }
            '{' => self.scan_open_brace(),
            '}' => self.scan_close_brace(),
            '[' => { self.pos += 1; SyntaxKind::OpenBracketToken }
            ']' => { self.pos += 1; SyntaxKind::CloseBracketToken }
            ';' => { self.pos += 1; SyntaxKind::SemicolonToken }
            ',' => { self.pos += 1; SyntaxKind::CommaToken }
            ':' => { self.pos += 1; SyntaxKind::ColonToken }
            '~' => { self.pos += 1; SyntaxKind::TildeToken }

            '.' => self.scan_dot(),
            '?' => self.scan_question(),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '=' => self.scan_equals(),
            '!' => self.scan_exclamation(),
            '+' => self.scan_plus(),
            '-' => self.scan_minus(),
            '*' => self.scan_asterisk(),
            '/' => self.scan_slash(),
            '%' => self.scan_percent(),
            '&' => self.scan_ampersand(),
            '|' => self.scan_bar(),
            '^' => self.scan_caret(),

            '\'' | '"' => self.scan_string_literal(ch),
            '`' => self.scan_template_literal(),

            c if is_digit(c) => self.scan_number(),
            c if is_identifier_start(c) => self.scan_identifier(),

            _ => {
                self.pos += 1;
                let text = ch.to_string();
                self.error_at(&messages::INVALID_CHARACTER_0, &[&text], self.token_start, 1);
                SyntaxKind::InvalidToken
            }
        };

        self.token
    }

    // ========================================================================
    // Token-specific scanning methods
    // ========================================================================

    fn scan_open_brace(&mut self) -> SyntaxKind {
        if let Some(frame) = self.template_stack.last_mut() {
            frame.brace_depth += 1;
        }
        self.pos += 1;
        SyntaxKind::OpenBraceToken
    }

    fn scan_close_brace(&mut self) -> SyntaxKind {
        if let Some(frame) = self.template_stack.last_mut() {
            if frame.brace_depth == 0 {
                return self.scan_template_continuation();
            }
            frame.brace_depth -= 1;
        }
        self.pos += 1;
        SyntaxKind::CloseBraceToken
    }

    fn scan_dot(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('.') && self.char_at(2) == Some('.') {
            self.pos += 3;
            SyntaxKind::DotDotDotToken
        } else if self.char_at(1).map_or(false, is_digit) {
            self.scan_number()
        } else {
            self.pos += 1;
            SyntaxKind::DotToken
        }
    }

    fn scan_question(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('?') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::QuestionQuestionEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::QuestionQuestionToken
            }
        } else if self.char_at(1) == Some('.') && !self.char_at(2).map_or(false, is_digit) {
            self.pos += 2;
            SyntaxKind::QuestionDotToken
        } else {
            self.pos += 1;
            SyntaxKind::QuestionToken
        }
    }

    fn scan_less_than(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2)) {
            (Some('<'), Some('=')) => { self.pos += 3; SyntaxKind::LessThanLessThanEqualsToken }
            (Some('<'), _) => { self.pos += 2; SyntaxKind::LessThanLessThanToken }
            (Some('='), _) => { self.pos += 2; SyntaxKind::LessThanEqualsToken }
            _ => { self.pos += 1; SyntaxKind::LessThanToken }
        }
    }

    fn scan_greater_than(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2), self.char_at(3)) {
            (Some('>'), Some('>'), Some('=')) => {
                self.pos += 4;
                SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken
            }
            (Some('>'), Some('>'), _) => { self.pos += 3; SyntaxKind::GreaterThanGreaterThanGreaterThanToken }
            (Some('>'), Some('='), _) => { self.pos += 3; SyntaxKind::GreaterThanGreaterThanEqualsToken }
            (Some('>'), _, _) => { self.pos += 2; SyntaxKind::GreaterThanGreaterThanToken }
            (Some('='), _, _) => { self.pos += 2; SyntaxKind::GreaterThanEqualsToken }
            _ => { self.pos += 1; SyntaxKind::GreaterThanToken }
        }
    }

    fn scan_equals(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::EqualsEqualsEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::EqualsEqualsToken
            }
        } else if self.char_at(1) == Some('>') {
            self.pos += 2;
            SyntaxKind::EqualsGreaterThanToken
        } else {
            self.pos += 1;
            SyntaxKind::EqualsToken
        }
    }

    fn scan_exclamation(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::ExclamationEqualsEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::ExclamationEqualsToken
            }
        } else {
            self.pos += 1;
            SyntaxKind::ExclamationToken
        }
    }

    fn scan_plus(&mut self) -> SyntaxKind {
        match self.char_at(1) {
            Some('+') => { self.pos += 2; SyntaxKind::PlusPlusToken }
            Some('=') => { self.pos += 2; SyntaxKind::PlusEqualsToken }
            _ => { self.pos += 1; SyntaxKind::PlusToken }
        }
    }

    fn scan_minus(&mut self) -> SyntaxKind {
        match self.char_at(1) {
            Some('-') => { self.pos += 2; SyntaxKind::MinusMinusToken }
            Some('=') => { self.pos += 2; SyntaxKind::MinusEqualsToken }
            _ => { self.pos += 1; SyntaxKind::MinusToken }
        }
    }

    fn scan_asterisk(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2)) {
            (Some('*'), Some('=')) => { self.pos += 3; SyntaxKind::AsteriskAsteriskEqualsToken }
            (Some('*'), _) => { self.pos += 2; SyntaxKind::AsteriskAsteriskToken }
            (Some('='), _) => { self.pos += 2; SyntaxKind::AsteriskEqualsToken }
            _ => { self.pos += 1; SyntaxKind::AsteriskToken }
        }
    }

    fn scan_slash(&mut self) -> SyntaxKind {
        // Comments were consumed by skip_trivia.
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            SyntaxKind::SlashEqualsToken
        } else {
            self.pos += 1;
            SyntaxKind::SlashToken
        }
    }

    fn scan_percent(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            SyntaxKind::PercentEqualsToken
        } else {
            self.pos += 1;
            SyntaxKind::PercentToken
        }
    }

    fn scan_ampersand(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2)) {
            (Some('&'), Some('=')) => { self.pos += 3; SyntaxKind::AmpersandAmpersandEqualsToken }
            (Some('&'), _) => { self.pos += 2; SyntaxKind::AmpersandAmpersandToken }
            (Some('='), _) => { self.pos += 2; SyntaxKind::AmpersandEqualsToken }
            _ => { self.pos += 1; SyntaxKind::AmpersandToken }
        }
    }

    fn scan_bar(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2)) {
            (Some('|'), Some('=')) => { self.pos += 3; SyntaxKind::BarBarEqualsToken }
            (Some('|'), _) => { self.pos += 2; SyntaxKind::BarBarToken }
            (Some('='), _) => { self.pos += 2; SyntaxKind::BarEqualsToken }
            _ => { self.pos += 1; SyntaxKind::BarToken }
        }
    }

    fn scan_caret(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            SyntaxKind::CaretEqualsToken
        } else {
            self.pos += 1;
            SyntaxKind::CaretToken
        }
    }

    // ========================================================================
    // Strings and templates
    // ========================================================================

    fn scan_string_literal(&mut self, quote: char) -> SyntaxKind {
        self.pos += 1; // opening quote
        let mut result = String::new();
        loop {
            match self.current_char() {
                None => return self.unterminated_literal(&messages::UNTERMINATED_STRING_LITERAL),
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    break;
                }
                Some('\\') => self.scan_escape_sequence(&mut result),
                Some(ch) if is_line_break(ch) => {
                    return self.unterminated_literal(&messages::UNTERMINATED_STRING_LITERAL)
                }
                Some(ch) => {
                    result.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.token_value = result;
        SyntaxKind::StringLiteral
    }

    fn scan_template_literal(&mut self) -> SyntaxKind {
        self.pos += 1; // backtick
        match self.scan_template_chars() {
            Some(true) => SyntaxKind::NoSubstitutionTemplateLiteral,
            Some(false) => {
                self.template_stack.push(TemplateFrame {
                    brace_depth: 0,
                    start: self.token_start,
                });
                SyntaxKind::TemplateHead
            }
            None => self.unterminated_literal(&messages::UNTERMINATED_TEMPLATE_LITERAL),
        }
    }

    /// Scan a template middle or tail, starting at the `}` that closes a
    /// substitution.
    fn scan_template_continuation(&mut self) -> SyntaxKind {
        self.pos += 1; // `}`
        match self.scan_template_chars() {
            Some(true) => {
                self.template_stack.pop();
                SyntaxKind::TemplateTail
            }
            Some(false) => SyntaxKind::TemplateMiddle,
            None => {
                let start = self.template_stack.pop().map_or(self.token_start, |f| f.start);
                self.recover_to_end_of_line();
                self.error_at(&messages::UNTERMINATED_TEMPLATE_LITERAL, &[], start, 1);
                SyntaxKind::InvalidToken
            }
        }
    }

    /// Scan template characters into `token_value`. Returns `Some(true)` at a
    /// closing backtick, `Some(false)` at `${`, `None` at end of input.
    fn scan_template_chars(&mut self) -> Option<bool> {
        let mut result = String::new();
        let end = loop {
            match self.current_char() {
                None => break None,
                Some('`') => {
                    self.pos += 1;
                    break Some(true);
                }
                Some('$') if self.char_at(1) == Some('{') => {
                    self.pos += 2;
                    break Some(false);
                }
                Some('\\') => self.scan_escape_sequence(&mut result),
                Some('\r') => {
                    // Template chunks normalize CRLF to LF.
                    result.push('\n');
                    self.pos += 1;
                    if self.current_char() == Some('\n') {
                        self.pos += 1;
                    }
                }
                Some(ch) => {
                    result.push(ch);
                    self.pos += 1;
                }
            }
        };
        self.token_value = result;
        end
    }

    /// Report an unterminated literal and turn the rest of its first line into
    /// an invalid token; scanning resumes on the next line.
    fn unterminated_literal(&mut self, message: &DiagnosticMessage) -> SyntaxKind {
        self.recover_to_end_of_line();
        self.error_at(message, &[], self.token_start, 1);
        SyntaxKind::InvalidToken
    }

    fn recover_to_end_of_line(&mut self) {
        self.pos = self.end_of_line(self.token_start);
        self.token_flags |= TokenFlags::UNTERMINATED;
        self.token_value = self.chars_to_string(self.token_start, self.pos);
    }

    /// Decode the escape sequence at `pos` (a backslash) into `out`.
    fn scan_escape_sequence(&mut self, out: &mut String) {
        let start = self.pos;
        self.pos += 1;
        let Some(ch) = self.current_char() else {
            return;
        };
        self.pos += 1;
        match ch {
            '0' if !self.current_char().map_or(false, is_digit) => out.push('\0'),
            'b' => out.push('\u{0008}'),
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'v' => out.push('\u{000B}'),
            'f' => out.push('\u{000C}'),
            'r' => out.push('\r'),
            // Line continuation
            '\r' => {
                if self.current_char() == Some('\n') {
                    self.pos += 1;
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            'x' => match self.scan_hex_value(2, 2) {
                Some(c) => out.push(c),
                None => self.invalid_escape(start),
            },
            'u' => {
                self.token_flags |= TokenFlags::UNICODE_ESCAPE;
                let decoded = if self.current_char() == Some('{') {
                    self.pos += 1;
                    let value = self.scan_hex_value(1, 6);
                    if value.is_some() && self.current_char() == Some('}') {
                        self.pos += 1;
                        value
                    } else {
                        None
                    }
                } else {
                    self.scan_hex_value(4, 4)
                };
                match decoded {
                    Some(c) => out.push(c),
                    None => self.invalid_escape(start),
                }
            }
            other => out.push(other),
        }
    }

    fn scan_hex_value(&mut self, min_digits: usize, max_digits: usize) -> Option<char> {
        let mut value: u32 = 0;
        let mut digits = 0;
        while digits < max_digits {
            match self.current_char().and_then(|c| c.to_digit(16)) {
                Some(d) => {
                    value = value * 16 + d;
                    digits += 1;
                    self.pos += 1;
                }
                None => break,
            }
        }
        if digits < min_digits {
            return None;
        }
        char::from_u32(value)
    }

    fn invalid_escape(&mut self, start: usize) {
        self.token_flags |= TokenFlags::CONTAINS_INVALID_ESCAPE;
        self.error_at(&messages::HEXADECIMAL_DIGIT_EXPECTED, &[], start, self.pos - start);
    }

    // ========================================================================
    // Numbers and identifiers
    // ========================================================================

    fn scan_number(&mut self) -> SyntaxKind {
        if self.current_char() == Some('0') && matches!(self.char_at(1), Some('x') | Some('X')) {
            return self.scan_hex_number();
        }

        self.scan_digits();
        if self.current_char() == Some('.') {
            self.pos += 1;
            self.scan_digits();
        }

        // Exponent
        if let Some('e') | Some('E') = self.current_char() {
            self.pos += 1;
            self.token_flags |= TokenFlags::SCIENTIFIC;
            if let Some('+') | Some('-') = self.current_char() {
                self.pos += 1;
            }
            if self.current_char().map_or(false, is_digit) {
                self.scan_digits();
            } else {
                self.error_at(&messages::DIGIT_EXPECTED, &[], self.pos, 0);
            }
        }

        SyntaxKind::NumericLiteral
    }

    fn scan_hex_number(&mut self) -> SyntaxKind {
        self.pos += 2; // skip 0x
        self.token_flags |= TokenFlags::HEX_SPECIFIER;
        let digits_start = self.pos;
        while self.current_char().map_or(false, is_hex_digit) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            self.error_at(&messages::HEXADECIMAL_DIGIT_EXPECTED, &[], self.pos, 0);
        }
        SyntaxKind::NumericLiteral
    }

    fn scan_digits(&mut self) {
        while self.current_char().map_or(false, is_digit) {
            self.pos += 1;
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        while self.current_char().map_or(false, is_identifier_part) {
            self.pos += 1;
        }
        let text = self.chars_to_string(start, self.pos);
        SyntaxKind::from_keyword(&text).unwrap_or(SyntaxKind::Identifier)
    }
}
