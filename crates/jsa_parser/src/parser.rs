//! The parser implementation.
//!
//! Recursive descent over the scanner's token list with precedence climbing
//! for binary operators. Errors use panic-mode recovery: the first error
//! enters panic mode, further diagnostics are suppressed until the parser
//! resynchronizes at a statement (or class member) boundary, and the tokens
//! skipped on the way become an `ErrorNode` in the tree.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;
use jsa_ast::node::*;
use jsa_ast::syntax_kind::SyntaxKind;
use jsa_ast::types::*;
use jsa_core::text::{Position, TextRange, TextSpan};
use jsa_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use jsa_scanner::{parse_numeric_literal, Token};

use crate::precedence::{get_binary_operator_precedence, OperatorPrecedence};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 200;

/// Start location of a node being parsed.
#[derive(Debug, Clone, Copy)]
struct Marker {
    pos: u32,
    position: Position,
}

/// Builds a [`Program`] from a token list.
pub struct Parser<'a, 't> {
    arena: &'a Bump,
    /// Tokens with comments and the end-of-file marker removed.
    tokens: Vec<&'t Token>,
    eof: Token,
    /// Index of the current token.
    pos: usize,
    /// End offset and kind of the last consumed token.
    prev_end: u32,
    prev_kind: SyntaxKind,
    diagnostics: DiagnosticCollection,
    panic_mode: bool,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    depth_exceeded: bool,
    next_node_id: u32,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(arena: &'a Bump, tokens: &'t [Token]) -> Self {
        let eof = tokens
            .iter()
            .find(|t| t.kind == SyntaxKind::EndOfFileToken)
            .cloned()
            .unwrap_or_else(|| synthesized_eof(tokens.last()));
        Self {
            arena,
            tokens: tokens
                .iter()
                .filter(|t| !t.is_comment() && t.kind != SyntaxKind::EndOfFileToken)
                .collect(),
            eof,
            pos: 0,
            prev_end: 0,
            prev_kind: SyntaxKind::EndOfFileToken,
            diagnostics: DiagnosticCollection::new(),
            panic_mode: false,
            recursion_depth: 0,
            depth_exceeded: false,
            next_node_id: 0,
        }
    }

    pub fn parse_program(&mut self) -> Program<'a> {
        let statements = self.parse_statement_list(false);
        let end = self.eof.span.start;
        Program {
            data: NodeData::new(
                SyntaxKind::Program,
                self.next_id(),
                TextRange::new(0, end),
                Position::new(1, 1),
            ),
            statements,
        }
    }

    pub fn into_diagnostics(self) -> DiagnosticCollection {
        self.diagnostics
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current(&self) -> &Token {
        self.tokens.get(self.pos).copied().unwrap_or(&self.eof)
    }

    #[inline]
    fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    fn peek(&self, n: usize) -> SyntaxKind {
        self.tokens
            .get(self.pos + n)
            .map_or(SyntaxKind::EndOfFileToken, |t| t.kind)
    }

    /// Kind of the token `n` ahead, if it is on the same line as the one before it.
    fn peek_on_same_line(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens
            .get(self.pos + n)
            .filter(|t| !t.has_preceding_line_break())
            .map(|t| t.kind)
    }

    fn next_token(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.prev_end = token.span.end();
            self.prev_kind = token.kind;
            self.pos += 1;
        }
    }

    #[inline]
    fn has_preceding_line_break(&self) -> bool {
        self.current().has_preceding_line_break()
    }

    /// Whether the current token is the identifier `text` (`async`, `get`, ...).
    fn is_contextual(&self, text: &str) -> bool {
        self.token() == SyntaxKind::Identifier && self.current().value == text
    }

    fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.token() == kind {
            self.next_token();
            return true;
        }
        let text = kind.text().unwrap_or("token");
        self.error(&messages::_0_EXPECTED, &[text]);
        false
    }

    fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.token() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn parse_expected_semicolon(&mut self) {
        match self.token() {
            SyntaxKind::SemicolonToken => self.next_token(),
            // Automatic insertion before `}`, at end of input, or at a line break.
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken => {}
            _ if self.has_preceding_line_break() => {}
            _ => {
                self.error(&messages::_0_EXPECTED, &[";"]);
            }
        }
    }

    // ========================================================================
    // Node construction
    // ========================================================================

    fn mark(&self) -> Marker {
        let token = self.current();
        Marker {
            pos: token.span.start,
            position: token.position,
        }
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Node data spanning from `start` to the end of the last consumed token.
    fn finish(&mut self, kind: SyntaxKind, start: Marker) -> NodeData {
        let end = self.prev_end.max(start.pos);
        NodeData::new(kind, self.next_id(), TextRange::new(start.pos, end), start.position)
    }

    fn alloc<T>(&self, value: T) -> &'a T {
        self.arena.alloc(value)
    }

    /// Cooked value of the current token, copied into the arena.
    fn token_value(&self) -> &'a str {
        self.arena.alloc_str(&self.current().value)
    }

    fn error_node(&mut self, start: Marker) -> ErrorNode {
        ErrorNode {
            data: self.finish(SyntaxKind::ErrorNode, start),
        }
    }

    fn error_expression(&mut self, start: Marker) -> Expression<'a> {
        Expression::Error(self.error_node(start))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Report at the current token and enter panic mode. Nothing is reported
    /// while already panicking.
    fn error(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        let token = self.current();
        let diagnostic = Diagnostic::new(message, args, token.span, token.position);
        self.diagnostics.add(diagnostic);
    }

    /// Report a problem with a construct the parser has already consumed in
    /// full; parsing stays in sync, so panic mode is not entered.
    fn report(&mut self, start: Marker, message: &DiagnosticMessage, args: &[&str]) {
        let span = TextSpan::from_bounds(start.pos, self.prev_end.max(start.pos));
        self.report_span(span, start.position, message, args);
    }

    fn report_span(
        &mut self,
        span: TextSpan,
        position: Position,
        message: &DiagnosticMessage,
        args: &[&str],
    ) {
        if self.panic_mode {
            return;
        }
        self.diagnostics.add(Diagnostic::new(message, args, span, position));
    }

    fn unsupported(&mut self, start: Marker, what: &str) {
        self.report(start, &messages::UNSUPPORTED_SYNTAX_0, &[what]);
    }

    fn enter_recursion(&mut self) -> bool {
        if self.recursion_depth >= MAX_RECURSION_DEPTH {
            if !self.depth_exceeded {
                self.depth_exceeded = true;
                self.error(&messages::EXPRESSION_NESTED_TOO_DEEPLY, &[]);
            }
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    fn leave_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Skip tokens until a statement boundary: just past a `;`, or before a
    /// `}` or a token that starts a statement. Braced groups are skipped
    /// whole. Returns a placeholder covering the skipped tokens, if any.
    fn synchronize(&mut self) -> Option<ErrorNode> {
        self.panic_mode = false;
        if self.prev_kind == SyntaxKind::SemicolonToken {
            return None;
        }
        let start = self.mark();
        let first = self.pos;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken | SyntaxKind::CloseBraceToken => break,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    break;
                }
                SyntaxKind::OpenBraceToken => self.skip_balanced(),
                kind if is_statement_start(kind) => break,
                _ => self.next_token(),
            }
        }
        if self.pos == first {
            return None;
        }
        Some(self.error_node(start))
    }

    /// Skip to the start of the next class member: past a `;`, before the
    /// class's closing `}`, or at a name that begins a new line.
    fn synchronize_class_member(&mut self) {
        self.panic_mode = false;
        let first = self.pos;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken | SyntaxKind::CloseBraceToken => return,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                kind if self.pos > first
                    && self.has_preceding_line_break()
                    && (kind == SyntaxKind::Identifier || kind.is_keyword()) =>
                {
                    return
                }
                _ => self.next_token(),
            }
        }
    }

    /// Skip one bracketed group (the current token opens it), or a single
    /// token when the current token is not an opening bracket.
    fn skip_balanced(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => return,
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => depth += 1,
                SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.next_token();
                        return;
                    }
                }
                _ if depth == 0 => {
                    self.next_token();
                    return;
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// Skip a whole statement the analyzer does not support: up to a `;` or
    /// the closing `}` of its body, following `else`, `catch`, `finally` and
    /// the `while` of a `do` loop.
    fn skip_balanced_construct(&mut self) {
        let is_do = self.token() == SyntaxKind::DoKeyword;
        let first = self.pos;
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => return,
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => depth += 1,
                SyntaxKind::CloseBraceToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    if depth == 0 && self.token() == SyntaxKind::CloseBraceToken {
                        self.next_token();
                        match self.token() {
                            SyntaxKind::ElseKeyword
                            | SyntaxKind::CatchKeyword
                            | SyntaxKind::FinallyKeyword => {}
                            SyntaxKind::WhileKeyword if is_do => {}
                            _ => return,
                        }
                    }
                }
                SyntaxKind::SemicolonToken if depth == 0 => {
                    self.next_token();
                    return;
                }
                kind if depth == 0
                    && self.pos > first
                    && self.has_preceding_line_break()
                    && is_statement_start(kind) =>
                {
                    return
                }
                _ => {}
            }
            self.next_token();
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_statement_list(&mut self, in_block: bool) -> NodeList<'a, Statement<'a>> {
        let mut statements = BumpVec::new_in(self.arena);
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken => break,
                SyntaxKind::CloseBraceToken if in_block => break,
                _ => {}
            }
            let before = self.pos;
            statements.push(self.parse_statement());
            if self.panic_mode {
                if let Some(skipped) = self.synchronize() {
                    statements.push(Statement::Error(skipped));
                }
            }
            if self.pos == before {
                self.next_token();
            }
        }
        statements.into_bump_slice()
    }

    fn parse_statement(&mut self) -> Statement<'a> {
        let start = self.mark();
        if !self.enter_recursion() {
            self.skip_balanced_construct();
            self.panic_mode = false;
            return Statement::Error(self.error_node(start));
        }
        let statement = match self.token() {
            SyntaxKind::SemicolonToken => {
                self.next_token();
                Statement::EmptyStatement(self.finish(SyntaxKind::EmptyStatement, start))
            }
            SyntaxKind::OpenBraceToken => Statement::Block(self.parse_block()),
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_statement()
            }
            SyntaxKind::FunctionKeyword => self.parse_function_declaration(),
            SyntaxKind::ClassKeyword => self.parse_class_declaration(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::WhileKeyword
            | SyntaxKind::ForKeyword
            | SyntaxKind::DoKeyword
            | SyntaxKind::SwitchKeyword
            | SyntaxKind::TryKeyword
            | SyntaxKind::ThrowKeyword
            | SyntaxKind::BreakKeyword
            | SyntaxKind::ContinueKeyword
            | SyntaxKind::WithKeyword
            | SyntaxKind::DebuggerKeyword => {
                let what = format!("'{}' statements", self.current().text);
                self.parse_unsupported_statement(&what)
            }
            SyntaxKind::ImportKeyword | SyntaxKind::ExportKeyword => {
                let what = format!("'{}' declarations", self.current().text);
                self.parse_unsupported_statement(&what)
            }
            SyntaxKind::Identifier
                if self.is_contextual("async")
                    && self.peek_on_same_line(1) == Some(SyntaxKind::FunctionKeyword) =>
            {
                self.parse_unsupported_statement("async functions")
            }
            SyntaxKind::ElseKeyword | SyntaxKind::CloseBraceToken => {
                let text = self.current().text.clone();
                self.error(&messages::UNEXPECTED_TOKEN_0, &[&text]);
                self.next_token();
                Statement::Error(self.error_node(start))
            }
            _ => self.parse_expression_statement(),
        };
        self.leave_recursion();
        statement
    }

    fn parse_unsupported_statement(&mut self, what: &str) -> Statement<'a> {
        let start = self.mark();
        self.skip_balanced_construct();
        self.unsupported(start, what);
        Statement::Error(self.error_node(start))
    }

    fn parse_block(&mut self) -> Block<'a> {
        let start = self.mark();
        if !self.parse_expected(SyntaxKind::OpenBraceToken) {
            return Block {
                data: self.finish(SyntaxKind::Block, start),
                statements: &[],
            };
        }
        let statements = self.parse_statement_list(true);
        self.parse_expected(SyntaxKind::CloseBraceToken);
        Block {
            data: self.finish(SyntaxKind::Block, start),
            statements,
        }
    }

    fn parse_variable_statement(&mut self) -> Statement<'a> {
        let start = self.mark();
        let kind = match self.token() {
            SyntaxKind::VarKeyword => VariableKind::Var,
            SyntaxKind::LetKeyword => VariableKind::Let,
            _ => VariableKind::Const,
        };
        self.next_token();

        let mut declarations = BumpVec::new_in(self.arena);
        loop {
            declarations.push(self.parse_variable_declaration(kind));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected_semicolon();

        Statement::VariableStatement(VariableStatement {
            data: self.finish(SyntaxKind::VariableStatement, start),
            kind,
            declarations: declarations.into_bump_slice(),
        })
    }

    fn parse_variable_declaration(&mut self, kind: VariableKind) -> VariableDeclaration<'a> {
        let start = self.mark();
        let name = self.parse_binding_identifier();
        let initializer = if self.parse_optional(SyntaxKind::EqualsToken) {
            let value = self.parse_assignment_expression();
            Some(self.alloc(value))
        } else {
            if kind == VariableKind::Const {
                self.report(start, &messages::CONST_DECLARATIONS_MUST_BE_INITIALIZED, &[]);
            }
            None
        };
        VariableDeclaration {
            data: self.finish(SyntaxKind::VariableDeclaration, start),
            name,
            initializer,
        }
    }

    fn parse_identifier(&mut self) -> Identifier<'a> {
        let start = self.mark();
        let name = self.token_value();
        self.next_token();
        Identifier {
            data: self.finish(SyntaxKind::Identifier, start),
            name,
        }
    }

    /// Identifier with an empty name, standing in for a missing one.
    fn missing_identifier(&mut self, start: Marker) -> Identifier<'a> {
        Identifier {
            data: self.finish(SyntaxKind::Identifier, start),
            name: "",
        }
    }

    fn parse_binding_identifier(&mut self) -> Identifier<'a> {
        let start = self.mark();
        match self.token() {
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::OpenBraceToken | SyntaxKind::OpenBracketToken => {
                self.skip_balanced();
                self.unsupported(start, "destructuring patterns");
                self.missing_identifier(start)
            }
            _ => {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                self.missing_identifier(start)
            }
        }
    }

    /// A name after `.` or in a class body; keywords are allowed.
    fn parse_property_name(&mut self) -> Identifier<'a> {
        let kind = self.token();
        if kind == SyntaxKind::Identifier || kind.is_keyword() {
            return self.parse_identifier();
        }
        let start = self.mark();
        self.error(&messages::IDENTIFIER_EXPECTED, &[]);
        self.missing_identifier(start)
    }

    fn parse_function_declaration(&mut self) -> Statement<'a> {
        let start = self.mark();
        self.next_token(); // function
        if self.token() == SyntaxKind::AsteriskToken {
            let star = self.mark();
            self.next_token();
            self.unsupported(star, "generator functions");
        }
        let name = self.parse_binding_identifier();
        let parameters = self.parse_parameter_list();
        let body = self.parse_block();
        Statement::FunctionDeclaration(FunctionDeclaration {
            data: self.finish(SyntaxKind::FunctionDeclaration, start),
            name,
            parameters,
            body,
        })
    }

    fn parse_parameter_list(&mut self) -> NodeList<'a, Parameter<'a>> {
        let mut parameters = BumpVec::new_in(self.arena);
        if !self.parse_expected(SyntaxKind::OpenParenToken) {
            return parameters.into_bump_slice();
        }
        while !matches!(
            self.token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            let start = self.mark();
            match self.token() {
                SyntaxKind::Identifier => {
                    let name = self.parse_identifier();
                    if self.token() == SyntaxKind::EqualsToken {
                        self.skip_parameter_remainder();
                        self.unsupported(start, "default parameter values");
                    }
                    parameters.push(Parameter {
                        data: self.finish(SyntaxKind::Parameter, start),
                        name,
                    });
                }
                SyntaxKind::DotDotDotToken => {
                    self.skip_parameter_remainder();
                    self.unsupported(start, "rest parameters");
                }
                SyntaxKind::OpenBraceToken | SyntaxKind::OpenBracketToken => {
                    self.skip_parameter_remainder();
                    self.unsupported(start, "destructuring patterns");
                }
                _ => {
                    self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                    break;
                }
            }
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        parameters.into_bump_slice()
    }

    /// Skip to the `,` or `)` that ends the current parameter.
    fn skip_parameter_remainder(&mut self) {
        loop {
            match self.token() {
                SyntaxKind::CommaToken
                | SyntaxKind::CloseParenToken
                | SyntaxKind::SemicolonToken
                | SyntaxKind::EndOfFileToken => return,
                SyntaxKind::OpenBraceToken
                | SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                SyntaxKind::CloseBraceToken | SyntaxKind::CloseBracketToken => return,
                _ => self.next_token(),
            }
        }
    }

    fn parse_class_declaration(&mut self) -> Statement<'a> {
        let start = self.mark();
        self.next_token(); // class
        let name = self.parse_binding_identifier();
        let heritage = if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            let base = self.parse_left_hand_side_expression();
            Some(self.alloc(base))
        } else {
            None
        };
        let members = self.parse_class_members();
        Statement::ClassDeclaration(ClassDeclaration {
            data: self.finish(SyntaxKind::ClassDeclaration, start),
            name,
            heritage,
            members,
        })
    }

    fn parse_class_members(&mut self) -> NodeList<'a, ClassElement<'a>> {
        let mut members = BumpVec::new_in(self.arena);
        if !self.parse_expected(SyntaxKind::OpenBraceToken) {
            return members.into_bump_slice();
        }
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            if self.parse_optional(SyntaxKind::SemicolonToken) {
                continue;
            }
            let before = self.pos;
            members.push(self.parse_class_member());
            if self.panic_mode {
                self.synchronize_class_member();
            }
            if self.pos == before {
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        members.into_bump_slice()
    }

    fn parse_class_member(&mut self) -> ClassElement<'a> {
        let start = self.mark();
        let is_static = self.token() == SyntaxKind::StaticKeyword
            && self.peek(1) != SyntaxKind::OpenParenToken;
        if is_static {
            self.next_token();
        }

        if self.is_contextual("async")
            && self.peek_on_same_line(1).map_or(false, |k| k != SyntaxKind::OpenParenToken)
        {
            self.next_token();
            self.unsupported(start, "async methods");
        }
        if self.token() == SyntaxKind::AsteriskToken {
            self.next_token();
            self.unsupported(start, "generator methods");
        }
        if (self.is_contextual("get") || self.is_contextual("set"))
            && self
                .peek_on_same_line(1)
                .map_or(false, |k| k == SyntaxKind::Identifier || k.is_keyword())
        {
            self.next_token();
            self.unsupported(start, "getters and setters");
        }

        let kind = self.token();
        if kind == SyntaxKind::OpenBracketToken {
            self.error(&messages::UNSUPPORTED_SYNTAX_0, &["computed property names"]);
            return ClassElement::Error(self.error_node(start));
        }
        if kind != SyntaxKind::Identifier && !kind.is_keyword() {
            self.error(&messages::METHOD_OR_CONSTRUCTOR_EXPECTED, &[]);
            return ClassElement::Error(self.error_node(start));
        }
        let name = self.parse_identifier();

        if self.token() != SyntaxKind::OpenParenToken {
            self.report(start, &messages::UNSUPPORTED_SYNTAX_0, &["class fields"]);
            self.panic_mode = true;
            return ClassElement::Error(self.error_node(start));
        }

        let node_kind = if !is_static && name.name == "constructor" {
            SyntaxKind::Constructor
        } else {
            SyntaxKind::MethodDeclaration
        };
        let parameters = self.parse_parameter_list();
        let body = self.parse_block();
        ClassElement::Method(MethodDeclaration {
            data: self.finish(node_kind, start),
            name,
            is_static,
            parameters,
            body,
        })
    }

    fn parse_if_statement(&mut self) -> Statement<'a> {
        let start = self.mark();
        self.next_token(); // if
        self.parse_expected(SyntaxKind::OpenParenToken);
        let condition = self.parse_expression();
        let condition = self.alloc(condition);
        self.parse_expected(SyntaxKind::CloseParenToken);
        let then_statement = self.parse_statement();
        let then_statement = self.alloc(then_statement);
        let else_statement = if self.parse_optional(SyntaxKind::ElseKeyword) {
            let statement = self.parse_statement();
            Some(self.alloc(statement))
        } else {
            None
        };
        Statement::IfStatement(IfStatement {
            data: self.finish(SyntaxKind::IfStatement, start),
            condition,
            then_statement,
            else_statement,
        })
    }

    fn parse_return_statement(&mut self) -> Statement<'a> {
        let start = self.mark();
        self.next_token(); // return
        let has_expression = !matches!(
            self.token(),
            SyntaxKind::SemicolonToken | SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) && !self.has_preceding_line_break();
        let expression = if has_expression {
            let value = self.parse_expression();
            Some(self.alloc(value))
        } else {
            None
        };
        self.parse_expected_semicolon();
        Statement::ReturnStatement(ReturnStatement {
            data: self.finish(SyntaxKind::ReturnStatement, start),
            expression,
        })
    }

    fn parse_expression_statement(&mut self) -> Statement<'a> {
        let start = self.mark();
        let expression = self.parse_expression();
        let expression = self.alloc(expression);
        self.parse_expected_semicolon();
        Statement::ExpressionStatement(ExpressionStatement {
            data: self.finish(SyntaxKind::ExpressionStatement, start),
            expression,
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        let expression = self.parse_assignment_expression();
        if self.token() != SyntaxKind::CommaToken {
            return expression;
        }
        while self.parse_optional(SyntaxKind::CommaToken) {
            self.parse_assignment_expression();
        }
        self.unsupported(start, "comma expressions");
        self.error_expression(start)
    }

    fn parse_assignment_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        if !self.enter_recursion() {
            return self.error_expression(start);
        }
        let expression = self.parse_assignment_expression_worker(start);
        self.leave_recursion();
        expression
    }

    fn parse_assignment_expression_worker(&mut self, start: Marker) -> Expression<'a> {
        if self.is_start_of_arrow_function() {
            return self.parse_arrow_function(start);
        }

        let target = self.parse_conditional_expression();
        let operator_kind = self.token();
        if !operator_kind.is_assignment_operator() {
            return target;
        }
        self.next_token();
        let value = self.parse_assignment_expression();

        let Some(operator) = AssignmentOperator::from_token(operator_kind) else {
            let what = format!("'{}' operator", operator_kind.text().unwrap_or("?"));
            self.unsupported(start, &what);
            return self.error_expression(start);
        };
        if !target.is_assignment_target() {
            let data = *target.data();
            self.report_span(
                data.range.to_span(),
                data.position,
                &messages::INVALID_ASSIGNMENT_TARGET,
                &[],
            );
        }
        Expression::Assignment(AssignmentExpression {
            data: self.finish(SyntaxKind::AssignmentExpression, start),
            target: self.alloc(target),
            operator,
            value: self.alloc(value),
        })
    }

    fn is_start_of_arrow_function(&self) -> bool {
        match self.token() {
            SyntaxKind::Identifier => {
                if self.peek(1) == SyntaxKind::EqualsGreaterThanToken {
                    return true;
                }
                self.is_contextual("async")
                    && match self.peek_on_same_line(1) {
                        Some(SyntaxKind::Identifier) => {
                            self.peek(2) == SyntaxKind::EqualsGreaterThanToken
                        }
                        Some(SyntaxKind::OpenParenToken) => self.is_arrow_after_parens(1),
                        _ => false,
                    }
            }
            SyntaxKind::OpenParenToken => self.is_arrow_after_parens(0),
            _ => false,
        }
    }

    /// Whether the parenthesized group starting `offset` tokens ahead is
    /// followed by `=>`.
    fn is_arrow_after_parens(&self, offset: usize) -> bool {
        let mut depth = 0u32;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos + offset) {
            match token.kind {
                SyntaxKind::OpenParenToken
                | SyntaxKind::OpenBracketToken
                | SyntaxKind::OpenBraceToken => depth += 1,
                SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::CloseBraceToken => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .map_or(false, |t| t.kind == SyntaxKind::EqualsGreaterThanToken);
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Consume an arrow function and report it; the result is a placeholder.
    fn parse_arrow_function(&mut self, start: Marker) -> Expression<'a> {
        if self.is_contextual("async") {
            self.next_token();
        }
        match self.token() {
            SyntaxKind::Identifier => self.next_token(),
            SyntaxKind::OpenParenToken => self.skip_balanced(),
            _ => {}
        }
        self.parse_expected(SyntaxKind::EqualsGreaterThanToken);
        self.unsupported(start, "arrow functions");
        if self.token() == SyntaxKind::OpenBraceToken {
            self.skip_balanced();
        } else {
            self.parse_assignment_expression();
        }
        self.error_expression(start)
    }

    fn parse_conditional_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        let condition = self.parse_binary_expression(OperatorPrecedence::Conditional);
        if !self.parse_optional(SyntaxKind::QuestionToken) {
            return condition;
        }
        let when_true = self.parse_assignment_expression();
        self.parse_expected(SyntaxKind::ColonToken);
        let when_false = self.parse_assignment_expression();
        Expression::Conditional(ConditionalExpression {
            data: self.finish(SyntaxKind::ConditionalExpression, start),
            condition: self.alloc(condition),
            when_true: self.alloc(when_true),
            when_false: self.alloc(when_false),
        })
    }

    fn parse_binary_expression(&mut self, min_precedence: OperatorPrecedence) -> Expression<'a> {
        let start = self.mark();
        let mut left = self.parse_unary_expression();

        loop {
            let operator_kind = self.token();
            let precedence = get_binary_operator_precedence(operator_kind);
            if precedence == OperatorPrecedence::Invalid || precedence <= min_precedence {
                break;
            }

            self.next_token();
            let right = self.parse_binary_expression(precedence);
            left = match BinaryOperator::from_token(operator_kind) {
                Some(operator) => Expression::Binary(BinaryExpression {
                    data: self.finish(SyntaxKind::BinaryExpression, start),
                    left: self.alloc(left),
                    operator,
                    right: self.alloc(right),
                }),
                None => {
                    let what = format!("'{}' operator", operator_kind.text().unwrap_or("?"));
                    self.unsupported(start, &what);
                    self.error_expression(start)
                }
            };
        }

        left
    }

    fn parse_unary_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        if !self.enter_recursion() {
            return self.error_expression(start);
        }
        let expression = self.parse_unary_expression_worker(start);
        self.leave_recursion();
        expression
    }

    fn parse_unary_expression_worker(&mut self, start: Marker) -> Expression<'a> {
        let kind = self.token();
        if let Some(operator) = UnaryOperator::from_token(kind) {
            self.next_token();
            let operand = self.parse_unary_expression();
            return Expression::PrefixUnary(PrefixUnaryExpression {
                data: self.finish(SyntaxKind::PrefixUnaryExpression, start),
                operator,
                operand: self.alloc(operand),
            });
        }
        match kind {
            SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken => {
                self.next_token();
                let operand = self.parse_unary_expression();
                self.finish_update(start, kind, true, operand)
            }
            SyntaxKind::TildeToken | SyntaxKind::DeleteKeyword | SyntaxKind::VoidKeyword => {
                self.next_token();
                self.parse_unary_expression();
                let what = format!("'{}' operator", kind.text().unwrap_or("?"));
                self.unsupported(start, &what);
                self.error_expression(start)
            }
            SyntaxKind::Identifier
                if self.is_contextual("await")
                    && self.peek_on_same_line(1).map_or(false, is_start_of_expression) =>
            {
                self.next_token();
                self.parse_unary_expression();
                self.unsupported(start, "'await' expressions");
                self.error_expression(start)
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn finish_update(
        &mut self,
        start: Marker,
        kind: SyntaxKind,
        prefix: bool,
        operand: Expression<'a>,
    ) -> Expression<'a> {
        let operator = if kind == SyntaxKind::PlusPlusToken {
            UpdateOperator::Increment
        } else {
            UpdateOperator::Decrement
        };
        if !operand.is_assignment_target() {
            let data = *operand.data();
            self.report_span(
                data.range.to_span(),
                data.position,
                &messages::INVALID_UPDATE_TARGET,
                &[operator.text()],
            );
        }
        let node_kind = if prefix {
            SyntaxKind::PrefixUnaryExpression
        } else {
            SyntaxKind::PostfixUnaryExpression
        };
        Expression::Update(UpdateExpression {
            data: self.finish(node_kind, start),
            operator,
            prefix,
            operand: self.alloc(operand),
        })
    }

    fn parse_postfix_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        let expression = self.parse_left_hand_side_expression();
        let kind = self.token();
        if matches!(kind, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
            && !self.has_preceding_line_break()
        {
            self.next_token();
            return self.finish_update(start, kind, false, expression);
        }
        expression
    }

    fn parse_left_hand_side_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        let mut expression = if self.token() == SyntaxKind::NewKeyword {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };

        loop {
            expression = match self.token() {
                SyntaxKind::DotToken => {
                    self.next_token();
                    self.finish_property_access(start, expression)
                }
                SyntaxKind::QuestionDotToken => {
                    let chain = self.mark();
                    self.next_token();
                    self.unsupported(chain, "optional chaining");
                    match self.token() {
                        SyntaxKind::OpenParenToken => self.finish_call(start, expression),
                        SyntaxKind::OpenBracketToken => self.finish_element_access(start, expression),
                        _ => self.finish_property_access(start, expression),
                    }
                }
                SyntaxKind::OpenBracketToken => self.finish_element_access(start, expression),
                SyntaxKind::OpenParenToken => self.finish_call(start, expression),
                SyntaxKind::NoSubstitutionTemplateLiteral | SyntaxKind::TemplateHead => {
                    self.parse_template_expression();
                    self.unsupported(start, "tagged templates");
                    self.error_expression(start)
                }
                _ => return expression,
            };
        }
    }

    fn finish_property_access(&mut self, start: Marker, object: Expression<'a>) -> Expression<'a> {
        let name = self.parse_property_name();
        Expression::PropertyAccess(PropertyAccessExpression {
            data: self.finish(SyntaxKind::PropertyAccessExpression, start),
            expression: self.alloc(object),
            name,
        })
    }

    fn finish_element_access(&mut self, start: Marker, object: Expression<'a>) -> Expression<'a> {
        self.next_token(); // [
        let argument = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseBracketToken);
        Expression::ElementAccess(ElementAccessExpression {
            data: self.finish(SyntaxKind::ElementAccessExpression, start),
            expression: self.alloc(object),
            argument: self.alloc(argument),
        })
    }

    fn finish_call(&mut self, start: Marker, callee: Expression<'a>) -> Expression<'a> {
        let arguments = self.parse_arguments();
        Expression::Call(CallExpression {
            data: self.finish(SyntaxKind::CallExpression, start),
            expression: self.alloc(callee),
            arguments,
        })
    }

    fn parse_new_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        if !self.enter_recursion() {
            return self.error_expression(start);
        }
        self.next_token(); // new

        let callee_start = self.mark();
        let mut callee = if self.token() == SyntaxKind::NewKeyword {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        loop {
            callee = match self.token() {
                SyntaxKind::DotToken => {
                    self.next_token();
                    self.finish_property_access(callee_start, callee)
                }
                SyntaxKind::OpenBracketToken => self.finish_element_access(callee_start, callee),
                _ => break,
            };
        }
        let arguments = if self.token() == SyntaxKind::OpenParenToken {
            self.parse_arguments()
        } else {
            &[]
        };
        self.leave_recursion();

        Expression::New(NewExpression {
            data: self.finish(SyntaxKind::NewExpression, start),
            expression: self.alloc(callee),
            arguments,
        })
    }

    fn parse_arguments(&mut self) -> NodeList<'a, Expression<'a>> {
        let mut arguments = BumpVec::new_in(self.arena);
        if !self.parse_expected(SyntaxKind::OpenParenToken) {
            return arguments.into_bump_slice();
        }
        while !matches!(
            self.token(),
            SyntaxKind::CloseParenToken | SyntaxKind::EndOfFileToken
        ) {
            arguments.push(self.parse_argument_or_element());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        arguments.into_bump_slice()
    }

    fn parse_argument_or_element(&mut self) -> Expression<'a> {
        if self.token() != SyntaxKind::DotDotDotToken {
            return self.parse_assignment_expression();
        }
        let start = self.mark();
        self.next_token();
        self.parse_assignment_expression();
        self.unsupported(start, "spread elements");
        self.error_expression(start)
    }

    fn parse_primary_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        match self.token() {
            SyntaxKind::Identifier => Expression::Identifier(self.parse_identifier()),
            SyntaxKind::ThisKeyword => {
                self.next_token();
                Expression::This(self.finish(SyntaxKind::ThisExpression, start))
            }
            SyntaxKind::SuperKeyword => {
                self.next_token();
                self.unsupported(start, "'super' expressions");
                self.error_expression(start)
            }
            SyntaxKind::NumericLiteral => {
                // Malformed literals were already reported by the scanner.
                let value = parse_numeric_literal(&self.current().text).unwrap_or(0.0);
                self.next_token();
                self.finish_literal(start, LiteralValue::Number(value))
            }
            SyntaxKind::StringLiteral => {
                let value = self.token_value();
                self.next_token();
                self.finish_literal(start, LiteralValue::String(value))
            }
            SyntaxKind::TrueKeyword => {
                self.next_token();
                self.finish_literal(start, LiteralValue::Boolean(true))
            }
            SyntaxKind::FalseKeyword => {
                self.next_token();
                self.finish_literal(start, LiteralValue::Boolean(false))
            }
            SyntaxKind::NullKeyword => {
                self.next_token();
                self.finish_literal(start, LiteralValue::Null)
            }
            SyntaxKind::NoSubstitutionTemplateLiteral | SyntaxKind::TemplateHead => {
                self.parse_template_expression()
            }
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let expression = self.parse_expression();
                self.parse_expected(SyntaxKind::CloseParenToken);
                expression
            }
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword | SyntaxKind::ClassKeyword => {
                let what = if self.token() == SyntaxKind::FunctionKeyword {
                    "function expressions"
                } else {
                    "class expressions"
                };
                self.skip_declaration_expression();
                self.unsupported(start, what);
                self.error_expression(start)
            }
            SyntaxKind::SlashToken | SyntaxKind::SlashEqualsToken => {
                self.error(&messages::UNSUPPORTED_SYNTAX_0, &["regular expression literals"]);
                self.error_expression(start)
            }
            SyntaxKind::InvalidToken => {
                let text = self.current().text.clone();
                self.error(&messages::UNEXPECTED_TOKEN_0, &[&text]);
                self.next_token();
                self.error_expression(start)
            }
            _ => {
                self.error(&messages::EXPRESSION_EXPECTED, &[]);
                self.error_expression(start)
            }
        }
    }

    fn finish_literal(&mut self, start: Marker, value: LiteralValue<'a>) -> Expression<'a> {
        Expression::Literal(Literal {
            data: self.finish(SyntaxKind::Literal, start),
            value,
        })
    }

    /// Skip a `function` or `class` in expression position: everything up to
    /// and including its braced body.
    fn skip_declaration_expression(&mut self) {
        self.next_token();
        loop {
            match self.token() {
                SyntaxKind::OpenBraceToken => {
                    self.skip_balanced();
                    return;
                }
                SyntaxKind::EndOfFileToken | SyntaxKind::SemicolonToken => return,
                SyntaxKind::OpenParenToken | SyntaxKind::OpenBracketToken => self.skip_balanced(),
                _ => self.next_token(),
            }
        }
    }

    fn parse_template_expression(&mut self) -> Expression<'a> {
        let start = self.mark();
        let head = self.token_value();
        let has_substitutions = self.token() == SyntaxKind::TemplateHead;
        self.next_token();

        let mut spans = BumpVec::new_in(self.arena);
        if has_substitutions {
            loop {
                let expression = self.parse_expression();
                match self.token() {
                    SyntaxKind::TemplateMiddle => {
                        let literal = self.token_value();
                        self.next_token();
                        spans.push(TemplateSpan { expression, literal });
                    }
                    SyntaxKind::TemplateTail => {
                        let literal = self.token_value();
                        self.next_token();
                        spans.push(TemplateSpan { expression, literal });
                        break;
                    }
                    _ => {
                        self.error(&messages::_0_EXPECTED, &["}"]);
                        spans.push(TemplateSpan { expression, literal: "" });
                        break;
                    }
                }
            }
        }

        Expression::Template(TemplateExpression {
            data: self.finish(SyntaxKind::TemplateExpression, start),
            head,
            spans: spans.into_bump_slice(),
        })
    }

    fn parse_array_literal(&mut self) -> Expression<'a> {
        let start = self.mark();
        self.next_token(); // [
        let mut elements = BumpVec::new_in(self.arena);
        while !matches!(
            self.token(),
            SyntaxKind::CloseBracketToken | SyntaxKind::EndOfFileToken
        ) {
            if self.token() == SyntaxKind::CommaToken {
                let hole = self.mark();
                self.next_token();
                self.unsupported(hole, "array holes");
                elements.push(self.error_expression(hole));
                continue;
            }
            elements.push(self.parse_argument_or_element());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBracketToken);
        Expression::ArrayLiteral(ArrayLiteralExpression {
            data: self.finish(SyntaxKind::ArrayLiteralExpression, start),
            elements: elements.into_bump_slice(),
        })
    }

    fn parse_object_literal(&mut self) -> Expression<'a> {
        let start = self.mark();
        self.next_token(); // {
        let mut properties = BumpVec::new_in(self.arena);
        while !matches!(
            self.token(),
            SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
        ) {
            if let Some(property) = self.parse_property_assignment() {
                properties.push(property);
            }
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        Expression::ObjectLiteral(ObjectLiteralExpression {
            data: self.finish(SyntaxKind::ObjectLiteralExpression, start),
            properties: properties.into_bump_slice(),
        })
    }

    /// Parse `key: value` or shorthand `key`. Unsupported property forms are
    /// reported and yield `None`.
    fn parse_property_assignment(&mut self) -> Option<PropertyAssignment<'a>> {
        let start = self.mark();
        let kind = self.token();
        match kind {
            SyntaxKind::DotDotDotToken => {
                self.next_token();
                self.parse_assignment_expression();
                self.unsupported(start, "spread properties");
                return None;
            }
            SyntaxKind::OpenBracketToken => {
                self.skip_balanced();
                if self.parse_optional(SyntaxKind::ColonToken) {
                    self.parse_assignment_expression();
                }
                self.unsupported(start, "computed property names");
                return None;
            }
            _ => {}
        }

        let key = match kind {
            SyntaxKind::Identifier | SyntaxKind::StringLiteral => self.token_value(),
            k if k.is_keyword() => self.token_value(),
            SyntaxKind::NumericLiteral => self.arena.alloc_str(&self.current().text),
            _ => {
                self.error(&messages::PROPERTY_ASSIGNMENT_EXPECTED, &[]);
                return None;
            }
        };
        self.next_token();

        match self.token() {
            SyntaxKind::ColonToken => {
                self.next_token();
                let initializer = self.parse_assignment_expression();
                Some(PropertyAssignment {
                    data: self.finish(SyntaxKind::PropertyAssignment, start),
                    key,
                    initializer,
                    is_shorthand: false,
                })
            }
            SyntaxKind::OpenParenToken => {
                self.skip_balanced();
                if self.token() == SyntaxKind::OpenBraceToken {
                    self.skip_balanced();
                }
                self.unsupported(start, "object literal methods");
                None
            }
            SyntaxKind::CommaToken | SyntaxKind::CloseBraceToken
                if kind == SyntaxKind::Identifier =>
            {
                let name = Identifier {
                    data: self.finish(SyntaxKind::Identifier, start),
                    name: key,
                };
                Some(PropertyAssignment {
                    data: self.finish(SyntaxKind::PropertyAssignment, start),
                    key,
                    initializer: Expression::Identifier(name),
                    is_shorthand: true,
                })
            }
            _ => {
                self.error(&messages::_0_EXPECTED, &[":"]);
                None
            }
        }
    }
}

/// Tokens that begin a statement; panic-mode recovery stops in front of them.
fn is_statement_start(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::VarKeyword
            | SyntaxKind::LetKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::FunctionKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::IfKeyword
            | SyntaxKind::ReturnKeyword
            | SyntaxKind::WhileKeyword
            | SyntaxKind::ForKeyword
            | SyntaxKind::DoKeyword
            | SyntaxKind::SwitchKeyword
            | SyntaxKind::TryKeyword
            | SyntaxKind::ThrowKeyword
            | SyntaxKind::BreakKeyword
            | SyntaxKind::ContinueKeyword
            | SyntaxKind::ImportKeyword
            | SyntaxKind::ExportKeyword
    )
}

fn is_start_of_expression(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier
            | SyntaxKind::NumericLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::NoSubstitutionTemplateLiteral
            | SyntaxKind::TemplateHead
            | SyntaxKind::ThisKeyword
            | SyntaxKind::NewKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword
            | SyntaxKind::NullKeyword
            | SyntaxKind::TypeOfKeyword
            | SyntaxKind::OpenParenToken
            | SyntaxKind::OpenBracketToken
            | SyntaxKind::OpenBraceToken
            | SyntaxKind::MinusToken
            | SyntaxKind::PlusToken
            | SyntaxKind::ExclamationToken
            | SyntaxKind::PlusPlusToken
            | SyntaxKind::MinusMinusToken
    )
}

fn synthesized_eof(last: Option<&Token>) -> Token {
    let (end, position) = last.map_or((0, Position::new(1, 1)), |t| (t.span.end(), t.position));
    Token {
        kind: SyntaxKind::EndOfFileToken,
        text: String::new(),
        value: String::new(),
        span: TextSpan::empty(end),
        position,
        flags: TokenFlags::NONE,
    }
}
