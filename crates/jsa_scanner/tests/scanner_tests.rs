//! Scanner integration tests.

use jsa_ast::syntax_kind::SyntaxKind;
use jsa_ast::types::{TokenClass, TokenFlags};
use jsa_scanner::{tokenize, tokenize_with_comments, Scanner};

/// Helper: scan all tokens (without EOF) as (kind, value) pairs.
fn scan_all(source: &str) -> Vec<(SyntaxKind, String)> {
    tokenize(source)
        .tokens
        .into_iter()
        .filter(|t| t.kind != SyntaxKind::EndOfFileToken)
        .map(|t| (t.kind, t.value))
        .collect()
}

fn scan_kinds(source: &str) -> Vec<SyntaxKind> {
    scan_all(source).into_iter().map(|(k, _)| k).collect()
}

fn diagnostic_codes(source: &str) -> Vec<u32> {
    tokenize(source).diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn test_empty_source() {
    let result = tokenize("");
    assert_eq!(result.tokens.len(), 1);
    assert_eq!(result.tokens[0].kind, SyntaxKind::EndOfFileToken);
    assert_eq!(result.token_count(), 0);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_whitespace_only() {
    assert!(scan_all("   \n\t  ").is_empty());
}

#[test]
fn test_keywords_and_identifiers() {
    assert_eq!(
        scan_kinds("const calc = new Calculator()"),
        vec![
            SyntaxKind::ConstKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::EqualsToken,
            SyntaxKind::NewKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::OpenParenToken,
            SyntaxKind::CloseParenToken,
        ]
    );
    let tokens = scan_all("$el _private café");
    assert!(tokens.iter().all(|(k, _)| *k == SyntaxKind::Identifier));
    assert_eq!(tokens[2].1, "café");
}

#[test]
fn test_numeric_literals() {
    let result = tokenize("42 2.5 .5 1e3 0xFF");
    let values: Vec<f64> = result
        .tokens
        .iter()
        .filter_map(|t| t.numeric_value())
        .collect();
    assert_eq!(values, vec![42.0, 2.5, 0.5, 1000.0, 255.0]);
    assert!(result.diagnostics.is_empty());
    assert!(result.tokens[3].flags.contains(TokenFlags::SCIENTIFIC));
    assert!(result.tokens[4].flags.contains(TokenFlags::HEX_SPECIFIER));
}

#[test]
fn test_malformed_numbers() {
    assert_eq!(diagnostic_codes("1e"), vec![1006]);
    assert_eq!(diagnostic_codes("1e+;"), vec![1006]);
    assert_eq!(diagnostic_codes("0x;"), vec![1005]);
}

#[test]
fn test_string_literals() {
    let tokens = scan_all(r#""hello" 'world'"#);
    assert_eq!(tokens[0], (SyntaxKind::StringLiteral, "hello".to_string()));
    assert_eq!(tokens[1], (SyntaxKind::StringLiteral, "world".to_string()));
}

#[test]
fn test_string_escapes() {
    let tokens = scan_all(r#""a\nb" 'it\'s' "\x41B\u{43}""#);
    assert_eq!(tokens[0].1, "a\nb");
    assert_eq!(tokens[1].1, "it's");
    assert_eq!(tokens[2].1, "ABC");
}

#[test]
fn test_invalid_hex_escape() {
    let result = tokenize(r#""\xZZ""#);
    assert_eq!(result.tokens[0].kind, SyntaxKind::StringLiteral);
    assert!(result.tokens[0].flags.contains(TokenFlags::CONTAINS_INVALID_ESCAPE));
    assert_eq!(result.diagnostics.diagnostics()[0].code, 1005);
}

#[test]
fn test_raw_text_is_preserved() {
    let result = tokenize(r#"'a\tb'"#);
    assert_eq!(result.tokens[0].text, r#"'a\tb'"#);
    assert_eq!(result.tokens[0].value, "a\tb");
}

#[test]
fn test_unterminated_string_recovers_on_next_line() {
    let result = tokenize("let s = \"abc\nlet t = 1;");
    let diags = result.diagnostics.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, 1002);
    assert_eq!((diags[0].line(), diags[0].column()), (1, 9));

    let invalid = &result.tokens[3];
    assert_eq!(invalid.kind, SyntaxKind::InvalidToken);
    assert_eq!(invalid.text, "\"abc");
    assert!(invalid.flags.contains(TokenFlags::UNTERMINATED));

    let next = &result.tokens[4];
    assert_eq!(next.kind, SyntaxKind::LetKeyword);
    assert_eq!(next.line(), 2);
    assert!(next.has_preceding_line_break());
}

#[test]
fn test_template_literals() {
    assert_eq!(
        scan_all("`plain`"),
        vec![(SyntaxKind::NoSubstitutionTemplateLiteral, "plain".to_string())]
    );

    let tokens = scan_all("`a${x}b${y}c`");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::TemplateHead, "a".to_string()),
            (SyntaxKind::Identifier, "x".to_string()),
            (SyntaxKind::TemplateMiddle, "b".to_string()),
            (SyntaxKind::Identifier, "y".to_string()),
            (SyntaxKind::TemplateTail, "c".to_string()),
        ]
    );
}

#[test]
fn test_template_with_nested_braces() {
    assert_eq!(
        scan_kinds("`${ {a: 1}.a }`"),
        vec![
            SyntaxKind::TemplateHead,
            SyntaxKind::OpenBraceToken,
            SyntaxKind::Identifier,
            SyntaxKind::ColonToken,
            SyntaxKind::NumericLiteral,
            SyntaxKind::CloseBraceToken,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::TemplateTail,
        ]
    );
}

#[test]
fn test_unterminated_template() {
    let result = tokenize("`abc");
    assert_eq!(result.tokens[0].kind, SyntaxKind::InvalidToken);
    assert_eq!(diagnostic_codes("`abc"), vec![1003]);

    // An unclosed substitution is reported once, at the backtick.
    let result = tokenize("x = `a${y");
    let diags = result.diagnostics.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, 1003);
    assert_eq!(diags[0].column(), 5);
}

#[test]
fn test_invalid_character() {
    let result = tokenize("let a = #;");
    let diags = result.diagnostics.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, 1001);
    assert_eq!(diags[0].message_text, "Invalid character '#'.");
    assert_eq!(result.tokens[3].kind, SyntaxKind::InvalidToken);
    assert_eq!(result.tokens[4].kind, SyntaxKind::SemicolonToken);
}

#[test]
fn test_comments() {
    let source = "// line\nlet x = 1; /* block */";
    assert_eq!(scan_kinds(source).len(), 5);

    let result = tokenize_with_comments(source);
    assert_eq!(result.tokens[0].kind, SyntaxKind::SingleLineComment);
    assert_eq!(result.tokens[0].value, "// line");
    assert_eq!(result.tokens[6].kind, SyntaxKind::MultiLineComment);
    assert_eq!(result.token_count(), 5);
}

#[test]
fn test_unterminated_block_comment() {
    assert_eq!(diagnostic_codes("let a; /* never closed"), vec![1004]);
}

#[test]
fn test_operators_longest_match() {
    assert_eq!(
        scan_kinds("a === b !== c >>>= d ?? e += f++ ... => ?."),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::EqualsEqualsEqualsToken,
            SyntaxKind::Identifier,
            SyntaxKind::ExclamationEqualsEqualsToken,
            SyntaxKind::Identifier,
            SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken,
            SyntaxKind::Identifier,
            SyntaxKind::QuestionQuestionToken,
            SyntaxKind::Identifier,
            SyntaxKind::PlusEqualsToken,
            SyntaxKind::Identifier,
            SyntaxKind::PlusPlusToken,
            SyntaxKind::DotDotDotToken,
            SyntaxKind::EqualsGreaterThanToken,
            SyntaxKind::QuestionDotToken,
        ]
    );
    // `?.` followed by a digit is a conditional, not optional chaining.
    assert_eq!(
        scan_kinds("a?.5:1"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::QuestionToken,
            SyntaxKind::NumericLiteral,
            SyntaxKind::ColonToken,
            SyntaxKind::NumericLiteral,
        ]
    );
}

#[test]
fn test_positions_are_one_based() {
    let result = tokenize("let a\n  = 1");
    let eq = &result.tokens[2];
    assert_eq!(eq.kind, SyntaxKind::EqualsToken);
    assert_eq!((eq.line(), eq.column()), (2, 3));
    assert!(eq.has_preceding_line_break());
    assert_eq!((result.tokens[0].line(), result.tokens[0].column()), (1, 1));
}

#[test]
fn test_token_classes() {
    let result = tokenize("let x = true; // c");
    let classes: Vec<_> = result.tokens.iter().filter_map(|t| t.class()).collect();
    assert_eq!(
        classes,
        vec![
            TokenClass::Keyword,
            TokenClass::Identifier,
            TokenClass::Operator,
            TokenClass::Literal,
            TokenClass::Punctuation,
        ]
    );
}

#[test]
fn test_scanner_step_by_step() {
    let mut scanner = Scanner::new("a + b");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::PlusToken);
    assert_eq!(scanner.token_start(), 2);
    assert_eq!(scanner.token_end(), 3);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
}
