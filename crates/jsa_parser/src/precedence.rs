//! Operator precedence for binary operators.

use jsa_ast::syntax_kind::SyntaxKind;

/// Operator precedence levels, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum OperatorPrecedence {
    Lowest = 0,
    Assignment = 1,
    Conditional = 2,
    NullishCoalescing = 3,
    LogicalOr = 4,
    LogicalAnd = 5,
    BitwiseOr = 6,
    BitwiseXor = 7,
    BitwiseAnd = 8,
    Equality = 9,
    Relational = 10,
    Shift = 11,
    Additive = 12,
    Multiplicative = 13,
    Exponentiation = 14,
    Invalid = 255,
}

/// Get the binary operator precedence for a given token kind. Operators the
/// analyzer does not support still get their usual level so that the
/// surrounding expression keeps its shape while the error is reported.
pub fn get_binary_operator_precedence(kind: SyntaxKind) -> OperatorPrecedence {
    match kind {
        SyntaxKind::QuestionQuestionToken => OperatorPrecedence::NullishCoalescing,
        SyntaxKind::BarBarToken => OperatorPrecedence::LogicalOr,
        SyntaxKind::AmpersandAmpersandToken => OperatorPrecedence::LogicalAnd,
        SyntaxKind::BarToken => OperatorPrecedence::BitwiseOr,
        SyntaxKind::CaretToken => OperatorPrecedence::BitwiseXor,
        SyntaxKind::AmpersandToken => OperatorPrecedence::BitwiseAnd,
        SyntaxKind::EqualsEqualsToken
        | SyntaxKind::ExclamationEqualsToken
        | SyntaxKind::EqualsEqualsEqualsToken
        | SyntaxKind::ExclamationEqualsEqualsToken => OperatorPrecedence::Equality,
        SyntaxKind::LessThanToken
        | SyntaxKind::GreaterThanToken
        | SyntaxKind::LessThanEqualsToken
        | SyntaxKind::GreaterThanEqualsToken
        | SyntaxKind::InstanceOfKeyword
        | SyntaxKind::InKeyword => OperatorPrecedence::Relational,
        SyntaxKind::LessThanLessThanToken
        | SyntaxKind::GreaterThanGreaterThanToken
        | SyntaxKind::GreaterThanGreaterThanGreaterThanToken => OperatorPrecedence::Shift,
        SyntaxKind::PlusToken | SyntaxKind::MinusToken => OperatorPrecedence::Additive,
        SyntaxKind::AsteriskToken | SyntaxKind::SlashToken | SyntaxKind::PercentToken => {
            OperatorPrecedence::Multiplicative
        }
        SyntaxKind::AsteriskAsteriskToken => OperatorPrecedence::Exponentiation,
        _ => OperatorPrecedence::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_grammar() {
        let ladder = [
            SyntaxKind::BarBarToken,
            SyntaxKind::AmpersandAmpersandToken,
            SyntaxKind::EqualsEqualsEqualsToken,
            SyntaxKind::LessThanToken,
            SyntaxKind::PlusToken,
            SyntaxKind::AsteriskToken,
        ];
        for pair in ladder.windows(2) {
            assert!(
                get_binary_operator_precedence(pair[0]) < get_binary_operator_precedence(pair[1]),
                "{:?} should bind looser than {:?}",
                pair[0],
                pair[1]
            );
        }
        assert_eq!(
            get_binary_operator_precedence(SyntaxKind::SlashToken),
            get_binary_operator_precedence(SyntaxKind::PercentToken)
        );
    }

    #[test]
    fn non_operators_are_invalid() {
        assert_eq!(get_binary_operator_precedence(SyntaxKind::EqualsToken), OperatorPrecedence::Invalid);
        assert_eq!(get_binary_operator_precedence(SyntaxKind::Identifier), OperatorPrecedence::Invalid);
    }
}
