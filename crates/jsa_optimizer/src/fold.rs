//! Compile-time evaluation of operations on constants.
//!
//! Every function returns `None` when the result is not safely known:
//! mixed-type coercions, `NaN`, non-finite numbers, and division or
//! remainder by zero are all left for run time.

use jsa_ir::{Constant, Opcode};

pub fn fold_binary(op: Opcode, left: &Constant, right: &Constant) -> Option<Constant> {
    use Constant::*;
    let result = match (op, left, right) {
        (Opcode::Add, Number(a), Number(b)) => Number(a + b),
        (Opcode::Add, String(_), _) | (Opcode::Add, _, String(_)) | (Opcode::Concat, _, _) => {
            String(format!("{}{}", left.to_js_string(), right.to_js_string()))
        }
        (Opcode::Sub, Number(a), Number(b)) => Number(a - b),
        (Opcode::Mul, Number(a), Number(b)) => Number(a * b),
        (Opcode::Div, Number(a), Number(b)) if *b != 0.0 => Number(a / b),
        (Opcode::Mod, Number(a), Number(b)) if *b != 0.0 => Number(a % b),
        (Opcode::Eq, _, _) => Boolean(loose_equals(left, right)?),
        (Opcode::Ne, _, _) => Boolean(!loose_equals(left, right)?),
        (Opcode::StrictEq, _, _) => Boolean(strict_equals(left, right)),
        (Opcode::StrictNe, _, _) => Boolean(!strict_equals(left, right)),
        (Opcode::Lt, _, _) => Boolean(compare(left, right)?.is_lt()),
        (Opcode::Gt, _, _) => Boolean(compare(left, right)?.is_gt()),
        (Opcode::Le, _, _) => Boolean(compare(left, right)?.is_le()),
        (Opcode::Ge, _, _) => Boolean(compare(left, right)?.is_ge()),
        (Opcode::And, _, _) => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        (Opcode::Or, _, _) => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
        _ => return None,
    };
    finite(result)
}

pub fn fold_unary(op: Opcode, operand: &Constant) -> Option<Constant> {
    use Constant::*;
    let result = match (op, operand) {
        (Opcode::Neg, Number(n)) => Number(-n),
        (Opcode::ToNumber, Number(n)) => Number(*n),
        (Opcode::ToNumber, Boolean(b)) => Number(if *b { 1.0 } else { 0.0 }),
        (Opcode::ToNumber, Null) => Number(0.0),
        (Opcode::Not, _) => Boolean(!operand.is_truthy()),
        (Opcode::Typeof, _) => String(operand.type_name().to_string()),
        _ => return None,
    };
    finite(result)
}

fn finite(value: Constant) -> Option<Constant> {
    match value {
        Constant::Number(n) if !n.is_finite() => None,
        other => Some(other),
    }
}

/// `==` when both sides have the same type, or both are nullish.
fn loose_equals(left: &Constant, right: &Constant) -> Option<bool> {
    use Constant::*;
    match (left, right) {
        (Null | Undefined, Null | Undefined) => Some(true),
        (Null | Undefined, _) | (_, Null | Undefined) => Some(false),
        _ if std::mem::discriminant(left) == std::mem::discriminant(right) => {
            Some(strict_equals(left, right))
        }
        _ => None,
    }
}

fn strict_equals(left: &Constant, right: &Constant) -> bool {
    use Constant::*;
    match (left, right) {
        (Number(a), Number(b)) => a == b,
        (String(a), String(b)) => a == b,
        (Boolean(a), Boolean(b)) => a == b,
        (Null, Null) | (Undefined, Undefined) => true,
        _ => false,
    }
}

fn compare(left: &Constant, right: &Constant) -> Option<std::cmp::Ordering> {
    match (left, right) {
        (Constant::Number(a), Constant::Number(b)) => a.partial_cmp(b),
        (Constant::String(a), Constant::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Constant {
        Constant::Number(n)
    }

    fn string(s: &str) -> Constant {
        Constant::String(s.to_string())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(fold_binary(Opcode::Add, &num(2.0), &num(3.0)), Some(num(5.0)));
        assert_eq!(fold_binary(Opcode::Mod, &num(7.0), &num(3.0)), Some(num(1.0)));
        assert_eq!(fold_binary(Opcode::Div, &num(1.0), &num(4.0)), Some(num(0.25)));
    }

    #[test]
    fn test_never_divides_by_zero() {
        assert_eq!(fold_binary(Opcode::Div, &num(1.0), &num(0.0)), None);
        assert_eq!(fold_binary(Opcode::Mod, &num(1.0), &num(0.0)), None);
    }

    #[test]
    fn test_never_produces_nan_or_infinity() {
        assert_eq!(fold_binary(Opcode::Sub, &string("a"), &num(1.0)), None);
        assert_eq!(fold_binary(Opcode::Mul, &num(1e308), &num(10.0)), None);
        assert_eq!(fold_unary(Opcode::ToNumber, &string("x")), None);
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(fold_binary(Opcode::Add, &num(1.0), &string("a")), Some(string("1a")));
        assert_eq!(
            fold_binary(Opcode::Concat, &string("n="), &num(2.0)),
            Some(string("n=2"))
        );
        assert_eq!(
            fold_binary(Opcode::Concat, &string(""), &Constant::Null),
            Some(string("null"))
        );
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            fold_binary(Opcode::StrictEq, &num(1.0), &string("1")),
            Some(Constant::Boolean(false))
        );
        assert_eq!(fold_binary(Opcode::Eq, &num(1.0), &string("1")), None);
        assert_eq!(
            fold_binary(Opcode::Eq, &Constant::Null, &Constant::Undefined),
            Some(Constant::Boolean(true))
        );
        assert_eq!(
            fold_binary(Opcode::Lt, &string("a"), &string("b")),
            Some(Constant::Boolean(true))
        );
    }

    #[test]
    fn test_logical_and_unary() {
        assert_eq!(fold_binary(Opcode::And, &num(0.0), &num(5.0)), Some(num(0.0)));
        assert_eq!(fold_binary(Opcode::Or, &num(0.0), &num(5.0)), Some(num(5.0)));
        assert_eq!(fold_unary(Opcode::Not, &string("")), Some(Constant::Boolean(true)));
        assert_eq!(fold_unary(Opcode::Typeof, &Constant::Null), Some(string("object")));
        assert_eq!(fold_unary(Opcode::Neg, &num(4.0)), Some(num(-4.0)));
    }
}
