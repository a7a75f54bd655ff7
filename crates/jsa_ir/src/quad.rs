//! Quadruples: opcodes, operands and the instruction record.

use serde::{Serialize, Serializer};
use std::fmt;

/// Operation codes of the intermediate code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    ToNumber,
    Not,
    Typeof,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Concat,
    GetProp,
    SetProp,
    NewObject,
    NewArray,
    New,
    Call,
    Return,
    Label,
    Goto,
    JumpIfFalse,
    Class,
    Function,
    Halt,
}

impl Opcode {
    pub fn as_str(self) -> &'static str {
        match self {
            Opcode::Assign => "ASSIGN",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::ToNumber => "TO_NUMBER",
            Opcode::Not => "NOT",
            Opcode::Typeof => "TYPEOF",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::StrictEq => "STRICT_EQ",
            Opcode::StrictNe => "STRICT_NE",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Le => "LE",
            Opcode::Ge => "GE",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Concat => "CONCAT",
            Opcode::GetProp => "GET_PROP",
            Opcode::SetProp => "SET_PROP",
            Opcode::NewObject => "NEW_OBJECT",
            Opcode::NewArray => "NEW_ARRAY",
            Opcode::New => "NEW",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Label => "LABEL",
            Opcode::Goto => "GOTO",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::Class => "CLASS",
            Opcode::Function => "FUNCTION",
            Opcode::Halt => "HALT",
        }
    }

    /// Operations computing `res` from `arg1` and `arg2`.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Eq
                | Opcode::Ne
                | Opcode::StrictEq
                | Opcode::StrictNe
                | Opcode::Lt
                | Opcode::Gt
                | Opcode::Le
                | Opcode::Ge
                | Opcode::And
                | Opcode::Or
                | Opcode::Concat
        )
    }

    /// Operations computing `res` from `arg1` alone.
    pub fn is_unary(self) -> bool {
        matches!(self, Opcode::Neg | Opcode::ToNumber | Opcode::Not | Opcode::Typeof)
    }

    /// Control never falls through to the next quadruple.
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::Return | Opcode::Halt)
    }

    /// Whether removing the quadruple could change observable behavior, given
    /// that its result is never read.
    pub fn has_side_effects(self) -> bool {
        !(self.is_binary()
            || self.is_unary()
            || matches!(self, Opcode::Assign | Opcode::NewObject | Opcode::NewArray))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal value usable directly as an operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Undefined,
}

impl Constant {
    /// Truthiness under the language's boolean conversion.
    pub fn is_truthy(&self) -> bool {
        match self {
            Constant::Number(n) => *n != 0.0 && !n.is_nan(),
            Constant::String(s) => !s.is_empty(),
            Constant::Boolean(b) => *b,
            Constant::Null | Constant::Undefined => false,
        }
    }

    /// The string conversion used by concatenation.
    pub fn to_js_string(&self) -> String {
        match self {
            Constant::Number(n) => format_number(*n),
            Constant::String(s) => s.clone(),
            Constant::Boolean(b) => b.to_string(),
            Constant::Null => "null".to_string(),
            Constant::Undefined => "undefined".to_string(),
        }
    }

    /// The result of `typeof` applied to this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Number(_) => "number",
            Constant::String(_) => "string",
            Constant::Boolean(_) => "boolean",
            Constant::Null => "object",
            Constant::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::String(s) => {
                f.write_str("\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        _ => write!(f, "{}", ch)?,
                    }
                }
                f.write_str("\"")
            }
            other => f.write_str(&other.to_js_string()),
        }
    }
}

/// Format a number the way the language prints it: integral values have no
/// fractional part and negative zero prints as `0`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// One operand or result slot of a quadruple.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// An unused slot.
    Empty,
    /// A compiler temporary, `t<n>`.
    Temp(u32),
    /// A jump target, `L<n>`.
    Label(u32),
    /// A named variable, function, class, property or entry point.
    Name(String),
    Const(Constant),
    /// A property of an object used as a callee, `obj.prop`.
    Member {
        object: Box<Operand>,
        property: String,
    },
    /// An ordered argument list, `(a, b)`.
    Args(Vec<Operand>),
}

impl Operand {
    pub fn name(name: impl Into<String>) -> Self {
        Operand::Name(name.into())
    }

    pub fn number(value: f64) -> Self {
        Operand::Const(Constant::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Operand::Const(Constant::String(value.into()))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Operand::Empty)
    }

    pub fn as_temp(&self) -> Option<u32> {
        match self {
            Operand::Temp(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<u32> {
        match self {
            Operand::Label(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_const(&self) -> Option<&Constant> {
        match self {
            Operand::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Call `f` with every temporary this operand reads, including those
    /// nested in member callees and argument lists.
    pub fn for_each_temp(&self, f: &mut impl FnMut(u32)) {
        match self {
            Operand::Temp(n) => f(*n),
            Operand::Member { object, .. } => object.for_each_temp(f),
            Operand::Args(args) => {
                for arg in args {
                    arg.for_each_temp(f);
                }
            }
            Operand::Empty | Operand::Label(_) | Operand::Name(_) | Operand::Const(_) => {}
        }
    }

    /// Rewrite nested operands in place, innermost first.
    pub fn rewrite(&mut self, f: &mut impl FnMut(&mut Operand)) {
        match self {
            Operand::Member { object, .. } => object.rewrite(f),
            Operand::Args(args) => {
                for arg in args.iter_mut() {
                    arg.rewrite(f);
                }
            }
            _ => {}
        }
        f(self);
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Empty => Ok(()),
            Operand::Temp(n) => write!(f, "t{}", n),
            Operand::Label(n) => write!(f, "L{}", n),
            Operand::Name(name) => f.write_str(name),
            Operand::Const(c) => write!(f, "{}", c),
            Operand::Member { object, property } => write!(f, "{}.{}", object, property),
            Operand::Args(args) => {
                f.write_str("(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Empty slots serialize as `null`, everything else as its display text.
impl Serialize for Operand {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Operand::Empty => serializer.serialize_none(),
            other => serializer.collect_str(other),
        }
    }
}

/// A three-address instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quadruple {
    /// Position in its sequence.
    #[serde(skip)]
    pub index: usize,
    pub op: Opcode,
    pub arg1: Operand,
    pub arg2: Operand,
    pub res: Operand,
}

impl Quadruple {
    pub fn new(op: Opcode, arg1: Operand, arg2: Operand, res: Operand) -> Self {
        Self {
            index: 0,
            op,
            arg1,
            arg2,
            res,
        }
    }

    /// `LABEL -> L<n>`, a plain jump target.
    pub fn label(label: u32) -> Self {
        Self::new(Opcode::Label, Operand::Empty, Operand::Empty, Operand::Label(label))
    }

    /// Labels that name a method or function entry.
    pub fn is_entry_label(&self) -> bool {
        self.op == Opcode::Label && !self.arg1.is_empty()
    }

    /// The label this quadruple defines, if it is a `LABEL`.
    pub fn defined_label(&self) -> Option<u32> {
        if self.op == Opcode::Label {
            self.res.as_label()
        } else {
            None
        }
    }

    /// The label a `GOTO` or `JUMP_IF_FALSE` transfers control to.
    pub fn jump_target(&self) -> Option<u32> {
        match self.op {
            Opcode::Goto => self.arg1.as_label(),
            Opcode::JumpIfFalse => self.arg2.as_label(),
            _ => None,
        }
    }

    pub fn jump_target_mut(&mut self) -> Option<&mut Operand> {
        match self.op {
            Opcode::Goto => Some(&mut self.arg1),
            Opcode::JumpIfFalse => Some(&mut self.arg2),
            _ => None,
        }
    }

    /// Labels referenced by this quadruple other than the one it defines.
    pub fn referenced_labels(&self) -> impl Iterator<Item = u32> + '_ {
        let defines = self.op == Opcode::Label;
        [&self.arg1, &self.arg2]
            .into_iter()
            .filter(move |_| !defines)
            .filter_map(Operand::as_label)
    }
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = format!(
            "{:>4}  {:<14}{:<24}{:<24}{}",
            self.index,
            self.op.as_str(),
            self.arg1.to_string(),
            self.arg2.to_string(),
            self.res
        );
        f.write_str(line.trim_end())
    }
}

/// Assign each quadruple its position in the sequence.
pub fn renumber(code: &mut [Quadruple]) {
    for (index, quad) in code.iter_mut().enumerate() {
        quad.index = index;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::Temp(3).to_string(), "t3");
        assert_eq!(Operand::Label(1).to_string(), "L1");
        assert_eq!(Operand::Empty.to_string(), "");
        assert_eq!(
            Operand::Member { object: Box::new(Operand::name("console")), property: "log".into() }
                .to_string(),
            "console.log"
        );
        assert_eq!(
            Operand::Args(vec![Operand::number(10.0), Operand::Temp(2)]).to_string(),
            "(10, t2)"
        );
        assert_eq!(Operand::string("a \"b\"").to_string(), "\"a \\\"b\\\"\"");
    }

    #[test]
    fn test_number_format() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_opcode_names() {
        assert_eq!(Opcode::JumpIfFalse.to_string(), "JUMP_IF_FALSE");
        assert_eq!(Opcode::GetProp.as_str(), "GET_PROP");
        assert!(Opcode::Call.has_side_effects());
        assert!(!Opcode::Concat.has_side_effects());
        assert!(Opcode::Halt.is_terminator());
    }

    #[test]
    fn test_constant_semantics() {
        assert!(!Constant::Number(0.0).is_truthy());
        assert!(Constant::String("0".into()).is_truthy());
        assert_eq!(Constant::Null.type_name(), "object");
        assert_eq!(Constant::Boolean(true).to_js_string(), "true");
    }
}
