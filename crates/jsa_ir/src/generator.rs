//! Lowering of the syntax tree into quadruples.
//!
//! Top-level statements are emitted first, in source order. Function and
//! class declarations leave a `FUNCTION`/`CLASS` quadruple in place and
//! queue their bodies; each queued body is appended after the top-level code
//! as its own block, opened by an entry `LABEL` and closed by `RETURN`.

use crate::context::GenContext;
use crate::error::{GenerateError, GenerateResult};
use crate::quad::{renumber, Constant, Opcode, Operand, Quadruple};
use jsa_ast::node::*;
use jsa_ast::types::*;
use std::collections::VecDeque;
use tracing::debug;

/// A function or method body waiting to be emitted.
struct Body<'a> {
    entry: String,
    label: u32,
    parameters: &'a [Parameter<'a>],
    block: &'a Block<'a>,
}

/// Somewhere a value can be stored.
enum Place {
    Variable(String),
    Property { object: Operand, key: Operand },
}

pub struct Generator<'a> {
    ctx: GenContext,
    code: Vec<Quadruple>,
    bodies: VecDeque<Body<'a>>,
}

impl<'a> Default for Generator<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Generator<'a> {
    pub fn new() -> Self {
        Self {
            ctx: GenContext::new(),
            code: Vec::new(),
            bodies: VecDeque::new(),
        }
    }

    /// Lower a whole program.
    pub fn generate(mut self, program: &Program<'a>) -> GenerateResult<Vec<Quadruple>> {
        for stmt in program.statements {
            self.gen_statement(stmt)?;
        }
        if !self.bodies.is_empty() {
            self.emit(Opcode::Halt, Operand::Empty, Operand::Empty, Operand::Empty);
        }
        while let Some(body) = self.bodies.pop_front() {
            self.gen_body(body)?;
        }
        renumber(&mut self.code);
        debug!(
            quadruples = self.code.len(),
            temps = self.ctx.temp_count(),
            labels = self.ctx.label_count(),
            "generation complete"
        );
        Ok(self.code)
    }

    fn gen_body(&mut self, body: Body<'a>) -> GenerateResult<()> {
        let parameters = if body.parameters.is_empty() {
            Operand::Empty
        } else {
            Operand::Args(body.parameters.iter().map(|p| Operand::name(p.name.name)).collect())
        };
        self.emit(
            Opcode::Label,
            Operand::Name(body.entry),
            parameters,
            Operand::Label(body.label),
        );
        for stmt in body.block.statements {
            self.gen_statement(stmt)?;
        }
        if self.code.last().map(|q| q.op) != Some(Opcode::Return) {
            self.emit(Opcode::Return, Operand::Empty, Operand::Empty, Operand::Empty);
        }
        Ok(())
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn gen_statement(&mut self, stmt: &'a Statement<'a>) -> GenerateResult<()> {
        match stmt {
            Statement::VariableStatement(n) => {
                for decl in n.declarations {
                    let value = match decl.initializer {
                        Some(init) => self.gen_expression(init)?,
                        None => Operand::Const(Constant::Undefined),
                    };
                    self.emit(Opcode::Assign, value, Operand::Empty, Operand::name(decl.name.name));
                }
            }
            Statement::FunctionDeclaration(n) => {
                let label = self.ctx.new_label();
                self.emit(
                    Opcode::Function,
                    Operand::Label(label),
                    Operand::Empty,
                    Operand::name(n.name.name),
                );
                self.bodies.push_back(Body {
                    entry: n.name.name.to_string(),
                    label,
                    parameters: n.parameters,
                    block: &n.body,
                });
            }
            Statement::ClassDeclaration(n) => self.gen_class(n)?,
            Statement::Block(n) => {
                for stmt in n.statements {
                    self.gen_statement(stmt)?;
                }
            }
            Statement::EmptyStatement(_) => {}
            Statement::ExpressionStatement(n) => {
                self.gen_expression(n.expression)?;
            }
            Statement::IfStatement(n) => self.gen_if(n)?,
            Statement::ReturnStatement(n) => {
                let value = match n.expression {
                    Some(expr) => self.gen_expression(expr)?,
                    None => Operand::Empty,
                };
                self.emit(Opcode::Return, value, Operand::Empty, Operand::Empty);
            }
            Statement::Error(n) => return Err(error_node(&n.data)),
        }
        Ok(())
    }

    fn gen_class(&mut self, node: &'a ClassDeclaration<'a>) -> GenerateResult<()> {
        let heritage = match node.heritage {
            Some(expr) => self.gen_expression(expr)?,
            None => Operand::Empty,
        };
        self.emit(Opcode::Class, heritage, Operand::Empty, Operand::name(node.name.name));
        for member in node.members {
            match member {
                ClassElement::Method(method) => {
                    let label = self.ctx.new_label();
                    self.bodies.push_back(Body {
                        entry: format!("{}.{}", node.name.name, method.name.name),
                        label,
                        parameters: method.parameters,
                        block: &method.body,
                    });
                }
                ClassElement::Error(n) => return Err(error_node(&n.data)),
            }
        }
        Ok(())
    }

    fn gen_if(&mut self, node: &'a IfStatement<'a>) -> GenerateResult<()> {
        let condition = self.gen_expression(node.condition)?;
        match node.else_statement {
            Some(else_stmt) => {
                let else_label = self.ctx.new_label();
                let end_label = self.ctx.new_label();
                self.jump_if_false(condition, else_label);
                self.gen_statement(node.then_statement)?;
                self.goto(end_label);
                self.emit_label(else_label);
                self.gen_statement(else_stmt)?;
                self.emit_label(end_label);
            }
            None => {
                let end_label = self.ctx.new_label();
                self.jump_if_false(condition, end_label);
                self.gen_statement(node.then_statement)?;
                self.emit_label(end_label);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Lower an expression and return the operand holding its value.
    /// Names and literals are returned directly without emitting anything.
    fn gen_expression(&mut self, expr: &Expression<'a>) -> GenerateResult<Operand> {
        let operand = match expr {
            Expression::Identifier(id) => Operand::name(id.name),
            Expression::Literal(lit) => Operand::Const(constant(&lit.value)),
            Expression::This(_) => Operand::name("this"),
            Expression::Template(n) => {
                let mut acc = Operand::string(n.head);
                for span in n.spans {
                    let value = self.gen_expression(&span.expression)?;
                    acc = self.emit_value(Opcode::Concat, acc, value);
                    if !span.literal.is_empty() {
                        acc = self.emit_value(Opcode::Concat, acc, Operand::string(span.literal));
                    }
                }
                acc
            }
            Expression::ArrayLiteral(n) => {
                let elements = self.gen_operands(n.elements)?;
                let result = self.ctx.new_temp();
                let elements = if elements.is_empty() {
                    Operand::Empty
                } else {
                    Operand::Args(elements)
                };
                self.emit(Opcode::NewArray, elements, Operand::Empty, result.clone());
                result
            }
            Expression::ObjectLiteral(n) => {
                let object = self.ctx.new_temp();
                self.emit(Opcode::NewObject, Operand::Empty, Operand::Empty, object.clone());
                for prop in n.properties {
                    let value = self.gen_expression(&prop.initializer)?;
                    self.emit(Opcode::SetProp, value, Operand::name(prop.key), object.clone());
                }
                object
            }
            Expression::PropertyAccess(n) => {
                let object = self.gen_expression(n.expression)?;
                self.emit_value(Opcode::GetProp, object, Operand::name(n.name.name))
            }
            Expression::ElementAccess(n) => {
                let object = self.gen_expression(n.expression)?;
                let object = self.pin_before(object, std::slice::from_ref(n.argument));
                let key = self.gen_expression(n.argument)?;
                self.emit_value(Opcode::GetProp, object, key)
            }
            Expression::Call(n) => {
                let callee = match n.expression {
                    Expression::PropertyAccess(access) => {
                        let object = self.gen_expression(access.expression)?;
                        Operand::Member {
                            object: Box::new(object),
                            property: access.name.name.to_string(),
                        }
                    }
                    other => self.gen_expression(other)?,
                };
                let callee = self.pin_before(callee, n.arguments);
                let arguments = self.gen_operands(n.arguments)?;
                self.emit_value(Opcode::Call, callee, Operand::Args(arguments))
            }
            Expression::New(n) => {
                let callee = self.gen_expression(n.expression)?;
                let callee = self.pin_before(callee, n.arguments);
                let arguments = self.gen_operands(n.arguments)?;
                self.emit_value(Opcode::New, callee, Operand::Args(arguments))
            }
            Expression::PrefixUnary(n) => {
                let operand = self.gen_expression(n.operand)?;
                let op = match n.operator {
                    UnaryOperator::Minus => Opcode::Neg,
                    UnaryOperator::Plus => Opcode::ToNumber,
                    UnaryOperator::Not => Opcode::Not,
                    UnaryOperator::TypeOf => Opcode::Typeof,
                };
                self.emit_value(op, operand, Operand::Empty)
            }
            Expression::Update(n) => self.gen_update(n)?,
            Expression::Binary(n) if n.operator.is_logical() => self.gen_logical(n)?,
            Expression::Binary(n) => {
                let left = self.gen_expression(n.left)?;
                let left = self.pin_before(left, std::slice::from_ref(n.right));
                let right = self.gen_expression(n.right)?;
                self.emit_value(binary_opcode(n.operator), left, right)
            }
            Expression::Assignment(n) => self.gen_assignment(n)?,
            Expression::Conditional(n) => self.gen_conditional(n)?,
            Expression::Error(n) => return Err(error_node(&n.data)),
        };
        Ok(operand)
    }

    /// Lower operands left to right. A name is copied into a temporary when
    /// a later operand of the same list writes it.
    fn gen_operands(&mut self, exprs: &[Expression<'a>]) -> GenerateResult<Vec<Operand>> {
        let mut operands = Vec::with_capacity(exprs.len());
        for (i, expr) in exprs.iter().enumerate() {
            let operand = self.gen_expression(expr)?;
            operands.push(self.pin_before(operand, &exprs[i + 1..]));
        }
        Ok(operands)
    }

    /// Snapshot `operand` into a fresh temporary if it reads a variable that
    /// one of `later` assigns or updates. Also applies to the object of a
    /// method callee.
    fn pin_before(&mut self, operand: Operand, later: &[Expression<'a>]) -> Operand {
        match operand {
            Operand::Name(name) if later.iter().any(|e| writes_name(e, &name)) => {
                let copy = self.ctx.new_temp();
                self.emit(Opcode::Assign, Operand::Name(name), Operand::Empty, copy.clone());
                copy
            }
            Operand::Member { object, property } => Operand::Member {
                object: Box::new(self.pin_before(*object, later)),
                property,
            },
            other => other,
        }
    }

    fn gen_assignment(&mut self, node: &AssignmentExpression<'a>) -> GenerateResult<Operand> {
        let place = self.gen_place(node.target)?;
        let value = match node.operator.binary_operator() {
            None => self.gen_expression(node.value)?,
            Some(op) => {
                let current = self.read_place(&place);
                let current = self.pin_before(current, std::slice::from_ref(node.value));
                let rhs = self.gen_expression(node.value)?;
                self.emit_value(binary_opcode(op), current, rhs)
            }
        };
        let result = match &place {
            Place::Variable(name) => Operand::name(name.as_str()),
            Place::Property { .. } => value.clone(),
        };
        self.write_place(place, value);
        Ok(result)
    }

    /// `++`/`--` expand to a read, an add or subtract, and a write back.
    fn gen_update(&mut self, node: &UpdateExpression<'a>) -> GenerateResult<Operand> {
        let place = self.gen_place(node.operand)?;
        let current = self.read_place(&place);
        let old = match (&place, node.prefix) {
            (Place::Variable(_), false) => {
                let copy = self.ctx.new_temp();
                self.emit(Opcode::Assign, current, Operand::Empty, copy.clone());
                copy
            }
            _ => current,
        };
        let op = binary_opcode(node.operator.binary_operator());
        let updated = self.emit_value(op, old.clone(), Operand::number(1.0));
        self.write_place(place, updated.clone());
        Ok(if node.prefix { updated } else { old })
    }

    /// `&&` and `||` become plain `AND`/`OR` when the right operand cannot
    /// have side effects, and branch around it otherwise.
    fn gen_logical(&mut self, node: &BinaryExpression<'a>) -> GenerateResult<Operand> {
        let left = self.gen_expression(node.left)?;
        if is_side_effect_free(node.right) {
            let right = self.gen_expression(node.right)?;
            return Ok(self.emit_value(binary_opcode(node.operator), left, right));
        }

        let result = self.ctx.new_temp();
        self.emit(Opcode::Assign, left, Operand::Empty, result.clone());
        let end_label = self.ctx.new_label();
        let condition = match node.operator {
            BinaryOperator::LogicalOr => self.emit_value(Opcode::Not, result.clone(), Operand::Empty),
            _ => result.clone(),
        };
        self.jump_if_false(condition, end_label);
        let right = self.gen_expression(node.right)?;
        self.emit(Opcode::Assign, right, Operand::Empty, result.clone());
        self.emit_label(end_label);
        Ok(result)
    }

    fn gen_conditional(&mut self, node: &ConditionalExpression<'a>) -> GenerateResult<Operand> {
        let condition = self.gen_expression(node.condition)?;
        let else_label = self.ctx.new_label();
        let end_label = self.ctx.new_label();
        let result = self.ctx.new_temp();

        self.jump_if_false(condition, else_label);
        let when_true = self.gen_expression(node.when_true)?;
        self.emit(Opcode::Assign, when_true, Operand::Empty, result.clone());
        self.goto(end_label);
        self.emit_label(else_label);
        let when_false = self.gen_expression(node.when_false)?;
        self.emit(Opcode::Assign, when_false, Operand::Empty, result.clone());
        self.emit_label(end_label);
        Ok(result)
    }

    // ========================================================================
    // Places
    // ========================================================================

    fn gen_place(&mut self, target: &Expression<'a>) -> GenerateResult<Place> {
        match target {
            Expression::Identifier(id) => Ok(Place::Variable(id.name.to_string())),
            Expression::PropertyAccess(n) => {
                let object = self.gen_expression(n.expression)?;
                Ok(Place::Property {
                    object,
                    key: Operand::name(n.name.name),
                })
            }
            Expression::ElementAccess(n) => {
                let object = self.gen_expression(n.expression)?;
                let object = self.pin_before(object, std::slice::from_ref(n.argument));
                let key = self.gen_expression(n.argument)?;
                Ok(Place::Property { object, key })
            }
            other => {
                let position = other.position();
                Err(GenerateError::InvalidTarget {
                    line: position.line,
                    column: position.column,
                })
            }
        }
    }

    fn read_place(&mut self, place: &Place) -> Operand {
        match place {
            Place::Variable(name) => Operand::name(name.as_str()),
            Place::Property { object, key } => {
                self.emit_value(Opcode::GetProp, object.clone(), key.clone())
            }
        }
    }

    fn write_place(&mut self, place: Place, value: Operand) {
        match place {
            Place::Variable(name) => {
                self.emit(Opcode::Assign, value, Operand::Empty, Operand::Name(name))
            }
            Place::Property { object, key } => self.emit(Opcode::SetProp, value, key, object),
        }
    }

    // ========================================================================
    // Emission
    // ========================================================================

    fn emit(&mut self, op: Opcode, arg1: Operand, arg2: Operand, res: Operand) {
        self.code.push(Quadruple::new(op, arg1, arg2, res));
    }

    /// Emit `op` into a fresh temporary and return it.
    fn emit_value(&mut self, op: Opcode, arg1: Operand, arg2: Operand) -> Operand {
        let result = self.ctx.new_temp();
        self.emit(op, arg1, arg2, result.clone());
        result
    }

    fn emit_label(&mut self, label: u32) {
        self.code.push(Quadruple::label(label));
    }

    fn goto(&mut self, label: u32) {
        self.emit(Opcode::Goto, Operand::Label(label), Operand::Empty, Operand::Empty);
    }

    fn jump_if_false(&mut self, condition: Operand, label: u32) {
        self.emit(Opcode::JumpIfFalse, condition, Operand::Label(label), Operand::Empty);
    }
}

fn error_node(data: &NodeData) -> GenerateError {
    GenerateError::ErrorNode {
        line: data.position.line,
        column: data.position.column,
    }
}

fn constant(value: &LiteralValue<'_>) -> Constant {
    match value {
        LiteralValue::Number(n) => Constant::Number(*n),
        LiteralValue::String(s) => Constant::String(s.to_string()),
        LiteralValue::Boolean(b) => Constant::Boolean(*b),
        LiteralValue::Null => Constant::Null,
    }
}

fn binary_opcode(op: BinaryOperator) -> Opcode {
    match op {
        BinaryOperator::Add => Opcode::Add,
        BinaryOperator::Subtract => Opcode::Sub,
        BinaryOperator::Multiply => Opcode::Mul,
        BinaryOperator::Divide => Opcode::Div,
        BinaryOperator::Remainder => Opcode::Mod,
        BinaryOperator::Equals => Opcode::Eq,
        BinaryOperator::NotEquals => Opcode::Ne,
        BinaryOperator::StrictEquals => Opcode::StrictEq,
        BinaryOperator::StrictNotEquals => Opcode::StrictNe,
        BinaryOperator::LessThan => Opcode::Lt,
        BinaryOperator::GreaterThan => Opcode::Gt,
        BinaryOperator::LessThanOrEqual => Opcode::Le,
        BinaryOperator::GreaterThanOrEqual => Opcode::Ge,
        BinaryOperator::LogicalAnd => Opcode::And,
        BinaryOperator::LogicalOr => Opcode::Or,
    }
}

/// Expressions whose evaluation cannot be observed apart from their value.
fn is_side_effect_free(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::Identifier(_) | Expression::Literal(_) | Expression::This(_) => true,
        Expression::Template(n) => n.spans.iter().all(|s| is_side_effect_free(&s.expression)),
        Expression::PrefixUnary(n) => is_side_effect_free(n.operand),
        Expression::Binary(n) => is_side_effect_free(n.left) && is_side_effect_free(n.right),
        _ => false,
    }
}

/// Whether evaluating `expr` assigns to or updates the variable `name`.
fn writes_name(expr: &Expression<'_>, name: &str) -> bool {
    let targets =
        |target: &Expression<'_>| matches!(target, Expression::Identifier(id) if id.name == name);
    match expr {
        Expression::Identifier(_)
        | Expression::Literal(_)
        | Expression::This(_)
        | Expression::Error(_) => false,
        Expression::Template(n) => n.spans.iter().any(|s| writes_name(&s.expression, name)),
        Expression::ArrayLiteral(n) => n.elements.iter().any(|e| writes_name(e, name)),
        Expression::ObjectLiteral(n) => {
            n.properties.iter().any(|p| writes_name(&p.initializer, name))
        }
        Expression::PropertyAccess(n) => writes_name(n.expression, name),
        Expression::ElementAccess(n) => {
            writes_name(n.expression, name) || writes_name(n.argument, name)
        }
        Expression::Call(n) => {
            writes_name(n.expression, name) || n.arguments.iter().any(|e| writes_name(e, name))
        }
        Expression::New(n) => {
            writes_name(n.expression, name) || n.arguments.iter().any(|e| writes_name(e, name))
        }
        Expression::PrefixUnary(n) => writes_name(n.operand, name),
        Expression::Update(n) => targets(n.operand) || writes_name(n.operand, name),
        Expression::Binary(n) => writes_name(n.left, name) || writes_name(n.right, name),
        Expression::Assignment(n) => {
            targets(n.target) || writes_name(n.target, name) || writes_name(n.value, name)
        }
        Expression::Conditional(n) => {
            writes_name(n.condition, name)
                || writes_name(n.when_true, name)
                || writes_name(n.when_false, name)
        }
    }
}
