use rand::Rng;

use super::Scope;
use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::dice;
use crate::error::{ExprError, ExprResult};

/// Result of evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Numeric view: booleans count as 0 or 1.
    pub fn as_int(self) -> i64 {
        match self {
            Value::Int(n) => n,
            Value::Bool(b) => i64::from(b),
        }
    }

    /// Logical view: integers are true when non-zero.
    pub fn truthy(self) -> bool {
        match self {
            Value::Int(n) => n != 0,
            Value::Bool(b) => b,
        }
    }
}

/// Evaluate an expression tree against session state.
///
/// Identifiers resolve to an attribute value when the key is known, and to
/// inventory membership otherwise.
pub fn evaluate<S, R>(expr: &Expr, scope: &S, rng: &mut R) -> ExprResult<Value>
where
    S: Scope + ?Sized,
    R: Rng + ?Sized,
{
    match expr {
        Expr::Int(n) => Ok(Value::Int(*n)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Ident(name) => Ok(match scope.attribute(name) {
            Some(value) => Value::Int(value),
            None => Value::Bool(scope.has_item(name)),
        }),
        Expr::Dice(sides) => dice::roll(rng, *sides).map(Value::Int),
        Expr::Unary(UnaryOp::Neg, inner) => {
            let value = evaluate(inner, scope, rng)?.as_int();
            value.checked_neg().map(Value::Int).ok_or(ExprError::Overflow)
        }
        Expr::Unary(UnaryOp::Not, inner) => Ok(Value::Bool(!evaluate(inner, scope, rng)?.truthy())),
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            if !evaluate(lhs, scope, rng)?.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(evaluate(rhs, scope, rng)?.truthy()))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            if evaluate(lhs, scope, rng)?.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(evaluate(rhs, scope, rng)?.truthy()))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, scope, rng)?;
            let rhs = evaluate(rhs, scope, rng)?;
            binary(*op, lhs, rhs)
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> ExprResult<Value> {
    if let (Value::Bool(a), Value::Bool(b)) = (lhs, rhs) {
        match op {
            BinaryOp::Eq => return Ok(Value::Bool(a == b)),
            BinaryOp::NotEq => return Ok(Value::Bool(a != b)),
            _ => {}
        }
    }

    let (a, b) = (lhs.as_int(), rhs.as_int());
    let value = match op {
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Add => Value::Int(a.checked_add(b).ok_or(ExprError::Overflow)?),
        BinaryOp::Sub => Value::Int(a.checked_sub(b).ok_or(ExprError::Overflow)?),
        BinaryOp::Mul => Value::Int(a.checked_mul(b).ok_or(ExprError::Overflow)?),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(ExprError::DivisionByZero),
        BinaryOp::Div => Value::Int(a.checked_div(b).ok_or(ExprError::Overflow)?),
        BinaryOp::Rem => Value::Int(a.checked_rem(b).ok_or(ExprError::Overflow)?),
        BinaryOp::And => Value::Bool(lhs.truthy() && rhs.truthy()),
        BinaryOp::Or => Value::Bool(lhs.truthy() || rhs.truthy()),
    };
    Ok(value)
}
