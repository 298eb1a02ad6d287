use std::{cmp::Ordering, fmt::Display};

use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};

use crate::ast::InfixOperator;

use super::ExecutionErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(BigInt),
    Float(f64),
    String(String),
    Boolean(bool),
}

/// A value seen as a number. Booleans count as `0` and `1`.
#[derive(Debug, Clone)]
enum Number {
    Integer(BigInt),
    Float(f64),
}

impl Number {
    fn to_f64(&self) -> f64 {
        match self {
            Number::Integer(n) => integer_to_f64(n),
            Number::Float(f) => *f,
        }
    }

    fn cmp(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

fn integer_to_f64(n: &BigInt) -> f64 {
    n.to_f64().unwrap_or(if n.is_negative() {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    })
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => !n.is_zero(),
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
        }
    }

    /// Turns an integral float into an integer. Applied once to the result of a whole
    /// expression.
    pub fn normalize(self) -> Value {
        match self {
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => match BigInt::from_f64(f) {
                Some(n) => Value::Integer(n),
                None => Value::Float(f),
            },
            value => value,
        }
    }

    fn number(&self) -> Option<Number> {
        match self {
            Value::Integer(n) => Some(Number::Integer(n.clone())),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::Boolean(b) => Some(Number::Integer(BigInt::from(u8::from(*b)))),
            Value::String(_) => None,
        }
    }

    pub fn negate(self) -> Result<Value, ExecutionErrorKind> {
        match self.number() {
            Some(Number::Integer(n)) => Ok(Value::Integer(-n)),
            Some(Number::Float(f)) => Ok(Value::Float(-f)),
            None => Err(ExecutionErrorKind::InvalidNegate(self)),
        }
    }

    pub fn add(self, rhs: Value) -> Result<Value, ExecutionErrorKind> {
        if matches!(self, Value::String(_)) || matches!(rhs, Value::String(_)) {
            return Ok(Value::String(format!("{}{}", self, rhs)));
        }
        match (self.number(), rhs.number()) {
            (Some(Number::Integer(a)), Some(Number::Integer(b))) => Ok(Value::Integer(a + b)),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() + b.to_f64())),
            _ => Err(ExecutionErrorKind::InvalidAdd(self, rhs)),
        }
    }

    pub fn sub(self, rhs: Value) -> Result<Value, ExecutionErrorKind> {
        match (self.number(), rhs.number()) {
            (Some(Number::Integer(a)), Some(Number::Integer(b))) => Ok(Value::Integer(a - b)),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() - b.to_f64())),
            _ => Err(ExecutionErrorKind::InvalidSub(self, rhs)),
        }
    }

    pub fn mul(self, rhs: Value) -> Result<Value, ExecutionErrorKind> {
        match (&self, &rhs) {
            (Value::String(s), count) | (count, Value::String(s)) => {
                if let Some(Number::Integer(n)) = count.number() {
                    return repeat(s, &n);
                }
            }
            _ => {}
        }
        match (self.number(), rhs.number()) {
            (Some(Number::Integer(a)), Some(Number::Integer(b))) => Ok(Value::Integer(a * b)),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() * b.to_f64())),
            _ => Err(ExecutionErrorKind::InvalidMult(self, rhs)),
        }
    }

    /// Division always produces a float.
    pub fn div(self, rhs: Value) -> Result<Value, ExecutionErrorKind> {
        match (self.number(), rhs.number()) {
            (Some(a), Some(b)) => {
                let divisor = b.to_f64();
                if divisor == 0.0 {
                    return Err(ExecutionErrorKind::DivisionByZero);
                }
                Ok(Value::Float(a.to_f64() / divisor))
            }
            _ => Err(ExecutionErrorKind::InvalidDiv(self, rhs)),
        }
    }

    pub fn pow(self, rhs: Value) -> Result<Value, ExecutionErrorKind> {
        match (self.number(), rhs.number()) {
            (Some(Number::Integer(base)), Some(Number::Integer(exponent))) => {
                if exponent.is_negative() {
                    if base.is_zero() {
                        return Err(ExecutionErrorKind::DivisionByZero);
                    }
                    return Ok(Value::Float(
                        integer_to_f64(&base).powf(integer_to_f64(&exponent)),
                    ));
                }
                let exponent = exponent
                    .to_u32()
                    .ok_or(ExecutionErrorKind::IntegerOverflow)?;
                Ok(Value::Integer(base.pow(exponent)))
            }
            (Some(base), Some(exponent)) => {
                let (base, exponent) = (base.to_f64(), exponent.to_f64());
                if base == 0.0 && exponent < 0.0 {
                    return Err(ExecutionErrorKind::DivisionByZero);
                }
                if base < 0.0 && exponent.fract() != 0.0 {
                    return Err(ExecutionErrorKind::PowerDomain(self, rhs));
                }
                Ok(Value::Float(base.powf(exponent)))
            }
            _ => Err(ExecutionErrorKind::InvalidPow(self, rhs)),
        }
    }

    /// Equality never fails; values of unrelated kinds are simply unequal.
    pub fn equals(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::String(a), Value::String(b)) => a == b,
            (a, b) => match (a.number(), b.number()) {
                (Some(a), Some(b)) => a.cmp(&b) == Some(Ordering::Equal),
                _ => false,
            },
        }
    }

    /// Orders two numbers or two strings. `None` when the kinds cannot be ordered;
    /// `Some(None)` when they can but are unordered, as with NaN.
    fn ordering(&self, rhs: &Value) -> Option<Option<Ordering>> {
        match (self, rhs) {
            (Value::String(a), Value::String(b)) => Some(Some(a.cmp(b))),
            (a, b) => match (a.number(), b.number()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        }
    }

    fn compare(
        self,
        rhs: Value,
        test: fn(Ordering) -> bool,
        invalid: fn(Value, Value) -> ExecutionErrorKind,
    ) -> Result<Value, ExecutionErrorKind> {
        match self.ordering(&rhs) {
            Some(ordering) => Ok(Value::Boolean(ordering.map_or(false, test))),
            None => Err(invalid(self, rhs)),
        }
    }
}

fn repeat(s: &str, count: &BigInt) -> Result<Value, ExecutionErrorKind> {
    if count.is_negative() {
        return Ok(Value::String(String::new()));
    }
    let count = count.to_usize().ok_or(ExecutionErrorKind::IntegerOverflow)?;
    Ok(Value::String(s.repeat(count)))
}

/// Applies a non-short-circuiting infix operator to two evaluated operands.
pub fn binary(lhs: Value, op: InfixOperator, rhs: Value) -> Result<Value, ExecutionErrorKind> {
    match op {
        InfixOperator::Plus => lhs.add(rhs),
        InfixOperator::Minus => lhs.sub(rhs),
        InfixOperator::Multiply => lhs.mul(rhs),
        InfixOperator::Divide => lhs.div(rhs),
        InfixOperator::Power => lhs.pow(rhs),
        InfixOperator::Equal => Ok(Value::Boolean(lhs.equals(&rhs))),
        InfixOperator::NotEqual => Ok(Value::Boolean(!lhs.equals(&rhs))),
        InfixOperator::LessThan => {
            lhs.compare(rhs, Ordering::is_lt, ExecutionErrorKind::InvalidLess)
        }
        InfixOperator::LessThanOrEqual => {
            lhs.compare(rhs, Ordering::is_le, ExecutionErrorKind::InvalidLessEqual)
        }
        InfixOperator::GreaterThan => {
            lhs.compare(rhs, Ordering::is_gt, ExecutionErrorKind::InvalidGreater)
        }
        InfixOperator::GreaterThanOrEqual => {
            lhs.compare(rhs, Ordering::is_ge, ExecutionErrorKind::InvalidGreaterEqual)
        }
        InfixOperator::And => Ok(if lhs.is_truthy() { rhs } else { lhs }),
        InfixOperator::Or => Ok(if lhs.is_truthy() { lhs } else { rhs }),
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", format_float(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
        }
    }
}

// Shortest round-trip digits, `.0` on integral values, two-digit signed exponents.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let repr = format!("{:?}", n);
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => repr,
    }
}
