//! Runtime value representation
//!
//! This module defines the [`Value`] enum, the tagged union every operand-stack
//! slot and loop variable holds, together with the numeric coercion rules used
//! by arithmetic built-ins and loop bounds.
//!
//! # Coercion
//!
//! - [`Value::Int`] and [`Value::Double`] are used as they are.
//! - [`Value::Str`] is parsed as a 32-bit integer first, then as a double;
//!   if neither succeeds the value is "not a number". `NaN` and `Infinity`
//!   are the only spellings accepted without digits.
//! - A binary operation is done in doubles when either side is a double,
//!   otherwise in integers. Integer division by zero is an error; double
//!   division by zero yields an infinity or NaN.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Runtime values in the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Double(f64),
    Str(String),
}

/// A value after numeric coercion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i32),
    Double(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Double(n) => n,
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(n) => Value::Int(n),
            Number::Double(n) => Value::Double(n),
        }
    }
}

/// Failures of numeric coercion and arithmetic
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("integer division by zero")]
    DivisionByZero,
}

/// The four arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithmeticOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(ArithmeticOp::Add),
            "-" => Some(ArithmeticOp::Sub),
            "*" => Some(ArithmeticOp::Mul),
            "/" => Some(ArithmeticOp::Div),
            _ => None,
        }
    }

    fn apply_int(self, a: i32, b: i32) -> Result<i32, ValueError> {
        // Overflow saturates at the i32 bounds
        match self {
            ArithmeticOp::Add => Ok(a.saturating_add(b)),
            ArithmeticOp::Sub => Ok(a.saturating_sub(b)),
            ArithmeticOp::Mul => Ok(a.saturating_mul(b)),
            ArithmeticOp::Div => {
                if b == 0 {
                    Err(ValueError::DivisionByZero)
                } else {
                    Ok(a.saturating_div(b))
                }
            }
        }
    }

    fn apply_double(self, a: f64, b: f64) -> f64 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Sub => a - b,
            ArithmeticOp::Mul => a * b,
            ArithmeticOp::Div => a / b,
        }
    }
}

impl Value {
    /// Numeric view of this value
    pub fn to_number(&self) -> Result<Number, ValueError> {
        match self {
            Value::Int(n) => Ok(Number::Int(*n)),
            Value::Double(n) => Ok(Number::Double(*n)),
            Value::Str(s) => parse_number(s),
        }
    }

    pub fn to_f64(&self) -> Result<f64, ValueError> {
        self.to_number().map(Number::as_f64)
    }

    /// Apply `op` with `self` on the left and `other` on the right
    pub fn arithmetic(&self, op: ArithmeticOp, other: &Value) -> Result<Value, ValueError> {
        match (self.to_number()?, other.to_number()?) {
            (Number::Int(a), Number::Int(b)) => op.apply_int(a, b).map(Value::Int),
            (a, b) => Ok(Value::Double(op.apply_double(a.as_f64(), b.as_f64()))),
        }
    }

    /// Numeric comparison after coercion. `None` when either side is NaN.
    pub fn num_cmp(&self, other: &Value) -> Result<Option<Ordering>, ValueError> {
        match (self.to_number()?, other.to_number()?) {
            (Number::Int(a), Number::Int(b)) => Ok(Some(a.cmp(&b))),
            (a, b) => Ok(a.as_f64().partial_cmp(&b.as_f64())),
        }
    }

    /// `self + step` for advancing a loop variable. `None` when an integer sum
    /// would leave the i32 range.
    pub fn checked_step(&self, step: &Value) -> Result<Option<Value>, ValueError> {
        match (self.to_number()?, step.to_number()?) {
            (Number::Int(a), Number::Int(b)) => Ok(a.checked_add(b).map(Value::Int)),
            _ => self.arithmetic(ArithmeticOp::Add, step).map(Some),
        }
    }

    pub fn is_negative(&self) -> Result<bool, ValueError> {
        Ok(match self.to_number()? {
            Number::Int(n) => n < 0,
            Number::Double(n) => n < 0.0,
        })
    }

    /// Short type name for diagnostics and the explorer
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
        }
    }
}

fn parse_number(text: &str) -> Result<Number, ValueError> {
    if let Ok(n) = text.parse::<i32>() {
        return Ok(Number::Int(n));
    }
    let trimmed = text.trim();
    // Only the exact spellings `NaN` and `Infinity` may lack digits
    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    let has_digit = trimmed.bytes().any(|b| b.is_ascii_digit());
    if !has_digit && unsigned != "NaN" && unsigned != "Infinity" {
        return Err(ValueError::NotANumber(text.to_string()));
    }
    trimmed
        .parse::<f64>()
        .map(Number::Double)
        .map_err(|_| ValueError::NotANumber(text.to_string()))
}

/// Formats a double the way generated pages expect: `1.0`, `0.001`,
/// `1.0E7`, `1.5E-4`, `Infinity`, `NaN`.
pub fn format_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-3..1e7).contains(&magnitude) {
        let text = value.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    } else {
        let text = format!("{:e}", value);
        let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
        if mantissa.contains('.') {
            format!("{}E{}", mantissa, exponent)
        } else {
            format!("{}.0E{}", mantissa, exponent)
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Double(n) => write!(f, "{}", format_double(*n)),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}
