//! Operand stack for echo evaluation
//!
//! Echo elements are evaluated in reverse Polish order against an
//! [`OperandStack`]: constants and variable values are pushed, functions and
//! operators pop their arguments and push their result. Whatever is left when
//! the tag ends is written out bottom to top.

use super::value::Value;
use thiserror::Error;

/// A pop on an empty stack, tagged with the operation that needed the value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{operation}' needs more values than the stack holds")]
pub struct StackUnderflow {
    pub operation: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Pop the top value on behalf of `operation`
    pub fn pop(&mut self, operation: &str) -> Result<Value, StackUnderflow> {
        self.values.pop().ok_or_else(|| StackUnderflow {
            operation: operation.to_string(),
        })
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Values from bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Drain all values from bottom to top, leaving the stack empty
    pub fn drain(&mut self) -> std::vec::Drain<'_, Value> {
        self.values.drain(..)
    }
}
