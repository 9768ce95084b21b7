//! Keyed stacks for loop-variable bindings
//!
//! Each loop variable name maps to its own stack of values. Entering a loop
//! pushes the variable's binding, leaving it pops the binding, so an inner
//! loop reusing an outer loop's name shadows it only for the inner loop's
//! lifetime.

use super::value::Value;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct MultiStack {
    stacks: FxHashMap<String, Vec<Value>>,
}

impl MultiStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: Value) {
        self.stacks.entry(name.to_string()).or_default().push(value);
    }

    /// Remove and return the innermost binding of `name`
    pub fn pop(&mut self, name: &str) -> Option<Value> {
        let stack = self.stacks.get_mut(name)?;
        let value = stack.pop();
        if stack.is_empty() {
            self.stacks.remove(name);
        }
        value
    }

    pub fn peek(&self, name: &str) -> Option<&Value> {
        self.stacks.get(name).and_then(|stack| stack.last())
    }

    pub fn peek_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.stacks.get_mut(name).and_then(|stack| stack.last_mut())
    }

    /// Innermost binding of every bound name, sorted by name
    pub fn visible(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<(String, Value)> = self
            .stacks
            .iter()
            .filter_map(|(name, stack)| stack.last().map(|v| (name.clone(), v.clone())))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }
}
