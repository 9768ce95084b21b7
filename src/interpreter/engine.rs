// Execution engine for parsed templates

use crate::context::Context;
use crate::interpreter::builtins::Builtin;
use crate::interpreter::constants::DEFAULT_LOOP_STEP;
use crate::interpreter::errors::RuntimeError;
use crate::memory::{
    multistack::MultiStack,
    stack::OperandStack,
    value::Value,
};
use crate::parser::ast::*;
use crate::snapshot::{Snapshot, SnapshotManager, StepKind};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Walks a parsed template and writes its output to a [`Context`]
///
/// Each engine owns its operand stack and loop bindings, so one
/// [`DocumentNode`] may be run by any number of engines at once.
pub struct Engine<'a, C: Context + ?Sized> {
    /// Template being executed
    document: &'a DocumentNode,

    /// Output sink and parameter stores
    context: &'a mut C,

    /// Operand stack shared by every echo tag; empty between tags
    stack: OperandStack,

    /// Loop variable bindings
    variables: MultiStack,

    /// Execution trace, recorded only when requested
    history: Option<SnapshotManager>,
}

impl<'a, C: Context + ?Sized> Engine<'a, C> {
    pub fn new(document: &'a DocumentNode, context: &'a mut C) -> Self {
        Engine {
            document,
            context,
            stack: OperandStack::new(),
            variables: MultiStack::new(),
            history: None,
        }
    }

    /// Record a snapshot after every step, within `memory_limit` bytes
    pub fn with_trace(mut self, memory_limit: usize) -> Self {
        self.history = Some(SnapshotManager::new(memory_limit));
        self
    }

    /// Run the template from start to finish
    pub fn execute(&mut self) -> Result<(), RuntimeError> {
        debug!(nodes = self.document.node_count(), "executing template");
        self.take_snapshot(SourceLocation::new(1, 1), StepKind::Start, Vec::new(), 0)?;

        let document = self.document;
        document.accept(self)?;

        debug!("template executed");
        Ok(())
    }

    /// Recorded trace, if [`Engine::with_trace`] was used
    pub fn history(&self) -> Option<&SnapshotManager> {
        self.history.as_ref()
    }

    pub fn into_history(self) -> Option<SnapshotManager> {
        self.history
    }

    /// Write to the context, mirroring into the trace. Returns where the text
    /// starts in the transcript.
    fn emit(&mut self, text: &str) -> Result<usize, RuntimeError> {
        self.context.write(text)?;
        Ok(match &mut self.history {
            Some(history) => {
                let start = history.transcript().len();
                history.print(text);
                start
            }
            None => 0,
        })
    }

    fn take_snapshot(
        &mut self,
        location: SourceLocation,
        kind: StepKind,
        operand_stack: Vec<Value>,
        output_start: usize,
    ) -> Result<(), RuntimeError> {
        let Some(history) = &mut self.history else {
            return Ok(());
        };
        let snapshot = Snapshot {
            location,
            kind,
            operand_stack,
            variables: self.variables.visible(),
            output_start,
            output_end: history.transcript().len(),
        };
        history.push(snapshot)
    }

    fn lookup(&self, name: &str, location: SourceLocation) -> Result<Value, RuntimeError> {
        self.variables
            .peek(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
                location,
            })
    }

    /// Push a constant or variable, or call a function/operator
    fn evaluate_element(
        &mut self,
        element: &Element,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match element {
            Element::Variable(name) => {
                let value = self.lookup(name, location)?;
                self.stack.push(value);
            }
            Element::Integer(n) => self.stack.push(Value::Int(*n)),
            Element::Double(n) => self.stack.push(Value::Double(*n)),
            Element::Str(s) => self.stack.push(Value::Str(s.clone())),
            Element::Function(name) => self.call(name, location)?,
            Element::Operator(op) => self.call(&op.to_string(), location)?,
        }
        Ok(())
    }

    fn call(&mut self, name: &str, location: SourceLocation) -> Result<(), RuntimeError> {
        let builtin = Builtin::from_name(name).ok_or_else(|| RuntimeError::MethodNotFound {
            name: name.to_string(),
            location,
        })?;
        builtin.call(&mut self.stack, &mut *self.context, location)
    }

    /// Numeric value of a loop's start, end or step element
    fn loop_bound(&self, element: &Element, location: SourceLocation) -> Result<Value, RuntimeError> {
        let value = match element {
            Element::Variable(name) => self.lookup(name, location)?,
            Element::Integer(n) => Value::Int(*n),
            Element::Double(n) => Value::Double(*n),
            Element::Str(s) => Value::Str(s.clone()),
            Element::Function(_) | Element::Operator(_) => {
                return Err(RuntimeError::InvalidElement {
                    element: element.to_string(),
                    location,
                });
            }
        };
        value
            .to_number()
            .map(Value::from)
            .map_err(|err| RuntimeError::from_value(err, location))
    }

    fn run_loop(
        &mut self,
        node: &ForLoopNode,
        end: &Value,
        step: &Value,
        descending: bool,
    ) -> Result<(), RuntimeError> {
        let location = node.location;
        loop {
            let current = self.lookup(&node.variable, location)?;
            let ordering = current
                .num_cmp(end)
                .map_err(|err| RuntimeError::from_value(err, location))?;
            let continues = matches!(
                (ordering, descending),
                (Some(Ordering::Less | Ordering::Equal), false)
                    | (Some(Ordering::Greater | Ordering::Equal), true)
            );

            self.loop_check_snapshot(node, continues)?;
            if !continues {
                return Ok(());
            }
            trace!(variable = %node.variable, value = %current, "loop iteration");

            for child in &node.children {
                child.accept(self)?;
            }

            let next = current
                .checked_step(step)
                .map_err(|err| RuntimeError::from_value(err, location))?;
            let Some(next) = next else {
                // An integer step past the i32 range is past `end` too
                trace!(variable = %node.variable, "loop step left the integer range");
                return self.loop_check_snapshot(node, false);
            };
            if let Some(slot) = self.variables.peek_mut(&node.variable) {
                *slot = next;
            }
        }
    }

    fn loop_check_snapshot(&mut self, node: &ForLoopNode, continues: bool) -> Result<(), RuntimeError> {
        let kind = StepKind::LoopCheck {
            variable: node.variable.clone(),
            continues,
        };
        let output_start = self.history.as_ref().map_or(0, |h| h.transcript().len());
        self.take_snapshot(node.location, kind, Vec::new(), output_start)
    }
}

impl<C: Context + ?Sized> NodeVisitor for Engine<'_, C> {
    type Error = RuntimeError;

    fn visit_text(&mut self, node: &TextNode) -> Result<(), RuntimeError> {
        let output_start = self.emit(&node.text)?;
        self.take_snapshot(node.location, StepKind::Text, Vec::new(), output_start)
    }

    fn visit_echo(&mut self, node: &EchoNode) -> Result<(), RuntimeError> {
        // Left over from a tag that failed part way
        self.stack.clear();
        for element in &node.elements {
            self.evaluate_element(element, node.location)?;
        }

        let operand_stack: Vec<Value> = match self.history {
            Some(_) => self.stack.iter().cloned().collect(),
            None => Vec::new(),
        };
        let text: String = self.stack.drain().map(|value| value.to_string()).collect();
        let output_start = self.emit(&text)?;
        self.take_snapshot(node.location, StepKind::Echo, operand_stack, output_start)
    }

    fn visit_for_loop(&mut self, node: &ForLoopNode) -> Result<(), RuntimeError> {
        let location = node.location;
        let start = self.loop_bound(&node.start, location)?;
        let end = self.loop_bound(&node.end, location)?;
        let step = match &node.step {
            Some(step) => self.loop_bound(step, location)?,
            None => Value::Int(DEFAULT_LOOP_STEP),
        };
        let descending = step
            .is_negative()
            .map_err(|err| RuntimeError::from_value(err, location))?;

        trace!(variable = %node.variable, %start, %end, %step, "entering loop");
        self.variables.push(&node.variable, start);
        let result = self.run_loop(node, &end, &step, descending);
        self.variables.pop(&node.variable);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::parser::parser::parse;

    fn render(source: &str) -> Result<String, RuntimeError> {
        let document = parse(source).unwrap();
        let mut context = RequestContext::buffered();
        Engine::new(&document, &mut context).execute()?;
        Ok(context.output_text())
    }

    #[test]
    fn test_text_and_echo() {
        assert_eq!(render("a{$= 1 2 + $}b").unwrap(), "a3b");
        assert_eq!(render("{$= \"x\" 1 2.5 $}").unwrap(), "x12.5");
    }

    #[test]
    fn test_loop_variable_restored_after_shadowing() {
        let output = render("{$FOR i 1 2$}{$FOR i 7 7$}{$= i $}{$END$}{$= i $}{$END$}").unwrap();
        assert_eq!(output, "7172");
    }

    #[test]
    fn test_undefined_variable() {
        let err = render("{$= nope $}").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedVariable { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_method_not_found() {
        let err = render("{$= 2 3 ^ $}").unwrap_err();
        assert!(matches!(err, RuntimeError::MethodNotFound { ref name, .. } if name == "^"));
        let err = render("{$= @nothing $}").unwrap_err();
        assert!(matches!(err, RuntimeError::MethodNotFound { .. }));
    }

    #[test]
    fn test_echo_starts_with_empty_stack() {
        let document = parse("{$= 1 $}").unwrap();
        let mut context = RequestContext::buffered();
        let mut engine = Engine::new(&document, &mut context);
        engine.stack.push(Value::from("stale"));
        engine.execute().unwrap();
        assert!(engine.stack.is_empty());
        assert_eq!(context.output_text(), "1");
    }

    #[test]
    fn test_rerun_after_failed_echo() {
        let document = parse("{$= \"left\" \"k\" \"x\" @tparamGet 1 + $}").unwrap();
        let mut context = RequestContext::buffered();
        let mut engine = Engine::new(&document, &mut context);
        assert!(matches!(engine.execute(), Err(RuntimeError::NotANumber { .. })));
        engine.context.set_temporary_parameter("k", "2".to_string());
        engine.execute().unwrap();
        assert_eq!(context.output_text(), "left3");
    }

    #[test]
    fn test_trace_records_steps() {
        let document = parse("x{$FOR i 1 2$}{$= i $}{$END$}").unwrap();
        let mut context = RequestContext::buffered();
        let mut engine = Engine::new(&document, &mut context).with_trace(1 << 20);
        engine.execute().unwrap();
        let history = engine.into_history().unwrap();

        // start, text, then check/echo twice and a final check
        assert_eq!(history.len(), 7);
        assert_eq!(history.transcript().as_str(), "x12");
        let last_echo = history.get(5).unwrap();
        assert_eq!(last_echo.kind, StepKind::Echo);
        assert_eq!(last_echo.operand_stack, vec![Value::Int(2)]);
        assert_eq!(last_echo.variables, vec![("i".to_string(), Value::Int(2))]);
        assert_eq!(&history.transcript().as_str()[last_echo.output_start..last_echo.output_end], "2");
    }
}
