//! Runtime error types for the template engine
//!
//! This module defines [`RuntimeError`], which represents all errors that can occur
//! while executing a parsed template (as opposed to lexing or parse errors), and
//! [`TemplateError`], which unifies both phases for one-shot rendering.
//!
//! All runtime errors are fatal: execution stops and output already written
//! to the context stays written.

use crate::interpreter::decfmt::PatternError;
use crate::memory::stack::StackUnderflow;
use crate::memory::value::ValueError;
use crate::parser::ast::SourceLocation;
use crate::parser::parser::ParseError;
use std::io;
use thiserror::Error;

/// Runtime errors that can occur during execution
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Function or operator with no built-in behind it
    #[error("Runtime error at {location}: method '{name}' not found")]
    MethodNotFound {
        name: String,
        location: SourceLocation,
    },

    /// An operation popped more values than the stack held
    #[error("Runtime error at {location}: stack underflow in '{operation}'")]
    StackUnderflow {
        operation: String,
        location: SourceLocation,
    },

    /// A value used as a number could not be read as one
    #[error("Runtime error at {location}: '{value}' is not a number")]
    NotANumber {
        value: String,
        location: SourceLocation,
    },

    /// Division of two integers by zero
    #[error("Runtime error at {location}: integer division by zero")]
    DivisionByZero { location: SourceLocation },

    /// Echo referenced a variable no enclosing loop binds
    #[error("Runtime error at {location}: undefined variable '{name}'")]
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// Element kind not allowed where it appeared
    #[error("Runtime error at {location}: invalid element {element}")]
    InvalidElement {
        element: String,
        location: SourceLocation,
    },

    /// `@decfmt` was given a malformed pattern
    #[error("Runtime error at {location}: {source}")]
    InvalidFormat {
        source: PatternError,
        location: SourceLocation,
    },

    /// The context failed to accept output
    #[error("Output error: {0}")]
    Output(#[from] io::Error),

    /// Snapshot history limit exceeded
    #[error("Snapshot memory limit exceeded: {current} bytes used, limit is {limit}")]
    SnapshotLimitExceeded { current: usize, limit: usize },
}

impl RuntimeError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            RuntimeError::MethodNotFound { location, .. } => Some(location),
            RuntimeError::StackUnderflow { location, .. } => Some(location),
            RuntimeError::NotANumber { location, .. } => Some(location),
            RuntimeError::DivisionByZero { location } => Some(location),
            RuntimeError::UndefinedVariable { location, .. } => Some(location),
            RuntimeError::InvalidElement { location, .. } => Some(location),
            RuntimeError::InvalidFormat { location, .. } => Some(location),
            RuntimeError::Output(_) => None,
            RuntimeError::SnapshotLimitExceeded { .. } => None,
        }
    }

    pub(crate) fn from_value(error: ValueError, location: SourceLocation) -> Self {
        match error {
            ValueError::NotANumber(value) => RuntimeError::NotANumber { value, location },
            ValueError::DivisionByZero => RuntimeError::DivisionByZero { location },
        }
    }

    pub(crate) fn from_underflow(error: StackUnderflow, location: SourceLocation) -> Self {
        RuntimeError::StackUnderflow {
            operation: error.operation,
            location,
        }
    }
}

/// Failure of either phase of rendering a template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl TemplateError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            TemplateError::Parse(err) => Some(&err.location),
            TemplateError::Runtime(err) => err.location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_errors_keep_location() {
        let location = SourceLocation::new(3, 7);
        let err = RuntimeError::from_value(ValueError::DivisionByZero, location);
        assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
        assert_eq!(err.location(), Some(&location));
        assert_eq!(
            err.to_string(),
            "Runtime error at line 3, column 7: integer division by zero"
        );
    }

    #[test]
    fn test_underflow_message() {
        let err = RuntimeError::from_underflow(
            StackUnderflow {
                operation: "dup".to_string(),
            },
            SourceLocation::new(1, 1),
        );
        assert!(err.to_string().contains("stack underflow in 'dup'"));
    }
}
