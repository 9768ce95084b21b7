//! # Introduction
//!
//! scriptlet renders tag-based text templates. Literal text is copied to the
//! output, `{$= ... $}` tags evaluate a reverse Polish expression and print
//! what it leaves on the stack, and `{$ FOR i 1 10 2 $} ... {$ END $}` repeats
//! its body over a numeric range.
//!
//! ```text
//! This is {$= "sample" $} text.
//! {$ FOR i 1 3 $}  {$= i i * "0.0" @decfmt $}
//! {$ END $}
//! ```
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Lexer → Parser → Tree → Engine → Context
//! ```
//!
//! 1. [`parser`] tokenises the template and builds a [`parser::ast::DocumentNode`].
//! 2. [`interpreter`] walks the tree with an operand stack and loop bindings,
//!    calling built-ins such as `@sin`, `@decfmt` or `@pparamSet`.
//! 3. [`memory`] holds the runtime [`memory::value::Value`] and its stacks.
//! 4. [`context`] is where output and parameters live; [`RequestContext`] is an
//!    in-memory implementation.
//! 5. [`snapshot`] optionally records a step-by-step trace of a run, which
//!    [`ui`] replays in the terminal. Not part of the stable library API.

pub mod context;
pub mod interpreter;
pub mod logging;
pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod ui;

pub use context::{Context, RequestContext};
pub use interpreter::engine::Engine;
pub use interpreter::errors::{RuntimeError, TemplateError};
pub use parser::parser::{parse, ParseError};

/// Parse `source` and execute it against `context`
pub fn render<C: Context + ?Sized>(source: &str, context: &mut C) -> Result<(), TemplateError> {
    let document = parse(source)?;
    Engine::new(&document, context).execute()?;
    Ok(())
}
