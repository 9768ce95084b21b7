//! Template execution engine
//!
//! This module provides the core execution logic:
//! - [`engine`]: The [`engine::Engine`] visitor that walks a parsed template
//! - [`builtins`]: Functions and operators callable from echo tags
//! - [`decfmt`]: Decimal pattern formatting behind `@decfmt`
//! - [`errors`]: Runtime error types
//! - [`constants`]: Defaults shared with the CLI
//!
//! # Execution Model
//!
//! Text nodes are written as they are. Echo tags are evaluated in reverse
//! Polish order on an operand stack and whatever remains is written bottom to
//! top. A `FOR` loop binds its variable, runs its body while the variable has
//! not passed the end bound (in the direction of the step), adds the step and
//! finally unbinds the variable.

pub mod builtins;
pub mod constants;
pub mod decfmt;
pub mod engine;
pub mod errors;
