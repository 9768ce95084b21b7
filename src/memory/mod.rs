//! Runtime memory model for the template engine
//!
//! - [`value`]: Runtime value representation (Int, Double, Str) and numeric coercion
//! - [`stack`]: The operand stack an echo tag is evaluated against
//! - [`multistack`]: Per-name binding stacks for loop variables
//!
//! Loop bindings live in a [`multistack::MultiStack`] rather than a flat map so
//! that nested loops may reuse a variable name; the inner binding is popped on
//! loop exit and the outer value becomes visible again.

pub mod multistack;
pub mod stack;
pub mod value;
