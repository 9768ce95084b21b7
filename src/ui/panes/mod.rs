//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`source`]: Template display with tag highlighting and current line indicator
//! - [`output`]: Output written so far, with the latest write emphasized
//! - [`stack`]: Operand stack and loop variable bindings
//! - [`status`]: Status bar with keybindings and replay position
//!
//! Each pane module exports a primary `render_*` function, which draws from a
//! [`crate::snapshot::Snapshot`] and keeps no state of its own beyond scroll
//! offsets owned by the app.

pub mod output;
pub mod source;
pub mod stack;
pub mod status;

pub use output::render_output_pane;
pub use source::{highlight_template, render_source_pane, SourceScrollState};
pub use stack::render_stack_pane;
pub use status::{render_status_bar, StatusRenderData};
