//! Terminal explorer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI replays a trace recorded by [`Engine::with_trace`] and is organized
//! into three layers:
//!
//! - **[`app`]**: replay position, keyboard event loop, pane focus, auto-play
//! - **[`panes`]**: render functions for each visible pane (template, output,
//!   stack and variables, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! [`Engine::with_trace`]: crate::interpreter::engine::Engine::with_trace

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
