//! Interactive chat module
//!
//! Provides a line-editor based chat interface over the session manager.

mod command;
mod repl;

pub use command::ReplCommand;
pub use repl::{ChatRepl, Flow};
