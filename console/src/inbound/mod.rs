//! Driving-side adapters: the command line and terminal feedback.

pub mod cli;
pub mod terminal;

pub use cli::{Cli, Command, Console, ConsoleCommand, Printer};
pub use terminal::{StdioFeedback, TerminalFeedback};
