// Core infrastructure modules
pub mod core;

// Connection handling and session state
pub mod connections;
pub mod session;

// Command line parsing and dispatch
pub mod commands;
pub mod parser;

// Console
pub mod config;
pub mod render;
pub mod repl;

#[cfg(test)]
mod test_utils;

pub use commands::{execute_command, CommandOutcome, CommandSpec};
pub use connections::{register_wrapper, Connection, ConnectionWrapper, WrapperKind, WrapperVariant};
pub use crate::core::{DbreakError, Output, Result, TableOutput, Value};
pub use session::DebugSession;
