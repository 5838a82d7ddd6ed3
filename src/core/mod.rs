//! Core Module for dbreak
//!
//! Shared infrastructure used by every other module: the crate-wide error
//! type and the outputs command handlers produce for the renderer.

pub mod error;
pub mod output;

// Re-export commonly used types for convenience
pub use error::{DbreakError, Result};
pub use output::{Output, TableOutput, Value};
