//! dbreak Error Module
//!
//! This module defines the error types shared by the parser, the connection
//! layer, the session and the command handlers. Every failure is local to a
//! single dispatch call except a session that cannot be built at all.
use thiserror::Error;

/// Comprehensive error type for dbreak.
///
/// `!exit` is reported through [`crate::commands::CommandOutcome::Exit`],
/// not through this enum.
#[derive(Error, Debug)]
pub enum DbreakError {
    /// A command prefix was used with a name that is not in the command table
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The argument text did not match the command's declared arity
    #[error("Command '{command}' expects {expected} argument(s), found {found}")]
    WrongNumberOfArguments {
        command: String,
        expected: usize,
        found: usize,
    },

    /// A connection name that is not part of the session
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// A connection name that is already bound to a different connection
    #[error("Connection already exists: {0}")]
    ConnectionAlreadyExists(String),

    /// The object is neither a wrapper nor handled by any registered wrapper
    #[error("No connection wrapper handles objects of type {0}")]
    UnsupportedConnection(&'static str),

    /// The statement text holds more than one statement
    #[error("You can only execute one statement at a time.")]
    MultipleStatements,

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors raised by the bundled SQLite driver, carried unchanged
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Errors raised by an embedder-supplied driver, carried unchanged
    #[error("Driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbreakError {
    /// Stable kind name shown to the operator next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            DbreakError::UnknownCommand(_) => "UnknownCommandError",
            DbreakError::WrongNumberOfArguments { .. } => "WrongNumberOfArgumentsError",
            DbreakError::ConnectionNotFound(_) => "ConnectionNotFoundError",
            DbreakError::ConnectionAlreadyExists(_) => "ConnectionAlreadyExistsError",
            DbreakError::UnsupportedConnection(_) => "TypeError",
            DbreakError::MultipleStatements => "MultipleStatementsError",
            DbreakError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => "FileNotFoundError",
            DbreakError::Io(_) => "IOError",
            DbreakError::Database(_) => "DatabaseError",
            DbreakError::Driver(_) => "DriverError",
            DbreakError::Config(_) => "ConfigError",
            DbreakError::Json(_) => "JsonError",
        }
    }
}

/// Type alias for Result to use DbreakError as the error type.
pub type Result<T> = std::result::Result<T, DbreakError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbreakError::UnknownCommand("frobnicate".to_string());
        assert_eq!(err.to_string(), "Unknown command: frobnicate");

        let err = DbreakError::WrongNumberOfArguments {
            command: "switch".to_string(),
            expected: 1,
            found: 3,
        };
        assert!(err.to_string().contains("expects 1 argument(s), found 3"));
    }

    #[test]
    fn test_error_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DbreakError = io_err.into();
        assert_eq!(err.kind(), "FileNotFoundError");

        let err = DbreakError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert_eq!(err.kind(), "DatabaseError");

        assert_eq!(
            DbreakError::ConnectionNotFound("x".to_string()).kind(),
            "ConnectionNotFoundError"
        );
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        match DbreakError::from(json_err) {
            DbreakError::Json(_) => {}
            other => panic!("Expected JSON error, got {other:?}"),
        }
    }
}
