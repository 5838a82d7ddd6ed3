//! # Test Utilities Module
//!
//! Shared fixtures for the unit tests: in-memory SQLite connections and
//! sessions, plus a custom connection type with its own wrapper and custom
//! command.

use crate::commands::{CommandOutcome, CommandSpec};
use crate::connections::{
    ConnectionWrapper, NamedConnections, RawConnection, SqliteWrapper, WrapperKind,
};
use crate::core::{DbreakError, Output, Result};
use crate::session::DebugSession;
use rusqlite::Connection;
use std::any::{self, Any};

/// A fresh in-memory SQLite connection.
pub fn memory_connection() -> Connection {
    Connection::open_in_memory().expect("failed to open in-memory database")
}

pub fn memory_wrapper() -> Box<dyn ConnectionWrapper> {
    Box::new(SqliteWrapper::new(memory_connection()))
}

/// `conn1` and `conn2`, both wrapped in-memory SQLite connections.
pub fn basic_wrapped_connections() -> NamedConnections {
    let mut connections = NamedConnections::new();
    connections.insert("conn1", memory_wrapper()).unwrap();
    connections.insert("conn2", memory_wrapper()).unwrap();
    connections
}

/// A session over [`basic_wrapped_connections`] with `conn1` active.
pub fn basic_debug_session() -> DebugSession {
    DebugSession::new(basic_wrapped_connections(), Some("conn1")).unwrap()
}

/// A driver connection type no bundled wrapper knows about.
#[derive(Debug, PartialEq)]
pub struct CustomConnection {
    pub id: u32,
}

/// Wrapper for [`CustomConnection`] contributing a `doit` command, which
/// counts its own runs.
#[derive(Debug)]
pub struct CustomWrapper {
    connection: CustomConnection,
    pub times_done: u32,
}

impl CustomWrapper {
    pub fn new(connection: CustomConnection) -> Self {
        CustomWrapper {
            connection,
            times_done: 0,
        }
    }
}

fn doit(session: &mut DebugSession, _arguments: &[String]) -> Result<CommandOutcome> {
    if let Some(wrapper) = session.current_connection_mut().as_any_mut().downcast_mut::<CustomWrapper>() {
        wrapper.times_done += 1;
    }
    Ok(CommandOutcome::Continue(vec![Output::message("Did it")]))
}

impl WrapperKind for CustomWrapper {
    const NAME: &'static str = "CustomWrapper";

    fn handles(raw: &RawConnection) -> bool {
        raw.is::<CustomConnection>()
    }

    fn wrap(raw: RawConnection) -> Result<Self> {
        raw.downcast::<CustomConnection>()
            .map(CustomWrapper::new)
            .map_err(|raw| DbreakError::UnsupportedConnection(raw.type_name()))
    }
}

impl ConnectionWrapper for CustomWrapper {
    fn wrapper_name(&self) -> &'static str {
        Self::NAME
    }

    fn raw_connection(&self) -> &dyn Any {
        &self.connection
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn driver_type_name(&self) -> &'static str {
        any::type_name::<CustomConnection>()
    }

    fn execute_statement(&mut self, _statement: &str) -> Result<Vec<Output>> {
        Err(DbreakError::Driver("custom connections do not run statements".into()))
    }

    fn custom_commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec {
            name: "doit",
            handler: doit,
            description: "Do the thing",
            arguments: &[],
            verbose_final_argument: false,
        }]
    }
}

/// A session whose only connection is a [`CustomWrapper`] named `custom`.
pub fn custom_debug_session() -> DebugSession {
    let mut connections = NamedConnections::new();
    connections
        .insert("custom", Box::new(CustomWrapper::new(CustomConnection { id: 1 })))
        .unwrap();
    DebugSession::new(connections, Some("custom")).unwrap()
}
