//! Debug Session
//!
//! Holds every connection of one console run and the name of the active
//! one. The active name always refers to an existing connection: this is
//! checked when the session is built and on every switch or rename, and a
//! failed operation leaves the session untouched.
use crate::connections::{prepare_connections, Connection, ConnectionWrapper, NamedConnections};
use crate::core::{DbreakError, Result};
use tracing::info;

#[derive(Debug)]
pub struct DebugSession {
    current_connection_name: String,
    connections: NamedConnections,
}

impl DebugSession {
    /// Creates a session over `connections`.
    ///
    /// Without an explicit `current_connection_name` the first connection
    /// becomes the active one.
    ///
    /// # Errors
    ///
    /// `ConnectionNotFound` if the name is not a key of `connections`, or if
    /// `connections` is empty.
    pub fn new(connections: NamedConnections, current_connection_name: Option<&str>) -> Result<Self> {
        let current = match current_connection_name {
            Some(name) if connections.contains(name) => name.to_string(),
            Some(name) => return Err(DbreakError::ConnectionNotFound(name.to_string())),
            None => connections
                .names()
                .next()
                .map(str::to_string)
                .ok_or_else(|| DbreakError::ConnectionNotFound("<no connections given>".to_string()))?,
        };

        info!(current = %current, connections = connections.len(), "debug session ready");
        Ok(DebugSession {
            current_connection_name: current,
            connections,
        })
    }

    /// Builds a session from unnamed and named connections, raw or wrapped.
    ///
    /// Unnamed connections are called `db[0]`, `db[1]`, ... and come first.
    pub fn from_connections<U, N>(unnamed: U, named: N) -> Result<Self>
    where
        U: IntoIterator<Item = Connection>,
        N: IntoIterator<Item = (String, Connection)>,
    {
        DebugSession::new(prepare_connections(unnamed, named)?, None)
    }

    pub fn current_connection_name(&self) -> &str {
        &self.current_connection_name
    }

    pub fn current_connection(&self) -> &dyn ConnectionWrapper {
        match self.connections.get(&self.current_connection_name) {
            Some(connection) => connection,
            None => unreachable!("active connection '{}' missing", self.current_connection_name),
        }
    }

    pub fn current_connection_mut(&mut self) -> &mut (dyn ConnectionWrapper + 'static) {
        match self.connections.get_mut(&self.current_connection_name) {
            Some(connection) => connection,
            None => unreachable!("active connection '{}' missing", self.current_connection_name),
        }
    }

    pub fn connections(&self) -> &NamedConnections {
        &self.connections
    }

    /// Makes `name` the active connection.
    pub fn switch(&mut self, name: &str) -> Result<()> {
        if !self.connections.contains(name) {
            return Err(DbreakError::ConnectionNotFound(name.to_string()));
        }
        info!(from = %self.current_connection_name, to = name, "switching connection");
        self.current_connection_name = name.to_string();
        Ok(())
    }

    /// Renames the active connection. Renaming it to its own name is a no-op.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        if new_name == self.current_connection_name {
            return Ok(());
        }
        self.connections.rename(&self.current_connection_name, new_name)?;
        info!(from = %self.current_connection_name, to = new_name, "renamed connection");
        self.current_connection_name = new_name.to_string();
        Ok(())
    }

    /// Adds another connection without changing the active one.
    pub fn add_connection(&mut self, name: &str, wrapper: Box<dyn ConnectionWrapper>) -> Result<()> {
        self.connections.insert(name, wrapper)?;
        info!(name, "added connection");
        Ok(())
    }
}
