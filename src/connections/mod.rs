//! Connection Module
//!
//! This module lets the console treat heterogeneous database drivers
//! uniformly. It is split into three concerns:
//! - **Wrappers** (this file): the [`ConnectionWrapper`] capability and the
//!   raw/wrapped connection handles fed into a session
//! - **Registry** (`registry.rs`): resolving a raw connection to the wrapper
//!   variant that can drive it
//! - **SQLite** (`sqlite.rs`): the bundled wrapper for `rusqlite` connections
//!
//! Naming lives here too: unnamed connections receive `db[i]`, named ones
//! keep their names, and the result is an insertion-ordered
//! [`NamedConnections`] map.

pub mod registry;
pub mod sqlite;

pub use registry::*;
pub use sqlite::SqliteWrapper;

use crate::commands::CommandSpec;
use crate::core::{DbreakError, Output, Result};
use std::any::{self, Any};
use std::fmt;

/// Drives one raw connection on behalf of the console.
///
/// A wrapper owns its raw connection for its whole lifetime. Closing the
/// underlying connection is left to whoever drops the wrapper.
pub trait ConnectionWrapper {
    /// Display name of the wrapper type, shown by `!connections`.
    fn wrapper_name(&self) -> &'static str;

    /// The wrapped raw connection.
    fn raw_connection(&self) -> &dyn Any;

    /// The wrapper itself, for custom command handlers that downcast the
    /// active connection back to their own wrapper type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Fully qualified type name of the raw connection.
    fn driver_type_name(&self) -> &'static str;

    /// Runs one statement verbatim and converts whatever it returns.
    ///
    /// Driver errors are returned unchanged (wrapped in
    /// [`DbreakError::Database`] or [`DbreakError::Driver`]).
    fn execute_statement(&mut self, statement: &str) -> Result<Vec<Output>>;

    /// Extra commands available while this connection is the active one.
    fn custom_commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }
}

impl fmt::Debug for dyn ConnectionWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.wrapper_name())
            .field("driver", &self.driver_type_name())
            .finish()
    }
}

/// Splits a driver type name into its module path and its type name,
/// e.g. `rusqlite::Connection` into `("rusqlite", "Connection")`.
pub fn driver_identity(type_name: &str) -> (&str, &str) {
    // Generic parameters may contain `::` themselves.
    let base_end = type_name.find('<').unwrap_or(type_name.len());
    match type_name[..base_end].rfind("::") {
        Some(idx) => (&type_name[..idx], &type_name[idx + 2..]),
        None => ("", type_name),
    }
}

/// A driver connection of a type only known at runtime.
pub struct RawConnection {
    inner: Box<dyn Any>,
    type_name: &'static str,
}

impl RawConnection {
    pub fn new<T: Any>(connection: T) -> Self {
        RawConnection {
            inner: Box::new(connection),
            type_name: any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Takes the connection back out, or returns `self` on a type mismatch.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
        let type_name = self.type_name;
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|inner| RawConnection { inner, type_name })
    }
}

impl fmt::Debug for RawConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawConnection").field(&self.type_name).finish()
    }
}

/// Anything that can be placed into a session: a raw driver connection, or
/// a connection that has already been wrapped.
#[derive(Debug)]
pub enum Connection {
    Raw(RawConnection),
    Wrapped(Box<dyn ConnectionWrapper>),
}

impl Connection {
    pub fn raw<T: Any>(connection: T) -> Self {
        Connection::Raw(RawConnection::new(connection))
    }

    pub fn wrapped<W: ConnectionWrapper + 'static>(wrapper: W) -> Self {
        Connection::Wrapped(Box::new(wrapper))
    }
}

impl From<Box<dyn ConnectionWrapper>> for Connection {
    fn from(wrapper: Box<dyn ConnectionWrapper>) -> Self {
        Connection::Wrapped(wrapper)
    }
}

/// Name → wrapper map that keeps insertion order, which is also the order
/// `!connections` lists them in. Names are unique.
#[derive(Debug, Default)]
pub struct NamedConnections {
    entries: Vec<(String, Box<dyn ConnectionWrapper>)>,
}

impl NamedConnections {
    pub fn new() -> Self {
        NamedConnections::default()
    }

    /// Adds a connection under a fresh name.
    pub fn insert(&mut self, name: impl Into<String>, wrapper: Box<dyn ConnectionWrapper>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(DbreakError::ConnectionAlreadyExists(name));
        }
        self.entries.push((name, wrapper));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&dyn ConnectionWrapper> {
        self.position(name).map(|idx| self.entries[idx].1.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn ConnectionWrapper + 'static)> {
        let idx = self.position(name)?;
        Some(self.entries[idx].1.as_mut())
    }

    /// Renames an entry in place, keeping its position.
    pub(crate) fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.contains(new_name) {
            return Err(DbreakError::ConnectionAlreadyExists(new_name.to_string()));
        }
        let idx = self
            .position(old_name)
            .ok_or_else(|| DbreakError::ConnectionNotFound(old_name.to_string()))?;
        self.entries[idx].0 = new_name.to_string();
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn ConnectionWrapper)> {
        self.entries
            .iter()
            .map(|(name, wrapper)| (name.as_str(), wrapper.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }
}

/// Gives each unnamed connection the synthetic name `db[i]`, `i` being its
/// zero-based position.
pub fn name_connections<I>(connections: I) -> Vec<(String, Connection)>
where
    I: IntoIterator<Item = Connection>,
{
    connections
        .into_iter()
        .enumerate()
        .map(|(i, connection)| (format!("db[{i}]"), connection))
        .collect()
}
