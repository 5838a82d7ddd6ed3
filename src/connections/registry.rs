//! Wrapper Registry
//!
//! An explicit table of wrapper variants, each with a `handles` predicate, a
//! specificity rank and a factory. Resolution filters the variants that
//! handle a raw connection and picks the highest rank; among equal top ranks
//! the variant registered first wins.
//!
//! A process-wide registry, seeded with the bundled SQLite wrapper, backs the
//! free functions at the bottom of this file. Embedding code adds its own
//! variants with [`register_wrapper`].
use super::{name_connections, Connection, ConnectionWrapper, NamedConnections, RawConnection, SqliteWrapper};
use crate::core::{DbreakError, Result};
use once_cell::sync::OnceCell;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A wrapper type that can be registered by type.
pub trait WrapperKind: ConnectionWrapper + Sized + 'static {
    /// Registry name of the variant.
    const NAME: &'static str;
    /// Specificity rank; higher wins.
    const RANK: i32 = 0;

    fn handles(raw: &RawConnection) -> bool;

    /// Takes ownership of a raw connection that `handles` accepted.
    fn wrap(raw: RawConnection) -> Result<Self>;
}

pub type HandlesFn = fn(&RawConnection) -> bool;
pub type WrapperFactory = fn(RawConnection) -> Result<Box<dyn ConnectionWrapper>>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct WrapperVariant {
    pub name: &'static str,
    pub rank: i32,
    pub handles: HandlesFn,
    pub factory: WrapperFactory,
}

fn boxed_factory<W: WrapperKind>(raw: RawConnection) -> Result<Box<dyn ConnectionWrapper>> {
    Ok(Box::new(W::wrap(raw)?))
}

impl WrapperVariant {
    pub fn new(name: &'static str, rank: i32, handles: HandlesFn, factory: WrapperFactory) -> Self {
        WrapperVariant {
            name,
            rank,
            handles,
            factory,
        }
    }

    pub fn of<W: WrapperKind>() -> Self {
        WrapperVariant::new(W::NAME, W::RANK, W::handles, boxed_factory::<W>)
    }

    /// Derives a variant that behaves like this one under a different name.
    pub fn named(self, name: &'static str) -> Self {
        WrapperVariant { name, ..self }
    }

    pub fn with_rank(self, rank: i32) -> Self {
        WrapperVariant { rank, ..self }
    }

    pub fn with_handles(self, handles: HandlesFn) -> Self {
        WrapperVariant { handles, ..self }
    }
}

impl std::fmt::Debug for WrapperVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperVariant")
            .field("name", &self.name)
            .field("rank", &self.rank)
            .finish()
    }
}

/// Ordered set of wrapper variants.
#[derive(Debug, Default)]
pub struct WrapperRegistry {
    variants: Vec<WrapperVariant>,
}

impl WrapperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        WrapperRegistry::default()
    }

    /// A registry holding the bundled wrappers.
    pub fn with_defaults() -> Self {
        let mut registry = WrapperRegistry::new();
        registry.register(WrapperVariant::of::<SqliteWrapper>());
        registry
    }

    /// Adds a variant. A variant with the same name is replaced in place,
    /// keeping its registration order.
    pub fn register(&mut self, variant: WrapperVariant) {
        match self.variants.iter_mut().find(|v| v.name == variant.name) {
            Some(existing) => *existing = variant,
            None => self.variants.push(variant),
        }
    }

    pub fn variants(&self) -> &[WrapperVariant] {
        &self.variants
    }

    /// Picks the highest-ranked variant that handles `raw`.
    pub fn find_handler(&self, raw: &RawConnection) -> Result<WrapperVariant> {
        let mut best: Option<WrapperVariant> = None;
        for variant in self.variants.iter().filter(|v| (v.handles)(raw)) {
            match best {
                Some(current) if current.rank >= variant.rank => {
                    if current.rank == variant.rank {
                        debug!(
                            kept = current.name,
                            ignored = variant.name,
                            rank = variant.rank,
                            "equal wrapper ranks, keeping the first registered"
                        );
                    }
                }
                _ => best = Some(*variant),
            }
        }
        let found = best.ok_or(DbreakError::UnsupportedConnection(raw.type_name()))?;
        debug!(wrapper = found.name, driver = raw.type_name(), "resolved connection wrapper");
        Ok(found)
    }

    /// Wraps a raw connection; an already wrapped connection comes back as is.
    pub fn wrap_connection(&self, connection: Connection) -> Result<Box<dyn ConnectionWrapper>> {
        match connection {
            Connection::Wrapped(wrapper) => Ok(wrapper),
            Connection::Raw(raw) => {
                let variant = self.find_handler(&raw)?;
                (variant.factory)(raw)
            }
        }
    }

    /// Names and wraps connections: unnamed ones first as `db[i]`, then the
    /// named ones in the given order. A name used twice is rejected.
    pub fn prepare_connections<U, N>(&self, unnamed: U, named: N) -> Result<NamedConnections>
    where
        U: IntoIterator<Item = Connection>,
        N: IntoIterator<Item = (String, Connection)>,
    {
        prepare_with(unnamed, named, |connection| self.wrap_connection(connection))
    }
}

fn prepare_with<U, N, F>(unnamed: U, named: N, wrap: F) -> Result<NamedConnections>
where
    U: IntoIterator<Item = Connection>,
    N: IntoIterator<Item = (String, Connection)>,
    F: Fn(Connection) -> Result<Box<dyn ConnectionWrapper>>,
{
    let mut prepared = NamedConnections::new();
    for (name, connection) in name_connections(unnamed).into_iter().chain(named) {
        if prepared.contains(&name) {
            return Err(DbreakError::ConnectionAlreadyExists(name));
        }
        prepared.insert(name, wrap(connection)?)?;
    }
    Ok(prepared)
}

static GLOBAL_REGISTRY: OnceCell<Mutex<WrapperRegistry>> = OnceCell::new();

/// Locks the process-wide registry, creating it with the bundled wrappers on
/// first use.
pub fn global_registry() -> MutexGuard<'static, WrapperRegistry> {
    GLOBAL_REGISTRY
        .get_or_init(|| Mutex::new(WrapperRegistry::with_defaults()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Registers a wrapper variant process-wide.
pub fn register_wrapper(variant: WrapperVariant) {
    debug!(wrapper = variant.name, rank = variant.rank, "registering connection wrapper");
    global_registry().register(variant);
}

pub fn find_handler(raw: &RawConnection) -> Result<WrapperVariant> {
    global_registry().find_handler(raw)
}

pub fn wrap_connection(connection: Connection) -> Result<Box<dyn ConnectionWrapper>> {
    let raw = match connection {
        Connection::Wrapped(wrapper) => return Ok(wrapper),
        Connection::Raw(raw) => raw,
    };
    // Release the lock before running the factory, which is embedder code.
    let variant = find_handler(&raw)?;
    (variant.factory)(raw)
}

pub fn prepare_connections<U, N>(unnamed: U, named: N) -> Result<NamedConnections>
where
    U: IntoIterator<Item = Connection>,
    N: IntoIterator<Item = (String, Connection)>,
{
    prepare_with(unnamed, named, wrap_connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{memory_connection, CustomConnection, CustomWrapper};

    fn never(_: &RawConnection) -> bool {
        false
    }

    /// Two top-level variants and three derived from the first one, all of
    /// rank 1 unless a test raises one.
    fn ranked_registry(adjust: impl Fn(WrapperVariant) -> WrapperVariant) -> WrapperRegistry {
        let base = WrapperVariant::of::<CustomWrapper>().with_rank(1);
        let mut registry = WrapperRegistry::new();
        for variant in [
            base.named("L1_1"),
            base.named("L1_2"),
            base.named("L2_1"),
            base.named("L2_2"),
            base.named("L2_3").with_handles(never),
        ] {
            registry.register(adjust(variant));
        }
        registry
    }

    #[test]
    fn test_find_handler_top_level() {
        let registry = ranked_registry(|v| if v.name == "L1_2" { v.with_rank(2) } else { v });
        let raw = RawConnection::new(CustomConnection { id: 1 });
        assert_eq!(registry.find_handler(&raw).unwrap().name, "L1_2");
    }

    #[test]
    fn test_find_handler_derived() {
        let registry = ranked_registry(|v| if v.name == "L2_2" { v.with_rank(2) } else { v });
        let raw = RawConnection::new(CustomConnection { id: 1 });
        assert_eq!(registry.find_handler(&raw).unwrap().name, "L2_2");
    }

    #[test]
    fn test_find_handler_only_valid_wrappers() {
        let registry = ranked_registry(|v| match v.name {
            "L2_2" => v.with_rank(2),
            "L2_3" => v.with_rank(9999),
            _ => v,
        });
        let raw = RawConnection::new(CustomConnection { id: 1 });
        assert_eq!(registry.find_handler(&raw).unwrap().name, "L2_2");
    }

    #[test]
    fn test_find_handler_tie_keeps_first_registered() {
        let registry = ranked_registry(|v| v);
        let raw = RawConnection::new(CustomConnection { id: 1 });
        assert_eq!(registry.find_handler(&raw).unwrap().name, "L1_1");
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = WrapperRegistry::with_defaults();
        registry.register(WrapperVariant::of::<SqliteWrapper>().with_rank(5));
        assert_eq!(registry.variants().len(), 1);
        assert_eq!(registry.variants()[0].rank, 5);
    }

    #[test]
    fn test_wrap_sqlite_connection() {
        let registry = WrapperRegistry::with_defaults();
        let wrapped = registry.wrap_connection(Connection::raw(memory_connection())).unwrap();
        assert_eq!(wrapped.wrapper_name(), "SqliteWrapper");
        assert!(wrapped.raw_connection().is::<rusqlite::Connection>());
    }

    #[test]
    fn test_wrap_pre_wrapped_connection() {
        let registry = WrapperRegistry::new();
        let wrapper: Box<dyn ConnectionWrapper> = Box::new(CustomWrapper::new(CustomConnection { id: 3 }));
        let before = wrapper.as_ref() as *const dyn ConnectionWrapper as *const ();

        let wrapped = registry.wrap_connection(Connection::from(wrapper)).unwrap();
        let after = wrapped.as_ref() as *const dyn ConnectionWrapper as *const ();
        assert_eq!(before, after);
    }

    #[test]
    fn test_wrap_invalid_connection() {
        let registry = WrapperRegistry::with_defaults();
        let result = registry.wrap_connection(Connection::raw(Vec::<i32>::new()));
        match result {
            Err(DbreakError::UnsupportedConnection(type_name)) => assert!(type_name.contains("Vec")),
            other => panic!("Expected UnsupportedConnection, got {other:?}"),
        }
    }

    #[test]
    fn test_wrap_custom_connection_globally() {
        register_wrapper(WrapperVariant::of::<CustomWrapper>());
        let wrapped = wrap_connection(Connection::raw(CustomConnection { id: 9 })).unwrap();
        assert_eq!(wrapped.wrapper_name(), "CustomWrapper");
        let raw = wrapped.raw_connection().downcast_ref::<CustomConnection>().unwrap();
        assert_eq!(raw.id, 9);
    }

    #[test]
    fn test_prepare_unnamed_connections() {
        let mut registry = WrapperRegistry::new();
        registry.register(WrapperVariant::of::<CustomWrapper>());
        let prepared = registry
            .prepare_connections(
                vec![
                    Connection::raw(CustomConnection { id: 0 }),
                    Connection::raw(CustomConnection { id: 1 }),
                ],
                Vec::new(),
            )
            .unwrap();

        let found: Vec<(&str, u32)> = prepared
            .iter()
            .map(|(name, w)| (name, w.raw_connection().downcast_ref::<CustomConnection>().unwrap().id))
            .collect();
        assert_eq!(found, vec![("db[0]", 0), ("db[1]", 1)]);
    }

    #[test]
    fn test_prepare_named_connections() {
        let prepared = prepare_connections(
            Vec::new(),
            vec![
                ("conn1".to_string(), Connection::raw(memory_connection())),
                ("conn2".to_string(), Connection::raw(memory_connection())),
            ],
        )
        .unwrap();
        assert_eq!(prepared.names().collect::<Vec<_>>(), vec!["conn1", "conn2"]);
    }

    #[test]
    fn test_prepare_mixed_connections() {
        let prepared = prepare_connections(
            vec![Connection::raw(memory_connection())],
            vec![("conn2".to_string(), Connection::raw(memory_connection()))],
        )
        .unwrap();
        assert_eq!(prepared.names().collect::<Vec<_>>(), vec!["db[0]", "conn2"]);
    }

    #[test]
    fn test_prepare_rejects_name_collision() {
        let result = prepare_connections(
            vec![Connection::raw(memory_connection())],
            vec![("db[0]".to_string(), Connection::raw(memory_connection()))],
        );
        assert!(matches!(
            result,
            Err(DbreakError::ConnectionAlreadyExists(name)) if name == "db[0]"
        ));
    }
}
