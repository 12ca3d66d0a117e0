//! # The Container — heart of Kasl
//!
//! A name-keyed container of lazily constructed singletons.
//!
//! # Architecture
//! ```text
//! Container ──inject()──────────> Registry: name → Slot (factory + OnceCell)
//!     │                                               │
//!     └──get::<T>(name)──> Lazy<T> ──get()──> builds once, then Arc<T>
//! ```
//!
//! Registration never runs a factory. A factory runs on the first
//! `Lazy::get` and receives the container it was registered in, so services
//! registered together can reference one another in any order.
//!
//! # Examples
//! ```rust
//! use kasl_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! let container = Container::new();
//! container
//!     .inject([
//!         Registration::factory("database", |c| {
//!             Ok(Database { config: c.resolve::<Config>("config")? })
//!         }),
//!         Registration::factory("config", |_| {
//!             Ok(Config { url: "postgres://localhost".into() })
//!         }),
//!     ])
//!     .expect("Failed to register services");
//!
//! let db = container.resolve::<Database>("database").expect("Failed to resolve");
//! assert_eq!(db.config.url, "postgres://localhost");
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace};

use kasl_support::rendering::suggest_similar;

use crate::error::{KaslError, NotRegisteredError, ReservedNameError, Result};
use crate::key::ServiceName;
use crate::lazy::Lazy;
use crate::provider::Provider;
use crate::registry::{Entry, Registration, Registry};
use crate::service::Service;
use crate::settings::ContainerSettings;

/// How many "did you mean?" names a lookup error carries.
const MAX_SUGGESTIONS: usize = 3;

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Thread-safe container of lazily constructed, named singletons.
///
/// Cloning a `Container` gives another handle to the same container:
/// services registered through one clone are visible through all of them.
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

struct Inner {
    registry: RwLock<Registry>,
    settings: ContainerSettings,
}

impl Container {
    /// Creates an empty container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    /// Creates an empty container with the given settings.
    pub fn with_settings(settings: ContainerSettings) -> Self {
        debug!(label = ?settings.label, "Creating container");
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry::new()),
                settings,
            }),
        }
    }

    /// The settings this container was created with.
    pub fn settings(&self) -> &ContainerSettings {
        &self.inner.settings
    }

    // ── Registration ──

    /// Registers one or more services.
    ///
    /// Each name is checked in order: the empty name fails with
    /// [`KaslError::EmptyName`], reserved names with
    /// [`KaslError::ReservedName`], taken names (including ones earlier in
    /// the same batch) with [`KaslError::DuplicateName`]. Services installed
    /// before the failing one stay installed.
    ///
    /// No factory runs here.
    pub fn inject<I>(&self, registrations: I) -> Result<&Self>
    where
        I: IntoIterator<Item = Registration>,
    {
        // Collected first: user iterators must not run under the lock
        let batch: Vec<Registration> = registrations.into_iter().collect();
        trace!(count = batch.len(), label = ?self.inner.settings.label, "Injecting services");

        let mut registry = self.inner.registry.write();
        for registration in batch {
            if registration.name().is_empty() {
                return Err(KaslError::EmptyName);
            }
            if self.inner.settings.is_reserved(registration.name()) {
                return Err(KaslError::ReservedName(ReservedNameError {
                    name: registration.name,
                }));
            }
            registry.register(registration)?;
        }

        Ok(self)
    }

    /// Registers a [`Service`] type under its own name.
    pub fn inject_service<S: Service>(&self) -> Result<&Self> {
        self.inject([Registration::service::<S>()])
    }

    /// Registers a factory under an explicit name.
    pub fn inject_fn<T, F>(&self, name: impl Into<ServiceName>, factory: F) -> Result<&Self>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        self.inject([Registration::factory(name, factory)])
    }

    /// Registers every service of a [`Provider`] as one batch.
    pub fn add_provider(&self, provider: &dyn Provider) -> Result<&Self> {
        let services = provider.services();
        info!(provider = provider.name(), services = services.len(), "Adding provider");
        self.inject(services)
    }

    /// Copies every entry of `other` into this container.
    ///
    /// All or nothing: if any name exists in both containers, fails with
    /// [`KaslError::MergeCollision`] naming the first shared key in sorted
    /// order, and this container is left unchanged.
    ///
    /// Merged services stay lazy and stay singletons: both containers share
    /// one instance. Their factories keep running against `other`.
    #[instrument(skip_all, name = "inject_container", fields(label = ?self.inner.settings.label))]
    pub fn inject_container(&self, other: &Container) -> Result<&Self> {
        // Snapshot first: never hold both containers' locks at once
        let incoming = other.export_entries();
        let count = incoming.len();

        let mut registry = self.inner.registry.write();
        registry.merge(incoming, &self.inner.settings)?;

        info!(merged = count, total = registry.len(), "Merged container");
        Ok(self)
    }

    // ── Lookup ──

    /// Returns a lazy handle to a service. Does not construct it.
    ///
    /// # Errors
    /// - [`KaslError::NotRegistered`] for unknown names
    /// - [`KaslError::TypeMismatch`] if `T` is not the registered type
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Lazy<T>> {
        trace!(service = name, "Looking up service");

        let entry = {
            let registry = self.inner.registry.read();
            match registry.get(name) {
                Some(entry) => entry.clone(),
                None => return Err(self.not_registered(&registry, name)),
            }
        };

        if entry.slot.value_type_id() != TypeId::of::<T>() {
            return Err(KaslError::TypeMismatch {
                name: entry.slot.name().clone(),
                expected: type_name::<T>(),
                registered: entry.slot.value_type_name(),
            });
        }

        let owner = match &entry.origin {
            Some(origin) => origin.downgrade(),
            None => self.downgrade(),
        };
        Ok(Lazy::new(entry.slot, owner))
    }

    /// Looks up a service and builds it if needed.
    ///
    /// ```rust
    /// use kasl_container::prelude::*;
    ///
    /// let container = Container::new();
    /// container.inject_fn("answer", |_| Ok(42u32)).unwrap();
    ///
    /// let answer = container.resolve::<u32>("answer").unwrap();
    /// assert_eq!(*answer, 42);
    /// ```
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        self.get::<T>(name)?.get()
    }

    /// Returns `true` if a service with this name is registered.
    /// Does not construct anything.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.registry.read().contains(name)
    }

    /// All registered names, sorted. Does not construct anything.
    pub fn names(&self) -> Vec<ServiceName> {
        self.inner.registry.read().names()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().is_empty()
    }

    /// Returns `true` if both values are handles to the same container.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Internal ──

    pub(crate) fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    pub(crate) fn export_entries(&self) -> Vec<(ServiceName, Entry)> {
        self.inner.registry.read().export(self)
    }

    fn not_registered(&self, registry: &Registry, name: &str) -> KaslError {
        let names = registry.names();
        let available: Vec<&str> = names.iter().map(|n| n.as_str()).collect();

        KaslError::NotRegistered(NotRegisteredError {
            requested: ServiceName::from(name),
            suggestions: suggest_similar(name, &available, MAX_SUGGESTIONS),
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.inner.registry.read();
        f.debug_struct("Container")
            .field("label", &self.inner.settings.label)
            .field("registered", &registry.len())
            .field("services", &*registry)
            .finish()
    }
}

/// Non-owning reference to a container, held by [`Lazy`] handles.
#[derive(Clone)]
pub(crate) struct WeakContainer(Weak<Inner>);

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(|inner| Container { inner })
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::Container;
    pub use crate::error::{KaslError, Result};
    pub use crate::key::ServiceName;
    pub use crate::lazy::Lazy;
    pub use crate::provider::Provider;
    pub use crate::registry::Registration;
    pub use crate::service::Service;
    pub use crate::settings::ContainerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("kasl_container=trace")
            .with_test_writer()
            .try_init();
    }

    fn value(name: &str, v: &'static str) -> Registration {
        Registration::factory(name, move |_| Ok(v))
    }

    #[test]
    fn disjoint_batches_union() {
        init_tracing();

        let container = Container::new();
        container.inject([value("a", "A"), value("b", "B")]).unwrap();
        container.inject([value("c", "C")]).unwrap();

        assert_eq!(container.names(), vec!["a", "b", "c"]);
        assert_eq!(container.len(), 3);
    }

    #[test]
    fn chaining_returns_same_container() {
        let container = Container::new();
        let returned = container
            .inject_fn("a", |_| Ok(1u8))
            .unwrap()
            .inject_fn("b", |_| Ok(2u8))
            .unwrap();

        assert!(returned.ptr_eq(&container));
        assert_eq!(container.len(), 2);
    }

    #[test]
    fn duplicate_in_later_call_fails() {
        let container = Container::new();
        container.inject([value("s", "first")]).unwrap();

        let err = container.inject([value("s", "second")]).unwrap_err();
        assert_eq!(err.to_string(), "Duplicated service name: s");
        assert_eq!(*container.resolve::<&str>("s").unwrap(), "first");
    }

    #[test]
    fn duplicate_within_batch_is_partial() {
        let container = Container::new();
        let err = container
            .inject([value("a", "A"), value("b", "B"), value("a", "again"), value("c", "C")])
            .unwrap_err();

        assert!(matches!(err, KaslError::DuplicateName(ref e) if e.name == "a"));
        assert_eq!(container.names(), vec!["a", "b"]);
        assert_eq!(*container.resolve::<&str>("a").unwrap(), "A");
    }

    #[test]
    fn reserved_name_rejected() {
        let container = Container::new();
        let err = container.inject([value("inject", "x")]).unwrap_err();

        assert_eq!(err.to_string(), "Reserved service name: inject");
        assert!(container.is_empty());
    }

    #[test]
    fn empty_name_rejected() {
        let container = Container::new();
        container.inject([value("a", "A")]).unwrap();

        let err = container.inject_fn("", |_| Ok(1u8)).unwrap_err();
        assert!(matches!(err, KaslError::EmptyName));
        assert_eq!(err.to_string(), "Service name must not be empty");

        let err = container.inject([value("b", "B"), value("", "x"), value("c", "C")]).unwrap_err();
        assert!(matches!(err, KaslError::EmptyName));
        assert_eq!(container.names(), vec!["a", "b"]);
    }

    #[test]
    fn configured_reserved_name_rejected() {
        let container =
            Container::with_settings(ContainerSettings::default().with_reserved_name("shutdown"));
        let err = container.inject_fn("shutdown", |_| Ok(())).unwrap_err();
        assert!(matches!(err, KaslError::ReservedName(_)));
    }

    #[test]
    fn lookup_does_not_construct() {
        let counter = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container
            .inject_fn("svc", {
                let counter = Arc::clone(&counter);
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .unwrap();

        let _handle = container.get::<()>("svc").unwrap();
        assert!(container.contains("svc"));
        assert_eq!(container.names().len(), 1);
        let _ = format!("{container:?}");
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        container.resolve::<()>("svc").unwrap();
        container.resolve::<()>("svc").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn not_registered_suggests() {
        let container = Container::new();
        container.inject([value("database", "db")]).unwrap();

        match container.get::<&str>("databse").unwrap_err() {
            KaslError::NotRegistered(e) => {
                assert_eq!(e.requested, "databse");
                assert_eq!(e.suggestions, vec!["database"]);
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn not_registered_suggests_case_mismatch_first() {
        let container = Container::new();
        container
            .inject([value("database_pool", "pool"), value("database", "db")])
            .unwrap();

        match container.get::<&str>("Database").unwrap_err() {
            KaslError::NotRegistered(e) => {
                assert_eq!(e.suggestions[0], "database");
            }
            other => panic!("Expected NotRegistered, got: {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_on_lookup() {
        let container = Container::new();
        container.inject_fn("port", |_| Ok(8080u16)).unwrap();

        let err = container.get::<String>("port").unwrap_err();
        assert!(matches!(err, KaslError::TypeMismatch { .. }));
        assert!(err.to_string().contains("registered as u16"));
    }

    #[test]
    fn batch_peers_resolve_in_any_order() {
        let container = Container::new();
        container
            .inject([
                Registration::factory("c", |c| {
                    let a = c.resolve::<String>("a")?;
                    let b = c.resolve::<String>("b")?;
                    Ok(format!("C{a}{b}"))
                }),
                Registration::factory("a", |_| Ok(String::from("A"))),
                Registration::factory("b", |c| Ok(format!("B{}", c.resolve::<String>("a")?))),
            ])
            .unwrap();

        assert_eq!(container.resolve::<String>("c").unwrap().as_str(), "CABA");
    }

    #[test]
    fn factory_error_propagates_unchanged() {
        #[derive(Debug, thiserror::Error)]
        #[error("disk on fire")]
        struct DiskError;

        let container = Container::new();
        container
            .inject([
                Registration::factory("disk", |_| -> Result<u8> { Err(KaslError::construction(DiskError)) }),
                Registration::factory("cache", |c| Ok(*c.resolve::<u8>("disk")?)),
            ])
            .unwrap();

        let err = container.resolve::<u8>("cache").unwrap_err();
        match err {
            KaslError::Construction(source) => assert!(source.downcast_ref::<DiskError>().is_some()),
            other => panic!("Expected Construction, got: {other:?}"),
        }
    }

    #[test]
    fn merge_union_shares_instances() {
        init_tracing();

        let counter = Arc::new(AtomicU32::new(0));
        let source = Container::new();
        source
            .inject_fn("shared", {
                let counter = Arc::clone(&counter);
                move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(String::from("once"))
                }
            })
            .unwrap();

        let target = Container::new();
        target.inject([value("own", "mine")]).unwrap();
        target.inject_container(&source).unwrap();

        assert_eq!(target.names(), vec!["own", "shared"]);
        assert!(!target.get::<String>("shared").unwrap().is_initialized());

        let via_target = target.resolve::<String>("shared").unwrap();
        let via_source = source.resolve::<String>("shared").unwrap();
        assert!(Arc::ptr_eq(&via_target, &via_source));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn merge_collision_leaves_target_unchanged() {
        let source = Container::new();
        source.inject([value("x", "1"), value("b", "2"), value("a", "3")]).unwrap();

        let target = Container::new();
        target.inject([value("b", "mine"), value("x", "mine")]).unwrap();

        let err = target.inject_container(&source).unwrap_err();
        assert_eq!(err.to_string(), "Containers have duplicated keys: b");
        assert_eq!(target.names(), vec!["b", "x"]);
        assert_eq!(*target.resolve::<&str>("b").unwrap(), "mine");
    }

    #[test]
    fn merge_into_self() {
        let container = Container::new();
        container.inject_container(&container.clone()).unwrap();

        container.inject([value("a", "A")]).unwrap();
        let err = container.inject_container(&container).unwrap_err();
        assert!(matches!(err, KaslError::MergeCollision(ref e) if e.name == "a"));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn merge_checks_target_reserved_names() {
        let source = Container::new();
        source.inject([value("health", "ok")]).unwrap();

        let target =
            Container::with_settings(ContainerSettings::default().with_reserved_name("health"));
        let err = target.inject_container(&source).unwrap_err();
        assert_eq!(err.to_string(), "Reserved service name: health");
        assert!(target.is_empty());
    }

    #[test]
    fn merged_factory_runs_against_source() {
        let source = Container::new();
        source
            .inject([
                Registration::factory("greeting", |c| {
                    Ok(format!("hello from {}", c.resolve::<&str>("origin")?))
                }),
                value("origin", "source"),
            ])
            .unwrap();

        let target = Container::new();
        target.inject_container(&source).unwrap();
        drop(source);

        let greeting = target.resolve::<String>("greeting").unwrap();
        assert_eq!(greeting.as_str(), "hello from source");
    }

    #[test]
    fn merge_is_a_snapshot() {
        let source = Container::new();
        source.inject([value("a", "A")]).unwrap();

        let target = Container::new();
        target.inject_container(&source).unwrap();
        source.inject([value("late", "L")]).unwrap();

        assert!(!target.contains("late"));
    }

    #[test]
    fn clones_share_registrations() {
        let container = Container::new();
        let alias = container.clone();
        alias.inject([value("a", "A")]).unwrap();
        assert!(container.contains("a"));
    }

    #[test]
    fn debug_display() {
        let container = Container::with_settings(ContainerSettings::default().with_label("app"));
        container.inject([value("a", "A"), value("b", "B")]).unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("app"));
        assert!(debug.contains("registered: 2"));
    }
}
