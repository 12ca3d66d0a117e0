//! Service registry — stores every entry of one container.
//!
//! The registry maps [`ServiceName`] to the lazy slot that knows how to
//! build (and then holds) the service instance.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::container::Container;
use crate::error::{DuplicateNameError, KaslError, MergeCollisionError, ReservedNameError, Result};
use crate::key::ServiceName;
use crate::lazy::Slot;
use crate::service::Service;
use crate::settings::ContainerSettings;

/// A constructed, type-erased service instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Type alias for factory functions.
///
/// A factory receives the container the service was registered in (to look
/// up its own dependencies) and returns the type-erased instance.
///
/// # Why `Arc` and not `Box`?
/// The same slot may be shared by several containers after a merge, and
/// a failed construction must be retryable, so the closure is `Fn` and shared.
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance> + Send + Sync>;

/// A service descriptor: one name plus the factory that builds it.
///
/// Build one from a [`Service`] type or from an explicit name and closure,
/// then hand any mix of them to [`Container::inject`].
///
/// ```
/// use kasl_container::prelude::*;
///
/// let container = Container::new();
/// container
///     .inject([
///         Registration::factory("greeting", |_| Ok(String::from("hello"))),
///         Registration::factory("answer", |_| Ok(42u32)),
///     ])
///     .unwrap();
///
/// assert_eq!(container.names(), vec!["answer", "greeting"]);
/// ```
#[derive(Clone)]
pub struct Registration {
    pub(crate) name: ServiceName,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) factory: FactoryFn,
}

impl Registration {
    /// Describes a [`Service`] type under its own [`Service::service_name`].
    pub fn service<S: Service>() -> Self {
        Self::factory(S::service_name(), S::construct)
    }

    /// Describes a service with an explicit name and factory.
    pub fn factory<T, F>(name: impl Into<ServiceName>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            factory: Arc::new(move |container: &Container| {
                Ok(Arc::new(factory(container)?) as Instance)
            }),
        }
    }

    /// The name this descriptor registers under.
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// The Rust type the factory produces.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// One container entry.
///
/// `origin` is set for entries merged in from another container: it keeps
/// that container alive, because the factory runs against it.
#[derive(Clone)]
pub(crate) struct Entry {
    pub slot: Arc<Slot>,
    pub origin: Option<Container>,
}

/// Stores all entries of a container.
pub(crate) struct Registry {
    entries: HashMap<ServiceName, Entry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Installs a lazy slot for a registration.
    ///
    /// # Errors
    /// Returns [`KaslError::DuplicateName`] if the name is taken; the
    /// existing entry is left untouched.
    pub fn register(&mut self, registration: Registration) -> Result<()> {
        if self.entries.contains_key(registration.name.as_str()) {
            return Err(KaslError::DuplicateName(DuplicateNameError {
                name: registration.name,
            }));
        }

        debug!(
            service = %registration.name,
            type_name = registration.type_name,
            "Registered service"
        );
        let name = registration.name.clone();
        let entry = Entry {
            slot: Arc::new(Slot::new(registration)),
            origin: None,
        };
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Copies entries from another container, all or nothing.
    ///
    /// # Errors
    /// - [`KaslError::MergeCollision`] naming the first shared key (in
    ///   sorted order) if any incoming name already exists
    /// - [`KaslError::ReservedName`] if an incoming name is reserved here;
    ///   only configured names can hit this, the source enforced the
    ///   built-in ones already
    pub fn merge(
        &mut self,
        incoming: Vec<(ServiceName, Entry)>,
        settings: &ContainerSettings,
    ) -> Result<()> {
        let collisions: Vec<ServiceName> = incoming
            .iter()
            .filter(|(name, _)| self.entries.contains_key(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect();

        if let Some(first) = collisions.first().cloned() {
            return Err(KaslError::MergeCollision(MergeCollisionError {
                name: first,
                all: collisions,
            }));
        }

        if let Some((name, _)) = incoming.iter().find(|(name, _)| settings.is_reserved(name)) {
            return Err(KaslError::ReservedName(ReservedNameError { name: name.clone() }));
        }

        for (name, entry) in incoming {
            trace!(service = %name, "Merged entry");
            self.entries.insert(name, entry);
        }
        Ok(())
    }

    /// Copies out every entry, sorted by name, for merging into another
    /// container. Own entries get `source` as their origin.
    pub fn export(&self, source: &Container) -> Vec<(ServiceName, Entry)> {
        let mut exported: Vec<(ServiceName, Entry)> = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let origin = entry.origin.clone().unwrap_or_else(|| source.clone());
                let entry = Entry {
                    slot: Arc::clone(&entry.slot),
                    origin: Some(origin),
                };
                (name.clone(), entry)
            })
            .collect();
        exported.sort_by(|a, b| a.0.cmp(&b.0));
        exported
    }

    /// Looks up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Returns true if a service with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of registered services.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<ServiceName> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reg(name: &str) -> Registration {
        Registration::factory(name, |_| Ok(42i32))
    }

    #[test]
    fn register_and_get() {
        let mut reg = Registry::new();
        reg.register(make_reg("database")).unwrap();
        assert!(reg.get("database").is_some());
        assert!(reg.contains("database"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_fails() {
        let mut reg = Registry::new();
        reg.register(make_reg("database")).unwrap();

        let err = reg.register(make_reg("database")).unwrap_err();
        assert_eq!(err.to_string(), "Duplicated service name: database");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_keeps_original_slot() {
        let mut reg = Registry::new();
        reg.register(make_reg("database")).unwrap();
        let before = Arc::clone(&reg.get("database").unwrap().slot);

        let _ = reg.register(Registration::factory("database", |_| Ok("other")));
        let after = &reg.get("database").unwrap().slot;
        assert!(Arc::ptr_eq(&before, after));
        assert_eq!(after.value_type_id(), TypeId::of::<i32>());
    }

    #[test]
    fn merge_is_all_or_nothing() {
        let source = Container::new();
        source.inject([make_reg("a"), make_reg("b")]).unwrap();

        let mut reg = Registry::new();
        reg.register(make_reg("b")).unwrap();

        let incoming = source.export_entries();
        let err = reg.merge(incoming, &ContainerSettings::default()).unwrap_err();
        match err {
            KaslError::MergeCollision(e) => {
                assert_eq!(e.name, "b");
                assert_eq!(e.all.len(), 1);
            }
            other => panic!("Expected MergeCollision, got: {other:?}"),
        }
        assert!(!reg.contains("a"));
    }

    #[test]
    fn export_sets_origin_and_sorts() {
        let source = Container::new();
        source.inject([make_reg("z"), make_reg("a")]).unwrap();

        let exported = source.export_entries();
        let names: Vec<&str> = exported.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a", "z"]);
        assert!(exported.iter().all(|(_, e)| e.origin.is_some()));
    }

    #[test]
    fn names_sorted() {
        let mut reg = Registry::new();
        reg.register(make_reg("c")).unwrap();
        reg.register(make_reg("a")).unwrap();
        reg.register(make_reg("b")).unwrap();
        assert_eq!(reg.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn registration_reports_type() {
        let reg = Registration::factory("answer", |_| Ok(42u64));
        assert_eq!(reg.name().as_str(), "answer");
        assert_eq!(reg.type_name(), "u64");
    }
}
