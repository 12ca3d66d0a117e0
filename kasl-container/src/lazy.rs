//! Lazy service handles.
//!
//! Every registered service lives in a [`Slot`]: the factory plus a
//! `OnceCell` that holds the instance once built. A [`Lazy<T>`] is the typed
//! handle callers get back from the container. Handing out a handle costs
//! nothing; the service is built on the first [`Lazy::get`] (or
//! [`Lazy::with`]) and then reused for the lifetime of the slot.
//!
//! # Concurrency
//! Concurrent first accesses from several threads run the factory once:
//! one thread builds, the others wait and receive the same `Arc`.
//!
//! # Recursion
//! A factory that forces a service still under construction on the same
//! thread (itself, or a peer that forces it back) gets
//! [`KaslError::RecursiveConstruction`] with the full chain. Keep a
//! `Lazy<T>` handle in the service and call `.get()` later instead.
//!
//! Two threads each constructing one half of such a cycle block on each
//! other; that case is not detected.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, instrument, warn};

use kasl_support::rendering::render_chain;

use crate::container::{Container, WeakContainer};
use crate::error::{KaslError, RecursiveConstructionError, Result};
use crate::key::ServiceName;
use crate::registry::{FactoryFn, Instance, Registration};

thread_local! {
    // Slots this thread is currently constructing, outermost first
    static CONSTRUCTING: RefCell<Vec<(usize, ServiceName)>> = const { RefCell::new(Vec::new()) };
}

/// Shared state behind every handle to one service.
pub(crate) struct Slot {
    name: ServiceName,
    type_id: TypeId,
    type_name: &'static str,
    factory: FactoryFn,
    cell: OnceCell<Instance>,
}

impl Slot {
    pub fn new(registration: Registration) -> Self {
        Self {
            name: registration.name,
            type_id: registration.type_id,
            type_name: registration.type_name,
            factory: registration.factory,
            cell: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn value_type_name(&self) -> &'static str {
        self.type_name
    }

    /// The instance, if it has been built. Never triggers construction.
    pub fn instance(&self) -> Option<Instance> {
        self.cell.get().cloned()
    }

    /// The single "ensure initialized" gate.
    pub fn force(&self, owner: &Container) -> Result<Instance> {
        if let Some(instance) = self.cell.get() {
            return Ok(Arc::clone(instance));
        }

        let _frame = ConstructionFrame::enter(self)?;
        let instance = self.cell.get_or_try_init(|| self.construct(owner))?;
        Ok(Arc::clone(instance))
    }

    #[instrument(skip_all, name = "construct", fields(service = %self.name))]
    fn construct(&self, owner: &Container) -> Result<Instance> {
        debug!(type_name = self.type_name, "Constructing service");
        let instance = (self.factory)(owner)?;
        debug!("Service constructed");
        Ok(instance)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("initialized", &self.cell.get().is_some())
            .finish()
    }
}

/// Marks a slot as under construction on this thread until dropped.
struct ConstructionFrame;

impl ConstructionFrame {
    fn enter(slot: &Slot) -> Result<Self> {
        let id = std::ptr::from_ref(slot) as usize;

        CONSTRUCTING.with(|stack| {
            let mut stack = stack.borrow_mut();

            if let Some(start) = stack.iter().position(|(active, _)| *active == id) {
                let mut chain: Vec<ServiceName> =
                    stack[start..].iter().map(|(_, name)| name.clone()).collect();
                chain.push(slot.name.clone());

                warn!(chain = %render_chain(&chain), "Recursive construction detected!");
                return Err(KaslError::RecursiveConstruction(RecursiveConstructionError {
                    chain,
                }));
            }

            stack.push((id, slot.name.clone()));
            Ok(ConstructionFrame)
        })
    }
}

impl Drop for ConstructionFrame {
    fn drop(&mut self) {
        CONSTRUCTING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Typed handle to a lazily constructed service.
///
/// Obtained from [`Container::get`]; cloning is cheap and every clone
/// points at the same instance. The handle holds the container weakly, so
/// services may store handles to one another without keeping their own
/// container alive.
///
/// ```
/// use kasl_container::prelude::*;
///
/// let container = Container::new();
/// container.inject_fn("greeting", |_| Ok(String::from("hello"))).unwrap();
///
/// let greeting = container.get::<String>("greeting").unwrap();
/// assert!(!greeting.is_initialized());
///
/// assert_eq!(greeting.get().unwrap().as_str(), "hello");
/// assert!(greeting.is_initialized());
/// ```
pub struct Lazy<T> {
    slot: Arc<Slot>,
    owner: WeakContainer,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub(crate) fn new(slot: Arc<Slot>, owner: WeakContainer) -> Self {
        Self {
            slot,
            owner,
            _marker: PhantomData,
        }
    }

    /// The service's name.
    pub fn name(&self) -> &ServiceName {
        self.slot.name()
    }

    /// Whether the service has been built. Does not build it.
    pub fn is_initialized(&self) -> bool {
        self.slot.cell.get().is_some()
    }

    /// Returns the instance, building it first if needed.
    ///
    /// # Errors
    /// - Whatever the factory returned, unchanged
    /// - [`KaslError::RecursiveConstruction`] if this call re-enters a
    ///   construction already running on this thread
    /// - [`KaslError::ContainerDropped`] if the service was never built and
    ///   the container that owns its factory is gone
    pub fn get(&self) -> Result<Arc<T>> {
        let instance = match self.slot.instance() {
            Some(instance) => instance,
            None => {
                let owner = self.owner.upgrade().ok_or_else(|| KaslError::ContainerDropped {
                    name: self.slot.name().clone(),
                })?;
                self.slot.force(&owner)?
            }
        };

        instance.downcast::<T>().map_err(|_| KaslError::TypeMismatch {
            name: self.slot.name().clone(),
            expected: std::any::type_name::<T>(),
            registered: self.slot.value_type_name(),
        })
    }

    /// Runs `f` against the instance, building it first if needed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let instance = self.get()?;
        Ok(f(&instance))
    }

    /// Returns `true` if both handles point at the same service slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            owner: self.owner.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("name", &self.slot.name)
            .field("type_name", &self.slot.type_name)
            .field("initialized", &self.slot.cell.get().is_some())
            .finish()
    }
}
