//! The [`Service`] trait — a type that knows its own name and how to build
//! itself from a container.

use crate::container::Container;
use crate::error::Result;

/// A constructible service with a fixed name.
///
/// The name is available without an instance, so the container can
/// validate and register the service long before it is built.
///
/// Usually derived with `#[derive(Service)]`; implementing it by hand:
///
/// ```
/// use kasl_container::prelude::*;
///
/// struct Clock;
///
/// impl Service for Clock {
///     fn service_name() -> &'static str {
///         "clock"
///     }
///
///     fn construct(_: &Container) -> Result<Self> {
///         Ok(Clock)
///     }
/// }
///
/// let container = Container::new();
/// container.inject_service::<Clock>().unwrap();
/// assert!(container.contains(Clock::service_name()));
/// ```
pub trait Service: Sized + Send + Sync + 'static {
    /// The name the service is registered under.
    fn service_name() -> &'static str;

    /// Builds the service. Called at most once per successful construction,
    /// on first access.
    ///
    /// Look up dependencies with [`Container::get`] to keep them lazy, or
    /// [`Container::resolve`] to build them right away.
    fn construct(container: &Container) -> Result<Self>;
}
