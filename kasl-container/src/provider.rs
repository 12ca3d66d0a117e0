//! Provider trait — a module of related service registrations.
//!
//! Providers group related services together, similar to
//! Laravel's ServiceProvider or DIshka's Provider class.
//!
//! # Examples
//! ```rust
//! use kasl_container::prelude::*;
//!
//! struct StorageProvider;
//!
//! impl Provider for StorageProvider {
//!     fn services(&self) -> Vec<Registration> {
//!         vec![
//!             Registration::factory("database_url", |_| Ok(String::from("postgres://localhost"))),
//!             Registration::factory("pool_size", |_| Ok(8usize)),
//!         ]
//!     }
//! }
//!
//! let container = Container::new();
//! container.add_provider(&StorageProvider).unwrap();
//! assert_eq!(container.len(), 2);
//! ```

use crate::registry::Registration;

/// A module that contributes a batch of services to a container.
///
/// Instead of one giant registration block, split services by domain:
///
/// ```rust,ignore
/// container
///     .add_provider(&DatabaseProvider)?
///     .add_provider(&AuthProvider)?
///     .add_provider(&EmailProvider)?;
/// ```
///
/// The batch goes through [`Container::inject`](crate::container::Container::inject)
/// unchanged, so services from one provider may depend on each other in
/// any order.
pub trait Provider: Send + Sync {
    /// The services this provider registers.
    fn services(&self) -> Vec<Registration>;

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
