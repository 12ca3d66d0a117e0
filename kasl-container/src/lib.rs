//! Core container implementation for Kasl DI.

pub mod container;
pub mod error;
pub mod key;
pub mod lazy;
pub mod provider;
pub mod registry;
pub mod service;
pub mod settings;

pub use container::{Container, prelude};
pub use error::{KaslError, Result};
pub use key::ServiceName;
pub use lazy::Lazy;
pub use provider::Provider;
pub use registry::Registration;
pub use service::Service;
pub use settings::ContainerSettings;
