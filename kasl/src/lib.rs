//! # Kasl — lazy dependency injection for Rust
//!
//! A container of named singletons that are built on first use.
//!
//! ```rust
//! use kasl::{Container, Result, Service};
//! use std::sync::Arc;
//!
//! #[derive(Service)]
//! struct Config {
//!     greeting: String,
//! }
//!
//! impl Config {
//!     fn new(_: &Container) -> Result<Self> {
//!         Ok(Config { greeting: "hello".into() })
//!     }
//! }
//!
//! #[derive(Service)]
//! #[service(name = "greeter")]
//! struct Greeter {
//!     config: Arc<Config>,
//! }
//!
//! impl Greeter {
//!     fn new(container: &Container) -> Result<Self> {
//!         Ok(Greeter { config: container.resolve("config")? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.inject_service::<Greeter>()?.inject_service::<Config>()?;
//!
//! let greeter = container.resolve::<Greeter>("greeter")?;
//! assert_eq!(greeter.config.greeting, "hello");
//! # Ok::<(), kasl::KaslError>(())
//! ```
//!
//! ## Names checked at compile time
//!
//! A derived service can't take one of the container's reserved names:
//!
//! ```compile_fail
//! use kasl::{Container, Result, Service};
//!
//! #[derive(Service)]
//! #[service(name = "inject")]
//! struct Injector;
//!
//! impl Injector {
//!     fn new(_: &Container) -> Result<Self> {
//!         Ok(Injector)
//!     }
//! }
//! ```
//!
//! Nor an empty one:
//!
//! ```compile_fail
//! use kasl::{Container, Result, Service};
//!
//! #[derive(Service)]
//! #[service(name = "")]
//! struct Nameless;
//!
//! impl Nameless {
//!     fn new(_: &Container) -> Result<Self> {
//!         Ok(Nameless)
//!     }
//! }
//! ```
//!
//! A type whose snake_case name is reserved is rejected too:
//!
//! ```compile_fail
//! use kasl::{Container, Result, Service};
//!
//! #[derive(Service)]
//! struct AddProvider;
//!
//! impl AddProvider {
//!     fn new(_: &Container) -> Result<Self> {
//!         Ok(AddProvider)
//!     }
//! }
//! ```

pub use kasl_container::*;
pub use kasl_derive::*;
pub use kasl_support::*;
