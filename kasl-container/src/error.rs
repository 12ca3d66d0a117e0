//! Error types for Kasl container operations.
//!
//! Registration and merge errors are raised at the call site, synchronously.
//! Construction errors surface on first access to a service, never at
//! registration time.

use std::fmt;

use kasl_support::naming::{EMPTY_NAME_MESSAGE, reserved_message};
use kasl_support::rendering::{render_chain, shorten_type_name};

use crate::key::ServiceName;

/// Main error type for all Kasl operations.
#[derive(Debug, thiserror::Error)]
pub enum KaslError {
    /// A service with this name is already registered.
    #[error("{}", .0)]
    DuplicateName(DuplicateNameError),

    /// The name collides with one of the container's own operations.
    #[error("{}", .0)]
    ReservedName(ReservedNameError),

    /// A service was registered under the empty name.
    #[error("{}", EMPTY_NAME_MESSAGE)]
    EmptyName,

    /// `inject_container` found a name present in both containers.
    #[error("{}", .0)]
    MergeCollision(MergeCollisionError),

    /// Requested service was never registered.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// Service exists but was registered with a different type.
    #[error(
        "Type mismatch for service {name}: registered as {}, requested as {}",
        shorten_type_name(.registered),
        shorten_type_name(.expected)
    )]
    TypeMismatch {
        name: ServiceName,
        expected: &'static str,
        registered: &'static str,
    },

    /// A factory forced a service that is still being constructed.
    #[error("{}", .0)]
    RecursiveConstruction(RecursiveConstructionError),

    /// A handle outlived its container before the service was ever built.
    #[error("Container dropped before service was constructed: {name}")]
    ContainerDropped { name: ServiceName },

    /// A factory failed. The source error is passed through untouched.
    #[error(transparent)]
    Construction(Box<dyn std::error::Error + Send + Sync>),
}

impl KaslError {
    /// Wraps a factory's own failure.
    ///
    /// ```
    /// use kasl_container::error::KaslError;
    ///
    /// let err = KaslError::construction("connection refused");
    /// assert_eq!(err.to_string(), "connection refused");
    /// ```
    pub fn construction(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        KaslError::Construction(source.into())
    }

    /// The service name the error is about, if there is exactly one.
    pub fn service_name(&self) -> Option<&ServiceName> {
        match self {
            KaslError::DuplicateName(e) => Some(&e.name),
            KaslError::ReservedName(e) => Some(&e.name),
            KaslError::EmptyName => None,
            KaslError::MergeCollision(e) => Some(&e.name),
            KaslError::NotRegistered(e) => Some(&e.requested),
            KaslError::TypeMismatch { name, .. } => Some(name),
            KaslError::RecursiveConstruction(e) => e.chain.last(),
            KaslError::ContainerDropped { name } => Some(name),
            KaslError::Construction(_) => None,
        }
    }
}

/// A service name was registered twice.
#[derive(Debug)]
pub struct DuplicateNameError {
    pub name: ServiceName,
}

impl fmt::Display for DuplicateNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duplicated service name: {}", self.name)
    }
}

/// A service name equals a reserved operation name.
#[derive(Debug)]
pub struct ReservedNameError {
    pub name: ServiceName,
}

impl fmt::Display for ReservedNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&reserved_message(&self.name))
    }
}

/// Two containers share at least one service name.
///
/// `name` is the first colliding key in sorted order; `all` lists every one.
#[derive(Debug)]
pub struct MergeCollisionError {
    pub name: ServiceName,
    pub all: Vec<ServiceName>,
}

impl fmt::Display for MergeCollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Containers have duplicated keys: {}", self.name)
    }
}

/// A lookup named a service that does not exist.
///
/// Includes "did you mean?" suggestions when any registered name is close.
#[derive(Debug)]
pub struct NotRegisteredError {
    pub requested: ServiceName,
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not registered: {}", self.requested)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// A service's construction re-entered itself on the same thread.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct RecursiveConstructionError {
    /// Example: `["a", "b", "a"]`
    pub chain: Vec<ServiceName>,
}

impl fmt::Display for RecursiveConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Recursive construction detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: Store a Lazy handle and call .get() after construction instead"
        )
    }
}

/// Convenient Result type for Kasl operations.
pub type Result<T> = std::result::Result<T, KaslError>;
