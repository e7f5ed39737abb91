//! Error taxonomy of the container.
//!
//! Every failure is typed and carries the offending [`TypeKey`]:
//!
//! - registration failures (duplicate, not assignable, not constructable,
//!   unresolved dependency, unregistered nested type) abort the registration
//!   and leave the registry untouched;
//! - resolution failures are detected before any instantiation work;
//! - errors produced by user factories pass through [`DiError::Factory`]
//!   unchanged (`#[error(transparent)]`), so callers can still downcast to
//!   the original cause.

use thiserror::Error;

use crate::key::TypeKey;

/// Main error type for all container operations
#[derive(Debug, Error)]
pub enum DiError {
    /// The requested type already has a registration
    #[error("Type {requested} is already registered")]
    DuplicateRegistration { requested: TypeKey },

    /// The concrete type does not provide the requested service
    #[error("Type {concrete} is not assignable to {requested}")]
    NotAssignable {
        requested: TypeKey,
        concrete: TypeKey,
    },

    /// No usable public constructor (or no constructor metadata at all)
    #[error("Type {type_key} is not constructable: {reason}")]
    TypeNotConstructable {
        type_key: TypeKey,
        reason: &'static str,
    },

    /// The dependency lookup hook produced no plan for a constructor parameter
    #[error("Dependency {dependency} of {dependent} could not be resolved")]
    DependencyUnresolved {
        dependency: TypeKey,
        dependent: TypeKey,
    },

    /// The type is absent from the registry
    #[error("Type {type_key} is not registered")]
    UnregisteredType { type_key: TypeKey },

    /// A type-erased value could not be viewed as the requested type
    #[error("Instance of {actual} cannot be used as {expected}")]
    TypeMismatch { expected: TypeKey, actual: TypeKey },

    /// A non-optional consumer received the explicit empty value
    #[error("Instance of {type_key} is empty")]
    EmptyInstance { type_key: TypeKey },

    /// A constructor was given, or consumed, a different number of arguments
    /// than it declares
    #[error("Constructor {constructor} of {owner} declares {expected} parameters but got {actual}")]
    ArgumentCount {
        owner: TypeKey,
        constructor: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Failure raised by user code while constructing an instance
    #[error(transparent)]
    Factory(#[from] anyhow::Error),

    /// Invalid container configuration
    #[error("Configuration error in {field}: {message}")]
    Configuration { field: String, message: String },
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, DiError>;

impl DiError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The type this error is about, when there is one.
    pub fn type_key(&self) -> Option<&TypeKey> {
        match self {
            Self::DuplicateRegistration { requested } => Some(requested),
            Self::NotAssignable { concrete, .. } => Some(concrete),
            Self::TypeNotConstructable { type_key, .. } => Some(type_key),
            Self::DependencyUnresolved { dependency, .. } => Some(dependency),
            Self::UnregisteredType { type_key } => Some(type_key),
            Self::TypeMismatch { expected, .. } => Some(expected),
            Self::EmptyInstance { type_key } => Some(type_key),
            Self::ArgumentCount { owner, .. } => Some(owner),
            Self::Factory(_) | Self::Configuration { .. } => None,
        }
    }

    /// Failures that only registration can produce. `UnregisteredType` is
    /// excluded: resolution reports it too.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRegistration { .. }
                | Self::NotAssignable { .. }
                | Self::TypeNotConstructable { .. }
                | Self::DependencyUnresolved { .. }
        )
    }
}
