//! Errors raised while registering handlers, resolving instances and
//! mapping values.
//!
//! Each failure stage has its own `thiserror` enum with structured fields so
//! callers can tell registration faults, resolution faults, convention engine
//! faults and the terminal "nothing can map this pair" outcome apart.

use std::any::type_name;
use std::error::Error as StdError;

use thiserror::Error;

use crate::keys::DispatchKey;
use crate::lifetime::Lifetime;

/// Errors raised while building the dispatch table. All are fatal at startup.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The candidate list contained no transform handlers.
    #[error("no transform handlers were supplied to the registry")]
    NoCandidates,

    /// Two handlers claim the same `(source, destination)` pair.
    #[error(
        "duplicate handler for `{source_type}` -> `{destination_type}`: \
         `{duplicate}` conflicts with `{existing}`"
    )]
    DuplicateHandler {
        /// Source type of the contested pair.
        source_type: String,
        /// Destination type of the contested pair.
        destination_type: String,
        /// Handler registered first.
        existing: String,
        /// Handler that attempted to claim the pair.
        duplicate: String,
    },

    /// The instance provider already holds a registration for this type.
    #[error("type `{type_name}` is already registered")]
    DuplicateService {
        /// Type that was registered twice.
        type_name: String,
    },

    /// The same type was declared twice with different lifetimes.
    #[error("type `{type_name}` is declared both {first} and {second}")]
    ConflictingLifetime {
        /// Type with contradictory declarations.
        type_name: String,
        /// Lifetime from the first declaration.
        first: Lifetime,
        /// Lifetime from the later declaration.
        second: Lifetime,
    },

    /// A declared dependency has no registration.
    #[error("`{dependent}` depends on `{dependency}`, which is not registered")]
    UnknownDependency {
        /// Type declaring the dependency.
        dependent: String,
        /// Missing dependency.
        dependency: String,
    },

    /// A singleton depends on something that must not outlive a scope.
    #[error(
        "{lifetime} `{dependent}` cannot depend on {dependency_lifetime} `{dependency}`"
    )]
    CaptiveDependency {
        /// Type declaring the dependency.
        dependent: String,
        /// Lifetime of the dependent.
        lifetime: Lifetime,
        /// Shorter-lived dependency.
        dependency: String,
        /// Lifetime of the dependency.
        dependency_lifetime: Lifetime,
    },

    /// Declared dependencies form a cycle.
    #[error("dependency cycle detected: {path}")]
    DependencyCycle {
        /// Cycle rendered as `A -> B -> A`.
        path: String,
    },
}

/// Errors raised by an instance provider while resolving a type.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// No registration exists for the requested type.
    #[error("type `{type_name}` is not registered")]
    Unregistered {
        /// Requested type.
        type_name: String,
    },

    /// Resolving the type required resolving itself.
    #[error("resolution cycle detected: {path}")]
    Cycle {
        /// Cycle rendered as `A -> B -> A`.
        path: String,
    },

    /// A singleton's construction asked for a shorter-lived instance.
    #[error("{lifetime} `{type_name}` cannot be resolved while constructing a singleton")]
    CaptiveDependency {
        /// Requested type.
        type_name: String,
        /// Its registered lifetime.
        lifetime: Lifetime,
    },

    /// The type's constructor reported a failure.
    #[error("failed to construct `{type_name}`: {message}")]
    Construction {
        /// Type being constructed.
        type_name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The provider returned an instance of an unexpected type.
    #[error("instance registered for `{type_name}` has a different type")]
    TypeMismatch {
        /// Requested type.
        type_name: String,
    },
}

impl ResolutionError {
    /// Builds a [`ResolutionError::Construction`] for `T`.
    #[must_use]
    pub fn construction<T: ?Sized>(message: impl Into<String>) -> Self {
        Self::Construction {
            type_name: type_name::<T>().to_owned(),
            message: message.into(),
        }
    }
}

/// Errors reported by the convention engine.
///
/// [`ConventionError::NotConfigured`] is the structured "no mapping for this
/// pair" signal; the mapper treats it as a miss. Every other variant is a
/// hard failure that reaches the caller.
#[derive(Debug, Error)]
pub enum ConventionError {
    /// The engine has no configuration for the pair.
    #[error("no convention configured for `{source_type}` -> `{destination_type}`")]
    NotConfigured {
        /// Source type of the pair.
        source_type: String,
        /// Destination type of the pair.
        destination_type: String,
    },

    /// The engine has a configuration for the pair but mapping failed.
    #[error("convention mapping `{source_type}` -> `{destination_type}` failed: {message}")]
    Failed {
        /// Source type of the pair.
        source_type: String,
        /// Destination type of the pair.
        destination_type: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The engine could not be constructed.
    #[error("convention engine unavailable: {message}")]
    Unavailable {
        /// Human-readable failure description.
        message: String,
    },
}

impl ConventionError {
    /// Builds a [`ConventionError::NotConfigured`] for mapping `A` into `B`.
    #[must_use]
    pub fn not_configured<A: ?Sized, B: ?Sized>() -> Self {
        Self::NotConfigured {
            source_type: type_name::<A>().to_owned(),
            destination_type: type_name::<B>().to_owned(),
        }
    }

    /// Builds a [`ConventionError::Failed`] for mapping `A` into `B`.
    #[must_use]
    pub fn failed<A: ?Sized, B: ?Sized>(message: impl Into<String>) -> Self {
        Self::Failed {
            source_type: type_name::<A>().to_owned(),
            destination_type: type_name::<B>().to_owned(),
            message: message.into(),
        }
    }

    /// Returns `true` for the soft "no configuration for this pair" signal.
    #[must_use]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured { .. })
    }
}

/// Failure reported by a handler's `transform`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransformError {
    /// Creates an error with a message and no underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors returned to callers of the mapper service.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Neither a handler nor the convention engine can map the pair.
    #[error("no mapping available from `{source_type}` to `{destination_type}`")]
    NotFound {
        /// Requested source type.
        source_type: String,
        /// Requested destination type.
        destination_type: String,
    },

    /// The handler or one of its dependencies could not be resolved.
    #[error("failed to resolve handler: {0}")]
    Resolution(#[from] ResolutionError),

    /// The convention engine failed for a reason other than a missing
    /// configuration.
    #[error("convention engine error: {0}")]
    Convention(#[source] ConventionError),

    /// The handler ran and reported a failure.
    #[error("handler `{handler}` failed: {source}")]
    Transform {
        /// Handler type that failed.
        handler: String,
        /// Failure reported by the handler.
        #[source]
        source: TransformError,
    },
}

impl MapperError {
    /// Builds a [`MapperError::NotFound`] naming both sides of the key.
    #[must_use]
    pub fn not_found(key: DispatchKey) -> Self {
        Self::NotFound {
            source_type: key.source().name().to_owned(),
            destination_type: key.destination().name().to_owned(),
        }
    }

    /// Returns `true` when nothing could map the requested pair.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests;
