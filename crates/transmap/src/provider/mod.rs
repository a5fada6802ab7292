//! Scope-aware instance provision.
//!
//! The mapper depends on its instance provider only through the
//! [`InstanceProvider`] and [`Resolver`] traits: register a type, open a
//! scope, resolve a type inside that scope. [`ScopedRegistry`] is the
//! built-in implementation; any container offering the same three
//! operations can stand in for it.
//!
//! Types describe their constructor through [`Injectable`]. The declared
//! dependency list drives lifetime inference and build-time validation, and
//! `construct` receives the resolver for the scope being served so that
//! every instance in one call's object graph comes from the same scope.

mod scoped;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::{RegistrationError, ResolutionError};
use crate::keys::TypeKey;
use crate::lifetime::Lifetime;
use crate::transform::Transform;

pub use self::scoped::{RegistryScope, ScopedRegistry};

/// Type-erased shared instance.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Type-erased constructor stored in a [`Registration`].
pub type Factory = Arc<dyn Fn(&dyn Resolver) -> Result<AnyInstance, ResolutionError> + Send + Sync>;

/// A type the provider knows how to build.
///
/// # Example
///
/// ```
/// use transmap::{Injectable, Resolver, ResolveExt, ResolutionError, TypeKey};
/// use std::sync::Arc;
///
/// struct Clock;
///
/// impl Injectable for Clock {
///     fn construct(_resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
///         Ok(Self)
///     }
/// }
///
/// struct Auditor {
///     clock: Arc<Clock>,
/// }
///
/// impl Injectable for Auditor {
///     fn dependencies() -> Vec<TypeKey> {
///         vec![TypeKey::of::<Clock>()]
///     }
///
///     fn construct(resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
///         Ok(Self { clock: resolver.resolve::<Clock>()? })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters, one key per injected dependency.
    #[must_use]
    fn dependencies() -> Vec<TypeKey> {
        Vec::new()
    }

    /// Builds an instance, resolving dependencies from `resolver`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when a dependency cannot be resolved or
    /// construction itself fails.
    fn construct(resolver: &dyn Resolver) -> Result<Self, ResolutionError>;
}

/// Resolution context for a single scope.
pub trait Resolver {
    /// Resolves the instance registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolutionError`] when the key is unregistered or any part
    /// of its dependency chain fails.
    fn resolve_key(&self, key: &TypeKey) -> Result<AnyInstance, ResolutionError>;
}

/// Typed resolution helpers available on every [`Resolver`].
pub trait ResolveExt: Resolver {
    /// Resolves the concrete type `T`.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error, or returns
    /// [`ResolutionError::TypeMismatch`] if the registration produced some
    /// other type.
    fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolutionError> {
        let key = TypeKey::of::<T>();
        self.resolve_key(&key)?
            .downcast::<T>()
            .map_err(|_| ResolutionError::TypeMismatch {
                type_name: key.name().to_owned(),
            })
    }

    /// Resolves whichever handler is registered for the `A -> B` capability.
    ///
    /// # Errors
    ///
    /// As for [`ResolveExt::resolve`].
    fn resolve_transform<A: 'static, B: 'static>(
        &self,
    ) -> Result<Arc<dyn Transform<A, B>>, ResolutionError> {
        let key = capability_key::<A, B>();
        let instance = self
            .resolve_key(&key)?
            .downcast::<Arc<dyn Transform<A, B>>>()
            .map_err(|_| ResolutionError::TypeMismatch {
                type_name: key.name().to_owned(),
            })?;
        Ok(Arc::clone(instance.as_ref()))
    }
}

impl<R: Resolver + ?Sized> ResolveExt for R {}

/// Key under which the handler for `A -> B` is registered with the provider.
#[must_use]
pub fn capability_key<A: 'static, B: 'static>() -> TypeKey {
    TypeKey::of::<dyn Transform<A, B>>()
}

/// Registration set and scope factory consumed by the mapper.
pub trait InstanceProvider: Send + Sync {
    /// Resolution context handed out by [`InstanceProvider::create_scope`].
    /// Dropping it releases every scoped instance it holds.
    type Scope<'a>: Resolver
    where
        Self: 'a;

    /// Adds a registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateService`] when the key is
    /// already registered.
    fn register(&mut self, registration: Registration) -> Result<(), RegistrationError>;

    /// Lifetime of the registration for `key`, if any.
    fn lifetime_of(&self, key: &TypeKey) -> Option<Lifetime>;

    /// Opens a fresh resolution scope.
    fn create_scope(&self) -> Self::Scope<'_>;
}

/// One entry in the provider's registration set.
#[derive(Clone)]
pub struct Registration {
    key: TypeKey,
    lifetime: Lifetime,
    dependencies: Vec<TypeKey>,
    factory: Factory,
}

impl Registration {
    /// Creates a registration from its parts.
    #[must_use]
    pub fn new(
        key: TypeKey,
        lifetime: Lifetime,
        dependencies: Vec<TypeKey>,
        factory: Factory,
    ) -> Self {
        Self {
            key,
            lifetime,
            dependencies,
            factory,
        }
    }

    /// Registers `T` under its own key, built through [`Injectable`].
    #[must_use]
    pub fn injectable<T: Injectable>(lifetime: Lifetime) -> Self {
        Self::new(
            TypeKey::of::<T>(),
            lifetime,
            T::dependencies(),
            injectable_factory::<T>(),
        )
    }

    /// Registers a prebuilt value as a singleton.
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let shared: AnyInstance = Arc::new(value);
        Self::new(
            TypeKey::of::<T>(),
            Lifetime::Singleton,
            Vec::new(),
            Arc::new(move |_: &dyn Resolver| -> Result<AnyInstance, ResolutionError> {
                Ok(Arc::clone(&shared))
            }),
        )
    }

    /// Registers handler `H` under the `A -> B` capability key.
    ///
    /// The capability resolves `H` through its concrete registration, so both
    /// keys must share a lifetime.
    #[must_use]
    pub fn capability<H, A, B>(lifetime: Lifetime) -> Self
    where
        H: Transform<A, B> + 'static,
        A: 'static,
        B: 'static,
    {
        Self::new(
            capability_key::<A, B>(),
            lifetime,
            vec![TypeKey::of::<H>()],
            capability_factory::<H, A, B>(),
        )
    }

    /// Key this registration answers to.
    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Lifetime policy for resolved instances.
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Declared constructor dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }

    pub(crate) fn factory(&self) -> Factory {
        Arc::clone(&self.factory)
    }

    /// Runs the constructor against `resolver`.
    ///
    /// # Errors
    ///
    /// Propagates any [`ResolutionError`] raised by the constructor.
    pub fn construct(&self, resolver: &dyn Resolver) -> Result<AnyInstance, ResolutionError> {
        (self.factory)(resolver)
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key)
            .field("lifetime", &self.lifetime)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

pub(crate) fn injectable_factory<T: Injectable>() -> Factory {
    Arc::new(|resolver: &dyn Resolver| -> Result<AnyInstance, ResolutionError> {
        let instance: AnyInstance = Arc::new(T::construct(resolver)?);
        Ok(instance)
    })
}

pub(crate) fn capability_factory<H, A, B>() -> Factory
where
    H: Transform<A, B> + 'static,
    A: 'static,
    B: 'static,
{
    Arc::new(|resolver: &dyn Resolver| -> Result<AnyInstance, ResolutionError> {
        let handler = resolver.resolve::<H>()?;
        let capability: Arc<dyn Transform<A, B>> = handler;
        let instance: AnyInstance = Arc::new(capability);
        Ok(instance)
    })
}
