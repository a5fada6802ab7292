//! Built-in [`InstanceProvider`]: a registration map with per-scope caches.
//!
//! Singletons live in a `OnceCell` beside their registration, so concurrent
//! first use constructs them exactly once. Scoped instances live in the
//! [`RegistryScope`] that created them and are released when it drops.
//! Singleton constructors run against a root context that refuses scoped
//! and transient lookups, which keeps a singleton from capturing an
//! instance that belongs to one request.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use super::{AnyInstance, InstanceProvider, Registration, Resolver};
use crate::error::{RegistrationError, ResolutionError};
use crate::keys::TypeKey;
use crate::lifetime::Lifetime;

/// Tracing target for instance provision.
pub(crate) const PROVIDER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::provider");

struct Entry {
    registration: Registration,
    singleton: OnceCell<AnyInstance>,
}

/// Registration set with singleton, scoped and transient lifetimes.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use transmap::{InstanceProvider, Lifetime, Registration, ResolveExt, ScopedRegistry};
///
/// let mut registry = ScopedRegistry::new();
/// registry
///     .register(Registration::instance(String::from("shared")))
///     .expect("registration succeeds");
///
/// let first = registry.create_scope().resolve::<String>().expect("resolves");
/// let second = registry.create_scope().resolve::<String>().expect("resolves");
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Default)]
pub struct ScopedRegistry {
    entries: HashMap<TypeKey, Entry>,
}

impl ScopedRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `key` has a registration.
    #[must_use]
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registrations, counting capability keys separately.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve_singleton(
        &self,
        entry: &Entry,
        in_flight: Vec<TypeKey>,
    ) -> Result<AnyInstance, ResolutionError> {
        entry
            .singleton
            .get_or_try_init(|| {
                let root = RegistryScope::root(self, in_flight);
                entry.registration.construct(&root).inspect(|_| {
                    debug!(
                        target: PROVIDER_TARGET,
                        type_name = entry.registration.key().name(),
                        "singleton constructed"
                    );
                })
            })
            .map(Arc::clone)
    }
}

impl fmt::Debug for ScopedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .map(|(key, entry)| (key.name(), entry.registration.lifetime())),
            )
            .finish()
    }
}

impl InstanceProvider for ScopedRegistry {
    type Scope<'a> = RegistryScope<'a>;

    fn register(&mut self, registration: Registration) -> Result<(), RegistrationError> {
        let key = registration.key();
        if self.entries.contains_key(&key) {
            return Err(RegistrationError::DuplicateService {
                type_name: key.name().to_owned(),
            });
        }
        trace!(
            target: PROVIDER_TARGET,
            type_name = key.name(),
            lifetime = %registration.lifetime(),
            "registered"
        );
        self.entries.insert(
            key,
            Entry {
                registration,
                singleton: OnceCell::new(),
            },
        );
        Ok(())
    }

    fn lifetime_of(&self, key: &TypeKey) -> Option<Lifetime> {
        self.entries
            .get(key)
            .map(|entry| entry.registration.lifetime())
    }

    fn create_scope(&self) -> RegistryScope<'_> {
        RegistryScope::new(self, ScopeKind::Request, Vec::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Request,
    Root,
}

/// Resolution scope opened by [`ScopedRegistry::create_scope`].
///
/// Scoped instances are cached here and dropped with the scope.
pub struct RegistryScope<'a> {
    registry: &'a ScopedRegistry,
    kind: ScopeKind,
    instances: Mutex<HashMap<TypeKey, AnyInstance>>,
    in_flight: Mutex<Vec<TypeKey>>,
}

impl<'a> RegistryScope<'a> {
    fn new(registry: &'a ScopedRegistry, kind: ScopeKind, in_flight: Vec<TypeKey>) -> Self {
        Self {
            registry,
            kind,
            instances: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(in_flight),
        }
    }

    fn root(registry: &'a ScopedRegistry, in_flight: Vec<TypeKey>) -> Self {
        Self::new(registry, ScopeKind::Root, in_flight)
    }

    /// Number of scoped instances currently held by this scope.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        lock(&self.instances).len()
    }

    fn enter(&self, key: &TypeKey) -> Result<InFlight<'_>, ResolutionError> {
        let mut stack = lock(&self.in_flight);
        if let Some(position) = stack.iter().position(|pending| pending == key) {
            let path = stack
                .iter()
                .skip(position)
                .chain(std::iter::once(key))
                .map(|pending| pending.name())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ResolutionError::Cycle { path });
        }
        stack.push(*key);
        Ok(InFlight {
            stack: &self.in_flight,
        })
    }

    fn in_flight(&self) -> Vec<TypeKey> {
        lock(&self.in_flight).clone()
    }

    fn cached(&self, key: &TypeKey) -> Option<AnyInstance> {
        lock(&self.instances).get(key).map(Arc::clone)
    }

    fn cache(&self, key: &TypeKey, instance: AnyInstance) -> AnyInstance {
        Arc::clone(lock(&self.instances).entry(*key).or_insert(instance))
    }
}

impl Resolver for RegistryScope<'_> {
    fn resolve_key(&self, key: &TypeKey) -> Result<AnyInstance, ResolutionError> {
        let entry =
            self.registry
                .entries
                .get(key)
                .ok_or_else(|| ResolutionError::Unregistered {
                    type_name: key.name().to_owned(),
                })?;
        let lifetime = entry.registration.lifetime();

        if self.kind == ScopeKind::Root && !Lifetime::Singleton.can_depend_on(lifetime) {
            return Err(ResolutionError::CaptiveDependency {
                type_name: key.name().to_owned(),
                lifetime,
            });
        }

        match lifetime {
            Lifetime::Singleton => {
                if let Some(instance) = entry.singleton.get() {
                    return Ok(Arc::clone(instance));
                }
                let _guard = self.enter(key)?;
                self.registry.resolve_singleton(entry, self.in_flight())
            }
            Lifetime::Scoped => {
                if let Some(instance) = self.cached(key) {
                    return Ok(instance);
                }
                let _guard = self.enter(key)?;
                let instance = entry.registration.construct(self)?;
                Ok(self.cache(key, instance))
            }
            Lifetime::Transient => {
                let _guard = self.enter(key)?;
                entry.registration.construct(self)
            }
        }
    }
}

impl fmt::Debug for RegistryScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryScope")
            .field("kind", &self.kind)
            .field("instances", &self.instance_count())
            .finish_non_exhaustive()
    }
}

impl Drop for RegistryScope<'_> {
    fn drop(&mut self) {
        if self.kind == ScopeKind::Request {
            let released = self
                .instances
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .len();
            debug!(target: PROVIDER_TARGET, released, "scope released");
        }
    }
}

/// Marks a key as under construction until dropped.
struct InFlight<'s> {
    stack: &'s Mutex<Vec<TypeKey>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.stack).pop();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
