//! Immutable routing table from dispatch keys to registered handlers.
//!
//! The [`DispatchTable`] is produced once by
//! [`RegistryBuilder::build`](crate::registry::RegistryBuilder::build) and
//! never mutated afterwards, so concurrent readers need no locking.

use std::collections::HashMap;

use crate::keys::{DispatchKey, TypeKey};
use crate::lifetime::Lifetime;

/// One registered transformation capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerDescriptor {
    key: DispatchKey,
    handler: TypeKey,
    lifetime: Lifetime,
}

impl HandlerDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub const fn new(key: DispatchKey, handler: TypeKey, lifetime: Lifetime) -> Self {
        Self {
            key,
            handler,
            lifetime,
        }
    }

    /// Dispatch key the handler serves.
    #[must_use]
    pub const fn key(&self) -> DispatchKey {
        self.key
    }

    /// Source type of the pair.
    #[must_use]
    pub const fn source(&self) -> TypeKey {
        self.key.source()
    }

    /// Destination type of the pair.
    #[must_use]
    pub const fn destination(&self) -> TypeKey {
        self.key.destination()
    }

    /// Concrete handler type.
    #[must_use]
    pub const fn handler(&self) -> TypeKey {
        self.handler
    }

    /// Lifetime the handler was registered with.
    #[must_use]
    pub const fn lifetime(&self) -> Lifetime {
        self.lifetime
    }
}

/// Read-only map from `(source, destination)` to handler.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    handlers: HashMap<DispatchKey, HandlerDescriptor>,
}

impl DispatchTable {
    pub(crate) fn from_descriptors(handlers: HashMap<DispatchKey, HandlerDescriptor>) -> Self {
        Self { handlers }
    }

    /// Looks up the handler registered for `key`.
    #[must_use]
    pub fn lookup(&self, key: &DispatchKey) -> Option<&HandlerDescriptor> {
        self.handlers.get(key)
    }

    /// Looks up the handler registered for mapping `A` into `B`.
    #[must_use]
    pub fn lookup_pair<A: 'static, B: 'static>(&self) -> Option<&HandlerDescriptor> {
        self.lookup(&DispatchKey::of::<A, B>())
    }

    /// Returns `true` when a handler serves `key`.
    #[must_use]
    pub fn contains(&self, key: &DispatchKey) -> bool {
        self.handlers.contains_key(key)
    }

    /// Iterates over every registered handler, in no particular order.
    pub fn descriptors(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.values()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` when no pairs are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests;
