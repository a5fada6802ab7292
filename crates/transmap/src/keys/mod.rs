//! Type identities and the composite keys used for handler dispatch.
//!
//! A [`DispatchKey`] is a structured pair of [`TypeKey`]s rather than a
//! string built from type names, so two distinct `(source, destination)`
//! pairs can never produce the same key even when their names share
//! prefixes or suffixes.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier for a Rust type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
///
/// # Example
///
/// ```
/// use transmap::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key, TypeKey::of::<String>());
/// assert_ne!(key, TypeKey::of::<&'static str>());
/// assert!(key.name().ends_with("String"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`. Unsized types such as trait objects are
    /// accepted.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Underlying type identifier.
    #[must_use]
    pub const fn id(self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics only.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Lookup key for a `(source, destination)` transformation.
///
/// # Example
///
/// ```
/// use transmap::DispatchKey;
///
/// let forward = DispatchKey::of::<u8, String>();
/// let backward = DispatchKey::of::<String, u8>();
/// assert_ne!(forward, backward);
/// assert_eq!(forward.to_string(), "u8 -> alloc::string::String");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    source: TypeKey,
    destination: TypeKey,
}

impl DispatchKey {
    /// Creates a key from explicit type keys.
    #[must_use]
    pub const fn new(source: TypeKey, destination: TypeKey) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Returns the key for mapping `A` into `B`.
    #[must_use]
    pub fn of<A: ?Sized + 'static, B: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<A>(), TypeKey::of::<B>())
    }

    /// Type being mapped from.
    #[must_use]
    pub const fn source(self) -> TypeKey {
        self.source
    }

    /// Type being mapped into.
    #[must_use]
    pub const fn destination(self) -> TypeKey {
        self.destination
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}
