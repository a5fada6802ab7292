//! Instance lifetimes and the rules that relate them.

use std::fmt;

/// How long a resolved instance lives and who shares it.
///
/// Variants are ordered from least to most restrictive, so
/// `Lifetime::Singleton < Lifetime::Scoped < Lifetime::Transient`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lifetime {
    /// One instance for the process, shared by every scope.
    Singleton,
    /// One instance per scope, shared by all resolutions inside it.
    Scoped,
    /// A fresh instance for every resolution.
    Transient,
}

impl Lifetime {
    /// Infers a lifetime from the number of constructor dependencies.
    ///
    /// A type with no dependencies holds no borrowed state and is safe to
    /// share; anything with dependencies is scoped so that it never outlives
    /// what it was built from.
    ///
    /// # Example
    ///
    /// ```
    /// use transmap::Lifetime;
    ///
    /// assert_eq!(Lifetime::infer(0), Lifetime::Singleton);
    /// assert_eq!(Lifetime::infer(2), Lifetime::Scoped);
    /// ```
    #[must_use]
    pub const fn infer(dependency_count: usize) -> Self {
        if dependency_count == 0 {
            Self::Singleton
        } else {
            Self::Scoped
        }
    }

    /// Returns `true` when an instance of this lifetime may hold a
    /// dependency of the given lifetime.
    ///
    /// Only singletons are constrained: a singleton built from a scoped or
    /// transient instance would keep that instance alive for the process.
    #[must_use]
    pub const fn can_depend_on(self, dependency: Self) -> bool {
        !matches!(
            (self, dependency),
            (Self::Singleton, Self::Scoped | Self::Transient)
        )
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Singleton => "singleton",
            Self::Scoped => "scoped",
            Self::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
