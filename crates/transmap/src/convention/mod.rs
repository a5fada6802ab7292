//! Contract for the secondary, convention-based mapping engine.
//!
//! The engine is a black box consulted when no explicit handler serves a
//! pair. It must report a missing configuration with
//! [`ConventionError::NotConfigured`]; the mapper folds that into its own
//! not-found result and surfaces every other error unchanged.

use std::fmt;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::ConventionError;

/// Tracing target for the convention fallback.
pub(crate) const CONVENTION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::convention");

/// Convention-based mapper used as a fallback.
pub trait ConventionEngine: Send + Sync {
    /// Maps `input` into `B` using whatever conventions are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConventionError::NotConfigured`] when the engine has nothing
    /// for the pair, or another [`ConventionError`] when a configured mapping
    /// fails.
    fn map<A: 'static, B: 'static>(&self, input: &A, output: Option<B>) -> Result<B, ConventionError>;
}

/// Engine with no configured conventions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConventions;

impl ConventionEngine for NoConventions {
    fn map<A: 'static, B: 'static>(&self, _input: &A, _output: Option<B>) -> Result<B, ConventionError> {
        Err(ConventionError::not_configured::<A, B>())
    }
}

type EngineFactory<C> = Box<dyn Fn() -> Result<C, ConventionError> + Send + Sync>;

/// Convention engine built on first use and kept for the owner's lifetime.
///
/// Concurrent first callers block until one of them has built the engine;
/// the factory runs at most once per successful initialisation. A failed
/// initialisation is reported to its caller and retried on the next use.
///
/// The engine is shared per [`MapperService`](crate::MapperService), not
/// per process. A host is expected to build one mapper at startup and share
/// it; two services built from separate `LazyConvention`s each construct
/// their own engine.
///
/// # Example
///
/// ```
/// use transmap::{LazyConvention, NoConventions};
///
/// let lazy = LazyConvention::new(|| Ok(NoConventions));
/// assert!(!lazy.is_initialised());
/// lazy.get().expect("engine builds");
/// assert!(lazy.is_initialised());
/// ```
pub struct LazyConvention<C> {
    engine: OnceCell<C>,
    factory: Option<EngineFactory<C>>,
}

impl<C> LazyConvention<C> {
    /// Defers construction to `factory`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<C, ConventionError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// Wraps an engine that is already built.
    pub fn ready(engine: C) -> Self {
        Self {
            engine: OnceCell::with_value(engine),
            factory: None,
        }
    }

    /// Returns the engine, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns the factory's error, typically
    /// [`ConventionError::Unavailable`].
    pub fn get(&self) -> Result<&C, ConventionError> {
        self.engine.get_or_try_init(|| {
            let factory = self.factory.as_ref().ok_or_else(|| ConventionError::Unavailable {
                message: "no engine factory configured".to_owned(),
            })?;
            debug!(target: CONVENTION_TARGET, "initialising convention engine");
            factory()
        })
    }

    /// Returns `true` once the engine has been built.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.engine.get().is_some()
    }
}

impl<C: Default + Send + Sync + 'static> Default for LazyConvention<C> {
    fn default() -> Self {
        Self::new(|| Ok(C::default()))
    }
}

impl<C> fmt::Debug for LazyConvention<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConvention")
            .field("initialised", &self.is_initialised())
            .finish_non_exhaustive()
    }
}
