//! The mapper façade.
//!
//! [`MapperService`] routes a mapping request for `(A, B)` through the
//! dispatch table. On a hit it opens one scope for the call, resolves the
//! handler and its dependencies inside that scope, runs the transform and
//! releases the scope whether or not the transform succeeded. On a miss it
//! asks the convention engine, treating "not configured" as a miss and
//! passing every other convention failure through.

use std::sync::Arc;

use tracing::debug;
use transmap_config::MapperConfig;

use crate::convention::{ConventionEngine, LazyConvention};
use crate::dispatch::{DispatchTable, HandlerDescriptor};
use crate::error::{MapperError, RegistrationError};
use crate::keys::DispatchKey;
use crate::provider::{InstanceProvider, ResolveExt, ScopedRegistry};
use crate::registry::{Candidate, RegistryBuilder};

/// Tracing target for mapping calls.
pub(crate) const SERVICE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::service");

/// Entry point for mapping values between registered types.
///
/// `MapperService` is `Send + Sync`; share it behind an [`Arc`] and call it
/// from any number of threads. Calls do not block one another except while
/// a singleton or the convention engine is first constructed.
///
/// # Example
///
/// ```
/// use transmap::{
///     Candidate, Injectable, LazyConvention, MapperService, NoConventions, Resolver,
///     ResolutionError, Transform, TransformError,
/// };
/// use transmap_config::MapperConfig;
///
/// struct Celsius(f64);
/// struct Kelvin(f64);
/// struct KelvinHandler;
///
/// impl Injectable for KelvinHandler {
///     fn construct(_resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
///         Ok(Self)
///     }
/// }
///
/// impl Transform<Celsius, Kelvin> for KelvinHandler {
///     fn transform(&self, input: &Celsius, _output: Option<Kelvin>) -> Result<Kelvin, TransformError> {
///         Ok(Kelvin(input.0 + 273.0))
///     }
/// }
///
/// let mapper = MapperService::from_candidates(
///     &MapperConfig::default(),
///     vec![Candidate::handler::<KelvinHandler, Celsius, Kelvin>()],
///     LazyConvention::ready(NoConventions),
/// )
/// .expect("registry builds");
///
/// let kelvin: Kelvin = mapper.map(&Celsius(27.0)).expect("mapping succeeds");
/// assert_eq!(kelvin.0, 300.0);
/// ```
#[derive(Debug)]
pub struct MapperService<P = ScopedRegistry, C = crate::convention::NoConventions> {
    table: Arc<DispatchTable>,
    provider: P,
    conventions: LazyConvention<C>,
    convention_fallback: bool,
}

impl<C: ConventionEngine> MapperService<ScopedRegistry, C> {
    /// Builds the registry from `candidates` into a fresh [`ScopedRegistry`].
    ///
    /// # Errors
    ///
    /// Returns any [`RegistrationError`] raised while building the registry.
    pub fn from_candidates(
        config: &MapperConfig,
        candidates: Vec<Candidate>,
        conventions: LazyConvention<C>,
    ) -> Result<Self, RegistrationError> {
        let mut provider = ScopedRegistry::new();
        let table = RegistryBuilder::from_config(config).build(candidates, &mut provider)?;
        Ok(Self::new(table, provider, conventions)
            .with_convention_fallback(config.convention_fallback()))
    }
}

impl<P: InstanceProvider, C: ConventionEngine> MapperService<P, C> {
    /// Assembles a service from a built table and the provider it populated.
    pub fn new(table: DispatchTable, provider: P, conventions: LazyConvention<C>) -> Self {
        Self {
            table: Arc::new(table),
            provider,
            conventions,
            convention_fallback: true,
        }
    }

    /// Enables or disables the convention engine fallback.
    #[must_use]
    pub fn with_convention_fallback(mut self, enabled: bool) -> Self {
        self.convention_fallback = enabled;
        self
    }

    /// Shared handle to the dispatch table.
    #[must_use]
    pub fn dispatch_table(&self) -> Arc<DispatchTable> {
        Arc::clone(&self.table)
    }

    /// The instance provider handlers are resolved from.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns `true` when an explicit handler serves `A -> B`.
    #[must_use]
    pub fn has_handler<A: 'static, B: 'static>(&self) -> bool {
        self.table.contains(&DispatchKey::of::<A, B>())
    }

    /// Maps `input` into a new `B`.
    ///
    /// Equivalent to [`MapperService::map_onto`] with no destination.
    ///
    /// # Errors
    ///
    /// As for [`MapperService::map_onto`].
    pub fn map<A: 'static, B: 'static>(&self, input: &A) -> Result<B, MapperError> {
        self.map_onto(input, None)
    }

    /// Maps `input` into `B`, handing `output` to the handler for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::NotFound`] when neither a handler nor the
    /// convention engine serves the pair, [`MapperError::Resolution`] when
    /// the handler cannot be resolved, [`MapperError::Transform`] when the
    /// handler fails and [`MapperError::Convention`] when the convention
    /// engine fails for any reason other than a missing configuration.
    pub fn map_onto<A: 'static, B: 'static>(
        &self,
        input: &A,
        output: Option<B>,
    ) -> Result<B, MapperError> {
        let key = DispatchKey::of::<A, B>();
        match self.table.lookup(&key) {
            Some(descriptor) => self.invoke_handler(descriptor, input, output),
            None => self.fall_back(key, input, output),
        }
    }

    fn invoke_handler<A: 'static, B: 'static>(
        &self,
        descriptor: &HandlerDescriptor,
        input: &A,
        output: Option<B>,
    ) -> Result<B, MapperError> {
        debug!(
            target: SERVICE_TARGET,
            pair = %descriptor.key(),
            handler = descriptor.handler().name(),
            lifetime = %descriptor.lifetime(),
            "dispatching to handler"
        );
        let scope = self.provider.create_scope();
        let handler = scope.resolve_transform::<A, B>()?;
        handler
            .transform(input, output)
            .map_err(|source| MapperError::Transform {
                handler: descriptor.handler().name().to_owned(),
                source,
            })
    }

    fn fall_back<A: 'static, B: 'static>(
        &self,
        key: DispatchKey,
        input: &A,
        output: Option<B>,
    ) -> Result<B, MapperError> {
        if !self.convention_fallback {
            debug!(target: SERVICE_TARGET, pair = %key, "no handler and fallback disabled");
            return Err(MapperError::not_found(key));
        }

        debug!(target: SERVICE_TARGET, pair = %key, "no handler; consulting conventions");
        let engine = self.conventions.get().map_err(MapperError::Convention)?;
        match engine.map(input, output) {
            Ok(mapped) => Ok(mapped),
            Err(error) if error.is_not_configured() => {
                debug!(target: SERVICE_TARGET, pair = %key, "no convention configured");
                Err(MapperError::not_found(key))
            }
            Err(error) => Err(MapperError::Convention(error)),
        }
    }
}
