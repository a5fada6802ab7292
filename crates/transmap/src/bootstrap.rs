//! Startup orchestration for host processes.
//!
//! [`bootstrap`] loads configuration, installs telemetry and builds the
//! registry in that order, stopping at the first failure. Hosts that manage
//! their own configuration or subscriber can skip it and call
//! [`MapperService::from_candidates`] directly.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::info;

use transmap_config::MapperConfig;

use crate::convention::{ConventionEngine, LazyConvention};
use crate::error::RegistrationError;
use crate::provider::ScopedRegistry;
use crate::registry::Candidate;
use crate::service::{MapperService, SERVICE_TARGET};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the mapper configuration.
    fn load(&self) -> Result<MapperConfig, Arc<OrthoError>>;
}

/// Loader that delegates to [`MapperConfig::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<MapperConfig, Arc<OrthoError>> {
        MapperConfig::load()
    }
}

/// Loader that runs the full layered load against explicit arguments
/// instead of the process command line.
///
/// Defaults, configuration files and `TRANSMAP_*` environment variables
/// still apply; `args` stands in for `std::env::args_os`, including the
/// program name.
#[derive(Debug, Clone)]
pub struct ArgsConfigLoader {
    args: Vec<OsString>,
}

impl ArgsConfigLoader {
    /// Creates a loader over `args`.
    #[must_use]
    pub fn new<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConfigLoader for ArgsConfigLoader {
    fn load(&self) -> Result<MapperConfig, Arc<OrthoError>> {
        MapperConfig::load_from_iter(self.args.iter().cloned())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The handler registry could not be built.
    #[error("failed to build the handler registry: {source}")]
    Registration {
        /// Underlying registration error.
        #[source]
        source: RegistrationError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct MapperRuntime<C> {
    config: MapperConfig,
    mapper: MapperService<ScopedRegistry, C>,
    telemetry: TelemetryHandle,
}

impl<C> MapperRuntime<C> {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The ready-to-use mapper.
    #[must_use]
    pub const fn mapper(&self) -> &MapperService<ScopedRegistry, C> {
        &self.mapper
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Releases the mapper, discarding the configuration.
    #[must_use]
    pub fn into_mapper(self) -> MapperService<ScopedRegistry, C> {
        self.mapper
    }
}

/// Loads configuration, installs telemetry and builds the mapper.
///
/// # Errors
///
/// Returns the [`BootstrapError`] variant for the first stage that fails.
pub fn bootstrap<C>(
    loader: &dyn ConfigLoader,
    candidates: Vec<Candidate>,
    conventions: LazyConvention<C>,
) -> Result<MapperRuntime<C>, BootstrapError>
where
    C: ConventionEngine,
{
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let mapper = MapperService::from_candidates(&config, candidates, conventions)
        .map_err(|source| BootstrapError::Registration { source })?;

    info!(
        target: SERVICE_TARGET,
        handlers = mapper.dispatch_table().len(),
        convention_fallback = config.convention_fallback(),
        "mapper ready"
    );
    Ok(MapperRuntime {
        config,
        mapper,
        telemetry,
    })
}
