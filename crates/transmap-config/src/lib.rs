//! Shared configuration for the `transmap` mapping runtime.
//!
//! [`MapperConfig`] is loaded through `ortho_config`, which layers built-in
//! defaults, configuration files, `TRANSMAP_*` environment variables and
//! command-line flags, with later layers taking precedence.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_DISABLE_CONVENTION_FALLBACK, DEFAULT_LOG_FILTER, DEFAULT_SKIP_DEPENDENCY_VALIDATION,
    default_log_filter, default_log_filter_string, default_log_format,
};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Runtime configuration for the mapper and its telemetry.
///
/// The policy switches are stored as opt-out flags: a flag that is absent
/// from every layer reads as `false`, which leaves validation and the
/// convention fallback enabled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TRANSMAP")]
pub struct MapperConfig {
    /// `tracing` filter expression, e.g. `info` or `transmap=debug`.
    #[ortho_config(default = default_log_filter_string())]
    log_filter: String,
    /// Output format for log records.
    #[ortho_config(default = default_log_format())]
    log_format: LogFormat,
    /// Accept registrations whose declared dependencies are not registered;
    /// they fail on first resolution instead.
    #[ortho_config(default = DEFAULT_SKIP_DEPENDENCY_VALIDATION)]
    skip_dependency_validation: bool,
    /// Report pairs without an explicit handler as not found instead of
    /// consulting the convention engine.
    #[ortho_config(default = DEFAULT_DISABLE_CONVENTION_FALLBACK)]
    disable_convention_fallback: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            skip_dependency_validation: DEFAULT_SKIP_DEPENDENCY_VALIDATION,
            disable_convention_fallback: DEFAULT_DISABLE_CONVENTION_FALLBACK,
        }
    }
}

impl MapperConfig {
    /// Log filter expression handed to the subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log records.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether unknown declared dependencies fail the registry build.
    #[must_use]
    pub const fn validate_dependencies(&self) -> bool {
        !self.skip_dependency_validation
    }

    /// Whether unmatched pairs fall back to the convention engine.
    #[must_use]
    pub const fn convention_fallback(&self) -> bool {
        !self.disable_convention_fallback
    }

    /// Replaces the log filter expression.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Replaces the log output format.
    #[must_use]
    pub const fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Enables or disables build-time dependency validation.
    #[must_use]
    pub const fn with_validate_dependencies(mut self, enabled: bool) -> Self {
        self.skip_dependency_validation = !enabled;
        self
    }

    /// Enables or disables the convention engine fallback.
    #[must_use]
    pub const fn with_convention_fallback(mut self, enabled: bool) -> Self {
        self.disable_convention_fallback = !enabled;
        self
    }
}
