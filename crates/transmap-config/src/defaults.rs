use crate::logging::LogFormat;

/// Default log filter expression used when nothing overrides it.
///
/// Registry and mapper events are kept at `info`; other crates in the host
/// process only report warnings.
pub const DEFAULT_LOG_FILTER: &str = "warn,transmap=info";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Declared handler dependencies are checked against the registration set at
/// build time unless validation is skipped.
pub const DEFAULT_SKIP_DEPENDENCY_VALIDATION: bool = false;

/// Pairs without an explicit handler are offered to the convention engine
/// unless the fallback is disabled.
pub const DEFAULT_DISABLE_CONVENTION_FALLBACK: bool = false;
