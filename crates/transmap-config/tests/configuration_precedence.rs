//! Behaviour tests for layered configuration loading.

use std::cell::RefCell;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, PoisonError};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use transmap_config::{LogFormat, MapperConfig, default_log_filter, default_log_format};

const LOG_FILTER_ENV: &str = "TRANSMAP_LOG_FILTER";

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<MapperConfig>>,
    error: RefCell<Option<String>>,
    _env_guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = std::env::var_os(LOG_FILTER_ENV);
        let harness = Self {
            cli_args: RefCell::new(vec![OsString::from("transmap")]),
            env_overrides: RefCell::new(vec![(LOG_FILTER_ENV.to_owned(), previous)]),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _env_guard: guard,
        };
        // Start every scenario from an environment without overrides.
        unsafe { std::env::remove_var(LOG_FILTER_ENV) };
        harness
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is serialised by `ENV_MUTEX` and undone in
        // `Drop`.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match MapperConfig::load_from_iter(args) {
            Ok(config) => {
                *self.loaded.borrow_mut() = Some(config);
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }

    fn loaded_config(&self) -> MapperConfig {
        self.load();

        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }

        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("the environment overrides the log filter to \"{filter}\"")]
fn given_environment_override(harness: &Harness, filter: String) {
    harness.set_env(LOG_FILTER_ENV, &filter);
}

#[when("the CLI sets the log filter to \"{filter}\"")]
fn when_cli_sets_filter(harness: &Harness, filter: String) {
    harness.push_cli_arg("--log-filter");
    harness.push_cli_arg(OsString::from(&filter));
}

#[when("the CLI sets the log format to \"{format}\"")]
fn when_cli_sets_format(harness: &Harness, format: String) {
    harness.push_cli_arg("--log-format");
    harness.push_cli_arg(OsString::from(&format));
}

#[when("the CLI passes the flag \"{flag}\"")]
fn when_cli_passes_flag(harness: &Harness, flag: String) {
    harness.push_cli_arg(flag);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the log filter to \"{filter}\"")]
fn then_resolved_filter(harness: &Harness, filter: String) {
    let config = harness.loaded_config();
    assert_eq!(config.log_filter(), filter);
}

#[then("loading the configuration resolves the log format to \"{format}\"")]
fn then_resolved_format(harness: &Harness, format: String) {
    let expected = match format.parse::<LogFormat>() {
        Ok(parsed) => parsed,
        Err(error) => panic!("invalid expected format '{format}': {error}"),
    };
    let config = harness.loaded_config();
    assert_eq!(config.log_format(), expected);
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.loaded_config();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert!(config.validate_dependencies());
    assert!(config.convention_fallback());
}

#[then("loading the configuration disables the convention fallback")]
fn then_fallback_disabled(harness: &Harness) {
    assert!(!harness.loaded_config().convention_fallback());
}

#[then("loading the configuration keeps dependency validation enabled")]
fn then_validation_enabled(harness: &Harness) {
    assert!(harness.loaded_config().validate_dependencies());
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Defaults apply when nothing overrides them"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Environment overrides the default log filter"
)]
fn environment_overrides_defaults(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line flags override the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line flags select the log format"
)]
fn cli_selects_log_format(#[from(harness)] harness: Harness) {
    drop(harness);
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Command-line flags opt out of the convention fallback"
)]
fn cli_opts_out_of_fallback(#[from(harness)] harness: Harness) {
    drop(harness);
}
