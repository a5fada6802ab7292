//! Unit tests for error types.

use std::error::Error as _;
use std::io;

use rstest::rstest;

use super::*;

struct Src4;
struct Dst4;

#[test]
fn not_found_names_both_types() {
    let error = MapperError::not_found(DispatchKey::of::<Src4, Dst4>());
    let message = error.to_string();
    assert!(message.contains("Src4"), "expected source in message: {message}");
    assert!(message.contains("Dst4"), "expected destination in message: {message}");
    assert!(error.is_not_found());
}

#[test]
fn convention_failure_is_distinct_from_not_found() {
    let error = MapperError::Convention(ConventionError::failed::<Src4, Dst4>("bad profile"));
    assert!(!error.is_not_found());
    let message = error.to_string();
    assert!(message.contains("bad profile"), "expected detail in message: {message}");
}

#[rstest]
#[case::not_configured(ConventionError::not_configured::<Src4, Dst4>(), true)]
#[case::failed(ConventionError::failed::<Src4, Dst4>("boom"), false)]
#[case::unavailable(ConventionError::Unavailable { message: "boom".into() }, false)]
fn only_not_configured_is_soft(#[case] error: ConventionError, #[case] soft: bool) {
    assert_eq!(error.is_not_configured(), soft);
}

#[test]
fn transform_error_keeps_its_cause() {
    let error = TransformError::with_source("could not parse", io::Error::other("eof"));
    assert_eq!(error.message(), "could not parse");
    let source = error.source().expect("source present");
    assert_eq!(source.to_string(), "eof");
}

#[test]
fn mapper_transform_error_names_handler() {
    let error = MapperError::Transform {
        handler: "OrderHandler".into(),
        source: TransformError::new("negative quantity"),
    };
    let message = error.to_string();
    assert!(message.contains("OrderHandler"), "expected handler in message: {message}");
    assert!(message.contains("negative quantity"), "expected detail in message: {message}");
    assert!(error.source().is_some());
}

#[test]
fn construction_error_names_type() {
    let error = ResolutionError::construction::<Src4>("pool exhausted");
    let message = error.to_string();
    assert!(message.contains("Src4"), "expected type in message: {message}");
    assert!(message.contains("pool exhausted"), "expected detail in message: {message}");
}

#[rstest]
#[case::captive(
    RegistrationError::CaptiveDependency {
        dependent: "Cache".into(),
        lifetime: Lifetime::Singleton,
        dependency: "Session".into(),
        dependency_lifetime: Lifetime::Scoped,
    },
    "singleton `Cache` cannot depend on scoped `Session`"
)]
#[case::cycle(
    RegistrationError::DependencyCycle { path: "A -> B -> A".into() },
    "A -> B -> A"
)]
fn registration_errors_render_context(#[case] error: RegistrationError, #[case] expected: &str) {
    let message = error.to_string();
    assert!(message.contains(expected), "expected '{expected}' in message: {message}");
}

#[test]
fn errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MapperError>();
    assert_send_sync::<RegistrationError>();
}
