//! The two-parameter transform capability implemented by handlers.

use crate::error::TransformError;

/// Converts a `&A` into a `B`, optionally reusing an existing destination.
///
/// Handlers resolved as singletons are shared across concurrent calls, so
/// implementations must be stateless or internally synchronised.
///
/// # Example
///
/// ```
/// use transmap::{Transform, TransformError};
///
/// struct Celsius(f64);
/// struct Fahrenheit(f64);
///
/// struct TemperatureHandler;
///
/// impl Transform<Celsius, Fahrenheit> for TemperatureHandler {
///     fn transform(
///         &self,
///         input: &Celsius,
///         _output: Option<Fahrenheit>,
///     ) -> Result<Fahrenheit, TransformError> {
///         Ok(Fahrenheit(input.0 * 9.0 / 5.0 + 32.0))
///     }
/// }
/// ```
pub trait Transform<A, B>: Send + Sync {
    /// Maps `input` into a destination value.
    ///
    /// `output` carries a preexisting destination when the caller supplied
    /// one; handlers may update and return it instead of building a new one.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] when the input cannot be mapped.
    fn transform(&self, input: &A, output: Option<B>) -> Result<B, TransformError>;
}
