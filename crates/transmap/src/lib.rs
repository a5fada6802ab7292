//! Typed transformation-handler registry and mapper.
//!
//! `transmap` routes a request to turn a value of type `A` into a value of
//! type `B` to the one handler registered for that pair. Handlers are
//! ordinary types implementing [`Transform<A, B>`] and [`Injectable`]; they
//! receive their dependencies from a scope-aware [`InstanceProvider`] that
//! honours three lifetimes:
//!
//! - [`Lifetime::Singleton`]: one instance for the life of the provider.
//! - [`Lifetime::Scoped`]: one instance per mapping call.
//! - [`Lifetime::Transient`]: a fresh instance on every resolution.
//!
//! Startup is explicit. The host passes a list of [`Candidate`]s to
//! [`RegistryBuilder::build`] (or to [`MapperService::from_candidates`]),
//! which validates the dependency graph, populates the provider and returns
//! an immutable [`DispatchTable`]. Pairs with no handler fall back to a
//! pluggable [`ConventionEngine`] before the call fails with
//! [`MapperError::NotFound`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use transmap::{
//!     Candidate, Injectable, LazyConvention, Lifetime, MapperService, NoConventions,
//!     ResolveExt, Resolver, ResolutionError, Transform, TransformError, TypeKey,
//! };
//! use transmap_config::MapperConfig;
//!
//! struct Order {
//!     pence: u64,
//! }
//!
//! struct Receipt {
//!     line: String,
//! }
//!
//! struct Currency {
//!     symbol: &'static str,
//! }
//!
//! impl Injectable for Currency {
//!     fn construct(_resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
//!         Ok(Self { symbol: "£" })
//!     }
//! }
//!
//! struct ReceiptPrinter {
//!     currency: Arc<Currency>,
//! }
//!
//! impl Injectable for ReceiptPrinter {
//!     fn dependencies() -> Vec<TypeKey> {
//!         vec![TypeKey::of::<Currency>()]
//!     }
//!
//!     fn construct(resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
//!         Ok(Self {
//!             currency: resolver.resolve::<Currency>()?,
//!         })
//!     }
//! }
//!
//! impl Transform<Order, Receipt> for ReceiptPrinter {
//!     fn transform(&self, input: &Order, _output: Option<Receipt>) -> Result<Receipt, TransformError> {
//!         Ok(Receipt {
//!             line: format!("{}{}.{:02}", self.currency.symbol, input.pence / 100, input.pence % 100),
//!         })
//!     }
//! }
//!
//! let mapper = MapperService::from_candidates(
//!     &MapperConfig::default(),
//!     vec![
//!         Candidate::service::<Currency>().with_lifetime(Lifetime::Singleton),
//!         Candidate::handler::<ReceiptPrinter, Order, Receipt>(),
//!     ],
//!     LazyConvention::ready(NoConventions),
//! )
//! .expect("registry builds");
//!
//! let receipt: Receipt = mapper.map(&Order { pence: 1250 }).expect("mapping succeeds");
//! assert_eq!(receipt.line, "£12.50");
//! ```

mod bootstrap;
mod convention;
mod dispatch;
mod error;
mod keys;
mod lifetime;
mod provider;
mod registry;
mod service;
pub mod telemetry;
mod transform;

pub use bootstrap::{
    ArgsConfigLoader, BootstrapError, ConfigLoader, MapperRuntime, SystemConfigLoader, bootstrap,
};
pub use convention::{ConventionEngine, LazyConvention, NoConventions};
pub use dispatch::{DispatchTable, HandlerDescriptor};
pub use error::{ConventionError, MapperError, RegistrationError, ResolutionError, TransformError};
pub use keys::{DispatchKey, TypeKey};
pub use lifetime::Lifetime;
pub use provider::{
    AnyInstance, Factory, InstanceProvider, Injectable, Registration, RegistryScope, ResolveExt,
    Resolver, ScopedRegistry, capability_key,
};
pub use registry::{Candidate, RegistryBuilder};
pub use service::MapperService;
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transform::Transform;

#[cfg(test)]
mod tests;
