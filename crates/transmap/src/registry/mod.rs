//! Handler registry builder.
//!
//! The host process hands [`RegistryBuilder::build`] an explicit list of
//! [`Candidate`]s at startup. The builder infers or checks each type's
//! lifetime, validates the declared dependency graph, registers every type
//! with the instance provider (handlers under both their concrete key and
//! their capability key) and returns the [`DispatchTable`] used for routing.
//!
//! Registration is all-or-nothing in intent: any [`RegistrationError`] is
//! fatal and the partially populated provider should be discarded.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info};
use transmap_config::MapperConfig;

use crate::dispatch::{DispatchTable, HandlerDescriptor};
use crate::error::RegistrationError;
use crate::keys::{DispatchKey, TypeKey};
use crate::lifetime::Lifetime;
use crate::provider::{
    Factory, InstanceProvider, Injectable, Registration, capability_factory, capability_key,
    injectable_factory,
};
use crate::transform::Transform;

/// Tracing target for registry construction.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

#[derive(Clone)]
struct Capability {
    dispatch: DispatchKey,
    key: TypeKey,
    factory: Factory,
}

/// One entry in the startup registration list.
///
/// # Example
///
/// ```
/// use transmap::{Candidate, Injectable, Lifetime, Resolver, ResolutionError, Transform, TransformError};
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
///         Ok(Kelvin(input.0 + 273.15))
///     }
/// }
///
/// let candidate = Candidate::handler::<KelvinHandler, Celsius, Kelvin>();
/// assert!(candidate.is_handler());
/// assert_eq!(candidate.declared_lifetime(), None);
///
/// let pinned = candidate.with_lifetime(Lifetime::Transient);
/// assert_eq!(pinned.declared_lifetime(), Some(Lifetime::Transient));
/// ```
#[derive(Clone)]
pub struct Candidate {
    key: TypeKey,
    dependencies: Vec<TypeKey>,
    declared: Option<Lifetime>,
    factory: Factory,
    capability: Option<Capability>,
}

impl Candidate {
    /// Handler `H` serving the `A -> B` pair.
    ///
    /// A handler type may be listed once per pair it serves; it is
    /// registered with the provider only once.
    #[must_use]
    pub fn handler<H, A, B>() -> Self
    where
        H: Injectable + Transform<A, B>,
        A: 'static,
        B: 'static,
    {
        Self {
            key: TypeKey::of::<H>(),
            dependencies: H::dependencies(),
            declared: None,
            factory: injectable_factory::<H>(),
            capability: Some(Capability {
                dispatch: DispatchKey::of::<A, B>(),
                key: capability_key::<A, B>(),
                factory: capability_factory::<H, A, B>(),
            }),
        }
    }

    /// Dependency type `T` that handlers may inject.
    #[must_use]
    pub fn service<T: Injectable>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            dependencies: T::dependencies(),
            declared: None,
            factory: injectable_factory::<T>(),
            capability: None,
        }
    }

    /// Prebuilt value shared as a singleton.
    #[must_use]
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let registration = Registration::instance(value);
        Self {
            key: registration.key(),
            dependencies: Vec::new(),
            declared: Some(Lifetime::Singleton),
            factory: registration.factory(),
            capability: None,
        }
    }

    /// Declares the lifetime explicitly instead of inferring it from the
    /// number of dependencies.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.declared = Some(lifetime);
        self
    }

    /// Concrete type key.
    #[must_use]
    pub const fn key(&self) -> TypeKey {
        self.key
    }

    /// Pair served, for handler candidates.
    #[must_use]
    pub fn dispatch_key(&self) -> Option<DispatchKey> {
        self.capability.as_ref().map(|capability| capability.dispatch)
    }

    /// Returns `true` when the candidate implements the transform capability.
    #[must_use]
    pub const fn is_handler(&self) -> bool {
        self.capability.is_some()
    }

    /// Explicitly declared lifetime, if any.
    #[must_use]
    pub const fn declared_lifetime(&self) -> Option<Lifetime> {
        self.declared
    }

    /// Declared constructor dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[TypeKey] {
        &self.dependencies
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("key", &self.key)
            .field("dependencies", &self.dependencies)
            .field("declared", &self.declared)
            .field("dispatch", &self.dispatch_key())
            .finish_non_exhaustive()
    }
}

/// Candidates merged per concrete type.
struct TypeSpec {
    key: TypeKey,
    dependencies: Vec<TypeKey>,
    declared: Option<Lifetime>,
    factory: Factory,
    capabilities: Vec<Capability>,
}

impl TypeSpec {
    fn from_candidate(candidate: Candidate) -> Self {
        Self {
            key: candidate.key,
            dependencies: candidate.dependencies,
            declared: candidate.declared,
            factory: candidate.factory,
            capabilities: candidate.capability.into_iter().collect(),
        }
    }

    fn lifetime(&self) -> Lifetime {
        self.declared
            .unwrap_or_else(|| Lifetime::infer(self.dependencies.len()))
    }

    fn merge(&mut self, candidate: Candidate) -> Result<(), RegistrationError> {
        if self.capabilities.is_empty() && candidate.capability.is_none() {
            return Err(RegistrationError::DuplicateService {
                type_name: self.key.name().to_owned(),
            });
        }
        match (self.declared, candidate.declared) {
            (Some(first), Some(second)) if first != second => {
                return Err(RegistrationError::ConflictingLifetime {
                    type_name: self.key.name().to_owned(),
                    first,
                    second,
                });
            }
            (None, Some(second)) => self.declared = Some(second),
            _ => {}
        }
        self.capabilities.extend(candidate.capability);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Active,
    Done,
}

/// Builds the dispatch table and populates the instance provider.
#[derive(Debug, Clone, Copy)]
pub struct RegistryBuilder {
    validate_dependencies: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Creates a builder that validates declared dependencies.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            validate_dependencies: true,
        }
    }

    /// Creates a builder honouring the configured validation policy.
    #[must_use]
    pub const fn from_config(config: &MapperConfig) -> Self {
        Self::new().with_dependency_validation(config.validate_dependencies())
    }

    /// Enables or disables rejection of unregistered declared dependencies.
    ///
    /// When disabled, a missing dependency surfaces later as
    /// [`ResolutionError::Unregistered`](crate::ResolutionError::Unregistered)
    /// on the first call that needs it.
    #[must_use]
    pub const fn with_dependency_validation(mut self, enabled: bool) -> Self {
        self.validate_dependencies = enabled;
        self
    }

    /// Registers `candidates` with `provider` and returns the dispatch table.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::NoCandidates`] when no handler is
    /// supplied, [`RegistrationError::DuplicateHandler`] when two handlers
    /// claim the same pair, and the dependency graph errors
    /// ([`RegistrationError::UnknownDependency`],
    /// [`RegistrationError::CaptiveDependency`],
    /// [`RegistrationError::DependencyCycle`]) when validation fails.
    pub fn build<P>(
        &self,
        candidates: Vec<Candidate>,
        provider: &mut P,
    ) -> Result<DispatchTable, RegistrationError>
    where
        P: InstanceProvider + ?Sized,
    {
        if !candidates.iter().any(Candidate::is_handler) {
            return Err(RegistrationError::NoCandidates);
        }

        let (specs, index) = merge_candidates(candidates)?;
        detect_cycles(&specs, &index)?;
        self.check_dependencies(&specs, &index, provider)?;
        let handlers = collect_handlers(&specs)?;

        let mut registrations = 0_usize;
        for spec in specs {
            let lifetime = spec.lifetime();
            provider.register(Registration::new(
                spec.key,
                lifetime,
                spec.dependencies,
                spec.factory,
            ))?;
            registrations += 1;
            for capability in spec.capabilities {
                debug!(
                    target: REGISTRY_TARGET,
                    handler = spec.key.name(),
                    pair = %capability.dispatch,
                    %lifetime,
                    "registered handler"
                );
                provider.register(Registration::new(
                    capability.key,
                    lifetime,
                    vec![spec.key],
                    capability.factory,
                ))?;
                registrations += 1;
            }
        }

        info!(
            target: REGISTRY_TARGET,
            handlers = handlers.len(),
            registrations,
            "handler registry built"
        );
        Ok(DispatchTable::from_descriptors(handlers))
    }

    fn check_dependencies<P>(
        &self,
        specs: &[TypeSpec],
        index: &HashMap<TypeKey, usize>,
        provider: &P,
    ) -> Result<(), RegistrationError>
    where
        P: InstanceProvider + ?Sized,
    {
        for spec in specs {
            let lifetime = spec.lifetime();
            for dependency in &spec.dependencies {
                let known = index
                    .get(dependency)
                    .and_then(|position| specs.get(*position))
                    .map(TypeSpec::lifetime)
                    .or_else(|| provider.lifetime_of(dependency));
                let Some(dependency_lifetime) = known else {
                    if self.validate_dependencies {
                        return Err(RegistrationError::UnknownDependency {
                            dependent: spec.key.name().to_owned(),
                            dependency: dependency.name().to_owned(),
                        });
                    }
                    continue;
                };
                if !lifetime.can_depend_on(dependency_lifetime) {
                    return Err(RegistrationError::CaptiveDependency {
                        dependent: spec.key.name().to_owned(),
                        lifetime,
                        dependency: dependency.name().to_owned(),
                        dependency_lifetime,
                    });
                }
            }
        }
        Ok(())
    }
}

fn merge_candidates(
    candidates: Vec<Candidate>,
) -> Result<(Vec<TypeSpec>, HashMap<TypeKey, usize>), RegistrationError> {
    let mut specs: Vec<TypeSpec> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<TypeKey, usize> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        if let Some(position) = index.get(&candidate.key).copied() {
            if let Some(existing) = specs.get_mut(position) {
                existing.merge(candidate)?;
            }
            continue;
        }
        index.insert(candidate.key, specs.len());
        specs.push(TypeSpec::from_candidate(candidate));
    }
    Ok((specs, index))
}

fn collect_handlers(
    specs: &[TypeSpec],
) -> Result<HashMap<DispatchKey, HandlerDescriptor>, RegistrationError> {
    let mut handlers: HashMap<DispatchKey, HandlerDescriptor> = HashMap::new();
    for spec in specs {
        for capability in &spec.capabilities {
            if let Some(existing) = handlers.get(&capability.dispatch) {
                return Err(RegistrationError::DuplicateHandler {
                    source_type: capability.dispatch.source().name().to_owned(),
                    destination_type: capability.dispatch.destination().name().to_owned(),
                    existing: existing.handler().name().to_owned(),
                    duplicate: spec.key.name().to_owned(),
                });
            }
            handlers.insert(
                capability.dispatch,
                HandlerDescriptor::new(capability.dispatch, spec.key, spec.lifetime()),
            );
        }
    }
    Ok(handlers)
}

fn detect_cycles(
    specs: &[TypeSpec],
    index: &HashMap<TypeKey, usize>,
) -> Result<(), RegistrationError> {
    let mut visits: HashMap<TypeKey, Visit> = HashMap::with_capacity(specs.len());
    let mut path: Vec<TypeKey> = Vec::new();
    for spec in specs {
        visit(spec.key, specs, index, &mut visits, &mut path)?;
    }
    Ok(())
}

fn visit(
    key: TypeKey,
    specs: &[TypeSpec],
    index: &HashMap<TypeKey, usize>,
    visits: &mut HashMap<TypeKey, Visit>,
    path: &mut Vec<TypeKey>,
) -> Result<(), RegistrationError> {
    match visits.get(&key) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::Active) => {
            let start = path.iter().position(|step| *step == key).unwrap_or(0);
            let rendered = path
                .iter()
                .skip(start)
                .chain(std::iter::once(&key))
                .map(|step| step.name())
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(RegistrationError::DependencyCycle { path: rendered });
        }
        None => {}
    }

    let Some(spec) = index.get(&key).and_then(|position| specs.get(*position)) else {
        return Ok(());
    };

    visits.insert(key, Visit::Active);
    path.push(key);
    for dependency in &spec.dependencies {
        visit(*dependency, specs, index, visits, path)?;
    }
    path.pop();
    visits.insert(key, Visit::Done);
    Ok(())
}
