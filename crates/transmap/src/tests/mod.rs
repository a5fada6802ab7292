//! Crate-level test support and behaviour tests.
//!
//! The types here model the four end-to-end scenarios: a dependency-free
//! handler, a handler with a scoped dependency, a pair only the convention
//! engine knows, and a pair nothing knows.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::convention::ConventionEngine;
use crate::error::{ConventionError, ResolutionError, TransformError};
use crate::keys::TypeKey;
use crate::lifetime::Lifetime;
use crate::provider::{Injectable, ResolveExt, Resolver};
use crate::registry::Candidate;
use crate::transform::Transform;


// ---------------------------------------------------------------------------
// Scenario 1: dependency-free handler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Src {
    pub(crate) name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dst {
    pub(crate) greeting: String,
    pub(crate) revision: u32,
    pub(crate) handler_address: usize,
}

/// Handler with no dependencies; inferred as a singleton.
pub(crate) struct GreetingHandler;

impl Injectable for GreetingHandler {
    fn construct(_resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
        Ok(Self)
    }
}

impl Transform<Src, Dst> for GreetingHandler {
    fn transform(&self, input: &Src, output: Option<Dst>) -> Result<Dst, TransformError> {
        if input.name.is_empty() {
            return Err(TransformError::new("name must not be empty"));
        }
        let revision = output.map_or(0, |previous| previous.revision + 1);
        Ok(Dst {
            greeting: format!("hello, {}", input.name),
            revision,
            handler_address: std::ptr::from_ref(self) as usize,
        })
    }
}

// ---------------------------------------------------------------------------
// Scenario 2: handler with a scoped dependency
// ---------------------------------------------------------------------------

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// Per-request state; one instance per scope.
pub(crate) struct RequestContext {
    pub(crate) id: usize,
}

impl Injectable for RequestContext {
    fn construct(_resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
        Ok(Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::SeqCst),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Src2 {
    pub(crate) amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dst2 {
    pub(crate) amount: u32,
    pub(crate) context_id: usize,
}

/// Handler depending on [`RequestContext`]; inferred as scoped.
pub(crate) struct AuditedHandler {
    context: Arc<RequestContext>,
}

impl Injectable for AuditedHandler {
    fn dependencies() -> Vec<TypeKey> {
        vec![TypeKey::of::<RequestContext>()]
    }

    fn construct(resolver: &dyn Resolver) -> Result<Self, ResolutionError> {
        Ok(Self {
            context: resolver.resolve::<RequestContext>()?,
        })
    }
}

impl Transform<Src2, Dst2> for AuditedHandler {
    fn transform(&self, input: &Src2, _output: Option<Dst2>) -> Result<Dst2, TransformError> {
        Ok(Dst2 {
            amount: input.amount,
            context_id: self.context.id,
        })
    }
}

// ---------------------------------------------------------------------------
// Scenarios 3 and 4: convention fallback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Src3 {
    pub(crate) value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dst3 {
    pub(crate) value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Src4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dst4;

/// Pair for which the convention engine is configured but broken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Src5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dst5;

/// Convention engine that knows `Src3 -> Dst3` (doubling the value) and has
/// a broken configuration for `Src5 -> Dst5`.
#[derive(Debug, Default)]
pub(crate) struct StubConventions {
    calls: AtomicUsize,
}

impl StubConventions {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConventionEngine for StubConventions {
    fn map<A: 'static, B: 'static>(&self, input: &A, _output: Option<B>) -> Result<B, ConventionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let erased: &dyn Any = input;
        if let Some(source) = erased.downcast_ref::<Src3>() {
            let mapped: Box<dyn Any> = Box::new(Dst3 {
                value: source.value * 2,
            });
            return mapped
                .downcast::<B>()
                .map(|boxed| *boxed)
                .map_err(|_| ConventionError::not_configured::<A, B>());
        }
        if erased.is::<Src5>() {
            return Err(ConventionError::failed::<A, B>("profile references a missing member"));
        }
        Err(ConventionError::not_configured::<A, B>())
    }
}

/// Candidates for the scenario handlers and their dependencies.
pub(crate) fn scenario_candidates() -> Vec<Candidate> {
    vec![
        Candidate::handler::<GreetingHandler, Src, Dst>(),
        Candidate::service::<RequestContext>().with_lifetime(Lifetime::Scoped),
        Candidate::handler::<AuditedHandler, Src2, Dst2>(),
    ]
}
