//! Integration tests for the synthesis context: refusals, retries and
//! concurrent callers

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use typesynth_engine::sim::InMemoryHost;
use typesynth_engine::{Loader, PackageAccessElevator, SynthesisContext, SynthesisError};
use typesynth_ir::{Modifiers, ScopeId, TypeDescriptor, TypeName};

/// Loader that refuses the `fail_at`-th materialization once, then delegates
struct FlakyLoader<'h> {
    host: &'h InMemoryHost,
    calls: AtomicUsize,
    fail_at: usize,
}

impl<'h> FlakyLoader<'h> {
    fn new(host: &'h InMemoryHost, fail_at: usize) -> Self {
        Self {
            host,
            calls: AtomicUsize::new(0),
            fail_at,
        }
    }
}

impl Loader for FlakyLoader<'_> {
    fn materialize(
        &self,
        descriptor: TypeDescriptor,
        scope_anchor: &TypeName,
    ) -> Result<TypeName, SynthesisError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(SynthesisError::Host("loader unavailable".to_string()));
        }
        self.host.materialize(descriptor, scope_anchor)
    }
}

mod failures {
    use super::*;

    #[test]
    fn test_refusal_is_not_cached() {
        let host = InMemoryHost::new();
        let base = three_scope_chain(&host);
        let loader = FlakyLoader::new(&host, 0);
        let elevator = PackageAccessElevator::new(&host, &loader);
        let context = SynthesisContext::new();

        let err = context.synthesize(&elevator, &base).unwrap_err();
        assert_eq!(err, SynthesisError::Host("loader unavailable".to_string()));
        assert_eq!(context.cached(&base), None);

        let result = context.synthesize(&elevator, &base).unwrap();
        assert_eq!(context.cached(&base), Some(result));
        assert_eq!(host.materialized().len(), 3);
    }

    #[test]
    fn test_retry_after_partial_chain_reuses_bridges() {
        let host = InMemoryHost::new();
        let base = three_scope_chain(&host);
        let loader = FlakyLoader::new(&host, 1);
        let elevator = PackageAccessElevator::new(&host, &loader);
        let context = SynthesisContext::new();

        assert!(context.synthesize(&elevator, &base).is_err());
        assert_eq!(host.materialized().len(), 1);

        let result = context.synthesize(&elevator, &base).unwrap();
        let bridges = host.materialized();
        assert_eq!(bridges.len(), 3);
        assert_eq!(bridges.last(), Some(&result));
    }

    #[test]
    fn test_sealed_scope_is_a_scope_violation() {
        let host = InMemoryHost::new();
        let base = three_scope_chain(&host);
        host.seal_scope(ScopeId::new("pac2"));
        let elevator = PackageAccessElevator::new(&host, &host);
        let context = SynthesisContext::new();

        let err = context.synthesize(&elevator, &base).unwrap_err();
        assert!(matches!(err, SynthesisError::ScopeViolation { .. }), "{err}");
        assert!(context.is_empty());
    }

    #[test]
    fn test_name_taken_by_unrelated_type() {
        let host = InMemoryHost::new();
        let base = host
            .define(counting_type("app.Hidden", &object(), Modifiers::empty(), "tick"))
            .unwrap();
        let elevator = PackageAccessElevator::new(&host, &host);
        let squatter = elevator.bridge_name(&base, &base);
        host.define(counting_type(squatter.as_str(), &object(), Modifiers::PUBLIC, "run"))
            .unwrap();

        let err = SynthesisContext::new().synthesize(&elevator, &base).unwrap_err();
        assert!(matches!(err, SynthesisError::NameCollision { .. }));
    }

    #[test]
    fn test_unknown_base() {
        let host = InMemoryHost::new();
        let elevator = PackageAccessElevator::new(&host, &host);
        let err = SynthesisContext::new()
            .synthesize(&elevator, &TypeName::new("app.Nowhere"))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownType { .. }));
    }
}

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_callers_share_one_synthesis() {
        let host = InMemoryHost::new();
        let base = three_scope_chain(&host);
        let elevator = PackageAccessElevator::new(&host, &host);
        let context = SynthesisContext::new();

        let results: Vec<TypeName> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| context.synthesize(&elevator, &base).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(host.materialized().len(), 3);
        assert_eq!(context.len(), 1);
    }

    #[test]
    fn test_distinct_bases_synthesize_independently() {
        let host = InMemoryHost::new();
        let c = three_scope_chain(&host);
        let b = TypeName::new("pac2.B");
        let elevator = PackageAccessElevator::new(&host, &host);
        let context = SynthesisContext::new();

        let (from_c, from_b) = std::thread::scope(|s| {
            let first = s.spawn(|| context.synthesize(&elevator, &c).unwrap());
            let second = s.spawn(|| context.synthesize(&elevator, &b).unwrap());
            (first.join().unwrap(), second.join().unwrap())
        });

        assert_ne!(from_c, from_b);
        assert!(host.is_subtype(&from_c, &c));
        assert!(host.is_subtype(&from_b, &b));
        assert_eq!(host.materialized().len(), 5);
        assert_eq!(context.len(), 2);
    }
}
