//! Synthesis context
//!
//! Owns the results cache mapping a base type to its elevated type. Each key
//! gets one cell; concurrent callers for the same base block on that cell so a
//! base is synthesized once, while distinct bases proceed in parallel. A
//! failed synthesis leaves its cell empty and the next call starts over.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::trace;
use typesynth_ir::TypeName;

use crate::elevate::PackageAccessElevator;
use crate::error::SynthesisError;
use crate::host::{Introspector, Loader};

/// Results cache for elevation, shared by reference between callers
#[derive(Debug, Default)]
pub struct SynthesisContext {
    results: DashMap<TypeName, Arc<OnceCell<TypeName>>>,
}

impl SynthesisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elevated type for `base`, synthesizing it on first request
    pub fn synthesize<I, L>(
        &self,
        elevator: &PackageAccessElevator<I, L>,
        base: &TypeName,
    ) -> Result<TypeName, SynthesisError>
    where
        I: Introspector,
        L: Loader,
    {
        // Clone the cell out so the shard lock is released before synthesis.
        let cell = self.results.entry(base.clone()).or_default().clone();
        if let Some(done) = cell.get() {
            trace!("cache hit for {}", base);
            return Ok(done.clone());
        }
        cell.get_or_try_init(|| elevator.elevate(base)).cloned()
    }

    /// Previously synthesized result for `base`, if any
    pub fn cached(&self, base: &TypeName) -> Option<TypeName> {
        self.results.get(base).and_then(|cell| cell.get().cloned())
    }

    /// Number of bases with a completed synthesis
    pub fn len(&self) -> usize {
        self.results.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
