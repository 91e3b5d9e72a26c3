//! Proxy repository — the public entry point
//!
//! Ties the definition model, generation engine, interception filter, and
//! structural cache together. Factories are generated at most once per
//! distinct definition and shared by every caller.

use std::sync::Arc;

use crate::cache::LockOnWriteCache;
use crate::contract::ContractDecl;
use crate::definition::{ProxyDefinition, TargetType};
use crate::emitter::{DispatchTableEmitter, TypeEmitter};
use crate::factory::{ProxyFactory, ProxyHandle};
use crate::filter::{DefaultInterceptionFilter, InterceptionFilter};
use crate::generator::ProxyGenerator;
use crate::handler::DispatchHandler;
use crate::value::Value;
use crate::ProxyResult;

/// Creates and caches proxy factories
pub struct ProxyRepository {
    emitter: Arc<dyn TypeEmitter>,
    filter: Arc<dyn InterceptionFilter>,
    generator: ProxyGenerator,
    factories: LockOnWriteCache<ProxyDefinition, ProxyResult<Arc<ProxyFactory>>>,
}

impl ProxyRepository {
    /// A repository with the default emitter and interception filter
    pub fn new() -> Self {
        Self::with_filter(Arc::new(DefaultInterceptionFilter::new()))
    }

    /// A repository with the default emitter and a custom filter
    pub fn with_filter(filter: Arc<dyn InterceptionFilter>) -> Self {
        Self::with_parts(Arc::new(DispatchTableEmitter), filter)
    }

    /// A repository with a custom emitter and filter
    pub fn with_parts(emitter: Arc<dyn TypeEmitter>, filter: Arc<dyn InterceptionFilter>) -> Self {
        Self {
            emitter,
            filter,
            generator: ProxyGenerator::new(),
            factories: LockOnWriteCache::new(),
        }
    }

    /// Get or generate the proxy factory for a base target and additional
    /// contracts.
    ///
    /// Idempotent: the same definition always yields the same factory.
    /// A failed generation is cached as the definitive outcome for its
    /// definition and re-raised to later callers unchanged.
    pub fn get_factory(
        &self,
        base: TargetType,
        contracts: &[Arc<ContractDecl>],
    ) -> ProxyResult<Arc<ProxyFactory>> {
        let definition = ProxyDefinition::new(base, contracts)?;
        self.factories.get_or_add(&definition, |definition| {
            self.generator
                .generate(definition, self.filter.as_ref(), self.emitter.as_ref())
                .map(Arc::new)
        })
    }

    /// Create a proxy in one step: resolve the factory, then instantiate
    /// it bound to the handler with the given constructor arguments.
    pub fn create_proxy(
        &self,
        base: TargetType,
        contracts: &[Arc<ContractDecl>],
        handler: Arc<dyn DispatchHandler>,
        args: &[Value],
    ) -> ProxyResult<ProxyHandle> {
        let factory = self.get_factory(base, contracts)?;
        factory.instantiate(handler, args)
    }

    /// Number of cached definitions
    pub fn cached_definitions(&self) -> usize {
        self.factories.len()
    }
}

impl Default for ProxyRepository {
    fn default() -> Self {
        Self::new()
    }
}
