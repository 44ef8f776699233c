//! Exchanger: the set of mapping registries used by one exchange
//!
//! Holds exactly one registry per mapping type. Concrete code asks for its
//! registry by type; a pipeline driver walks all of them through the
//! type-erased facade.

use super::pass::ExchangePass;
use crate::config::ExchangeConfig;
use crate::mapping::{ErasedMappings, Mapping, MappingRegistry};
use dashmap::DashMap;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::{error, info};

/// Per-registry line of an exchange summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub name: String,
    pub source_type: &'static str,
    pub target_type: &'static str,
    pub key_type: &'static str,
    pub entries: usize,
}

/// Once-cell holding the registry for mapping type `M`
type RegistrySlot<M> = OnceLock<Arc<MappingRegistry<M>>>;

/// Container of mapping registries for one source/target model pair
pub struct Exchanger {
    config: ExchangeConfig,
    /// Per mapping type, an `Arc<RegistrySlot<M>>`
    registries: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    /// Built registries in registration order, for stable iteration
    order: RwLock<Vec<Arc<dyn ErasedMappings>>>,
    pass: RwLock<ExchangePass>,
}

impl Exchanger {
    pub fn new() -> Self {
        Self::with_config(ExchangeConfig::default())
    }

    pub fn with_config(config: ExchangeConfig) -> Self {
        let pass = ExchangePass::start();
        info!(exchange = %config.name, pass = %pass, "exchanger created");
        Self {
            config,
            registries: DashMap::new(),
            order: RwLock::new(Vec::new()),
            pass: RwLock::new(pass),
        }
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// The registry for mapping type `M`, built with `make` on first request.
    ///
    /// Concurrent first requests build it once; `make` runs at most once per
    /// exchanger and outside any map lock, so it may look up or create other
    /// registries. It must not request `M` itself. Store sizing comes from
    /// the configuration entry matching the mapping's name.
    pub fn get_or_create_mappings<M: Mapping>(
        &self,
        make: impl FnOnce() -> M,
    ) -> Arc<MappingRegistry<M>> {
        let slot = self.slot::<M>();
        let registry = slot.get_or_init(|| {
            let mapping = make();
            let sizing = self.config.registry(mapping.name());
            let registry = Arc::new(MappingRegistry::with_config(mapping, sizing));
            info!(
                exchange = %self.config.name,
                registry = registry.name(),
                source = registry.source_type().name,
                target = registry.target_type().name,
                "registered mappings"
            );
            // Listed before the slot completes, so begin_pass sees every
            // registry a typed caller can reach.
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Arc::clone(&registry) as Arc<dyn ErasedMappings>);
            registry
        });
        Arc::clone(registry)
    }

    /// Slot for `M`, inserted on first use. The shard guard is released
    /// before the slot is returned.
    fn slot<M: Mapping>(&self) -> Arc<RegistrySlot<M>> {
        let id = TypeId::of::<M>();
        let stored = Arc::clone(
            self.registries
                .entry(id)
                .or_insert_with(|| Arc::new(RegistrySlot::<M>::new()) as Arc<dyn Any + Send + Sync>)
                .value(),
        );

        match stored.downcast::<RegistrySlot<M>>() {
            Ok(slot) => slot,
            Err(_) => {
                error!(
                    mapping = std::any::type_name::<M>(),
                    "registry slot held the wrong type, replacing it"
                );
                let slot = Arc::new(RegistrySlot::<M>::new());
                self.registries.insert(id, slot.clone());
                slot
            }
        }
    }

    /// The registry for mapping type `M`, if one was built
    pub fn mappings<M: Mapping>(&self) -> Option<Arc<MappingRegistry<M>>> {
        let stored = Arc::clone(self.registries.get(&TypeId::of::<M>())?.value());
        stored.downcast::<RegistrySlot<M>>().ok()?.get().cloned()
    }

    /// Every registry, in registration order
    pub fn registries(&self) -> Vec<Arc<dyn ErasedMappings>> {
        self.order
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First registry converting `source` entities into `target` entities
    pub fn find_registry(&self, source: TypeId, target: TypeId) -> Option<Arc<dyn ErasedMappings>> {
        self.registries()
            .into_iter()
            .find(|r| r.source_type().id == source && r.target_type().id == target)
    }

    /// Number of built registries
    pub fn len(&self) -> usize {
        self.order.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pass(&self) -> ExchangePass {
        *self.pass.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new pass: every registry is cleared and a new pass id issued.
    ///
    /// Must not overlap with conversions still running for the old pass.
    pub fn begin_pass(&self) -> ExchangePass {
        let next = ExchangePass::start();
        let mut current = self.pass.write().unwrap_or_else(PoisonError::into_inner);

        for registry in self.registries() {
            registry.clear();
        }
        info!(
            exchange = %self.config.name,
            previous = %*current,
            pass = %next,
            "began exchange pass"
        );

        *current = next;
        next
    }

    pub fn summary(&self) -> Vec<RegistrySummary> {
        self.registries()
            .iter()
            .map(|r| RegistrySummary {
                name: r.name().to_string(),
                source_type: r.source_type().name,
                target_type: r.target_type().name,
                key_type: r.key_type().name,
                entries: r.len(),
            })
            .collect()
    }
}

impl Default for Exchanger {
    fn default() -> Self {
        Self::new()
    }
}
