//! MappingRegistry: memoizes one target entity per source identity key
//!
//! The store is a lock-striped `DashMap` of per-key once-cells. The shard
//! lock is held only long enough to find or insert a key's slot; building
//! the target runs outside it, so a slow creation never blocks other keys
//! that happen to share the shard. Callers racing on the same key wait on
//! the slot and all receive the single winning entity.

use super::error::MappingResult;
use super::key::IdentityKey;
use super::traits::Mapping;
use crate::config::RegistryConfig;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

type Slot<T> = Arc<OnceLock<Arc<T>>>;

/// Runtime description of one of a registry's generic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeDescriptor {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl std::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Key → target store for one source/target entity pair.
pub struct MappingRegistry<M: Mapping> {
    mapping: M,
    results: DashMap<M::Key, Slot<M::Target>>,
}

impl<M: Mapping> MappingRegistry<M> {
    /// Create a registry with default store sizing
    pub fn new(mapping: M) -> Self {
        Self::with_config(mapping, &RegistryConfig::default())
    }

    /// Create a registry whose store is sized by `config`
    pub fn with_config(mapping: M, config: &RegistryConfig) -> Self {
        let results = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_capacity, shards.get())
            }
            None => DashMap::with_capacity(config.initial_capacity),
        };
        Self { mapping, results }
    }

    pub fn name(&self) -> &str {
        self.mapping.name()
    }

    /// The mapping strategies this registry drives
    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    /// Build a fresh target through the factory. Never touches the store.
    pub fn create_target_object(&self) -> Arc<M::Target> {
        Arc::new(self.mapping.create_target())
    }

    /// Look up the target already associated with `key`. Never creates.
    pub fn get_target_object(&self, key: &M::Key) -> Option<Arc<M::Target>> {
        let found = self.results.get(key).and_then(|slot| slot.value().get().cloned());
        trace!(registry = self.name(), key = ?key, hit = found.is_some(), "lookup");
        found
    }

    /// Return the target for `key`, creating and storing it on first request.
    ///
    /// A key that is not keyable (a null reference) yields a fresh target on
    /// every call and nothing is stored.
    pub fn get_or_create_target_object(&self, key: M::Key) -> Arc<M::Target> {
        self.get_or_create_target_object_with_flag(key).0
    }

    /// Like [`get_or_create_target_object`](Self::get_or_create_target_object),
    /// also reporting whether this call created the target.
    ///
    /// The flag is `true` for exactly one call per keyable key. Unkeyable keys
    /// always report `true` since each call builds a new target.
    pub fn get_or_create_target_object_with_flag(&self, key: M::Key) -> (Arc<M::Target>, bool) {
        if !key.is_keyable() {
            debug!(registry = self.name(), key = ?key, "unkeyed source, target not memoized");
            return (self.create_target_object(), true);
        }

        if let Some(existing) = self.get_target_object(&key) {
            return (existing, false);
        }

        // Shard guard is released at the end of this statement.
        let slot = Arc::clone(&self.results.entry(key.clone()).or_default());

        let mut created = false;
        let target = slot.get_or_init(|| {
            created = true;
            debug!(registry = self.name(), key = ?key, "created target");
            self.create_target_object()
        });

        (Arc::clone(target), created)
    }

    /// Run the mapping function from `source` into `target`.
    ///
    /// The store is not touched; `target` should come from
    /// [`get_or_create_target_object`](Self::get_or_create_target_object).
    /// Mapping errors are returned unchanged.
    pub fn add_mapping(
        &self,
        source: &M::Source,
        target: Arc<M::Target>,
    ) -> MappingResult<Arc<M::Target>> {
        trace!(registry = self.name(), "mapping source into target");
        self.mapping.map(source, target)
    }

    /// Fetch or create the target for `key`, mapping `source` into it only
    /// when this call created it.
    ///
    /// Another thread asking for the same key may receive the target before
    /// this call has finished populating it.
    pub fn convert(&self, key: M::Key, source: &M::Source) -> MappingResult<Arc<M::Target>> {
        let (target, created) = self.get_or_create_target_object_with_flag(key);
        if created {
            self.add_mapping(source, target)
        } else {
            Ok(target)
        }
    }

    /// Read-only live view of the store
    pub fn mappings(&self) -> Mappings<'_, M> {
        Mappings {
            results: &self.results,
        }
    }

    /// Drop every entry, e.g. before reusing the registry for a new pass
    pub fn clear(&self) {
        debug!(registry = self.name(), "clearing mappings");
        self.results.clear();
    }

    pub fn source_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<M::Source>()
    }

    pub fn target_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<M::Target>()
    }

    pub fn key_type(&self) -> TypeDescriptor {
        TypeDescriptor::of::<M::Key>()
    }

    pub(crate) fn store(&self) -> &DashMap<M::Key, Slot<M::Target>> {
        &self.results
    }
}

impl<M: Mapping> std::fmt::Debug for MappingRegistry<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingRegistry")
            .field("name", &self.name())
            .field("source", &self.source_type().name)
            .field("target", &self.target_type().name)
            .field("entries", &self.mappings().len())
            .finish()
    }
}

/// Read-only view over a registry's store.
///
/// Reads go straight to the backing map, so entries created after the view
/// was taken are visible. A key whose target is still being built is not
/// reported.
pub struct Mappings<'a, M: Mapping> {
    results: &'a DashMap<M::Key, Slot<M::Target>>,
}

impl<M: Mapping> Mappings<'_, M> {
    /// Number of completed entries. Walks the whole store.
    pub fn len(&self) -> usize {
        self.results.iter().filter(|r| r.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &M::Key) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &M::Key) -> Option<Arc<M::Target>> {
        self.results.get(key).and_then(|slot| slot.value().get().cloned())
    }

    pub fn keys(&self) -> Vec<M::Key> {
        self.results
            .iter()
            .filter(|r| r.value().get().is_some())
            .map(|r| r.key().clone())
            .collect()
    }

    /// Snapshot of every completed (key, target) pair
    pub fn entries(&self) -> Vec<(M::Key, Arc<M::Target>)> {
        self.results
            .iter()
            .filter_map(|r| r.value().get().map(|t| (r.key().clone(), Arc::clone(t))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShardAmount;
    use crate::mapping::MappingError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::RwLock;

    struct Space {
        name: Option<String>,
        long_name: Option<String>,
    }

    #[derive(Default, Debug)]
    struct Zone {
        name: String,
    }

    struct SpaceToZone {
        created: Arc<AtomicUsize>,
    }

    impl Mapping for SpaceToZone {
        type Key = u64;
        type Source = Space;
        type Target = RwLock<Zone>;

        fn create_target(&self) -> RwLock<Zone> {
            self.created.fetch_add(1, Ordering::SeqCst);
            RwLock::new(Zone::default())
        }

        fn map(&self, source: &Space, target: Arc<RwLock<Zone>>) -> MappingResult<Arc<RwLock<Zone>>> {
            let name = crate::mapping::first_non_empty_string([
                source.long_name.as_deref(),
                source.name.as_deref(),
            ])
            .ok_or_else(|| MappingError::InvalidSource("space has no name".into()))?;
            target.write().unwrap().name = name.to_string();
            Ok(target)
        }
    }

    fn registry() -> (MappingRegistry<SpaceToZone>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let registry = MappingRegistry::new(SpaceToZone {
            created: created.clone(),
        });
        (registry, created)
    }

    #[test]
    fn repeated_requests_return_the_same_target() {
        let (registry, created) = registry();

        let first = registry.get_or_create_target_object(7);
        let second = registry.get_or_create_target_object(7);
        let other = registry.get_or_create_target_object(8);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn created_flag_is_true_only_once_per_key() {
        let (registry, _) = registry();

        let flags: Vec<bool> = (0..5)
            .map(|_| registry.get_or_create_target_object_with_flag(42).1)
            .collect();

        assert_eq!(flags, vec![true, false, false, false, false]);
    }

    #[test]
    fn lookup_never_creates() {
        let (registry, created) = registry();

        for _ in 0..3 {
            assert!(registry.get_target_object(&1).is_none());
        }
        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert!(registry.mappings().is_empty());

        let (target, was_created) = registry.get_or_create_target_object_with_flag(1);
        assert!(was_created);
        assert!(Arc::ptr_eq(&registry.get_target_object(&1).unwrap(), &target));
    }

    #[test]
    fn create_target_object_is_unregistered() {
        let (registry, created) = registry();

        let a = registry.create_target_object();
        let b = registry.create_target_object();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert!(registry.mappings().is_empty());
    }

    #[test]
    fn add_mapping_populates_without_storing() {
        let (registry, _) = registry();
        let source = Space {
            name: Some("101".into()),
            long_name: Some("  ".into()),
        };

        let target = registry.create_target_object();
        let mapped = registry.add_mapping(&source, target.clone()).unwrap();

        assert!(Arc::ptr_eq(&mapped, &target));
        assert_eq!(mapped.read().unwrap().name, "101");
        assert!(registry.mappings().is_empty());
    }

    #[test]
    fn add_mapping_propagates_mapping_errors() {
        let (registry, _) = registry();
        let source = Space {
            name: None,
            long_name: Some(String::new()),
        };

        let err = registry
            .add_mapping(&source, registry.get_or_create_target_object(3))
            .unwrap_err();

        assert!(matches!(err, MappingError::InvalidSource(_)));
        // The target stays registered even though mapping failed.
        assert!(registry.mappings().contains_key(&3));
    }

    #[test]
    fn convert_maps_only_on_first_creation() {
        let (registry, created) = registry();
        let kitchen = Space {
            name: Some("K1".into()),
            long_name: Some("Kitchen".into()),
        };
        let renamed = Space {
            name: Some("K1".into()),
            long_name: Some("Scullery".into()),
        };

        let first = registry.convert(9, &kitchen).unwrap();
        let second = registry.convert(9, &renamed).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.read().unwrap().name, "Kitchen");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mappings_view_reads_through() {
        let (registry, _) = registry();
        let view = registry.mappings();
        assert_eq!(view.len(), 0);

        let target = registry.get_or_create_target_object(5);
        registry.get_or_create_target_object(6);

        assert_eq!(view.len(), 2);
        assert!(Arc::ptr_eq(&view.get(&5).unwrap(), &target));
        let mut keys = view.keys();
        keys.sort();
        assert_eq!(keys, vec![5, 6]);
        assert_eq!(view.entries().len(), 2);
    }

    #[test]
    fn clear_starts_a_fresh_cache() {
        let (registry, created) = registry();

        let before = registry.get_or_create_target_object(1);
        registry.clear();
        assert!(registry.get_target_object(&1).is_none());

        let (after, was_created) = registry.get_or_create_target_object_with_flag(1);
        assert!(was_created);
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn type_descriptors_name_generic_parameters() {
        let (registry, _) = registry();

        assert!(registry.key_type().is::<u64>());
        assert!(registry.source_type().is::<Space>());
        assert!(registry.target_type().is::<RwLock<Zone>>());
        assert!(registry.source_type().name.ends_with("Space"));
    }

    #[test]
    fn configured_store_behaves_identically() {
        let config = RegistryConfig {
            initial_capacity: 64,
            shard_amount: Some(ShardAmount::new(8).unwrap()),
        };
        let registry = MappingRegistry::with_config(
            SpaceToZone {
                created: Arc::new(AtomicUsize::new(0)),
            },
            &config,
        );

        let a = registry.get_or_create_target_object(1);
        assert!(Arc::ptr_eq(&a, &registry.get_or_create_target_object(1)));
        assert_eq!(registry.mappings().len(), 1);
    }

    #[test]
    fn panicking_factory_leaves_key_retryable() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        struct Flaky {
            calls: AtomicUsize,
        }

        impl Mapping for Flaky {
            type Key = &'static str;
            type Source = ();
            type Target = usize;

            fn create_target(&self) -> usize {
                let call = self.calls.fetch_add(1, Ordering::SeqCst);
                if call == 0 {
                    panic!("first construction fails");
                }
                call
            }

            fn map(&self, _source: &(), target: Arc<usize>) -> MappingResult<Arc<usize>> {
                Ok(target)
            }
        }

        let registry = MappingRegistry::new(Flaky {
            calls: AtomicUsize::new(0),
        });

        let result = catch_unwind(AssertUnwindSafe(|| registry.get_or_create_target_object("a")));
        assert!(result.is_err());
        assert!(registry.get_target_object(&"a").is_none());

        let (target, created) = registry.get_or_create_target_object_with_flag("a");
        assert!(created);
        assert_eq!(*target, 1);
    }
}
