//! Type-erased facade over mapping registries
//!
//! A pipeline driver holds registries for many unrelated entity pairs and
//! cannot name their generic parameters. `ErasedMappings` exposes the
//! registry operations over `dyn Any` keys and values; every
//! `MappingRegistry<M>` implements it by downcasting to its declared types.
//!
//! A value of the wrong runtime type is a wiring defect. It is rejected with
//! `MappingError::TypeMismatch` before the store is touched.

use super::error::{MappingError, MappingResult, ValueRole};
use super::registry::{MappingRegistry, TypeDescriptor};
use super::traits::Mapping;
use std::any::Any;
use std::sync::Arc;
use tracing::warn;

/// A target entity with its concrete type erased.
///
/// Points at the same allocation as the registry's typed `Arc<Target>`, so
/// `Arc::ptr_eq` identity holds across both paths.
pub type AnyTarget = Arc<dyn Any + Send + Sync>;

/// Registry operations without generic parameters.
pub trait ErasedMappings: Send + Sync {
    fn name(&self) -> &str;

    fn source_type(&self) -> TypeDescriptor;

    fn target_type(&self) -> TypeDescriptor;

    fn key_type(&self) -> TypeDescriptor;

    /// Build an unregistered target
    fn create_target_any(&self) -> AnyTarget;

    fn get_target_any(&self, key: &dyn Any) -> MappingResult<Option<AnyTarget>>;

    fn get_or_create_target_any(&self, key: &dyn Any) -> MappingResult<AnyTarget>;

    fn get_or_create_target_with_flag_any(&self, key: &dyn Any)
        -> MappingResult<(AnyTarget, bool)>;

    /// Map `source` into `target`. Both must have the registry's declared types.
    fn add_mapping_any(&self, source: &dyn Any, target: AnyTarget) -> MappingResult<AnyTarget>;

    fn contains_key_any(&self, key: &dyn Any) -> MappingResult<bool>;

    /// Number of completed entries in the backing store
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visit every completed entry of the backing store.
    ///
    /// Entries are collected before `visit` runs, so the visitor may call
    /// back into the registry.
    fn for_each_mapping(&self, visit: &mut dyn FnMut(&dyn Any, AnyTarget));

    fn clear(&self);

    fn as_any(&self) -> &dyn Any;
}

impl dyn ErasedMappings {
    /// Recover the concrete registry behind the facade.
    pub fn downcast_ref<M: Mapping>(&self) -> Option<&MappingRegistry<M>> {
        self.as_any().downcast_ref::<MappingRegistry<M>>()
    }
}

fn erase<T: Send + Sync + 'static>(target: Arc<T>) -> AnyTarget {
    target
}

impl<M: Mapping> MappingRegistry<M> {
    fn mismatch(&self, role: ValueRole, expected: &'static str) -> MappingError {
        warn!(registry = self.name(), %role, expected, "type mismatch through erased facade");
        MappingError::TypeMismatch {
            registry: self.name().to_string(),
            role,
            expected,
        }
    }

    fn downcast_key<'a>(&self, key: &'a dyn Any) -> MappingResult<&'a M::Key> {
        key.downcast_ref::<M::Key>()
            .ok_or_else(|| self.mismatch(ValueRole::Key, self.key_type().name))
    }
}

impl<M: Mapping> ErasedMappings for MappingRegistry<M> {
    fn name(&self) -> &str {
        MappingRegistry::name(self)
    }

    fn source_type(&self) -> TypeDescriptor {
        MappingRegistry::source_type(self)
    }

    fn target_type(&self) -> TypeDescriptor {
        MappingRegistry::target_type(self)
    }

    fn key_type(&self) -> TypeDescriptor {
        MappingRegistry::key_type(self)
    }

    fn create_target_any(&self) -> AnyTarget {
        erase(self.create_target_object())
    }

    fn get_target_any(&self, key: &dyn Any) -> MappingResult<Option<AnyTarget>> {
        let key = self.downcast_key(key)?;
        Ok(self.get_target_object(key).map(erase))
    }

    fn get_or_create_target_any(&self, key: &dyn Any) -> MappingResult<AnyTarget> {
        let key = self.downcast_key(key)?;
        Ok(erase(self.get_or_create_target_object(key.clone())))
    }

    fn get_or_create_target_with_flag_any(
        &self,
        key: &dyn Any,
    ) -> MappingResult<(AnyTarget, bool)> {
        let key = self.downcast_key(key)?;
        let (target, created) = self.get_or_create_target_object_with_flag(key.clone());
        Ok((erase(target), created))
    }

    fn add_mapping_any(&self, source: &dyn Any, target: AnyTarget) -> MappingResult<AnyTarget> {
        let source = source
            .downcast_ref::<M::Source>()
            .ok_or_else(|| self.mismatch(ValueRole::Source, self.source_type().name))?;
        let target = target
            .downcast::<M::Target>()
            .map_err(|_| self.mismatch(ValueRole::Target, self.target_type().name))?;
        self.add_mapping(source, target).map(erase)
    }

    fn contains_key_any(&self, key: &dyn Any) -> MappingResult<bool> {
        let key = self.downcast_key(key)?;
        Ok(self.mappings().contains_key(key))
    }

    fn len(&self) -> usize {
        self.mappings().len()
    }

    fn for_each_mapping(&self, visit: &mut dyn FnMut(&dyn Any, AnyTarget)) {
        let entries: Vec<_> = self
            .store()
            .iter()
            .filter_map(|r| r.value().get().map(|t| (r.key().clone(), Arc::clone(t))))
            .collect();

        for (key, target) in entries {
            visit(&key, erase(target));
        }
    }

    fn clear(&self) {
        MappingRegistry::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
