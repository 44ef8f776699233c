//! Mapping trait: the contract each schema pair implements
//!
//! A mapping supplies two strategies: a target factory that builds an empty
//! target entity, and a mapping function that populates it from a source
//! entity. The registry owns everything else.

use super::error::MappingResult;
use super::key::IdentityKey;
use std::marker::PhantomData;
use std::sync::Arc;

/// Conversion of one source entity type into one target entity type.
///
/// Targets are handed around as `Arc<Target>` so every caller that asks for
/// the same key sees the same entity. A target that is filled in after
/// creation needs its own interior mutability (`RwLock<Zone>` and the like).
///
/// Implementations must not keep mutable state shared across keys; the
/// registry's store is the only cross-key state.
pub trait Mapping: Send + Sync + 'static {
    type Key: IdentityKey;
    type Source: Send + Sync + 'static;
    type Target: Send + Sync + 'static;

    /// Name used in logs, errors and configuration lookups.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Build a fresh, empty target entity.
    ///
    /// Every call must return an independent instance. Override-worthy for
    /// targets that must be registered in a model at creation time. Must not
    /// call back into the registry for the key being created.
    fn create_target(&self) -> Self::Target;

    /// Populate `target` from `source` and return the mapped entity
    /// (usually `target` itself).
    fn map(
        &self,
        source: &Self::Source,
        target: Arc<Self::Target>,
    ) -> MappingResult<Arc<Self::Target>>;
}

/// A `Mapping` assembled from a factory closure and a mapping closure.
pub struct FnMapping<K, S, T, C, F> {
    name: String,
    create: C,
    map: F,
    _types: PhantomData<fn() -> (K, S, T)>,
}

impl<K, S, T, C, F> FnMapping<K, S, T, C, F>
where
    K: IdentityKey,
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
    C: Fn() -> T + Send + Sync + 'static,
    F: Fn(&S, Arc<T>) -> MappingResult<Arc<T>> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, create: C, map: F) -> Self {
        Self {
            name: name.into(),
            create,
            map,
            _types: PhantomData,
        }
    }
}

impl<K, S, T, C, F> Mapping for FnMapping<K, S, T, C, F>
where
    K: IdentityKey,
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
    C: Fn() -> T + Send + Sync + 'static,
    F: Fn(&S, Arc<T>) -> MappingResult<Arc<T>> + Send + Sync + 'static,
{
    type Key = K;
    type Source = S;
    type Target = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_target(&self) -> T {
        (self.create)()
    }

    fn map(&self, source: &S, target: Arc<T>) -> MappingResult<Arc<T>> {
        (self.map)(source, target)
    }
}
