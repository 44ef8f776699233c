//! Identity keys for source entities

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// A value that identifies a source entity inside a mapping registry.
///
/// Value keys (integers, strings, UUIDs) are always keyable. Reference-style
/// keys can be null; a key that reports `is_keyable() == false` is never
/// memoized, so every request for it yields a fresh target.
pub trait IdentityKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {
    fn is_keyable(&self) -> bool {
        true
    }
}

macro_rules! value_keys {
    ($($ty:ty),* $(,)?) => {
        $(impl IdentityKey for $ty {})*
    };
}

value_keys!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, String,
    &'static str, Uuid,
);

/// `None` is the null reference.
impl<K: IdentityKey> IdentityKey for Option<K> {
    fn is_keyable(&self) -> bool {
        self.as_ref().is_some_and(IdentityKey::is_keyable)
    }
}

impl<A: IdentityKey, B: IdentityKey> IdentityKey for (A, B) {
    fn is_keyable(&self) -> bool {
        self.0.is_keyable() && self.1.is_keyable()
    }
}

/// Reference identity of a shared source entity.
///
/// Two `EntityRef`s are equal only when they point at the same allocation,
/// regardless of the entity's contents. Wrap in `Option` for a nullable
/// reference key.
pub struct EntityRef<T>(Arc<T>);

impl<T> EntityRef<T> {
    pub fn new(entity: Arc<T>) -> Self {
        Self(entity)
    }

    pub fn entity(&self) -> &Arc<T> {
        &self.0
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl<T> From<Arc<T>> for EntityRef<T> {
    fn from(entity: Arc<T>) -> Self {
        Self(entity)
    }
}

impl<T> From<&Arc<T>> for EntityRef<T> {
    fn from(entity: &Arc<T>) -> Self {
        Self(Arc::clone(entity))
    }
}

impl<T> Clone for EntityRef<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for EntityRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for EntityRef<T> {}

impl<T> Hash for EntityRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T> fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef<{}>({:#x})", std::any::type_name::<T>(), self.addr())
    }
}

impl<T: Send + Sync + 'static> IdentityKey for EntityRef<T> {}
