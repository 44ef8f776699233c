//! Mapping registries
//!
//! One `MappingRegistry` per source/target entity pair guarantees that each
//! source identity is converted into exactly one target entity, however
//! many threads ask for it. `ErasedMappings` lets a pipeline driver work
//! over registries it cannot name.

mod erased;
mod error;
pub mod key;
mod registry;
mod text;
mod traits;

pub use erased::{AnyTarget, ErasedMappings};
pub use error::{MappingError, MappingResult, ValueRole};
pub use key::{EntityRef, IdentityKey};
pub use registry::{MappingRegistry, Mappings, TypeDescriptor};
pub use text::first_non_empty_string;
pub use traits::{FnMapping, Mapping};
