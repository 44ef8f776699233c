//! Exchanger: mapping registries for schema exchange
//!
//! Converts entity graphs from one domain model into another (say, a
//! building model into a facility-management model) one entity pair at a
//! time, guaranteeing that every source entity maps to exactly one target
//! entity.
//!
//! # Core Concepts
//!
//! - **Mapping**: the conversion rules for one source/target pair (a target
//!   factory plus a mapping function)
//! - **MappingRegistry**: memoizes one target per source identity key, safely
//!   across threads
//! - **ErasedMappings**: the same operations over `dyn Any`, for drivers
//!   that hold many unrelated registries
//! - **Exchanger**: one registry per mapping type, reset between passes
//!
//! # Example
//!
//! ```
//! use exchanger::{FnMapping, MappingRegistry};
//! use std::sync::{Arc, Mutex};
//!
//! let registry = MappingRegistry::new(FnMapping::<u32, String, Mutex<String>, _, _>::new(
//!     "space-to-zone",
//!     || Mutex::new(String::new()),
//!     |name: &String, zone: Arc<Mutex<String>>| {
//!         *zone.lock().unwrap() = name.clone();
//!         Ok(zone)
//!     },
//! ));
//!
//! let zone = registry.convert(1, &"Kitchen".to_string()).unwrap();
//! assert!(Arc::ptr_eq(&zone, &registry.get_or_create_target_object(1)));
//! ```

pub mod collection;
pub mod config;
pub mod exchange;
pub mod logging;
pub mod mapping;

pub use collection::{AddIfNotPresent, Classification, ValueKeyed};
pub use config::{ConfigError, ExchangeConfig, RegistryConfig, ShardAmount};
pub use exchange::{ExchangePass, Exchanger, RegistrySummary};
pub use mapping::{
    first_non_empty_string, AnyTarget, EntityRef, ErasedMappings, FnMapping, IdentityKey,
    Mapping, MappingError, MappingRegistry, MappingResult, Mappings, TypeDescriptor, ValueRole,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
