//! Building and facility fixture models
//!
//! A small building model (source) and facility-management model (target)
//! with the mappings an exchange between them would register.

use exchanger::{
    first_non_empty_string, AddIfNotPresent, Classification, EntityRef, Mapping, MappingError,
    MappingResult,
};
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

// === Source model ===

#[derive(Debug, Clone)]
pub struct Building {
    pub guid: Uuid,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub classifications: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Space {
    pub guid: Uuid,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub description: Option<String>,
}

impl Space {
    pub fn named(name: &str) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: Some(name.to_string()),
            long_name: None,
            description: None,
        }
    }
}

#[derive(Debug)]
pub struct Storey {
    pub name: String,
    pub elevation: f64,
}

// === Target model ===

#[derive(Debug, Default)]
pub struct Facility {
    pub name: String,
    pub categories: Vec<Classification>,
}

#[derive(Debug, Default)]
pub struct Zone {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub struct Floor {
    pub name: String,
    pub elevation: Option<f64>,
}

/// Target repository: entities created by some mappings are registered here
/// at construction time.
#[derive(Default)]
pub struct FacilityModel {
    instances: Mutex<Vec<Arc<dyn Any + Send + Sync>>>,
}

impl FacilityModel {
    pub fn register(&self, entity: Arc<dyn Any + Send + Sync>) {
        self.instances.lock().unwrap().push(entity);
    }

    pub fn instance_count(&self) -> usize {
        self.instances.lock().unwrap().len()
    }
}

// === Mappings ===

/// Spaces keyed by GUID. Counts factory calls.
#[derive(Default)]
pub struct SpaceToZone {
    pub created: AtomicUsize,
}

impl SpaceToZone {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl Mapping for SpaceToZone {
    type Key = Uuid;
    type Source = Space;
    type Target = RwLock<Zone>;

    fn name(&self) -> &str {
        "SpaceToZone"
    }

    fn create_target(&self) -> RwLock<Zone> {
        self.created.fetch_add(1, Ordering::SeqCst);
        RwLock::new(Zone::default())
    }

    fn map(&self, source: &Space, target: Arc<RwLock<Zone>>) -> MappingResult<Arc<RwLock<Zone>>> {
        let name = first_non_empty_string([source.long_name.as_deref(), source.name.as_deref()])
            .ok_or_else(|| MappingError::InvalidSource(format!("space {} has no name", source.guid)))?;
        {
            let mut zone = target.write().unwrap();
            zone.name = name.to_string();
            zone.description = first_non_empty_string([
                source.description.clone(),
                Some(name.to_string()),
            ]);
        }
        Ok(target)
    }
}

/// Storeys keyed by reference identity; `None` is a null reference.
#[derive(Default)]
pub struct StoreyToFloor;

impl Mapping for StoreyToFloor {
    type Key = Option<EntityRef<Storey>>;
    type Source = Storey;
    type Target = RwLock<Floor>;

    fn name(&self) -> &str {
        "StoreyToFloor"
    }

    fn create_target(&self) -> RwLock<Floor> {
        RwLock::new(Floor::default())
    }

    fn map(&self, source: &Storey, target: Arc<RwLock<Floor>>) -> MappingResult<Arc<RwLock<Floor>>> {
        if !source.elevation.is_finite() {
            return Err(MappingError::failed(
                self.name(),
                format!("storey {} has no usable elevation", source.name),
            ));
        }
        let mut floor = target.write().unwrap();
        floor.name = source.name.clone();
        floor.elevation = Some(source.elevation);
        drop(floor);
        Ok(target)
    }
}

/// Buildings keyed by GUID. Mapped facilities are registered in the target model.
pub struct BuildingToFacility {
    pub model: Arc<FacilityModel>,
}

impl Mapping for BuildingToFacility {
    type Key = Uuid;
    type Source = Building;
    type Target = RwLock<Facility>;

    fn name(&self) -> &str {
        "BuildingToFacility"
    }

    fn create_target(&self) -> RwLock<Facility> {
        RwLock::new(Facility::default())
    }

    fn map(
        &self,
        source: &Building,
        target: Arc<RwLock<Facility>>,
    ) -> MappingResult<Arc<RwLock<Facility>>> {
        {
            let mut facility = target.write().unwrap();
            facility.name = first_non_empty_string([source.name.as_deref(), source.long_name.as_deref()])
                .unwrap_or("Unnamed facility")
                .to_string();
            for code in &source.classifications {
                facility.categories.add_if_not_present(Classification::new(code.clone()));
            }
        }
        self.model.register(target.clone());
        Ok(target)
    }
}

pub fn building(name: &str, classifications: &[&str]) -> Building {
    Building {
        guid: Uuid::new_v4(),
        name: Some(name.to_string()),
        long_name: None,
        classifications: classifications.iter().map(|c| c.to_string()).collect(),
    }
}
