//! Shared fixtures for exchanger integration tests

#![allow(dead_code)]

pub mod model;

pub use model::{
    building, Building, BuildingToFacility, Facility, FacilityModel, Floor, Space, SpaceToZone,
    Storey, StoreyToFloor, Zone,
};
