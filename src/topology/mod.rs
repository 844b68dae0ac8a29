//! Entity kinds, handles and records of a geomodel.
//!
//! This module provides:
//! - closed enumerations of mesh and geological entity kinds with typed
//!   `(kind, index)` handles,
//! - the entity records stored in the model's arenas,
//! - the corner/face conventions of volumetric cell types.

pub mod cell_type;
pub mod entity;
pub mod geological_entity;
pub mod mesh_entity;

pub use cell_type::CellType;
pub use entity::{GeologicalEntityId, GeologicalEntityType, MeshEntityId, MeshEntityType};
pub use geological_entity::{GeologicalEntity, GeologicalFeature};
pub use mesh_entity::{BoundaryRef, LocalTopology, MeshEntity, SurfaceSide};
