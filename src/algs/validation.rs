//! Finalize-time checks.
//!
//! Entities are checked kind by kind (Corner, Line, Surface, Region, then
//! Contact, Interface, Layer) in index order; the first failure is returned
//! and names the entity at fault.

use crate::debug_invariants::DebugInvariants;
use crate::geomodel::GeoModel;
use crate::model_error::GeoModelError;
use crate::topology::entity::{GeologicalEntityType, MeshEntityType};

/// Checks that `model` is complete enough to be finalized.
pub fn validate_geomodel(model: &GeoModel) -> Result<(), GeoModelError> {
    for kind in MeshEntityType::ALL {
        for entity in model.mesh_entities(kind) {
            if !entity.has_geometry() {
                return Err(GeoModelError::MissingGeometry {
                    entity: entity.id(),
                });
            }
            if kind.requires_boundaries() && entity.nb_boundaries() == 0 {
                return Err(GeoModelError::MissingBoundary {
                    entity: entity.id(),
                });
            }
        }
    }
    for kind in GeologicalEntityType::ALL {
        if let Some(g) = model
            .geological_entities(kind)
            .iter()
            .find(|g| g.nb_children() == 0)
        {
            return Err(GeoModelError::MissingChildren { entity: g.id() });
        }
    }
    model.validate_invariants()
}
