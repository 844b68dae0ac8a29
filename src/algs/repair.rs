//! Repair passes over recorded relations.
//!
//! Repairs only reorder existing relation lists. They never add or remove a
//! relation and never touch geometry, and running a pass twice leaves the
//! model exactly as the first run did.
//!
//! Each pass is planned against an immutable model first; if any entity has
//! topology the pass will not correct, the error is returned and nothing is
//! written.

use serde::{Deserialize, Serialize};

use crate::geomodel::GeoModel;
use crate::model_error::GeoModelError;
use crate::topology::entity::{GeologicalEntityId, GeologicalEntityType, MeshEntityId, MeshEntityType};
use crate::topology::mesh_entity::{BoundaryRef, MeshEntity};

/// Which repair to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepairMode {
    /// Store each Line's corners as (corner at first vertex, corner at last vertex).
    #[default]
    LineBoundaryOrder,
    /// Sort the order-insignificant relation lists ascending.
    RelationOrder,
    /// `LineBoundaryOrder` then `RelationOrder`.
    All,
}

/// What a repair call changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Lines whose two corners were swapped.
    pub reordered_lines: Vec<MeshEntityId>,
    /// Relation lists that were re-sorted.
    pub sorted_lists: usize,
}

impl RepairReport {
    /// Whether the call left the model unchanged.
    pub fn is_noop(&self) -> bool {
        self.reordered_lines.is_empty() && self.sorted_lists == 0
    }
}

enum Rewrite {
    Boundaries(MeshEntityId, Vec<BoundaryRef>),
    Incidents(MeshEntityId, Vec<usize>),
    Children(GeologicalEntityId, Vec<usize>),
}

/// Runs `mode` over the whole model.
pub fn repair_geomodel(model: &mut GeoModel, mode: RepairMode) -> Result<RepairReport, GeoModelError> {
    let mut report = RepairReport::default();
    if matches!(mode, RepairMode::LineBoundaryOrder | RepairMode::All) {
        let swaps = plan_line_boundary_order(model)?;
        for &line in &swaps {
            model.mesh_entity_mut(line)?.boundaries_mut().swap(0, 1);
        }
        report.reordered_lines = swaps;
    }
    if matches!(mode, RepairMode::RelationOrder | RepairMode::All) {
        let rewrites = plan_relation_order(model);
        report.sorted_lists = rewrites.len();
        for rewrite in rewrites {
            match rewrite {
                Rewrite::Boundaries(id, sorted) => *model.mesh_entity_mut(id)?.boundaries_mut() = sorted,
                Rewrite::Incidents(id, sorted) => {
                    *model.mesh_entity_mut(id)?.incident_indices_mut() = sorted
                }
                Rewrite::Children(id, sorted) => {
                    *model.geological_entity_mut(id)?.child_indices_mut() = sorted
                }
            }
        }
    }
    Ok(report)
}

/// Lines whose stored corner order is reversed.
///
/// Lines without corners are left alone (nothing to order yet). A closed
/// Line (same first and last vertex) must have its single corner there.
fn plan_line_boundary_order(model: &GeoModel) -> Result<Vec<MeshEntityId>, GeoModelError> {
    let mut swaps = Vec::new();
    for line in model.mesh_entities(MeshEntityType::Line) {
        if line.nb_boundaries() == 0 {
            continue;
        }
        let Some((first, last)) = line.endpoint_ids() else {
            return Err(unexpected(line, "has corners but no geometry"));
        };
        let corner_vertex = |i: usize| -> Result<Option<usize>, GeoModelError> {
            let corner = line.boundary(i).map(|c| model.mesh_entity(c)).transpose()?;
            Ok(corner.and_then(|c| c.vertex_id(0)))
        };

        if first == last {
            if line.nb_boundaries() != 1 || corner_vertex(0)? != Some(first) {
                return Err(unexpected(line, "closed line must have one corner at its end"));
            }
            continue;
        }
        if line.nb_boundaries() != 2 {
            return Err(unexpected(
                line,
                &format!("open line has {} corners", line.nb_boundaries()),
            ));
        }
        match (corner_vertex(0)?, corner_vertex(1)?) {
            (Some(a), Some(b)) if a == first && b == last => {}
            (Some(a), Some(b)) if a == last && b == first => swaps.push(line.id()),
            _ => return Err(unexpected(line, "corners do not sit on the line endpoints")),
        }
    }
    Ok(swaps)
}

fn plan_relation_order(model: &GeoModel) -> Vec<Rewrite> {
    let mut rewrites = Vec::new();
    for kind in MeshEntityType::ALL {
        for e in model.mesh_entities(kind) {
            // a Line's corner order carries meaning
            if matches!(kind, MeshEntityType::Surface | MeshEntityType::Region) {
                if let Some(sorted) = sorted_copy(e.boundary_refs()) {
                    rewrites.push(Rewrite::Boundaries(e.id(), sorted));
                }
            }
            if let Some(sorted) = sorted_copy(e.incident_indices()) {
                rewrites.push(Rewrite::Incidents(e.id(), sorted));
            }
        }
    }
    for kind in GeologicalEntityType::ALL {
        for g in model.geological_entities(kind) {
            if let Some(sorted) = sorted_copy(g.child_indices()) {
                rewrites.push(Rewrite::Children(g.id(), sorted));
            }
        }
    }
    rewrites
}

fn sorted_copy<T: Ord + Clone>(items: &[T]) -> Option<Vec<T>> {
    if items.is_sorted() {
        return None;
    }
    let mut sorted = items.to_vec();
    sorted.sort_unstable();
    Some(sorted)
}

fn unexpected(line: &MeshEntity, reason: &str) -> GeoModelError {
    GeoModelError::UnexpectedTopology {
        entity: line.id(),
        reason: reason.to_string(),
    }
}
