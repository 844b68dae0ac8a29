//! Boundary relations and the geological hierarchy.

use crate::algs::boundary_resolver::{
    RelationPlan, ResolutionReport, plan_line_corner_boundaries, plan_surface_line_boundaries,
    register_boundary,
};
use crate::builder::GeoModelBuilder;
use crate::geomodel::AmbiguityHandling;
use crate::model_error::GeoModelError;
use crate::topology::entity::{GeologicalEntityId, MeshEntityId};
use crate::topology::mesh_entity::SurfaceSide;

impl GeoModelBuilder<'_> {
    /// Declares `corner` as a boundary of `line`.
    ///
    /// Returns `false` when the relation was already recorded.
    pub fn add_line_corner_boundary(&mut self, line: usize, corner: usize) -> Result<bool, GeoModelError> {
        self.ensure_building("add a line boundary")?;
        let added = register_boundary(
            self.model,
            MeshEntityId::line(line),
            MeshEntityId::corner(corner),
            None,
        )?;
        self.check_invariants();
        Ok(added)
    }

    /// Declares `line` as a boundary of `surface`.
    pub fn add_surface_line_boundary(&mut self, surface: usize, line: usize) -> Result<bool, GeoModelError> {
        self.ensure_building("add a surface boundary")?;
        let added = register_boundary(
            self.model,
            MeshEntityId::surface(surface),
            MeshEntityId::line(line),
            None,
        )?;
        self.check_invariants();
        Ok(added)
    }

    /// Declares `surface` as a boundary of `region`, with `side` facing the
    /// region's interior.
    ///
    /// Region boundaries are never inferred. An internal surface may be
    /// declared once per side.
    pub fn add_region_surface_boundary(
        &mut self,
        region: usize,
        surface: usize,
        side: SurfaceSide,
    ) -> Result<bool, GeoModelError> {
        self.ensure_building("add a region boundary")?;
        let added = register_boundary(
            self.model,
            MeshEntityId::region(region),
            MeshEntityId::surface(surface),
            Some(side),
        )?;
        self.check_invariants();
        Ok(added)
    }

    /// Infers Corner → Line relations from shared endpoint vertices.
    pub fn resolve_line_corner_boundaries(&mut self) -> Result<ResolutionReport, GeoModelError> {
        self.ensure_building("resolve line boundaries")?;
        let plan = plan_line_corner_boundaries(self.model);
        self.commit_plan("corner/line", plan)
    }

    /// Infers Line → Surface relations from shared endpoints, confirmed
    /// against the surface facet edges.
    pub fn resolve_surface_line_boundaries(&mut self) -> Result<ResolutionReport, GeoModelError> {
        self.ensure_building("resolve surface boundaries")?;
        let plan = plan_surface_line_boundaries(self.model);
        self.commit_plan("line/surface", plan)
    }

    fn commit_plan(&mut self, tier: &str, plan: RelationPlan) -> Result<ResolutionReport, GeoModelError> {
        let RelationPlan {
            relations,
            ambiguities,
        } = plan;
        if let Some(first) = ambiguities.first() {
            match self.model.options().ambiguity {
                AmbiguityHandling::Error => return Err(first.clone()),
                AmbiguityHandling::Warn => {
                    for a in &ambiguities {
                        log::warn!("{tier} resolution: {a}");
                    }
                }
            }
        }
        // an entity named in an ambiguity keeps none of its inferred relations
        let skipped: Vec<MeshEntityId> = ambiguities.iter().filter_map(ambiguous_entity).collect();

        let mut report = ResolutionReport {
            ambiguities,
            ..ResolutionReport::default()
        };
        for (bounded, boundary) in relations {
            if skipped.contains(&bounded) || skipped.contains(&boundary) {
                continue;
            }
            if register_boundary(self.model, bounded, boundary, None)? {
                report.registered += 1;
            } else {
                report.already_present += 1;
            }
        }
        log::info!(
            "{tier} resolution: {} registered, {} already present, {} ambiguous",
            report.registered,
            report.already_present,
            report.ambiguities.len()
        );
        self.check_invariants();
        Ok(report)
    }

    /// Makes `child` a member of geological entity `parent`.
    ///
    /// Tiers must match (Contact/Line, Interface/Surface, Layer/Region) and
    /// the child must not already have a parent.
    pub fn add_parent_children_relation(
        &mut self,
        parent: GeologicalEntityId,
        child: MeshEntityId,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("add a parent/child relation")?;
        self.model.geological_entity(parent)?;
        let entity = self.model.mesh_entity(child)?;
        if parent.kind.child_type() != child.kind {
            return Err(GeoModelError::TierMismatch { parent, child });
        }
        if let Some(existing) = entity.parent() {
            return Err(GeoModelError::ParentAlreadySet { child, existing });
        }

        self.model.mesh_entity_mut(child)?.set_parent(parent);
        self.model
            .geological_entity_mut(parent)?
            .child_indices_mut()
            .push(child.index);
        self.check_invariants();
        Ok(())
    }
}

/// Entity whose planned relations are withheld because of `err`.
///
/// Unconfirmed surfaces never reach the plan, so only corner counts matter.
fn ambiguous_entity(err: &GeoModelError) -> Option<MeshEntityId> {
    match err {
        GeoModelError::LineCornerCount { line, .. } => Some(*line),
        _ => None,
    }
}
