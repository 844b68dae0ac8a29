//! Phase-gated construction of a [`GeoModel`].
//!
//! A `GeoModelBuilder` borrows a model mutably and exposes every structural
//! mutation: entity creation, geometry assignment, relation registration,
//! repair and finalization. All calls fail with
//! [`GeoModelError::ModelFinalized`] once [`end_geomodel`](GeoModelBuilder::end_geomodel)
//! has succeeded.
//!
//! Operations are grouped by concern:
//! - this module: registry, names, repair, finalize
//! - [`geometry`]: vertices, facets, cells and cell adjacency
//! - [`relations`]: boundary relations and the geological hierarchy

pub mod geometry;
pub mod relations;

use std::ops::Range;

use crate::algs::repair::{RepairMode, RepairReport, repair_geomodel};
use crate::algs::validation::validate_geomodel;
use crate::debug_invariants::DebugInvariants;
use crate::geomodel::GeoModel;
use crate::model_error::GeoModelError;
use crate::topology::entity::{GeologicalEntityId, GeologicalEntityType, MeshEntityId, MeshEntityType};
use crate::topology::geological_entity::{GeologicalEntity, GeologicalFeature};
use crate::topology::mesh_entity::MeshEntity;

/// Mutable access to a model under construction.
pub struct GeoModelBuilder<'m> {
    model: &'m mut GeoModel,
}

impl<'m> GeoModelBuilder<'m> {
    pub fn new(model: &'m mut GeoModel) -> Self {
        Self { model }
    }

    /// Read access to the model being built.
    #[inline]
    pub fn model(&self) -> &GeoModel {
        &*self.model
    }

    pub(crate) fn ensure_building(&self, operation: &'static str) -> Result<(), GeoModelError> {
        if self.model.is_finalized() {
            Err(GeoModelError::ModelFinalized { operation })
        } else {
            Ok(())
        }
    }

    pub(crate) fn check_invariants(&self) {
        self.model.debug_assert_invariants();
    }

    /// Appends `count` empty mesh entities of `kind`.
    ///
    /// Returns the index range of the new entities; indices continue from
    /// the current count so the registry can grow incrementally.
    pub fn create_mesh_entities(
        &mut self,
        kind: MeshEntityType,
        count: usize,
    ) -> Result<Range<usize>, GeoModelError> {
        self.ensure_building("create mesh entities")?;
        let arena = self.model.mesh_arena_mut(kind);
        let start = arena.len();
        arena.extend((start..start + count).map(|i| MeshEntity::new(MeshEntityId::new(kind, i))));
        log::debug!("created {count} {kind} entities ({start}..{})", start + count);
        Ok(start..start + count)
    }

    /// Appends `count` empty geological entities of `kind`.
    pub fn create_geological_entities(
        &mut self,
        kind: GeologicalEntityType,
        count: usize,
    ) -> Result<Range<usize>, GeoModelError> {
        self.ensure_building("create geological entities")?;
        let arena = self.model.geological_arena_mut(kind);
        let start = arena.len();
        arena.extend(
            (start..start + count).map(|i| GeologicalEntity::new(GeologicalEntityId::new(kind, i))),
        );
        log::debug!("created {count} {kind} entities ({start}..{})", start + count);
        Ok(start..start + count)
    }

    pub fn set_mesh_entity_name(
        &mut self,
        entity: MeshEntityId,
        name: impl Into<String>,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("rename a mesh entity")?;
        self.model.mesh_entity_mut(entity)?.set_name(name.into());
        Ok(())
    }

    pub fn set_geological_entity_name(
        &mut self,
        entity: GeologicalEntityId,
        name: impl Into<String>,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("rename a geological entity")?;
        self.model.geological_entity_mut(entity)?.set_name(name.into());
        Ok(())
    }

    pub fn set_geological_feature(
        &mut self,
        entity: GeologicalEntityId,
        feature: GeologicalFeature,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("set a geological feature")?;
        self.model.geological_entity_mut(entity)?.set_feature(feature);
        Ok(())
    }

    /// Runs a repair pass. See [`repair_geomodel`].
    pub fn repair(&mut self, mode: RepairMode) -> Result<RepairReport, GeoModelError> {
        self.ensure_building("repair")?;
        let report = repair_geomodel(self.model, mode)?;
        if !report.is_noop() {
            log::debug!(
                "repair {mode:?}: {} lines reordered, {} lists sorted",
                report.reordered_lines.len(),
                report.sorted_lists
            );
        }
        self.check_invariants();
        Ok(report)
    }

    /// Validates and freezes the model.
    ///
    /// On failure the model stays `Building` and the error names the first
    /// offending entity.
    pub fn end_geomodel(&mut self) -> Result<(), GeoModelError> {
        self.ensure_building("finalize")?;
        validate_geomodel(self.model)?;
        self.model.freeze();
        self.check_invariants();
        log::info!(
            "geomodel finalized: {} corners, {} lines, {} surfaces, {} regions, {} vertices",
            self.model.nb_corners(),
            self.model.nb_lines(),
            self.model.nb_surfaces(),
            self.model.nb_regions(),
            self.model.vertices().len()
        );
        Ok(())
    }
}
