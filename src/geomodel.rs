//! The `GeoModel` aggregate.
//!
//! A geomodel owns one arena per entity kind, the shared vertex pool and
//! its lifecycle state. While `Building`, it is mutated only through a
//! [`GeoModelBuilder`](crate::builder::GeoModelBuilder); once `Finalized`
//! it is immutable and can be shared freely between readers.

use serde::{Deserialize, Serialize};

use crate::data::{DEFAULT_VERTEX_TOLERANCE, Vec3, VertexPool};
use crate::debug_invariants::DebugInvariants;
use crate::model_error::GeoModelError;
use crate::topology::entity::{
    GeologicalEntityId, GeologicalEntityType, MeshEntityId, MeshEntityType,
};
use crate::topology::geological_entity::GeologicalEntity;
use crate::topology::mesh_entity::{LocalTopology, MeshEntity};

/// Lifecycle of a geomodel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelState {
    /// Under construction; builder operations are accepted.
    Building,
    /// Validated and frozen; structural mutation is rejected.
    Finalized,
}

/// How the boundary resolver reacts to a relation it cannot decide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AmbiguityHandling {
    /// Abort the resolver call; nothing is registered.
    #[default]
    Error,
    /// Log a warning, register only unambiguous relations and return the
    /// ambiguities in the call's report.
    Warn,
}

/// Construction parameters fixed when the model is created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoModelOptions {
    /// Distance under which two positions are one vertex; `0.0` = exact.
    pub vertex_tolerance: f64,
    /// Resolver behavior on ambiguous relations.
    pub ambiguity: AmbiguityHandling,
}

impl Default for GeoModelOptions {
    fn default() -> Self {
        Self {
            vertex_tolerance: DEFAULT_VERTEX_TOLERANCE,
            ambiguity: AmbiguityHandling::Error,
        }
    }
}

impl GeoModelOptions {
    /// Exact coordinate matching, strict ambiguity handling.
    pub fn exact() -> Self {
        Self {
            vertex_tolerance: 0.0,
            ..Self::default()
        }
    }
}

/// Boundary-represented geological model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeoModel {
    options: GeoModelOptions,
    state: ModelState,
    pool: VertexPool,
    mesh_entities: [Vec<MeshEntity>; 4],
    geological_entities: [Vec<GeologicalEntity>; 3],
    vertices: Vec<Vec3>,
}

impl Default for GeoModel {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoModel {
    /// Empty model with default options.
    pub fn new() -> Self {
        Self::with_options(GeoModelOptions::default())
    }

    /// Empty model with explicit options.
    pub fn with_options(options: GeoModelOptions) -> Self {
        Self {
            options,
            state: ModelState::Building,
            pool: VertexPool::new(options.vertex_tolerance),
            mesh_entities: Default::default(),
            geological_entities: Default::default(),
            vertices: Vec::new(),
        }
    }

    #[inline]
    pub fn options(&self) -> &GeoModelOptions {
        &self.options
    }

    #[inline]
    pub fn state(&self) -> ModelState {
        self.state
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.state == ModelState::Finalized
    }

    /// The shared vertex pool.
    #[inline]
    pub fn vertex_pool(&self) -> &VertexPool {
        &self.pool
    }

    /// Combined deduplicated vertex array, indexed by pool id.
    ///
    /// Empty until the model is finalized.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    // --- mesh entities ---

    #[inline]
    pub fn nb_mesh_entities(&self, kind: MeshEntityType) -> usize {
        self.mesh_entities[kind.dimension()].len()
    }

    #[inline]
    pub fn mesh_entities(&self, kind: MeshEntityType) -> &[MeshEntity] {
        &self.mesh_entities[kind.dimension()]
    }

    /// Looks up a mesh entity, failing on an unknown handle.
    pub fn mesh_entity(&self, id: MeshEntityId) -> Result<&MeshEntity, GeoModelError> {
        let arena = &self.mesh_entities[id.kind.dimension()];
        arena.get(id.index).ok_or(GeoModelError::MeshEntityOutOfRange {
            entity: id,
            count: arena.len(),
        })
    }

    pub fn nb_corners(&self) -> usize {
        self.nb_mesh_entities(MeshEntityType::Corner)
    }

    pub fn nb_lines(&self) -> usize {
        self.nb_mesh_entities(MeshEntityType::Line)
    }

    pub fn nb_surfaces(&self) -> usize {
        self.nb_mesh_entities(MeshEntityType::Surface)
    }

    pub fn nb_regions(&self) -> usize {
        self.nb_mesh_entities(MeshEntityType::Region)
    }

    pub fn corner(&self, index: usize) -> Option<&MeshEntity> {
        self.mesh_entities(MeshEntityType::Corner).get(index)
    }

    pub fn line(&self, index: usize) -> Option<&MeshEntity> {
        self.mesh_entities(MeshEntityType::Line).get(index)
    }

    pub fn surface(&self, index: usize) -> Option<&MeshEntity> {
        self.mesh_entities(MeshEntityType::Surface).get(index)
    }

    pub fn region(&self, index: usize) -> Option<&MeshEntity> {
        self.mesh_entities(MeshEntityType::Region).get(index)
    }

    /// Pool id of local vertex `local` of `entity`.
    pub fn geomodel_vertex_id(&self, entity: MeshEntityId, local: usize) -> Option<usize> {
        self.mesh_entity(entity).ok()?.vertex_id(local)
    }

    /// Entities of `kind` having a vertex at pool id `vertex`.
    pub fn entities_at_vertex(&self, vertex: usize, kind: MeshEntityType) -> Vec<MeshEntityId> {
        self.pool
            .incident_entities(vertex, kind)
            .into_iter()
            .map(|i| MeshEntityId::new(kind, i))
            .collect()
    }

    // --- geological entities ---

    #[inline]
    pub fn nb_geological_entities(&self, kind: GeologicalEntityType) -> usize {
        self.geological_entities[kind.slot()].len()
    }

    #[inline]
    pub fn geological_entities(&self, kind: GeologicalEntityType) -> &[GeologicalEntity] {
        &self.geological_entities[kind.slot()]
    }

    /// Looks up a geological entity, failing on an unknown handle.
    pub fn geological_entity(
        &self,
        id: GeologicalEntityId,
    ) -> Result<&GeologicalEntity, GeoModelError> {
        let arena = &self.geological_entities[id.kind.slot()];
        arena
            .get(id.index)
            .ok_or(GeoModelError::GeologicalEntityOutOfRange {
                entity: id,
                count: arena.len(),
            })
    }

    // --- crate-internal mutation, reached through the builder ---

    pub(crate) fn mesh_arena_mut(&mut self, kind: MeshEntityType) -> &mut Vec<MeshEntity> {
        &mut self.mesh_entities[kind.dimension()]
    }

    pub(crate) fn mesh_entity_mut(
        &mut self,
        id: MeshEntityId,
    ) -> Result<&mut MeshEntity, GeoModelError> {
        let arena = &mut self.mesh_entities[id.kind.dimension()];
        let count = arena.len();
        arena
            .get_mut(id.index)
            .ok_or(GeoModelError::MeshEntityOutOfRange { entity: id, count })
    }

    pub(crate) fn geological_arena_mut(
        &mut self,
        kind: GeologicalEntityType,
    ) -> &mut Vec<GeologicalEntity> {
        &mut self.geological_entities[kind.slot()]
    }

    pub(crate) fn geological_entity_mut(
        &mut self,
        id: GeologicalEntityId,
    ) -> Result<&mut GeologicalEntity, GeoModelError> {
        let arena = &mut self.geological_entities[id.kind.slot()];
        let count = arena.len();
        arena
            .get_mut(id.index)
            .ok_or(GeoModelError::GeologicalEntityOutOfRange { entity: id, count })
    }

    /// Split borrow of the pool and one mesh entity.
    pub(crate) fn pool_and_entity_mut(
        &mut self,
        id: MeshEntityId,
    ) -> Result<(&mut VertexPool, &mut MeshEntity), GeoModelError> {
        let arena = &mut self.mesh_entities[id.kind.dimension()];
        let count = arena.len();
        let entity = arena
            .get_mut(id.index)
            .ok_or(GeoModelError::MeshEntityOutOfRange { entity: id, count })?;
        Ok((&mut self.pool, entity))
    }

    /// Drops unused pool positions, fills the combined vertex array and
    /// locks the model.
    pub(crate) fn freeze(&mut self) {
        if let Some(remap) = self.pool.compact() {
            let dropped = remap.iter().filter(|id| id.is_none()).count();
            for entity in self.mesh_entities.iter_mut().flatten() {
                entity.remap_vertex_ids(&remap);
            }
            log::debug!("finalize: dropped {dropped} unused pool vertices");
        }
        self.vertices = self.pool.positions().to_vec();
        self.state = ModelState::Finalized;
    }

    /// Rebuilds lookup tables skipped by serialization.
    pub(crate) fn rebuild_indices(&mut self) {
        let Self {
            pool,
            mesh_entities,
            ..
        } = self;
        pool.rebuild_indices(
            mesh_entities
                .iter()
                .flatten()
                .map(|e| (e.id(), e.vertex_ids())),
        );
    }
}

fn broken(message: String) -> GeoModelError {
    GeoModelError::BrokenInvariant(message)
}

impl DebugInvariants for GeoModel {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "GeoModel");
    }

    fn validate_invariants(&self) -> Result<(), GeoModelError> {
        let pool_len = self.pool.len();

        for kind in MeshEntityType::ALL {
            for (i, e) in self.mesh_entities(kind).iter().enumerate() {
                let id = e.id();
                if id != MeshEntityId::new(kind, i) {
                    return Err(broken(format!("{id} stored at {kind} slot {i}")));
                }
                if e.vertex_ids().len() != e.nb_vertices() {
                    return Err(broken(format!("{id}: vertex/pool-id length mismatch")));
                }
                if let Some(&v) = e.vertex_ids().iter().find(|&&v| v >= pool_len) {
                    return Err(broken(format!("{id}: pool id {v} >= {pool_len}")));
                }
                if e.topology().kind() != kind {
                    return Err(broken(format!("{id}: {} topology", e.topology().kind())));
                }
                let max_local = match e.topology() {
                    LocalTopology::Surface(facets) => {
                        facets.check_layout().map(|()| facets.max_vertex_index())
                    }
                    LocalTopology::Region(cells) => {
                        cells.check_layout().map(|()| cells.max_vertex_index())
                    }
                    LocalTopology::Corner | LocalTopology::Line => Ok(None),
                }
                .map_err(|reason| broken(format!("{id}: {reason}")))?;
                if max_local.is_some_and(|m| m >= e.nb_vertices()) {
                    return Err(broken(format!("{id}: local index beyond vertex array")));
                }

                for b in e.boundary_refs() {
                    let Some(bkind) = kind.boundary_type() else {
                        return Err(broken(format!("{id} cannot have boundaries")));
                    };
                    let bid = MeshEntityId::new(bkind, b.index);
                    let other = self
                        .mesh_entity(bid)
                        .map_err(|_| broken(format!("{id}: boundary {bid} missing")))?;
                    if !other.incident_indices().contains(&i) {
                        return Err(broken(format!("{bid} does not list {id} as incident")));
                    }
                    if b.side.is_some() != (kind == MeshEntityType::Region) {
                        return Err(broken(format!("{id}: side flag on wrong tier")));
                    }
                }
                for &inc in e.incident_indices() {
                    let Some(ikind) = kind.incident_type() else {
                        return Err(broken(format!("{id} cannot bound anything")));
                    };
                    let iid = MeshEntityId::new(ikind, inc);
                    let other = self
                        .mesh_entity(iid)
                        .map_err(|_| broken(format!("{id}: incident {iid} missing")))?;
                    if !other.boundary_refs().iter().any(|b| b.index == i) {
                        return Err(broken(format!("{iid} does not list {id} as boundary")));
                    }
                }
                if let Some(parent) = e.parent() {
                    if kind.geological_type() != Some(parent.kind) {
                        return Err(broken(format!("{id}: parent {parent} on wrong tier")));
                    }
                    let p = self
                        .geological_entity(parent)
                        .map_err(|_| broken(format!("{id}: parent {parent} missing")))?;
                    if !p.child_indices().contains(&i) {
                        return Err(broken(format!("{parent} does not list child {id}")));
                    }
                }
            }
        }

        for kind in GeologicalEntityType::ALL {
            for (i, g) in self.geological_entities(kind).iter().enumerate() {
                let gid = g.id();
                if gid != GeologicalEntityId::new(kind, i) {
                    return Err(broken(format!("{gid} stored at {kind} slot {i}")));
                }
                for child in g.children() {
                    let c = self
                        .mesh_entity(child)
                        .map_err(|_| broken(format!("{gid}: child {child} missing")))?;
                    if c.parent() != Some(gid) {
                        return Err(broken(format!("{child} does not point back to {gid}")));
                    }
                }
            }
        }

        if self.is_finalized() {
            if self.vertices.len() != pool_len {
                return Err(broken("finalized vertex array out of sync with pool".into()));
            }
            if let Some(v) = (0..pool_len).find(|&v| self.pool.incidences(v).is_empty()) {
                return Err(broken(format!("finalized pool vertex {v} is used by no entity")));
            }
        }
        Ok(())
    }
}
