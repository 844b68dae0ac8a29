//! Mesh entity records: geometry plus boundary/incidence bookkeeping.
//!
//! A `MeshEntity` owns its local vertex positions, the pool id of each local
//! vertex, and the type-specific local topology (nothing for corners and
//! lines, CSR facets for surfaces, volumetric cells for regions).
//!
//! Relations are stored as index lists into the arena of the neighbouring
//! kind: `boundaries` point one dimension down, `incident_entities` one
//! dimension up. The two lists mirror each other across the model.

use serde::{Deserialize, Serialize};

use crate::data::{CellMesh, FacetMesh, Vec3};
use crate::topology::entity::{GeologicalEntityId, MeshEntityId, MeshEntityType};

/// Which side of a Surface faces the interior of a Region it bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SurfaceSide {
    /// Along the surface facet normals.
    Positive,
    /// Against the surface facet normals.
    Negative,
}

/// One boundary relation. `side` is only set for Region→Surface relations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BoundaryRef {
    pub index: usize,
    pub side: Option<SurfaceSide>,
}

/// Type-specific local topology.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LocalTopology {
    /// A single point.
    Corner,
    /// The vertex chain itself, in order.
    Line,
    /// Polygonal facets over the local vertices.
    Surface(FacetMesh),
    /// Volumetric cells over the local vertices.
    Region(CellMesh),
}

impl LocalTopology {
    pub(crate) fn empty(kind: MeshEntityType) -> Self {
        match kind {
            MeshEntityType::Corner => LocalTopology::Corner,
            MeshEntityType::Line => LocalTopology::Line,
            MeshEntityType::Surface => LocalTopology::Surface(FacetMesh::default()),
            MeshEntityType::Region => LocalTopology::Region(CellMesh::default()),
        }
    }

    /// Entity type this topology belongs to.
    pub fn kind(&self) -> MeshEntityType {
        match self {
            LocalTopology::Corner => MeshEntityType::Corner,
            LocalTopology::Line => MeshEntityType::Line,
            LocalTopology::Surface(_) => MeshEntityType::Surface,
            LocalTopology::Region(_) => MeshEntityType::Region,
        }
    }
}

/// A Corner, Line, Surface or Region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshEntity {
    id: MeshEntityId,
    name: Option<String>,
    vertices: Vec<Vec3>,
    vertex_ids: Vec<usize>,
    topology: LocalTopology,
    boundaries: Vec<BoundaryRef>,
    incident_entities: Vec<usize>,
    parent: Option<GeologicalEntityId>,
}

impl MeshEntity {
    pub(crate) fn new(id: MeshEntityId) -> Self {
        Self {
            id,
            name: None,
            vertices: Vec::new(),
            vertex_ids: Vec::new(),
            topology: LocalTopology::empty(id.kind),
            boundaries: Vec::new(),
            incident_entities: Vec::new(),
            parent: None,
        }
    }

    #[inline]
    pub fn id(&self) -> MeshEntityId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> MeshEntityType {
        self.id.kind
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.id.index
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Local vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Pool id of every local vertex.
    #[inline]
    pub fn vertex_ids(&self) -> &[usize] {
        &self.vertex_ids
    }

    #[inline]
    pub fn vertex_id(&self, local: usize) -> Option<usize> {
        self.vertex_ids.get(local).copied()
    }

    /// Pool ids of the first and last vertex (a Line's geometric endpoints).
    pub fn endpoint_ids(&self) -> Option<(usize, usize)> {
        Some((*self.vertex_ids.first()?, *self.vertex_ids.last()?))
    }

    #[inline]
    pub fn topology(&self) -> &LocalTopology {
        &self.topology
    }

    /// Surface facets, for surfaces.
    pub fn facets(&self) -> Option<&FacetMesh> {
        match &self.topology {
            LocalTopology::Surface(facets) => Some(facets),
            _ => None,
        }
    }

    /// Region cells, for regions.
    pub fn cells(&self) -> Option<&CellMesh> {
        match &self.topology {
            LocalTopology::Region(cells) => Some(cells),
            _ => None,
        }
    }

    /// Whether the entity carries the geometry its kind needs.
    pub fn has_geometry(&self) -> bool {
        match &self.topology {
            LocalTopology::Corner => self.vertices.len() == 1,
            LocalTopology::Line => self.vertices.len() >= 2,
            LocalTopology::Surface(facets) => !facets.is_empty(),
            LocalTopology::Region(cells) => !cells.is_empty(),
        }
    }

    /// Raw boundary relations (indices into the boundary kind's arena).
    #[inline]
    pub fn boundary_refs(&self) -> &[BoundaryRef] {
        &self.boundaries
    }

    #[inline]
    pub fn nb_boundaries(&self) -> usize {
        self.boundaries.len()
    }

    /// Handle of the `i`-th boundary.
    pub fn boundary(&self, i: usize) -> Option<MeshEntityId> {
        let kind = self.kind().boundary_type()?;
        let b = self.boundaries.get(i)?;
        Some(MeshEntityId::new(kind, b.index))
    }

    /// Handles of all boundaries, in stored order.
    pub fn boundaries(&self) -> impl Iterator<Item = MeshEntityId> + '_ {
        let kind = self.kind().boundary_type();
        self.boundaries
            .iter()
            .filter_map(move |b| kind.map(|k| MeshEntityId::new(k, b.index)))
    }

    /// Handles of the entities this one bounds.
    pub fn incident_entities(&self) -> impl Iterator<Item = MeshEntityId> + '_ {
        let kind = self.kind().incident_type();
        self.incident_entities
            .iter()
            .filter_map(move |&i| kind.map(|k| MeshEntityId::new(k, i)))
    }

    #[inline]
    pub fn nb_incident_entities(&self) -> usize {
        self.incident_entities.len()
    }

    /// Geological parent, if attached.
    #[inline]
    pub fn parent(&self) -> Option<GeologicalEntityId> {
        self.parent
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_vertices(&mut self, vertices: Vec<Vec3>, vertex_ids: Vec<usize>) {
        debug_assert_eq!(vertices.len(), vertex_ids.len());
        self.vertices = vertices;
        self.vertex_ids = vertex_ids;
    }

    /// Renumbers pool ids after the pool dropped unused positions.
    pub(crate) fn remap_vertex_ids(&mut self, remap: &[Option<usize>]) {
        for id in &mut self.vertex_ids {
            if let Some(&Some(new)) = remap.get(*id) {
                *id = new;
            }
        }
    }

    pub(crate) fn topology_mut(&mut self) -> &mut LocalTopology {
        &mut self.topology
    }

    pub(crate) fn boundaries_mut(&mut self) -> &mut Vec<BoundaryRef> {
        &mut self.boundaries
    }

    pub(crate) fn incident_indices(&self) -> &[usize] {
        &self.incident_entities
    }

    pub(crate) fn incident_indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.incident_entities
    }

    pub(crate) fn set_parent(&mut self, parent: GeologicalEntityId) {
        self.parent = Some(parent);
    }
}
