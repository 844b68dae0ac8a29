//! Geometry assignment and cell adjacency.
//!
//! Every vertex array handed to the builder is registered in the model's
//! vertex pool, which records the pool id of each local vertex. Vertex
//! arrays are taken as `impl Into<Vec<Vec3>>`: passing a `Vec` moves it into
//! the entity without a copy, passing a slice copies it.

use std::ops::Range;

use crate::algs::cell_adjacency::{AdjacencyOutcome, AdjacencyReport, compute_cell_adjacency};
use crate::builder::GeoModelBuilder;
use crate::data::{FacetMesh, Vec3};
use crate::geomodel::{AmbiguityHandling, GeoModel};
use crate::model_error::GeoModelError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{MeshEntityId, MeshEntityType};
use crate::topology::mesh_entity::LocalTopology;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

impl GeoModelBuilder<'_> {
    /// Sets the position of a Corner.
    pub fn set_corner(&mut self, corner: usize, position: Vec3) -> Result<(), GeoModelError> {
        self.set_mesh_entity_vertices(MeshEntityId::corner(corner), vec![position])
    }

    /// Sets the ordered vertex chain of a Line (at least two vertices).
    pub fn set_line(
        &mut self,
        line: usize,
        vertices: impl Into<Vec<Vec3>>,
    ) -> Result<(), GeoModelError> {
        self.set_mesh_entity_vertices(MeshEntityId::line(line), vertices)
    }

    /// Sets the vertices and CSR facets of a Surface.
    ///
    /// Facet `k` is `facet_indices[facet_offsets[k]..facet_offsets[k + 1]]`.
    /// The whole input is checked before the entity is touched.
    pub fn set_surface_geometry(
        &mut self,
        surface: usize,
        vertices: impl Into<Vec<Vec3>>,
        facet_indices: impl Into<Vec<usize>>,
        facet_offsets: impl Into<Vec<usize>>,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("set surface geometry")?;
        let id = MeshEntityId::surface(surface);
        self.model.mesh_entity(id)?;
        let vertices = vertices.into();
        check_finite(id, &vertices)?;
        let facets = FacetMesh::try_new(id, facet_indices.into(), facet_offsets.into(), vertices.len())?;

        let nb_facets = facets.nb_facets();
        self.bind_vertices(id, vertices)?;
        *self.model.mesh_entity_mut(id)?.topology_mut() = LocalTopology::Surface(facets);
        log::debug!("{id}: {nb_facets} facets");
        self.check_invariants();
        Ok(())
    }

    /// Replaces the vertex array of any mesh entity.
    ///
    /// Existing facets or cells are kept and must still address the new
    /// array. A Corner takes exactly one vertex, a Line at least two.
    pub fn set_mesh_entity_vertices(
        &mut self,
        entity: MeshEntityId,
        vertices: impl Into<Vec<Vec3>>,
    ) -> Result<(), GeoModelError> {
        self.ensure_building("set mesh entity vertices")?;
        let current = self.model.mesh_entity(entity)?;
        let vertices = vertices.into();
        check_finite(entity, &vertices)?;

        let invalid = |reason: String| GeoModelError::InvalidGeometry { entity, reason };
        match entity.kind {
            MeshEntityType::Corner if vertices.len() != 1 => {
                return Err(invalid(format!("a corner takes 1 vertex, got {}", vertices.len())));
            }
            MeshEntityType::Line if vertices.len() < 2 => {
                return Err(invalid(format!(
                    "a line needs at least 2 vertices, got {}",
                    vertices.len()
                )));
            }
            _ => {}
        }
        let max_local = match current.topology() {
            LocalTopology::Surface(facets) => facets.max_vertex_index(),
            LocalTopology::Region(cells) => cells.max_vertex_index(),
            LocalTopology::Corner | LocalTopology::Line => None,
        };
        if let Some(index) = max_local.filter(|&m| m >= vertices.len()) {
            return Err(GeoModelError::LocalVertexOutOfRange {
                entity,
                index,
                count: vertices.len(),
            });
        }

        self.bind_vertices(entity, vertices)?;
        self.check_invariants();
        Ok(())
    }

    /// Swaps the entity's vertices, keeping the pool incidences in sync.
    fn bind_vertices(&mut self, entity: MeshEntityId, vertices: Vec<Vec3>) -> Result<(), GeoModelError> {
        let (pool, target) = self.model.pool_and_entity_mut(entity)?;
        pool.unbind_entity(entity, target.vertex_ids());
        let ids = pool.bind_entity(entity, &vertices);
        target.set_vertices(vertices, ids);
        Ok(())
    }

    /// Appends one cell to a Region; returns the new cell's index.
    ///
    /// `vertices` are local indices into the Region's vertex array, in the
    /// corner order of `cell_type`.
    pub fn create_region_cell(
        &mut self,
        region: usize,
        cell_type: CellType,
        vertices: &[usize],
    ) -> Result<usize, GeoModelError> {
        self.ensure_building("create a region cell")?;
        let id = MeshEntityId::region(region);
        let entity = self.model.mesh_entity_mut(id)?;
        let nb_vertices = entity.nb_vertices();
        let LocalTopology::Region(cells) = entity.topology_mut() else {
            return Err(GeoModelError::WrongEntityType {
                entity: id,
                expected: MeshEntityType::Region,
            });
        };
        cells.push_cell(id, cell_type, vertices, nb_vertices)
    }

    /// Appends `flat.len() / arity` cells of one type to a Region.
    ///
    /// Either every cell is added or none is.
    pub fn create_region_cells(
        &mut self,
        region: usize,
        cell_type: CellType,
        flat: &[usize],
    ) -> Result<Range<usize>, GeoModelError> {
        self.ensure_building("create region cells")?;
        let id = MeshEntityId::region(region);
        let entity = self.model.mesh_entity_mut(id)?;
        let nb_vertices = entity.nb_vertices();
        let LocalTopology::Region(cells) = entity.topology_mut() else {
            return Err(GeoModelError::WrongEntityType {
                entity: id,
                expected: MeshEntityType::Region,
            });
        };
        let range = cells.push_cells(id, cell_type, flat, nb_vertices)?;
        log::debug!("{id}: {} {cell_type:?} cells added", range.len());
        Ok(range)
    }

    /// Builds the cell face adjacency of one Region.
    ///
    /// An existing table is kept unless `recompute_if_present`. Faces shared
    /// by more than two cells fail the call under
    /// [`AmbiguityHandling::Error`]; under `Warn` they are logged, left
    /// without neighbor and returned in the report.
    pub fn compute_region_adjacencies(
        &mut self,
        region: usize,
        recompute_if_present: bool,
    ) -> Result<AdjacencyReport, GeoModelError> {
        self.ensure_building("compute region adjacencies")?;
        let id = MeshEntityId::region(region);
        let Some(outcome) = plan_adjacency(self.model, id, recompute_if_present)? else {
            let cells = self.model.mesh_entity(id)?.cells();
            return Ok(AdjacencyReport {
                region: Some(id),
                computed: false,
                nb_cells: cells.map_or(0, |c| c.nb_cells()),
                nb_boundary_faces: cells
                    .and_then(|c| c.adjacency())
                    .map_or(0, |t| t.nb_boundary_faces()),
                non_manifold: Vec::new(),
            });
        };
        check_manifold(self.model, &outcome)?;
        let report = self.commit_adjacency(id, outcome)?;
        self.check_invariants();
        Ok(report)
    }

    /// Builds the adjacency of every Region.
    ///
    /// Tables are computed first (in parallel with the `rayon` feature) and
    /// committed only once every Region succeeded.
    pub fn compute_all_region_adjacencies(
        &mut self,
        recompute_if_present: bool,
    ) -> Result<Vec<AdjacencyReport>, GeoModelError> {
        self.ensure_building("compute region adjacencies")?;
        let model: &GeoModel = self.model;
        let regions: Vec<MeshEntityId> = (0..model.nb_regions()).map(MeshEntityId::region).collect();

        #[cfg(feature = "rayon")]
        let planned: Vec<_> = regions
            .par_iter()
            .map(|&id| plan_adjacency(model, id, recompute_if_present).map(|o| (id, o)))
            .collect::<Result<_, _>>()?;
        #[cfg(not(feature = "rayon"))]
        let planned: Vec<_> = regions
            .iter()
            .map(|&id| plan_adjacency(model, id, recompute_if_present).map(|o| (id, o)))
            .collect::<Result<_, _>>()?;

        for (_, outcome) in &planned {
            if let Some(outcome) = outcome {
                check_manifold(model, outcome)?;
            }
        }

        let mut reports = Vec::with_capacity(planned.len());
        for (id, outcome) in planned {
            match outcome {
                Some(outcome) => reports.push(self.commit_adjacency(id, outcome)?),
                None => reports.push(AdjacencyReport {
                    region: Some(id),
                    computed: false,
                    ..AdjacencyReport::default()
                }),
            }
        }
        self.check_invariants();
        Ok(reports)
    }

    fn commit_adjacency(
        &mut self,
        id: MeshEntityId,
        outcome: AdjacencyOutcome,
    ) -> Result<AdjacencyReport, GeoModelError> {
        for err in &outcome.non_manifold {
            log::warn!("{err}");
        }
        let AdjacencyOutcome {
            table,
            non_manifold,
        } = outcome;
        let report = AdjacencyReport {
            region: Some(id),
            computed: true,
            nb_cells: table.nb_cells(),
            nb_boundary_faces: table.nb_boundary_faces(),
            non_manifold,
        };
        if let LocalTopology::Region(cells) = self.model.mesh_entity_mut(id)?.topology_mut() {
            cells.set_adjacency(table);
        }
        log::debug!(
            "{id}: adjacency of {} cells, {} boundary faces",
            report.nb_cells,
            report.nb_boundary_faces
        );
        Ok(report)
    }
}

/// Computes a Region's adjacency unless a table exists and may be kept.
fn plan_adjacency(
    model: &GeoModel,
    id: MeshEntityId,
    recompute_if_present: bool,
) -> Result<Option<AdjacencyOutcome>, GeoModelError> {
    let region = model.mesh_entity(id)?;
    let Some(cells) = region.cells() else {
        return Err(GeoModelError::WrongEntityType {
            entity: id,
            expected: MeshEntityType::Region,
        });
    };
    if cells.adjacency().is_some() && !recompute_if_present {
        return Ok(None);
    }
    compute_cell_adjacency(id, cells, region.vertex_ids()).map(Some)
}

fn check_manifold(model: &GeoModel, outcome: &AdjacencyOutcome) -> Result<(), GeoModelError> {
    match (model.options().ambiguity, outcome.non_manifold.first()) {
        (AmbiguityHandling::Error, Some(err)) => Err(err.clone()),
        _ => Ok(()),
    }
}

fn check_finite(entity: MeshEntityId, vertices: &[Vec3]) -> Result<(), GeoModelError> {
    match vertices.iter().position(|p| p.iter().any(|c| !c.is_finite())) {
        Some(local) => Err(GeoModelError::InvalidGeometry {
            entity,
            reason: format!("vertex {local} has a non-finite coordinate"),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geomodel::GeoModelOptions;

    fn unit_hex() -> Vec<Vec3> {
        (0..8)
            .map(|v| [(v & 1) as f64, ((v >> 1) & 1) as f64, ((v >> 2) & 1) as f64])
            .collect()
    }

    #[test]
    fn coincident_vertices_share_pool_ids() {
        let mut model = GeoModel::new();
        let mut b = GeoModelBuilder::new(&mut model);
        b.create_mesh_entities(MeshEntityType::Corner, 1).unwrap();
        b.create_mesh_entities(MeshEntityType::Line, 1).unwrap();
        b.set_corner(0, [1.0, 0.0, 0.0]).unwrap();
        b.set_line(0, &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]).unwrap();
        let corner = model.geomodel_vertex_id(MeshEntityId::corner(0), 0);
        assert_eq!(corner, model.geomodel_vertex_id(MeshEntityId::line(0), 1));
        assert_eq!(model.vertex_pool().len(), 2);
        assert_eq!(
            model.entities_at_vertex(corner.unwrap(), MeshEntityType::Line),
            vec![MeshEntityId::line(0)]
        );
    }

    #[test]
    fn geometry_calls_check_their_input() {
        let mut model = GeoModel::new();
        let mut b = GeoModelBuilder::new(&mut model);
        b.create_mesh_entities(MeshEntityType::Line, 1).unwrap();
        b.create_mesh_entities(MeshEntityType::Surface, 1).unwrap();
        assert!(matches!(
            b.set_corner(0, [0.0; 3]),
            Err(GeoModelError::MeshEntityOutOfRange { .. })
        ));
        assert!(matches!(
            b.set_line(0, &[[0.0; 3]]),
            Err(GeoModelError::InvalidGeometry { .. })
        ));
        assert!(matches!(
            b.set_line(0, &[[0.0; 3], [f64::NAN, 0.0, 0.0]]),
            Err(GeoModelError::InvalidGeometry { .. })
        ));
        let tri = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(matches!(
            b.set_surface_geometry(0, tri.clone(), vec![0, 1, 3], vec![0, 3]),
            Err(GeoModelError::LocalVertexOutOfRange { index: 3, .. })
        ));
        // nothing was registered by the failed calls
        assert_eq!(b.model().vertex_pool().len(), 0);
        b.set_surface_geometry(0, tri, vec![0, 1, 2], vec![0, 3])
            .unwrap();
        assert_eq!(model.surface(0).unwrap().facets().unwrap().nb_facets(), 1);
    }

    #[test]
    fn replacing_vertices_keeps_topology_in_range() {
        let mut model = GeoModel::new();
        let mut b = GeoModelBuilder::new(&mut model);
        b.create_mesh_entities(MeshEntityType::Surface, 1).unwrap();
        let tri = [[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        b.set_surface_geometry(0, &tri, vec![0, 1, 2], vec![0, 3])
            .unwrap();
        let id = MeshEntityId::surface(0);
        assert!(b.set_mesh_entity_vertices(id, &tri[..2]).is_err());
        let moved = [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]];
        b.set_mesh_entity_vertices(id, moved.to_vec()).unwrap();
        assert_eq!(model.surface(0).unwrap().vertices(), &moved);
        // old positions stay in the pool but no longer point at the surface
        assert_eq!(model.vertex_pool().len(), 6);
        assert!(model.entities_at_vertex(0, MeshEntityType::Surface).is_empty());
    }

    #[test]
    fn cells_are_checked_and_adjacency_is_computed() {
        let mut model = GeoModel::new();
        let mut b = GeoModelBuilder::new(&mut model);
        b.create_mesh_entities(MeshEntityType::Region, 1).unwrap();
        b.set_mesh_entity_vertices(MeshEntityId::region(0), unit_hex())
            .unwrap();
        assert!(matches!(
            b.create_region_cell(0, CellType::Hexahedron, &[0, 1, 2, 3]),
            Err(GeoModelError::CellArityMismatch { found: 4, .. })
        ));
        assert_eq!(
            b.create_region_cells(0, CellType::Tetrahedron, &[0, 1, 2, 4, 1, 2, 4, 7])
                .unwrap(),
            0..2
        );
        let report = b.compute_region_adjacencies(0, false).unwrap();
        assert!(report.computed);
        assert_eq!(report.nb_cells, 2);
        assert_eq!(report.nb_boundary_faces, 6);
        let again = b.compute_region_adjacencies(0, false).unwrap();
        assert!(!again.computed);
        assert_eq!(again.nb_boundary_faces, 6);

        // a new cell invalidates the table
        b.create_region_cell(0, CellType::Tetrahedron, &[2, 4, 6, 7])
            .unwrap();
        assert!(model.region(0).unwrap().cells().unwrap().adjacency().is_none());
    }

    #[test]
    fn non_manifold_faces_follow_ambiguity_handling() {
        let build = |options: GeoModelOptions| {
            let mut model = GeoModel::with_options(options);
            let mut b = GeoModelBuilder::new(&mut model);
            b.create_mesh_entities(MeshEntityType::Region, 1).unwrap();
            let pts = vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, -1.0],
                [1.0, 1.0, 1.0],
            ];
            b.set_mesh_entity_vertices(MeshEntityId::region(0), pts)
                .unwrap();
            b.create_region_cells(0, CellType::Tetrahedron, &[0, 1, 2, 3, 0, 1, 2, 4, 0, 1, 2, 5])
                .unwrap();
            model
        };

        let mut strict = build(GeoModelOptions::default());
        let err = GeoModelBuilder::new(&mut strict)
            .compute_all_region_adjacencies(false)
            .unwrap_err();
        assert!(matches!(err, GeoModelError::NonManifoldFace { .. }));
        assert!(strict.region(0).unwrap().cells().unwrap().adjacency().is_none());

        let mut lenient = build(GeoModelOptions {
            ambiguity: AmbiguityHandling::Warn,
            ..GeoModelOptions::default()
        });
        let reports = GeoModelBuilder::new(&mut lenient)
            .compute_all_region_adjacencies(false)
            .unwrap();
        assert_eq!(reports[0].non_manifold.len(), 1);
        assert!(lenient.region(0).unwrap().cells().unwrap().adjacency().is_some());
    }
}
