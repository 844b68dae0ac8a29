//! Face adjacency between the volumetric cells of one Region.
//!
//! Every cell face is keyed by its sorted pool ids (order-independent, so two
//! cells listing a shared face in opposite orientation still meet). One pass
//! over `cells × faces-per-cell` fills a hash map key → owners; afterwards
//!
//! * one owner    → boundary face (no neighbor),
//! * two owners   → mutual neighbors,
//! * three or more → non-manifold face, reported and left without neighbor.

use hashbrown::HashMap;

use crate::data::{AdjacencyTable, CellMesh};
use crate::model_error::GeoModelError;
use crate::topology::entity::MeshEntityId;

/// Adjacency table plus the non-manifold faces met while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjacencyOutcome {
    pub table: AdjacencyTable,
    /// `NonManifoldFace` errors, ordered by their first cell.
    pub non_manifold: Vec<GeoModelError>,
}

/// Summary returned by the builder after computing a Region's adjacency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdjacencyReport {
    pub region: Option<MeshEntityId>,
    /// Whether a table was (re)built by this call.
    pub computed: bool,
    pub nb_cells: usize,
    pub nb_boundary_faces: usize,
    /// Non-manifold faces reported in lenient mode.
    pub non_manifold: Vec<GeoModelError>,
}

/// Builds the face adjacency of `cells`, whose local vertices map to pool
/// ids through `vertex_ids`.
pub fn compute_cell_adjacency(
    region: MeshEntityId,
    cells: &CellMesh,
    vertex_ids: &[usize],
) -> Result<AdjacencyOutcome, GeoModelError> {
    let mut face_offsets = Vec::with_capacity(cells.nb_cells() + 1);
    face_offsets.push(0);
    let mut owners: HashMap<Vec<usize>, Vec<(usize, usize)>> = HashMap::new();

    for (cell, (cell_type, local)) in cells.cells().enumerate() {
        let base = face_offsets[cell];
        for (face, face_local) in cell_type.faces().iter().enumerate() {
            let mut key = Vec::with_capacity(face_local.len());
            for &lv in face_local.iter() {
                let id = vertex_ids
                    .get(local[lv])
                    .copied()
                    .ok_or(GeoModelError::LocalVertexOutOfRange {
                        entity: region,
                        index: local[lv],
                        count: vertex_ids.len(),
                    })?;
                key.push(id);
            }
            key.sort_unstable();
            owners.entry(key).or_default().push((cell, base + face));
        }
        face_offsets.push(base + cell_type.nb_faces());
    }

    let nb_faces = face_offsets[cells.nb_cells()];
    let mut neighbors = vec![None; nb_faces];
    let mut non_manifold = Vec::new();
    for (key, slots) in owners {
        match slots.as_slice() {
            [_] => {}
            [(c0, s0), (c1, s1)] => {
                if c0 == c1 {
                    return Err(GeoModelError::InvalidGeometry {
                        entity: region,
                        reason: format!("cell {c0} has two faces on vertices {key:?}"),
                    });
                }
                neighbors[*s0] = Some(*c1);
                neighbors[*s1] = Some(*c0);
            }
            _ => {
                let mut cells: Vec<usize> = slots.iter().map(|&(c, _)| c).collect();
                cells.sort_unstable();
                non_manifold.push(GeoModelError::NonManifoldFace {
                    region,
                    face: key,
                    cells,
                });
            }
        }
    }
    non_manifold.sort_by_key(|e| match e {
        GeoModelError::NonManifoldFace { cells, .. } => cells.first().copied(),
        _ => None,
    });

    Ok(AdjacencyOutcome {
        table: AdjacencyTable::new(face_offsets, neighbors),
        non_manifold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::CellType;

    const REGION: MeshEntityId = MeshEntityId::region(0);

    /// n×n×n hexahedra over a lattice of (n+1)^3 vertices (identity pool ids).
    fn hex_grid(n: usize) -> (CellMesh, Vec<usize>) {
        let p = n + 1;
        let at = |x: usize, y: usize, z: usize| x + p * y + p * p * z;
        let mut cells = CellMesh::default();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let hex: Vec<usize> = (0..8)
                        .map(|v| at(x + (v & 1), y + ((v >> 1) & 1), z + ((v >> 2) & 1)))
                        .collect();
                    cells
                        .push_cell(REGION, CellType::Hexahedron, &hex, p * p * p)
                        .unwrap();
                }
            }
        }
        (cells, (0..p * p * p).collect())
    }

    #[test]
    fn two_hexes_share_one_face() {
        // second hex glued on the +x face of the first (vertices 8..12 new)
        let ids: Vec<usize> = (0..12).collect();
        let mut two = CellMesh::default();
        two.push_cell(REGION, CellType::Hexahedron, &[0, 1, 2, 3, 4, 5, 6, 7], 12)
            .unwrap();
        two.push_cell(REGION, CellType::Hexahedron, &[1, 8, 3, 9, 5, 10, 7, 11], 12)
            .unwrap();
        let out = compute_cell_adjacency(REGION, &two, &ids).unwrap();
        assert!(out.non_manifold.is_empty());
        // face 1 of the hexahedron is the +x face {1,3,5,7}, face 0 the -x face
        assert_eq!(out.table.neighbor(0, 1), Some(1));
        assert_eq!(out.table.neighbor(1, 0), Some(0));
        assert_eq!(out.table.nb_boundary_faces(), 10);
    }

    #[test]
    fn grid_interior_faces_have_one_neighbor() {
        for n in 1..=3 {
            let (cells, ids) = hex_grid(n);
            let out = compute_cell_adjacency(REGION, &cells, &ids).unwrap();
            assert_eq!(out.table.nb_cells(), n * n * n);
            assert_eq!(out.table.nb_boundary_faces(), 6 * n * n);
            for cell in 0..out.table.nb_cells() {
                for face in 0..6 {
                    if let Some(other) = out.table.neighbor(cell, face) {
                        assert!(out.table.cell_neighbors(other).contains(&Some(cell)));
                    }
                }
            }
        }
    }

    #[test]
    fn shared_pool_ids_glue_cells_with_distinct_local_vertices() {
        // two tets with duplicated local vertices that coincide in the pool
        let mut cells = CellMesh::default();
        cells
            .push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, 3], 8)
            .unwrap();
        cells
            .push_cell(REGION, CellType::Tetrahedron, &[4, 5, 6, 7], 8)
            .unwrap();
        let ids = vec![0, 1, 2, 3, 0, 2, 1, 9];
        let out = compute_cell_adjacency(REGION, &cells, &ids).unwrap();
        // tet face 3 is {0,1,2}
        assert_eq!(out.table.neighbor(0, 3), Some(1));
        assert_eq!(out.table.neighbor(1, 3), Some(0));
    }

    #[test]
    fn three_cells_on_a_face_are_non_manifold() {
        let mut cells = CellMesh::default();
        for apex in [3, 4, 5] {
            cells
                .push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, apex], 6)
                .unwrap();
        }
        let ids: Vec<usize> = (0..6).collect();
        let out = compute_cell_adjacency(REGION, &cells, &ids).unwrap();
        assert_eq!(
            out.non_manifold,
            vec![GeoModelError::NonManifoldFace {
                region: REGION,
                face: vec![0, 1, 2],
                cells: vec![0, 1, 2]
            }]
        );
        for cell in 0..3 {
            assert_eq!(out.table.neighbor(cell, 3), None);
        }
    }
}
