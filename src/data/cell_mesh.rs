//! Volumetric cells of a Region and their face adjacency.

use serde::{Deserialize, Serialize};

use crate::data::check_csr_offsets;
use crate::model_error::GeoModelError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::MeshEntityId;

/// Cells of a Region: per-cell type plus a CSR vertex array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellMesh {
    cell_types: Vec<CellType>,
    cell_vertices: Vec<usize>,
    cell_offsets: Vec<usize>,
    adjacency: Option<AdjacencyTable>,
}

impl Default for CellMesh {
    fn default() -> Self {
        Self {
            cell_types: Vec::new(),
            cell_vertices: Vec::new(),
            cell_offsets: vec![0],
            adjacency: None,
        }
    }
}

impl CellMesh {
    /// Appends one cell after checking its arity and local indices.
    ///
    /// Returns the index of the new cell. Any existing adjacency table is
    /// dropped since it no longer covers every cell.
    pub(crate) fn push_cell(
        &mut self,
        region: MeshEntityId,
        cell_type: CellType,
        vertices: &[usize],
        nb_vertices: usize,
    ) -> Result<usize, GeoModelError> {
        check_cell(region, cell_type, vertices, nb_vertices)?;
        if self.adjacency.take().is_some() {
            log::debug!("{region}: cell added, discarding its adjacency table");
        }
        self.cell_types.push(cell_type);
        self.cell_vertices.extend_from_slice(vertices);
        self.cell_offsets.push(self.cell_vertices.len());
        Ok(self.cell_types.len() - 1)
    }

    /// Appends `flat.len() / arity` cells of one type, all or nothing.
    pub(crate) fn push_cells(
        &mut self,
        region: MeshEntityId,
        cell_type: CellType,
        flat: &[usize],
        nb_vertices: usize,
    ) -> Result<std::ops::Range<usize>, GeoModelError> {
        let arity = cell_type.nb_vertices();
        if flat.len() % arity != 0 {
            return Err(GeoModelError::CellArityMismatch {
                region,
                cell_type,
                expected: arity,
                found: flat.len() % arity,
            });
        }
        for chunk in flat.chunks_exact(arity) {
            check_cell(region, cell_type, chunk, nb_vertices)?;
        }
        let start = self.nb_cells();
        if !flat.is_empty() && self.adjacency.take().is_some() {
            log::debug!("{region}: cells added, discarding its adjacency table");
        }
        for chunk in flat.chunks_exact(arity) {
            self.cell_types.push(cell_type);
            self.cell_vertices.extend_from_slice(chunk);
            self.cell_offsets.push(self.cell_vertices.len());
        }
        Ok(start..self.nb_cells())
    }

    #[inline]
    pub fn nb_cells(&self) -> usize {
        self.cell_types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cell_types.is_empty()
    }

    #[inline]
    pub fn cell_type(&self, cell: usize) -> Option<CellType> {
        self.cell_types.get(cell).copied()
    }

    /// Local vertices of `cell` in the canonical corner order of its type.
    pub fn cell_vertices(&self, cell: usize) -> Option<&[usize]> {
        let start = *self.cell_offsets.get(cell)?;
        let end = *self.cell_offsets.get(cell + 1)?;
        self.cell_vertices.get(start..end)
    }

    /// Iterates `(cell type, local vertices)` in cell order.
    pub fn cells(&self) -> impl Iterator<Item = (CellType, &[usize])> + '_ {
        self.cell_types
            .iter()
            .zip(self.cell_offsets.windows(2))
            .map(move |(&ct, w)| (ct, &self.cell_vertices[w[0]..w[1]]))
    }

    /// Face adjacency, once computed.
    #[inline]
    pub fn adjacency(&self) -> Option<&AdjacencyTable> {
        self.adjacency.as_ref()
    }

    pub(crate) fn set_adjacency(&mut self, table: AdjacencyTable) {
        self.adjacency = Some(table);
    }

    /// Largest local vertex index referenced, if any cell exists.
    pub fn max_vertex_index(&self) -> Option<usize> {
        self.cell_vertices.iter().copied().max()
    }

    /// Checks the CSR shape of the cells and of the adjacency table.
    pub(crate) fn check_layout(&self) -> Result<(), String> {
        if self.cell_offsets.len() != self.cell_types.len() + 1 {
            return Err(format!(
                "{} cell offsets for {} cells",
                self.cell_offsets.len(),
                self.cell_types.len()
            ));
        }
        check_csr_offsets(&self.cell_offsets, self.cell_vertices.len())
            .map_err(|reason| format!("cell {reason}"))?;
        if let Some((cell, (cell_type, _))) = self
            .cells()
            .enumerate()
            .find(|&(_, (ct, vertices))| vertices.len() != ct.nb_vertices())
        {
            return Err(format!("cell {cell} has the wrong arity for a {cell_type:?}"));
        }
        match &self.adjacency {
            Some(table) => table.check_layout(&self.cell_types),
            None => Ok(()),
        }
    }
}

fn check_cell(
    region: MeshEntityId,
    cell_type: CellType,
    vertices: &[usize],
    nb_vertices: usize,
) -> Result<(), GeoModelError> {
    if vertices.len() != cell_type.nb_vertices() {
        return Err(GeoModelError::CellArityMismatch {
            region,
            cell_type,
            expected: cell_type.nb_vertices(),
            found: vertices.len(),
        });
    }
    if let Some(&index) = vertices.iter().find(|&&v| v >= nb_vertices) {
        return Err(GeoModelError::LocalVertexOutOfRange {
            entity: region,
            index,
            count: nb_vertices,
        });
    }
    Ok(())
}

/// Neighbor of every `(cell, local face)` pair, `None` on boundary faces.
///
/// Faces are laid out in CSR form: `face_offsets[c] .. face_offsets[c+1]`
/// covers the faces of cell `c` in the order of its type's face table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyTable {
    face_offsets: Vec<usize>,
    neighbors: Vec<Option<usize>>,
}

impl AdjacencyTable {
    pub(crate) fn new(face_offsets: Vec<usize>, neighbors: Vec<Option<usize>>) -> Self {
        debug_assert_eq!(face_offsets.last().copied(), Some(neighbors.len()));
        Self {
            face_offsets,
            neighbors,
        }
    }

    #[inline]
    pub fn nb_cells(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    /// Number of faces of `cell`.
    pub fn nb_faces(&self, cell: usize) -> usize {
        match (self.face_offsets.get(cell), self.face_offsets.get(cell + 1)) {
            (Some(&start), Some(&end)) => end - start,
            _ => 0,
        }
    }

    /// Cell across face `face` of `cell`; `None` on a boundary face or an
    /// out-of-range pair.
    pub fn neighbor(&self, cell: usize, face: usize) -> Option<usize> {
        if face >= self.nb_faces(cell) {
            return None;
        }
        self.neighbors[self.face_offsets[cell] + face]
    }

    /// Neighbors of every face of `cell`.
    pub fn cell_neighbors(&self, cell: usize) -> &[Option<usize>] {
        match (self.face_offsets.get(cell), self.face_offsets.get(cell + 1)) {
            (Some(&start), Some(&end)) => &self.neighbors[start..end],
            _ => &[],
        }
    }

    /// Iterates the `(cell, face)` pairs with no neighbor.
    pub fn boundary_faces(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nb_cells()).flat_map(move |cell| {
            self.cell_neighbors(cell)
                .iter()
                .enumerate()
                .filter(|(_, n)| n.is_none())
                .map(move |(face, _)| (cell, face))
        })
    }

    #[inline]
    pub fn nb_boundary_faces(&self) -> usize {
        self.neighbors.iter().filter(|n| n.is_none()).count()
    }

    /// Checks that the table has one face run per cell, sized by its type,
    /// and only names existing cells.
    fn check_layout(&self, cell_types: &[CellType]) -> Result<(), String> {
        if self.nb_cells() != cell_types.len() {
            return Err(format!(
                "adjacency table covers {} cells, region has {}",
                self.nb_cells(),
                cell_types.len()
            ));
        }
        check_csr_offsets(&self.face_offsets, self.neighbors.len())
            .map_err(|reason| format!("adjacency {reason}"))?;
        if let Some((cell, _)) = cell_types
            .iter()
            .enumerate()
            .find(|&(cell, ct)| self.nb_faces(cell) != ct.nb_faces())
        {
            return Err(format!("adjacency face count of cell {cell} does not match its type"));
        }
        match self.neighbors.iter().flatten().find(|&&n| n >= cell_types.len()) {
            Some(n) => Err(format!("adjacency names missing cell {n}")),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGION: MeshEntityId = MeshEntityId::region(0);

    #[test]
    fn push_checks_arity_and_range() {
        let mut cells = CellMesh::default();
        assert_eq!(
            cells.push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2], 4),
            Err(GeoModelError::CellArityMismatch {
                region: REGION,
                cell_type: CellType::Tetrahedron,
                expected: 4,
                found: 3
            })
        );
        assert!(matches!(
            cells.push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, 4], 4),
            Err(GeoModelError::LocalVertexOutOfRange { index: 4, .. })
        ));
        assert_eq!(cells.push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, 3], 4), Ok(0));
        assert_eq!(cells.nb_cells(), 1);
        assert_eq!(cells.cell_vertices(0), Some(&[0, 1, 2, 3][..]));
    }

    #[test]
    fn batch_push_is_all_or_nothing() {
        let mut cells = CellMesh::default();
        let bad = [0, 1, 2, 3, 0, 1, 2, 9];
        assert!(cells.push_cells(REGION, CellType::Tetrahedron, &bad, 5).is_err());
        assert!(cells.is_empty());
        let good = [0, 1, 2, 3, 1, 2, 3, 4];
        assert_eq!(cells.push_cells(REGION, CellType::Tetrahedron, &good, 5), Ok(0..2));
        assert_eq!(cells.cells().count(), 2);
    }

    #[test]
    fn adding_a_cell_discards_adjacency() {
        let mut cells = CellMesh::default();
        cells
            .push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, 3], 4)
            .unwrap();
        cells.set_adjacency(AdjacencyTable::new(vec![0, 4], vec![None; 4]));
        assert!(cells.adjacency().is_some());
        cells
            .push_cell(REGION, CellType::Tetrahedron, &[3, 2, 1, 0], 4)
            .unwrap();
        assert!(cells.adjacency().is_none());
    }

    #[test]
    fn layout_check_catches_broken_offsets() {
        let mut cells = CellMesh::default();
        cells
            .push_cell(REGION, CellType::Tetrahedron, &[0, 1, 2, 3], 4)
            .unwrap();
        assert_eq!(cells.check_layout(), Ok(()));

        let mut bad = cells.clone();
        bad.cell_offsets = vec![0, 4, 8];
        assert!(bad.check_layout().is_err());
        let mut bad = cells.clone();
        bad.cell_offsets = vec![0, 3];
        assert!(bad.check_layout().is_err());

        let mut bad = cells.clone();
        bad.set_adjacency(AdjacencyTable::new(vec![0, 4], vec![Some(3), None, None, None]));
        assert_eq!(
            bad.check_layout(),
            Err("adjacency names missing cell 3".to_string())
        );
        let mut bad = cells;
        bad.set_adjacency(AdjacencyTable::new(vec![0, 2], vec![None; 2]));
        assert!(bad.check_layout().is_err());
    }

    #[test]
    fn table_queries() {
        let table = AdjacencyTable::new(vec![0, 2, 4], vec![Some(1), None, Some(0), None]);
        assert_eq!(table.nb_cells(), 2);
        assert_eq!(table.neighbor(0, 0), Some(1));
        assert_eq!(table.neighbor(0, 1), None);
        assert_eq!(table.neighbor(0, 5), None);
        assert_eq!(table.boundary_faces().collect::<Vec<_>>(), vec![(0, 1), (1, 1)]);
        assert_eq!(table.nb_boundary_faces(), 2);
    }
}
