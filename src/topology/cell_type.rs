//! Volumetric cell types and their corner/face conventions.
//!
//! Cells reference their vertices in a fixed local order:
//!
//! - [`CellType::Tetrahedron`]: `(0,1,2,3)`
//! - [`CellType::Hexahedron`]: trilinear order, local vertex `dx + 2*dy + 4*dz`
//!   for the corner at offset `(dx, dy, dz)` of the unit cell.
//! - [`CellType::Prism`]: `(0,1,2)` bottom triangle, `(3,4,5)` top triangle,
//!   vertex `i + 3` above vertex `i`.
//! - [`CellType::Pyramid`]: `(0,1,2,3)` base quad in cyclic order, `4` apex.
//!
//! Face tables list each face's local vertices, wound so that the
//! right-hand normal points into the cell.

use serde::{Deserialize, Serialize};

/// Volumetric cell types accepted in a Region.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
}

const TETRAHEDRON_FACES: [&[usize]; 4] = [&[1, 3, 2], &[0, 2, 3], &[3, 1, 0], &[0, 1, 2]];

const HEXAHEDRON_FACES: [&[usize]; 6] = [
    &[0, 2, 6, 4],
    &[3, 1, 5, 7],
    &[1, 0, 4, 5],
    &[2, 3, 7, 6],
    &[1, 3, 2, 0],
    &[4, 6, 7, 5],
];

const PRISM_FACES: [&[usize]; 5] = [
    &[0, 1, 2],
    &[3, 5, 4],
    &[0, 3, 4, 1],
    &[0, 2, 5, 3],
    &[1, 4, 5, 2],
];

const PYRAMID_FACES: [&[usize]; 5] = [
    &[0, 1, 2, 3],
    &[0, 4, 1],
    &[0, 3, 4],
    &[2, 4, 3],
    &[2, 1, 4],
];

impl CellType {
    /// All supported cell types.
    pub const ALL: [CellType; 4] = [
        CellType::Tetrahedron,
        CellType::Hexahedron,
        CellType::Prism,
        CellType::Pyramid,
    ];

    /// Number of corners of the cell.
    pub fn nb_vertices(self) -> usize {
        match self {
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
            CellType::Prism => 6,
            CellType::Pyramid => 5,
        }
    }

    /// Local vertex lists of every face.
    pub fn faces(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Tetrahedron => &TETRAHEDRON_FACES,
            CellType::Hexahedron => &HEXAHEDRON_FACES,
            CellType::Prism => &PRISM_FACES,
            CellType::Pyramid => &PYRAMID_FACES,
        }
    }

    /// Number of faces of the cell.
    #[inline]
    pub fn nb_faces(self) -> usize {
        self.faces().len()
    }

    /// Local vertices of face `face`, or `None` if out of range.
    #[inline]
    pub fn face_vertices(self, face: usize) -> Option<&'static [usize]> {
        self.faces().get(face).copied()
    }
}
