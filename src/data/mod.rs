//! Geometry storage: the shared vertex pool and per-entity local meshes.

pub mod cell_mesh;
pub mod facet_mesh;
pub mod vertex_pool;

/// 3D position. Vector arithmetic is left to the caller.
pub type Vec3 = [f64; 3];

pub use cell_mesh::{AdjacencyTable, CellMesh};
pub use facet_mesh::FacetMesh;
pub use vertex_pool::{DEFAULT_VERTEX_TOLERANCE, VertexIncidence, VertexPool};

/// Checks that CSR `offsets` start at 0, never decrease and end at `len`.
pub(crate) fn check_csr_offsets(offsets: &[usize], len: usize) -> Result<(), String> {
    match offsets.first() {
        None => return Err("offsets are empty".into()),
        Some(&first) if first != 0 => return Err(format!("offsets start at {first}, not 0")),
        Some(_) => {}
    }
    if let Some(k) = offsets.windows(2).position(|w| w[1] < w[0]) {
        return Err(format!("offsets decrease after entry {k}"));
    }
    match offsets.last() {
        Some(&last) if last != len => Err(format!("offsets end at {last} but {len} entries exist")),
        _ => Ok(()),
    }
}
