//! Sample geomodel generators.
//!
//! [`unit_cube_geomodel`] builds the unit cube `[0, 1]^3` as a complete
//! geomodel: 8 Corners, 12 Lines, 6 Surfaces and 1 Region meshed with
//! `nb_hexs` hexahedra per axis, plus one geological entity per Line, Surface
//! and Region. It runs the whole builder pipeline and returns the model
//! finalized.

use crate::algs::repair::RepairMode;
use crate::builder::GeoModelBuilder;
use crate::data::Vec3;
use crate::geomodel::{GeoModel, GeoModelOptions};
use crate::model_error::GeoModelError;
use crate::topology::cell_type::CellType;
use crate::topology::entity::{GeologicalEntityId, GeologicalEntityType, MeshEntityId, MeshEntityType};
use crate::topology::mesh_entity::SurfaceSide;

/// Surface names, indexed by `2 * axis + side`.
pub const SURFACE_NAMES: [&str; 6] = [
    "boundary_x_min",
    "boundary_x_max",
    "boundary_y_min",
    "boundary_y_max",
    "boundary_z_min",
    "boundary_z_max",
];

/// Corners whose coordinate bits sum to an even number; every cube edge
/// joins one of them to an odd corner.
const EVEN_CORNERS: [usize; 4] = [0, 3, 5, 6];

/// Builds and finalizes the unit cube geomodel.
///
/// Corner `c` sits at `(c & 1, (c >> 1) & 1, (c >> 2) & 1)`. Lines start at
/// an even corner, so half of them run from the higher-numbered corner to
/// the lower one. Surfaces are oriented with outward normals.
pub fn unit_cube_geomodel(
    nb_hexs: usize,
    options: GeoModelOptions,
) -> Result<GeoModel, GeoModelError> {
    if nb_hexs == 0 {
        return Err(GeoModelError::InvalidGeometry {
            entity: MeshEntityId::region(0),
            reason: "nb_hexs must be positive".into(),
        });
    }
    let n = nb_hexs;
    let lattice = |p: [usize; 3]| -> Vec3 { p.map(|i| i as f64 / n as f64) };

    let mut model = GeoModel::with_options(options);
    let mut b = GeoModelBuilder::new(&mut model);
    b.create_mesh_entities(MeshEntityType::Corner, 8)?;
    b.create_mesh_entities(MeshEntityType::Line, 12)?;
    b.create_mesh_entities(MeshEntityType::Surface, 6)?;
    b.create_mesh_entities(MeshEntityType::Region, 1)?;

    for c in 0..8 {
        b.set_corner(c, lattice(corner_bits(c).map(|bit| bit * n)))?;
    }

    let mut line = 0;
    for start in EVEN_CORNERS {
        let bits = corner_bits(start);
        for axis in 0..3 {
            let chain: Vec<Vec3> = (0..=n)
                .map(|i| {
                    let mut p = bits.map(|bit| bit * n);
                    p[axis] = if bits[axis] == 0 { i } else { n - i };
                    lattice(p)
                })
                .collect();
            b.set_line(line, chain)?;
            line += 1;
        }
    }

    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        for side in 0..2 {
            let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
            for j in 0..=n {
                for i in 0..=n {
                    let mut p = [0; 3];
                    p[axis] = side * n;
                    p[u] = i;
                    p[v] = j;
                    vertices.push(lattice(p));
                }
            }
            let mut quads = Vec::with_capacity(4 * n * n);
            for j in 0..n {
                for i in 0..n {
                    let v0 = i + (n + 1) * j;
                    let (v1, v2, v3) = (v0 + 1, v0 + n + 2, v0 + n + 1);
                    // counter-clockwise in (u, v) points along +axis
                    if side == 1 {
                        quads.extend([v0, v1, v2, v3]);
                    } else {
                        quads.extend([v0, v3, v2, v1]);
                    }
                }
            }
            let offsets: Vec<usize> = (0..=n * n).map(|k| 4 * k).collect();
            let surface = 2 * axis + side;
            b.set_surface_geometry(surface, vertices, quads, offsets)?;
            b.set_mesh_entity_name(MeshEntityId::surface(surface), SURFACE_NAMES[surface])?;
        }
    }

    let p = n + 1;
    let mut vertices = Vec::with_capacity(p * p * p);
    for z in 0..p {
        for y in 0..p {
            for x in 0..p {
                vertices.push(lattice([x, y, z]));
            }
        }
    }
    b.set_mesh_entity_vertices(MeshEntityId::region(0), vertices)?;
    let at = |x: usize, y: usize, z: usize| x + p * y + p * p * z;
    let mut hexes = Vec::with_capacity(8 * n * n * n);
    for z in 0..n {
        for y in 0..n {
            for x in 0..n {
                hexes.extend((0..8).map(|v| at(x + (v & 1), y + ((v >> 1) & 1), z + ((v >> 2) & 1))));
            }
        }
    }
    b.create_region_cells(0, CellType::Hexahedron, &hexes)?;

    b.resolve_line_corner_boundaries()?;
    b.resolve_surface_line_boundaries()?;
    b.compute_region_adjacencies(0, false)?;
    for surface in 0..6 {
        b.add_region_surface_boundary(0, surface, SurfaceSide::Negative)?;
    }

    for kind in GeologicalEntityType::ALL {
        let child_kind = kind.child_type();
        let count = b.model().nb_mesh_entities(child_kind);
        for index in b.create_geological_entities(kind, count)? {
            b.add_parent_children_relation(
                GeologicalEntityId::new(kind, index),
                MeshEntityId::new(child_kind, index),
            )?;
        }
    }

    b.repair(RepairMode::All)?;
    b.end_geomodel()?;
    Ok(model)
}

fn corner_bits(c: usize) -> [usize; 3] {
    [c & 1, (c >> 1) & 1, (c >> 2) & 1]
}
