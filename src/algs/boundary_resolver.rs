//! Boundary relation inference.
//!
//! Two tiers are inferred from shared vertex identity:
//!
//! * **Corner → Line**: a Corner bounds every Line whose first or last
//!   vertex has the Corner's pool id.
//! * **Line → Surface**: the candidate Surfaces of a Line are those holding
//!   both its endpoints (intersection of the two per-endpoint incidence
//!   lists). A candidate is confirmed when every segment of the Line is an
//!   edge of one of the Surface's facets.
//!
//! Region → Surface relations are never inferred; callers declare them.
//!
//! Matching goes through the pool's incidence index (pool id → local
//! vertices bound to it) instead of comparing every pair of entities, so
//! the cost is proportional to the number of incidences touched.
//!
//! The functions here only compute a [`RelationPlan`]; committing it is the
//! builder's job so a failed call leaves the model untouched.

use hashbrown::{HashMap, HashSet};
use itertools::{EitherOrBoth, Itertools};

use crate::geomodel::GeoModel;
use crate::model_error::GeoModelError;
use crate::topology::entity::{MeshEntityId, MeshEntityType};
use crate::topology::mesh_entity::{BoundaryRef, SurfaceSide};

/// Relations found by one inference pass, plus what could not be decided.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RelationPlan {
    /// `(bounded entity, boundary entity)` pairs in registration order.
    pub relations: Vec<(MeshEntityId, MeshEntityId)>,
    /// Ambiguities, as `AmbiguousRelation` errors.
    pub ambiguities: Vec<GeoModelError>,
}

/// Outcome of a resolver call on the builder.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolutionReport {
    /// Relations newly registered by this call.
    pub registered: usize,
    /// Relations inferred again but already present.
    pub already_present: usize,
    /// Ambiguities reported in lenient mode (always empty in strict mode).
    pub ambiguities: Vec<GeoModelError>,
}

/// Corner → Line matches.
///
/// Corners are visited in index order, so each Line's corners are planned
/// in ascending corner order regardless of the Line's direction. Every Line
/// with geometry must match exactly two Corners; other counts are reported.
pub fn plan_line_corner_boundaries(model: &GeoModel) -> RelationPlan {
    let pool = model.vertex_pool();
    let mut per_line: Vec<Vec<usize>> = vec![Vec::new(); model.nb_lines()];

    for corner in model.mesh_entities(MeshEntityType::Corner) {
        let Some(vertex) = corner.vertex_id(0) else {
            continue;
        };
        for inc in pool.incidences(vertex) {
            if inc.entity.kind != MeshEntityType::Line {
                continue;
            }
            let Some(line) = model.line(inc.entity.index) else {
                continue;
            };
            let is_endpoint = inc.local == 0 || inc.local + 1 == line.nb_vertices();
            let matches = &mut per_line[inc.entity.index];
            if is_endpoint && !matches.contains(&corner.index()) {
                matches.push(corner.index());
            }
        }
    }

    let mut plan = RelationPlan::default();
    for (line_index, corners) in per_line.into_iter().enumerate() {
        let line = MeshEntityId::line(line_index);
        let has_geometry = model.line(line_index).is_some_and(|l| l.has_geometry());
        if has_geometry && corners.len() != 2 {
            plan.ambiguities.push(GeoModelError::LineCornerCount {
                line,
                found: corners.len(),
            });
        }
        plan.relations.extend(
            corners
                .into_iter()
                .map(|c| (line, MeshEntityId::corner(c))),
        );
    }
    plan
}

/// Line → Surface matches.
pub fn plan_surface_line_boundaries(model: &GeoModel) -> RelationPlan {
    let pool = model.vertex_pool();
    let mut edge_sets: HashMap<usize, HashSet<(usize, usize)>> = HashMap::new();
    let mut plan = RelationPlan::default();

    for line in model.mesh_entities(MeshEntityType::Line) {
        if !line.has_geometry() {
            continue;
        }
        let Some((first, last)) = line.endpoint_ids() else {
            continue;
        };
        let at_first = pool.incident_entities(first, MeshEntityType::Surface);
        let at_last = pool.incident_entities(last, MeshEntityType::Surface);
        let candidates = at_first
            .iter()
            .merge_join_by(at_last.iter(), |a, b| a.cmp(b))
            .filter_map(|pair| match pair {
                EitherOrBoth::Both(&s, _) => Some(s),
                _ => None,
            });

        let mut unconfirmed = Vec::new();
        for surface in candidates {
            let edges = edge_sets
                .entry(surface)
                .or_insert_with(|| surface_edge_set(model, surface));
            let confirmed = line
                .vertex_ids()
                .iter()
                .tuple_windows()
                .filter(|(a, b)| a != b)
                .all(|(&a, &b)| edges.contains(&edge_key(a, b)));
            if confirmed {
                plan.relations
                    .push((MeshEntityId::surface(surface), line.id()));
            } else {
                unconfirmed.push(surface);
            }
        }
        if !unconfirmed.is_empty() {
            plan.ambiguities.push(GeoModelError::UnconfirmedLineSurface {
                line: line.id(),
                surfaces: unconfirmed,
            });
        }
    }
    plan
}

/// Facet edges of a Surface as canonical pool-id pairs.
fn surface_edge_set(model: &GeoModel, surface: usize) -> HashSet<(usize, usize)> {
    let Some(entity) = model.surface(surface) else {
        return HashSet::new();
    };
    let Some(facets) = entity.facets() else {
        return HashSet::new();
    };
    let ids = entity.vertex_ids();
    facets
        .edges()
        .map(|(a, b)| edge_key(ids[a], ids[b]))
        .collect()
}

#[inline]
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// Records `boundary` as a boundary of `entity` and the inverse incidence.
///
/// Returns `Ok(false)` when the same relation (with the same side) already
/// exists. Both handles are checked before anything is written.
pub(crate) fn register_boundary(
    model: &mut GeoModel,
    entity: MeshEntityId,
    boundary: MeshEntityId,
    side: Option<SurfaceSide>,
) -> Result<bool, GeoModelError> {
    let expected = entity
        .kind
        .boundary_type()
        .ok_or(GeoModelError::NotBoundable { entity })?;
    if boundary.kind != expected {
        return Err(GeoModelError::WrongEntityType {
            entity: boundary,
            expected,
        });
    }
    model.mesh_entity(boundary)?;
    let relation = BoundaryRef {
        index: boundary.index,
        side,
    };

    let bounded = model.mesh_entity_mut(entity)?;
    if bounded.boundary_refs().contains(&relation) {
        return Ok(false);
    }
    bounded.boundaries_mut().push(relation);

    let lower = model.mesh_entity_mut(boundary)?;
    if !lower.incident_indices().contains(&entity.index) {
        lower.incident_indices_mut().push(entity.index);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GeoModelBuilder;
    use crate::geomodel::GeoModelOptions;

    /// Unit square: 4 corners, 4 lines, 1 quad surface made of 2x2 facets.
    fn square(model: &mut GeoModel) {
        let mut b = GeoModelBuilder::new(model);
        b.create_mesh_entities(MeshEntityType::Corner, 4).unwrap();
        b.create_mesh_entities(MeshEntityType::Line, 4).unwrap();
        b.create_mesh_entities(MeshEntityType::Surface, 1).unwrap();
        let c = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        for (i, p) in c.iter().enumerate() {
            b.set_corner(i, *p).unwrap();
        }
        let mid = |a: [f64; 3], z: [f64; 3]| {
            [(a[0] + z[0]) / 2.0, (a[1] + z[1]) / 2.0, (a[2] + z[2]) / 2.0]
        };
        // line 2 runs backwards (from corner 3 to corner 2)
        b.set_line(0, &[c[0], mid(c[0], c[1]), c[1]]).unwrap();
        b.set_line(1, &[c[1], mid(c[1], c[2]), c[2]]).unwrap();
        b.set_line(2, &[c[3], mid(c[3], c[2]), c[2]]).unwrap();
        b.set_line(3, &[c[0], mid(c[0], c[3]), c[3]]).unwrap();

        let mut verts = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                verts.push([i as f64 * 0.5, j as f64 * 0.5, 0.0]);
            }
        }
        let mut quads = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                let v = j * 3 + i;
                quads.extend([v, v + 1, v + 4, v + 3]);
            }
        }
        b.set_surface_geometry(0, verts, quads, vec![0, 4, 8, 12, 16])
            .unwrap();
    }

    /// Pairwise reference implementation of the corner matching.
    fn naive_line_corners(model: &GeoModel) -> Vec<(MeshEntityId, MeshEntityId)> {
        let mut out = Vec::new();
        for line in model.mesh_entities(MeshEntityType::Line) {
            let (first, last) = line.endpoint_ids().unwrap();
            for corner in model.mesh_entities(MeshEntityType::Corner) {
                let v = corner.vertex_id(0).unwrap();
                if v == first || v == last {
                    out.push((line.id(), corner.id()));
                }
            }
        }
        out
    }

    #[test]
    fn corners_match_line_endpoints() {
        let mut model = GeoModel::new();
        square(&mut model);
        let plan = plan_line_corner_boundaries(&model);
        assert!(plan.ambiguities.is_empty());
        let mut got = plan.relations.clone();
        got.sort();
        let mut want = naive_line_corners(&model);
        want.sort();
        assert_eq!(got, want);
        assert!(plan
            .relations
            .contains(&(MeshEntityId::line(2), MeshEntityId::corner(3))));
    }

    #[test]
    fn interior_vertices_do_not_match_corners() {
        let mut model = GeoModel::new();
        square(&mut model);
        {
            let mut b = GeoModelBuilder::new(&mut model);
            b.create_mesh_entities(MeshEntityType::Corner, 1).unwrap();
            // the midpoint of line 0
            b.set_corner(4, [0.5, 0.0, 0.0]).unwrap();
        }
        let plan = plan_line_corner_boundaries(&model);
        assert!(plan
            .relations
            .iter()
            .all(|&(_, c)| c != MeshEntityId::corner(4)));
    }

    #[test]
    fn dangling_line_end_is_reported() {
        let mut model = GeoModel::new();
        square(&mut model);
        {
            let mut b = GeoModelBuilder::new(&mut model);
            b.create_mesh_entities(MeshEntityType::Line, 1).unwrap();
            b.set_line(4, &[[0.0, 0.0, 0.0], [0.0, 0.0, 5.0]]).unwrap();
        }
        let plan = plan_line_corner_boundaries(&model);
        assert_eq!(
            plan.ambiguities,
            vec![GeoModelError::LineCornerCount {
                line: MeshEntityId::line(4),
                found: 1
            }]
        );
    }

    #[test]
    fn surfaces_found_by_endpoint_intersection() {
        let mut model = GeoModel::new();
        square(&mut model);
        let plan = plan_surface_line_boundaries(&model);
        assert!(plan.ambiguities.is_empty());
        assert_eq!(plan.relations.len(), 4);
        for (i, &(s, l)) in plan.relations.iter().enumerate() {
            assert_eq!(s, MeshEntityId::surface(0));
            assert_eq!(l, MeshEntityId::line(i));
        }
    }

    #[test]
    fn diagonal_line_is_not_confirmed() {
        let mut model = GeoModel::with_options(GeoModelOptions::exact());
        square(&mut model);
        {
            let mut b = GeoModelBuilder::new(&mut model);
            b.create_mesh_entities(MeshEntityType::Line, 1).unwrap();
            // both endpoints lie on the surface but the line crosses facets
            b.set_line(4, &[[0.0, 0.0, 0.0], [1.0, 1.0, 0.0]]).unwrap();
        }
        let plan = plan_surface_line_boundaries(&model);
        assert_eq!(
            plan.ambiguities,
            vec![GeoModelError::UnconfirmedLineSurface {
                line: MeshEntityId::line(4),
                surfaces: vec![0]
            }]
        );
        assert!(plan
            .relations
            .iter()
            .all(|&(_, l)| l != MeshEntityId::line(4)));
    }

    #[test]
    fn register_is_idempotent_and_symmetric() {
        let mut model = GeoModel::new();
        square(&mut model);
        let line = MeshEntityId::line(0);
        let corner = MeshEntityId::corner(1);
        assert_eq!(register_boundary(&mut model, line, corner, None), Ok(true));
        assert_eq!(register_boundary(&mut model, line, corner, None), Ok(false));
        assert_eq!(model.line(0).unwrap().nb_boundaries(), 1);
        assert_eq!(
            model.corner(1).unwrap().incident_entities().collect::<Vec<_>>(),
            vec![line]
        );
        assert!(matches!(
            register_boundary(&mut model, line, MeshEntityId::surface(0), None),
            Err(GeoModelError::WrongEntityType { .. })
        ));
        assert!(matches!(
            register_boundary(&mut model, line, MeshEntityId::corner(99), None),
            Err(GeoModelError::MeshEntityOutOfRange { .. })
        ));
        assert_eq!(
            register_boundary(&mut model, MeshEntityId::corner(0), corner, None),
            Err(GeoModelError::NotBoundable {
                entity: MeshEntityId::corner(0)
            })
        );
        assert_eq!(model.corner(0).unwrap().nb_boundaries(), 0);
    }
}
