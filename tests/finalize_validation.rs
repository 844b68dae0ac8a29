use brep_geomodel::prelude::*;

/// One tetrahedral Region bounded by four triangular Surfaces, with corners
/// and lines resolved but no region relations declared yet.
fn tetra(model: &mut GeoModel) {
    let p = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    let faces = [[1, 3, 2], [0, 2, 3], [3, 1, 0], [0, 1, 2]];
    let edges = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

    let mut b = GeoModelBuilder::new(model);
    b.create_mesh_entities(MeshEntityType::Corner, 4).unwrap();
    b.create_mesh_entities(MeshEntityType::Line, 6).unwrap();
    b.create_mesh_entities(MeshEntityType::Surface, 4).unwrap();
    b.create_mesh_entities(MeshEntityType::Region, 1).unwrap();
    for (i, &c) in p.iter().enumerate() {
        b.set_corner(i, c).unwrap();
    }
    for (i, &(s, e)) in edges.iter().enumerate() {
        b.set_line(i, &[p[s], p[e]]).unwrap();
    }
    for (i, f) in faces.iter().enumerate() {
        let verts: Vec<Vec3> = f.iter().map(|&v| p[v]).collect();
        b.set_surface_geometry(i, verts, vec![0, 1, 2], vec![0, 3])
            .unwrap();
    }
    b.set_mesh_entity_vertices(MeshEntityId::region(0), &p).unwrap();
    b.create_region_cell(0, CellType::Tetrahedron, &[0, 1, 2, 3])
        .unwrap();

    let corners = b.resolve_line_corner_boundaries().unwrap();
    assert_eq!(corners.registered, 12);
    let lines = b.resolve_surface_line_boundaries().unwrap();
    assert_eq!(lines.registered, 12);
    assert!(lines.ambiguities.is_empty());
}

#[test]
fn finalize_names_region_without_boundary() {
    let mut model = GeoModel::new();
    tetra(&mut model);
    let mut b = GeoModelBuilder::new(&mut model);
    let err = b.end_geomodel().unwrap_err();
    assert_eq!(
        err,
        GeoModelError::MissingBoundary {
            entity: MeshEntityId::region(0)
        }
    );
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    assert_eq!(err.to_string(), "validation failed: Region 0 has no boundary");
    assert_eq!(b.model().state(), ModelState::Building);

    // the model is still mutable: fix it and finalize
    for s in 0..4 {
        b.add_region_surface_boundary(0, s, SurfaceSide::Negative)
            .unwrap();
    }
    b.end_geomodel().unwrap();
    assert!(model.is_finalized());
    assert_eq!(model.vertices().len(), 4);
}

#[test]
fn finalize_reports_geometry_before_boundaries() {
    let mut model = GeoModel::new();
    tetra(&mut model);
    let mut b = GeoModelBuilder::new(&mut model);
    b.create_mesh_entities(MeshEntityType::Line, 1).unwrap();
    assert_eq!(
        b.end_geomodel(),
        Err(GeoModelError::MissingGeometry {
            entity: MeshEntityId::line(6)
        })
    );
}

#[test]
fn finalize_requires_geological_children() {
    let mut model = GeoModel::new();
    tetra(&mut model);
    let mut b = GeoModelBuilder::new(&mut model);
    for s in 0..4 {
        b.add_region_surface_boundary(0, s, SurfaceSide::Negative)
            .unwrap();
    }
    b.create_geological_entities(GeologicalEntityType::Layer, 2)
        .unwrap();
    b.add_parent_children_relation(GeologicalEntityId::layer(0), MeshEntityId::region(0))
        .unwrap();
    assert_eq!(
        b.end_geomodel(),
        Err(GeoModelError::MissingChildren {
            entity: GeologicalEntityId::layer(1)
        })
    );
    assert!(!model.is_finalized());
}
