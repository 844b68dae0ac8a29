//! # brep-geomodel
//!
//! brep-geomodel builds boundary-represented geological models. A model is
//! made of mesh entities of increasing dimension (Corners, Lines, Surfaces,
//! Regions), each carrying its own local mesh, tied together by boundary
//! relations and grouped into geological entities (Contacts, Interfaces,
//! Layers).
//!
//! ## Features
//! - A shared vertex pool that deduplicates coincident vertices across
//!   entities, with exact or tolerance-based matching
//! - Boundary relation inference (Corner→Line, Line→Surface) from shared
//!   vertex identity, with explicit reporting of ambiguous matches
//! - Face adjacency between volumetric cells (tetrahedra, hexahedra, prisms,
//!   pyramids)
//! - Repair passes that normalize relation ordering
//! - Finalization that validates and freezes the model
//! - JSON persistence of finalized models
//!
//! ## Usage
//!
//! ```
//! use brep_geomodel::prelude::*;
//!
//! let model = unit_cube_geomodel(2, GeoModelOptions::default()).unwrap();
//! assert!(model.is_finalized());
//! assert_eq!(model.region(0).unwrap().cells().unwrap().nb_cells(), 8);
//! ```
//!
//! Models are built through a [`GeoModelBuilder`](builder::GeoModelBuilder):
//! create entities, assign geometry, resolve or declare boundary relations,
//! attach the geological hierarchy, repair, then call `end_geomodel`.
//!
//! ## Invariant checks
//! Builder steps re-check the model's cross references in debug builds. Enable
//! the `check-invariants` feature to keep those checks in release builds.

pub mod algs;
pub mod builder;
pub mod data;
pub mod debug_invariants;
pub mod geomodel;
pub mod io;
pub mod mesh_generation;
pub mod model_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::boundary_resolver::ResolutionReport;
    pub use crate::algs::cell_adjacency::AdjacencyReport;
    pub use crate::algs::repair::{RepairMode, RepairReport};
    pub use crate::builder::GeoModelBuilder;
    pub use crate::data::{AdjacencyTable, CellMesh, FacetMesh, Vec3, VertexPool};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geomodel::{AmbiguityHandling, GeoModel, GeoModelOptions, ModelState};
    pub use crate::io::{
        GeoModelReader, GeoModelWriter, JsonGeoModelIo, load_geomodel, save_geomodel,
    };
    pub use crate::mesh_generation::unit_cube_geomodel;
    pub use crate::model_error::{ErrorKind, GeoModelError};
    pub use crate::topology::{
        BoundaryRef, CellType, GeologicalEntity, GeologicalEntityId, GeologicalEntityType,
        GeologicalFeature, MeshEntity, MeshEntityId, MeshEntityType, SurfaceSide,
    };
}
