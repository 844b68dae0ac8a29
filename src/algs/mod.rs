//! Algorithms over a geomodel: relation inference, cell adjacency, repair
//! and finalize-time validation.

pub mod boundary_resolver;
pub mod cell_adjacency;
pub mod repair;
pub mod validation;

pub use boundary_resolver::{
    RelationPlan, ResolutionReport, plan_line_corner_boundaries, plan_surface_line_boundaries,
};
pub use cell_adjacency::{AdjacencyOutcome, AdjacencyReport, compute_cell_adjacency};
pub use repair::{RepairMode, RepairReport, repair_geomodel};
pub use validation::validate_geomodel;
