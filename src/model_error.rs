//! GeoModelError: unified error type for the geomodel builder APIs
//!
//! Every fallible operation of the crate returns this error type. Variants
//! carry the offending entity handles so callers can report or correct the
//! exact entity; [`GeoModelError::kind`] groups them into the broad
//! categories used when deciding how to react.

use thiserror::Error;

use crate::topology::cell_type::CellType;
use crate::topology::entity::{GeologicalEntityId, MeshEntityId, MeshEntityType};

/// Broad failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller error: bad handle, wrong tier, malformed geometry, wrong phase.
    PreconditionViolation,
    /// An inferred relation has no unique answer and was not resolved.
    AmbiguousRelation,
    /// A finalize check rejected the model.
    ValidationFailure,
    /// A repair pass met topology it will not force-correct.
    RepairFailure,
    /// The persistence collaborator failed to read or write a model.
    Persistence,
}

/// Unified error type for geomodel operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoModelError {
    /// A mutating call was made after `end_geomodel` succeeded.
    #[error("cannot {operation}: the geomodel is finalized")]
    ModelFinalized { operation: &'static str },
    /// A mesh entity handle does not name an existing entity.
    #[error("{entity} does not exist (only {count} entities of that type)")]
    MeshEntityOutOfRange { entity: MeshEntityId, count: usize },
    /// A geological entity handle does not name an existing entity.
    #[error("{entity} does not exist (only {count} entities of that type)")]
    GeologicalEntityOutOfRange {
        entity: GeologicalEntityId,
        count: usize,
    },
    /// The operation requires a mesh entity of another type.
    #[error("{entity} has the wrong type for this operation, expected a {expected}")]
    WrongEntityType {
        entity: MeshEntityId,
        expected: MeshEntityType,
    },
    /// A boundary was registered on a Corner, which has none.
    #[error("{entity} cannot have boundaries")]
    NotBoundable { entity: MeshEntityId },
    /// Parent and child do not belong to the same tier.
    #[error("{child} cannot be a child of {parent}: tiers do not match")]
    TierMismatch {
        parent: GeologicalEntityId,
        child: MeshEntityId,
    },
    /// The mesh entity already has a geological parent at that tier.
    #[error("{child} already has geological parent {existing}")]
    ParentAlreadySet {
        child: MeshEntityId,
        existing: GeologicalEntityId,
    },
    /// A local vertex index does not address the entity's vertex array.
    #[error("{entity}: local vertex {index} out of range ({count} vertices)")]
    LocalVertexOutOfRange {
        entity: MeshEntityId,
        index: usize,
        count: usize,
    },
    /// A cell was given a vertex tuple that does not match its type.
    #[error("{region}: {cell_type:?} cell needs {expected} vertices, got {found}")]
    CellArityMismatch {
        region: MeshEntityId,
        cell_type: CellType,
        expected: usize,
        found: usize,
    },
    /// Geometry input is malformed (CSR layout, degenerate facet, non-finite value, ...).
    #[error("invalid geometry for {entity}: {reason}")]
    InvalidGeometry { entity: MeshEntityId, reason: String },
    /// A Line matched a number of Corners other than two.
    #[error("{line} is bounded by {found} corners (expected 2)")]
    LineCornerCount { line: MeshEntityId, found: usize },
    /// Surfaces contain both Line endpoints without the Line being one of their edges.
    #[error("{line}: surfaces {surfaces:?} contain both endpoints but not the line itself")]
    UnconfirmedLineSurface {
        line: MeshEntityId,
        surfaces: Vec<usize>,
    },
    /// A cell face is shared by more than two cells.
    #[error("{region}: face {face:?} is shared by cells {cells:?} (non-manifold)")]
    NonManifoldFace {
        region: MeshEntityId,
        face: Vec<usize>,
        cells: Vec<usize>,
    },
    /// Finalize: a mesh entity has no geometry.
    #[error("validation failed: {entity} has no geometry")]
    MissingGeometry { entity: MeshEntityId },
    /// Finalize: an entity that needs boundaries has none.
    #[error("validation failed: {entity} has no boundary")]
    MissingBoundary { entity: MeshEntityId },
    /// Finalize: a geological entity groups nothing.
    #[error("validation failed: {entity} has no children")]
    MissingChildren { entity: GeologicalEntityId },
    /// Structural cross-references disagree with each other.
    #[error("invariant violated: {0}")]
    BrokenInvariant(String),
    /// A repair pass found topology it does not correct.
    #[error("repair of {entity} failed: {reason}")]
    UnexpectedTopology { entity: MeshEntityId, reason: String },
    /// Persistence requires a finalized model.
    #[error("the geomodel must be finalized before it can be saved")]
    NotFinalized,
    /// The destination format is not supported.
    #[error("unsupported geomodel format: {0}")]
    UnsupportedFormat(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
    /// Encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl GeoModelError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        use GeoModelError::*;
        match self {
            ModelFinalized { .. }
            | MeshEntityOutOfRange { .. }
            | GeologicalEntityOutOfRange { .. }
            | WrongEntityType { .. }
            | NotBoundable { .. }
            | TierMismatch { .. }
            | ParentAlreadySet { .. }
            | LocalVertexOutOfRange { .. }
            | CellArityMismatch { .. }
            | InvalidGeometry { .. } => ErrorKind::PreconditionViolation,
            LineCornerCount { .. } | UnconfirmedLineSurface { .. } | NonManifoldFace { .. } => {
                ErrorKind::AmbiguousRelation
            }
            MissingGeometry { .. }
            | MissingBoundary { .. }
            | MissingChildren { .. }
            | BrokenInvariant(_) => ErrorKind::ValidationFailure,
            UnexpectedTopology { .. } => ErrorKind::RepairFailure,
            NotFinalized | UnsupportedFormat(_) | Io(_) | Serialization(_) => {
                ErrorKind::Persistence
            }
        }
    }
}

impl From<std::io::Error> for GeoModelError {
    fn from(err: std::io::Error) -> Self {
        GeoModelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GeoModelError {
    fn from(err: serde_json::Error) -> Self {
        GeoModelError::Serialization(err.to_string())
    }
}
