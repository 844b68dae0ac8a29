//! Entity kinds and typed handles.
//!
//! A geomodel stores two families of entities:
//! - mesh entities (`Corner`, `Line`, `Surface`, `Region`), one per
//!   topological dimension, each carrying geometry;
//! - geological entities (`Contact`, `Interface`, `Layer`), which group mesh
//!   entities of one tier into named geological concepts.
//!
//! Entities are addressed by `(kind, index)` handles. Indices are assigned
//! sequentially per kind and never reused, so a handle stays valid for the
//! lifetime of the model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a mesh entity, ordered by dimension.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum MeshEntityType {
    Corner,
    Line,
    Surface,
    Region,
}

impl MeshEntityType {
    /// All mesh entity kinds in dimension order.
    pub const ALL: [MeshEntityType; 4] = [
        MeshEntityType::Corner,
        MeshEntityType::Line,
        MeshEntityType::Surface,
        MeshEntityType::Region,
    ];

    /// Topological dimension (0 for corners, 3 for regions).
    #[inline]
    pub fn dimension(self) -> usize {
        self as usize
    }

    /// Kind of the entities that bound this one, if any.
    pub fn boundary_type(self) -> Option<MeshEntityType> {
        match self {
            MeshEntityType::Corner => None,
            MeshEntityType::Line => Some(MeshEntityType::Corner),
            MeshEntityType::Surface => Some(MeshEntityType::Line),
            MeshEntityType::Region => Some(MeshEntityType::Surface),
        }
    }

    /// Kind of the entities this one can bound, if any.
    pub fn incident_type(self) -> Option<MeshEntityType> {
        match self {
            MeshEntityType::Corner => Some(MeshEntityType::Line),
            MeshEntityType::Line => Some(MeshEntityType::Surface),
            MeshEntityType::Surface => Some(MeshEntityType::Region),
            MeshEntityType::Region => None,
        }
    }

    /// Geological kind grouping entities of this kind.
    pub fn geological_type(self) -> Option<GeologicalEntityType> {
        match self {
            MeshEntityType::Corner => None,
            MeshEntityType::Line => Some(GeologicalEntityType::Contact),
            MeshEntityType::Surface => Some(GeologicalEntityType::Interface),
            MeshEntityType::Region => Some(GeologicalEntityType::Layer),
        }
    }

    /// Whether a finalized model requires entities of this kind to have boundaries.
    #[inline]
    pub fn requires_boundaries(self) -> bool {
        self.boundary_type().is_some()
    }
}

impl fmt::Display for MeshEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeshEntityType::Corner => "Corner",
            MeshEntityType::Line => "Line",
            MeshEntityType::Surface => "Surface",
            MeshEntityType::Region => "Region",
        };
        f.write_str(name)
    }
}

/// Kind of a geological entity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum GeologicalEntityType {
    /// Groups Lines.
    Contact,
    /// Groups Surfaces.
    Interface,
    /// Groups Regions.
    Layer,
}

impl GeologicalEntityType {
    /// All geological kinds, ordered like their child kinds.
    pub const ALL: [GeologicalEntityType; 3] = [
        GeologicalEntityType::Contact,
        GeologicalEntityType::Interface,
        GeologicalEntityType::Layer,
    ];

    /// Mesh kind of the children this geological kind accepts.
    pub fn child_type(self) -> MeshEntityType {
        match self {
            GeologicalEntityType::Contact => MeshEntityType::Line,
            GeologicalEntityType::Interface => MeshEntityType::Surface,
            GeologicalEntityType::Layer => MeshEntityType::Region,
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for GeologicalEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeologicalEntityType::Contact => "Contact",
            GeologicalEntityType::Interface => "Interface",
            GeologicalEntityType::Layer => "Layer",
        };
        f.write_str(name)
    }
}

/// Handle of a mesh entity: its kind plus its index within that kind.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MeshEntityId {
    pub kind: MeshEntityType,
    pub index: usize,
}

impl MeshEntityId {
    #[inline]
    pub const fn new(kind: MeshEntityType, index: usize) -> Self {
        Self { kind, index }
    }

    #[inline]
    pub const fn corner(index: usize) -> Self {
        Self::new(MeshEntityType::Corner, index)
    }

    #[inline]
    pub const fn line(index: usize) -> Self {
        Self::new(MeshEntityType::Line, index)
    }

    #[inline]
    pub const fn surface(index: usize) -> Self {
        Self::new(MeshEntityType::Surface, index)
    }

    #[inline]
    pub const fn region(index: usize) -> Self {
        Self::new(MeshEntityType::Region, index)
    }
}

impl fmt::Display for MeshEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}

/// Handle of a geological entity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GeologicalEntityId {
    pub kind: GeologicalEntityType,
    pub index: usize,
}

impl GeologicalEntityId {
    #[inline]
    pub const fn new(kind: GeologicalEntityType, index: usize) -> Self {
        Self { kind, index }
    }

    #[inline]
    pub const fn contact(index: usize) -> Self {
        Self::new(GeologicalEntityType::Contact, index)
    }

    #[inline]
    pub const fn interface(index: usize) -> Self {
        Self::new(GeologicalEntityType::Interface, index)
    }

    #[inline]
    pub const fn layer(index: usize) -> Self {
        Self::new(GeologicalEntityType::Layer, index)
    }
}

impl fmt::Display for GeologicalEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.index)
    }
}
