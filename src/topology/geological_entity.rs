//! Geological entities: named groupings of mesh entities of one tier.

use serde::{Deserialize, Serialize};

use crate::topology::entity::{GeologicalEntityId, GeologicalEntityType, MeshEntityId};

/// Geological meaning attached to a geological entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeologicalFeature {
    #[default]
    Unspecified,
    /// Stratigraphic horizon or unit.
    Stratigraphy,
    /// Fault surface or fault block boundary.
    Fault,
    /// Outer limit of the volume of interest.
    VolumeOfInterest,
}

/// A Contact, Interface or Layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeologicalEntity {
    id: GeologicalEntityId,
    name: Option<String>,
    feature: GeologicalFeature,
    children: Vec<usize>,
}

impl GeologicalEntity {
    pub(crate) fn new(id: GeologicalEntityId) -> Self {
        Self {
            id,
            name: None,
            feature: GeologicalFeature::default(),
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> GeologicalEntityId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> GeologicalEntityType {
        self.id.kind
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn feature(&self) -> GeologicalFeature {
        self.feature
    }

    #[inline]
    pub fn nb_children(&self) -> usize {
        self.children.len()
    }

    /// Handle of the `i`-th child.
    pub fn child(&self, i: usize) -> Option<MeshEntityId> {
        let index = *self.children.get(i)?;
        Some(MeshEntityId::new(self.kind().child_type(), index))
    }

    /// Handles of all children.
    pub fn children(&self) -> impl Iterator<Item = MeshEntityId> + '_ {
        let kind = self.kind().child_type();
        self.children.iter().map(move |&i| MeshEntityId::new(kind, i))
    }

    pub(crate) fn child_indices(&self) -> &[usize] {
        &self.children
    }

    pub(crate) fn child_indices_mut(&mut self) -> &mut Vec<usize> {
        &mut self.children
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_feature(&mut self, feature: GeologicalFeature) {
        self.feature = feature;
    }
}
