//! Polygonal facets of a Surface in compressed-sparse-row form.
//!
//! * `facet_offsets[k] .. facet_offsets[k+1]` = run of facet `k` in `facet_indices`
//! * `facet_indices` = concatenated local vertex indices
//!
//! `facet_offsets` always starts at 0, is non-decreasing and ends at
//! `facet_indices.len()`.

use serde::{Deserialize, Serialize};

use crate::data::check_csr_offsets;
use crate::model_error::GeoModelError;
use crate::topology::entity::MeshEntityId;

/// CSR polygon connectivity over a Surface's local vertices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetMesh {
    facet_indices: Vec<usize>,
    facet_offsets: Vec<usize>,
}

impl Default for FacetMesh {
    fn default() -> Self {
        Self {
            facet_indices: Vec::new(),
            facet_offsets: vec![0],
        }
    }
}

impl FacetMesh {
    /// Validates a CSR facet layout against `nb_vertices` local vertices.
    pub fn try_new(
        entity: MeshEntityId,
        facet_indices: Vec<usize>,
        facet_offsets: Vec<usize>,
        nb_vertices: usize,
    ) -> Result<Self, GeoModelError> {
        let mesh = Self {
            facet_indices,
            facet_offsets,
        };
        mesh.check_layout()
            .map_err(|reason| GeoModelError::InvalidGeometry { entity, reason })?;
        if let Some(&index) = mesh.facet_indices.iter().find(|&&i| i >= nb_vertices) {
            return Err(GeoModelError::LocalVertexOutOfRange {
                entity,
                index,
                count: nb_vertices,
            });
        }
        Ok(mesh)
    }

    /// Checks the CSR shape: offsets cover `facet_indices` exactly and every
    /// facet has at least three vertices.
    pub(crate) fn check_layout(&self) -> Result<(), String> {
        check_csr_offsets(&self.facet_offsets, self.facet_indices.len())
            .map_err(|reason| format!("facet {reason}"))?;
        match self.facets().position(|facet| facet.len() < 3) {
            Some(k) => Err(format!("facet {k} has fewer than 3 vertices")),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn nb_facets(&self) -> usize {
        self.facet_offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nb_facets() == 0
    }

    /// Local vertices of facet `k`.
    pub fn facet(&self, k: usize) -> Option<&[usize]> {
        let start = *self.facet_offsets.get(k)?;
        let end = *self.facet_offsets.get(k + 1)?;
        self.facet_indices.get(start..end)
    }

    /// Iterates facets in order.
    pub fn facets(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.facet_offsets
            .windows(2)
            .map(move |w| &self.facet_indices[w[0]..w[1]])
    }

    /// Iterates every facet edge as a pair of local vertices, in facet order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.facets().flat_map(|facet| {
            let n = facet.len();
            (0..n).map(move |i| (facet[i], facet[(i + 1) % n]))
        })
    }

    #[inline]
    pub fn facet_indices(&self) -> &[usize] {
        &self.facet_indices
    }

    #[inline]
    pub fn facet_offsets(&self) -> &[usize] {
        &self.facet_offsets
    }

    /// Largest local vertex index referenced, if any facet exists.
    pub fn max_vertex_index(&self) -> Option<usize> {
        self.facet_indices.iter().copied().max()
    }
}
