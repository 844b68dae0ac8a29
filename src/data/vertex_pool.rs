//! Global vertex pool: deduplicated 3D positions shared by all mesh entities.
//!
//! Every local vertex of every mesh entity is bound to a pool id. Two local
//! vertices whose positions coincide (bitwise with a zero tolerance, within
//! `tolerance` otherwise) share the same pool id, which is how corners, line
//! endpoints and surface vertices recognise each other geometrically.
//!
//! Pool ids are dense (`0..len`) and stable while the model is built: a
//! position is never moved or renumbered once registered. Finalizing drops
//! the positions no local vertex is bound to any more and renumbers the rest
//! in order. The pool also keeps the inverse map from pool id to the
//! `(entity, local vertex)` pairs bound to it.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::data::Vec3;
use crate::topology::entity::{MeshEntityId, MeshEntityType};

/// Default distance under which two positions are the same vertex.
pub const DEFAULT_VERTEX_TOLERANCE: f64 = 1e-8;

/// One local vertex of one mesh entity bound to a pool id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexIncidence {
    pub entity: MeshEntityId,
    pub local: usize,
}

/// Deduplicated position registry with an incidence index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VertexPool {
    tolerance: f64,
    positions: Vec<Vec3>,
    #[serde(skip)]
    incidences: Vec<Vec<VertexIncidence>>,
    #[serde(skip)]
    buckets: HashMap<[i64; 3], Vec<usize>>,
}

impl Default for VertexPool {
    fn default() -> Self {
        Self::new(DEFAULT_VERTEX_TOLERANCE)
    }
}

impl VertexPool {
    /// Creates an empty pool. A non-positive tolerance selects exact matching.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: if tolerance > 0.0 { tolerance } else { 0.0 },
            positions: Vec::new(),
            incidences: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    /// Matching tolerance (`0.0` means exact).
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Number of distinct positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of pool id `id`.
    #[inline]
    pub fn position(&self, id: usize) -> Option<&Vec3> {
        self.positions.get(id)
    }

    /// All positions, indexed by pool id.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Pool id of `p`, if a matching position is registered.
    ///
    /// With a tolerance, the lowest matching id wins so the answer does not
    /// depend on hash iteration order.
    pub fn find(&self, p: &Vec3) -> Option<usize> {
        let p = normalize(p);
        if self.tolerance == 0.0 {
            return self
                .buckets
                .get(&exact_key(&p))?
                .iter()
                .copied()
                .find(|&id| self.positions[id] == p);
        }
        let base = self.grid_key(&p);
        let tol2 = self.tolerance * self.tolerance;
        let mut best: Option<usize> = None;
        for dx in -1..=1i64 {
            for dy in -1..=1i64 {
                for dz in -1..=1i64 {
                    let key = [
                        base[0].saturating_add(dx),
                        base[1].saturating_add(dy),
                        base[2].saturating_add(dz),
                    ];
                    let Some(ids) = self.buckets.get(&key) else {
                        continue;
                    };
                    for &id in ids {
                        if distance2(&self.positions[id], &p) <= tol2
                            && best.is_none_or(|b| id < b)
                        {
                            best = Some(id);
                        }
                    }
                }
            }
        }
        best
    }

    /// Returns the pool id of `p`, registering it if new.
    pub fn insert(&mut self, p: &Vec3) -> usize {
        if let Some(id) = self.find(p) {
            return id;
        }
        let p = normalize(p);
        let id = self.positions.len();
        let key = self.key(&p);
        self.positions.push(p);
        self.incidences.push(Vec::new());
        self.buckets.entry(key).or_default().push(id);
        id
    }

    /// Registers all `vertices` of `entity` and returns their pool ids.
    pub(crate) fn bind_entity(&mut self, entity: MeshEntityId, vertices: &[Vec3]) -> Vec<usize> {
        let mut ids = Vec::with_capacity(vertices.len());
        for (local, p) in vertices.iter().enumerate() {
            let id = self.insert(p);
            self.incidences[id].push(VertexIncidence { entity, local });
            ids.push(id);
        }
        ids
    }

    /// Forgets the incidences of `entity` previously bound at `ids`.
    ///
    /// Positions stay registered so existing pool ids remain valid.
    pub(crate) fn unbind_entity(&mut self, entity: MeshEntityId, ids: &[usize]) {
        for &id in ids {
            if let Some(list) = self.incidences.get_mut(id) {
                list.retain(|inc| inc.entity != entity);
            }
        }
    }

    /// Local vertices bound to pool id `id`.
    #[inline]
    pub fn incidences(&self, id: usize) -> &[VertexIncidence] {
        self.incidences.get(id).map_or(&[], Vec::as_slice)
    }

    /// Indices of the entities of `kind` having a vertex at pool id `id`,
    /// sorted ascending without duplicates.
    pub fn incident_entities(&self, id: usize, kind: MeshEntityType) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .incidences(id)
            .iter()
            .filter(|inc| inc.entity.kind == kind)
            .map(|inc| inc.entity.index)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Drops positions that no local vertex is bound to.
    ///
    /// Returns the old-to-new id map (`None` for dropped ids), or `None` when
    /// every position is still in use and nothing moved.
    pub(crate) fn compact(&mut self) -> Option<Vec<Option<usize>>> {
        if self.incidences.iter().all(|list| !list.is_empty()) {
            return None;
        }
        let mut remap = vec![None; self.positions.len()];
        let mut positions = Vec::with_capacity(self.positions.len());
        let mut incidences = Vec::with_capacity(self.positions.len());
        let old = self.positions.iter().zip(std::mem::take(&mut self.incidences));
        for (id, (p, list)) in old.enumerate() {
            if list.is_empty() {
                continue;
            }
            remap[id] = Some(positions.len());
            positions.push(*p);
            incidences.push(list);
        }
        self.positions = positions;
        self.incidences = incidences;
        self.rebuild_buckets();
        Some(remap)
    }

    /// Rebuilds the lookup buckets and the incidence index after loading.
    pub(crate) fn rebuild_indices<'a, I>(&mut self, entities: I)
    where
        I: IntoIterator<Item = (MeshEntityId, &'a [usize])>,
    {
        self.rebuild_buckets();
        self.incidences = vec![Vec::new(); self.positions.len()];
        for (entity, ids) in entities {
            for (local, &id) in ids.iter().enumerate() {
                if let Some(list) = self.incidences.get_mut(id) {
                    list.push(VertexIncidence { entity, local });
                }
            }
        }
    }

    fn rebuild_buckets(&mut self) {
        self.buckets.clear();
        for id in 0..self.positions.len() {
            let key = self.key(&self.positions[id]);
            self.buckets.entry(key).or_default().push(id);
        }
    }

    fn key(&self, p: &Vec3) -> [i64; 3] {
        if self.tolerance == 0.0 {
            exact_key(p)
        } else {
            self.grid_key(p)
        }
    }

    fn grid_key(&self, p: &Vec3) -> [i64; 3] {
        // `as` saturates for coordinates far outside the grid range.
        [
            (p[0] / self.tolerance).floor() as i64,
            (p[1] / self.tolerance).floor() as i64,
            (p[2] / self.tolerance).floor() as i64,
        ]
    }
}

/// Maps `-0.0` to `0.0` so both land in the same bucket.
#[inline]
fn normalize(p: &Vec3) -> Vec3 {
    [p[0] + 0.0, p[1] + 0.0, p[2] + 0.0]
}

#[inline]
fn exact_key(p: &Vec3) -> [i64; 3] {
    [
        p[0].to_bits() as i64,
        p[1].to_bits() as i64,
        p[2].to_bits() as i64,
    ]
}

#[inline]
fn distance2(a: &Vec3, b: &Vec3) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    d[0] * d[0] + d[1] * d[1] + d[2] * d[2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn coincident_vertices_share_an_id() {
        let mut pool = VertexPool::new(0.0);
        let a = pool.bind_entity(MeshEntityId::corner(0), &[[1.0, 2.0, 3.0]]);
        let b = pool.bind_entity(
            MeshEntityId::line(0),
            &[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]],
        );
        assert_eq!(a, vec![0]);
        assert_eq!(b, vec![1, 0]);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.incident_entities(0, MeshEntityType::Line), vec![0]);
        assert_eq!(pool.incident_entities(0, MeshEntityType::Corner), vec![0]);
    }

    #[test]
    fn negative_zero_matches_zero() {
        let mut pool = VertexPool::new(0.0);
        let a = pool.insert(&[0.0, 0.0, 0.0]);
        let b = pool.insert(&[-0.0, 0.0, -0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn tolerance_merges_close_points_only() {
        let mut pool = VertexPool::new(1e-6);
        let a = pool.insert(&[0.1 + 0.2, 0.0, 0.0]);
        let b = pool.insert(&[0.3, 0.0, 0.0]);
        let c = pool.insert(&[0.3 + 1e-3, 0.0, 0.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut exact = VertexPool::new(0.0);
        let a = exact.insert(&[0.1 + 0.2, 0.0, 0.0]);
        let b = exact.insert(&[0.3, 0.0, 0.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn tolerance_matches_across_bucket_boundaries() {
        let mut pool = VertexPool::new(1e-3);
        let a = pool.insert(&[0.9999e-3, 0.0, 0.0]);
        let b = pool.insert(&[1.0001e-3, 0.0, 0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn unbind_keeps_ids_stable() {
        let mut pool = VertexPool::new(0.0);
        let line = MeshEntityId::line(2);
        let ids = pool.bind_entity(line, &[[0.0; 3], [1.0, 0.0, 0.0]]);
        pool.unbind_entity(line, &ids);
        assert!(pool.incidences(ids[0]).is_empty());
        assert_eq!(pool.find(&[1.0, 0.0, 0.0]), Some(ids[1]));
        assert_eq!(pool.insert(&[2.0, 0.0, 0.0]), 2);
    }

    #[test]
    fn compact_drops_unbound_positions_in_order() {
        let mut pool = VertexPool::new(0.0);
        let corner = MeshEntityId::corner(0);
        let line = MeshEntityId::line(0);
        let old = pool.bind_entity(corner, &[[0.0; 3]]);
        pool.bind_entity(line, &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        pool.unbind_entity(corner, &old);
        pool.bind_entity(corner, &[[3.0, 0.0, 0.0]]);

        let remap = pool.compact().unwrap();
        assert_eq!(remap, vec![None, Some(0), Some(1), Some(2)]);
        assert_eq!(
            pool.positions(),
            &[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]]
        );
        assert_eq!(pool.find(&[0.0; 3]), None);
        assert_eq!(pool.find(&[3.0, 0.0, 0.0]), Some(2));
        assert_eq!(pool.incident_entities(2, MeshEntityType::Corner), vec![0]);
        assert_eq!(pool.compact(), None);
    }

    #[test]
    fn rebuild_restores_lookup_and_incidences() {
        let mut pool = VertexPool::new(0.0);
        let corner = MeshEntityId::corner(0);
        let ids = pool.bind_entity(corner, &[[4.0, 5.0, 6.0]]);
        let json = serde_json::to_string(&pool).unwrap();
        let mut loaded: VertexPool = serde_json::from_str(&json).unwrap();
        loaded.rebuild_indices([(corner, ids.as_slice())]);
        assert_eq!(loaded.find(&[4.0, 5.0, 6.0]), Some(0));
        assert_eq!(loaded.incidences(0), pool.incidences(0));
    }

    proptest! {
        #[test]
        fn distinct_grid_points_never_collapse(
            coords in proptest::collection::vec((0i32..20, 0i32..20, 0i32..20), 1..60)
        ) {
            let mut pool = VertexPool::new(DEFAULT_VERTEX_TOLERANCE);
            let mut seen = std::collections::HashMap::new();
            for (x, y, z) in coords {
                let p = [x as f64 * 0.1, y as f64 * 0.1, z as f64 * 0.1];
                let id = pool.insert(&p);
                let expected = *seen.entry((x, y, z)).or_insert(id);
                prop_assert_eq!(id, expected);
            }
            prop_assert_eq!(pool.len(), seen.len());
        }
    }
}
