//! The node arena and unique table (spec §3.3, §4.1–§4.3).
//!
//! A [`Factory<V>`] owns every interior node for one family of diagrams.
//! Nodes are hash-consed on `(value, right, down)`: two requests for the
//! same triple always yield the same [`NodeId`], which is what makes
//! equality of diagrams a pointer (id) comparison. A node whose refcount
//! drops to zero is not immediately destroyed — it is left in the unique
//! table so that an identical `create` request before the next
//! [`Factory::clean`] can *revive* it instead of re-allocating (spec §3.3,
//! §4.1; resolution of the two inconsistent readings in the original source
//! is recorded in `SPEC_FULL.md` §D).

mod cache;

use std::collections::HashMap;

use tracing::trace;

use crate::error::{MddError, Result};
use crate::node::{NodeData, NodeId, TRUE};
use crate::ops::projection::Projection;

pub(crate) use cache::OpTag;
use cache::OperationCache;

/// Owner of one family of hash-consed nodes over value domain `V`.
///
/// `V` must be `Clone + Eq + Hash` to serve as a unique-table key component;
/// the set/relation/projection algorithms in [`crate::ops`] additionally
/// require `Ord` for the right-chain ordering invariant (spec §3.2).
pub struct Factory<V> {
    nodes: Vec<NodeData<V>>,
    unique: HashMap<(V, NodeId, NodeId), NodeId>,
    free: Vec<NodeId>,
    cache: OperationCache,
    count_memo: HashMap<NodeId, f64>,
}

impl<V> Default for Factory<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn default() -> Self {
        Factory::new()
    }
}

impl<V> Factory<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    pub fn new() -> Self {
        Factory {
            nodes: Vec::new(),
            unique: HashMap::new(),
            free: Vec::new(),
            cache: OperationCache::default(),
            count_memo: HashMap::new(),
        }
    }

    fn slot(&self, id: NodeId) -> &NodeData<V> {
        debug_assert!(!id.is_sentinel(), "sentinels carry no node data");
        &self.nodes[(id.index() - 2) as usize]
    }

    fn slot_mut(&mut self, id: NodeId) -> &mut NodeData<V> {
        debug_assert!(!id.is_sentinel(), "sentinels carry no node data");
        &mut self.nodes[(id.index() - 2) as usize]
    }

    pub(crate) fn value(&self, id: NodeId) -> &V {
        &self.slot(id).value
    }

    pub(crate) fn right_of(&self, id: NodeId) -> NodeId {
        self.slot(id).right
    }

    pub(crate) fn down_of(&self, id: NodeId) -> NodeId {
        self.slot(id).down
    }

    /// Current refcount; sentinels report `u32::MAX` (they are never
    /// created, used, or collected).
    pub fn refcount(&self, id: NodeId) -> u32 {
        if id.is_sentinel() {
            u32::MAX
        } else {
            self.slot(id).refcount
        }
    }

    fn alloc(&mut self, value: V, right: NodeId, down: NodeId) -> NodeId {
        if let Some(id) = self.free.pop() {
            *self.slot_mut(id) = NodeData::new(value, right, down);
            id
        } else {
            let id = NodeId(self.nodes.len() as u32 + 2);
            self.nodes.push(NodeData::new(value, right, down));
            id
        }
    }

    /// Hash-cons `(value, right, down)`: returns the existing node if the
    /// triple is already present (reviving it if its refcount had reached
    /// zero), otherwise allocates a fresh one.
    ///
    /// Takes ownership of the caller's references on `right` and `down` —
    /// see `SPEC_FULL.md` §D for why this holds uniformly across the
    /// fresh-insert, revival, and already-live branches.
    pub(crate) fn create(&mut self, value: V, right: NodeId, down: NodeId) -> NodeId {
        let key = (value.clone(), right, down);
        if let Some(&existing) = self.unique.get(&key) {
            let refcount = self.slot(existing).refcount;
            if refcount > 0 {
                self.slot_mut(existing).refcount += 1;
                self.unuse(right);
                self.unuse(down);
            } else {
                self.slot_mut(existing).refcount = 1;
                trace!(node = %existing, "revived");
            }
            existing
        } else {
            let id = self.alloc(value, right, down);
            self.unique.insert(key, id);
            trace!(node = %id, "created");
            id
        }
    }

    /// Bumps `id`'s refcount by one and returns it, mirroring the original
    /// source's `use()` returning its argument so callers can chain it.
    pub fn use_ref(&mut self, id: NodeId) -> NodeId {
        if !id.is_sentinel() {
            let slot = self.slot_mut(id);
            debug_assert!(slot.refcount > 0, "use_ref on a zero-count node");
            slot.refcount += 1;
        }
        id
    }

    /// Drops one reference to `id`; at zero, recursively drops the
    /// references `id` held on its own `right`/`down` children (spec §3.3).
    /// The node itself is left in the unique table for possible revival
    /// until the next [`Factory::clean`].
    pub fn unuse(&mut self, id: NodeId) {
        if id.is_sentinel() {
            return;
        }
        let slot = self.slot_mut(id);
        debug_assert!(slot.refcount > 0, "refcount underflow");
        slot.refcount -= 1;
        if slot.refcount == 0 {
            let (right, down) = (slot.right, slot.down);
            self.unuse(right);
            self.unuse(down);
        }
    }

    /// Number of distinct triples in the unique table, counting zero-count
    /// (not-yet-swept) nodes (spec §4.2).
    pub fn size(&self) -> usize {
        self.unique.len()
    }

    /// Sweeps every zero-refcount node out of the unique table, freeing its
    /// arena slot for reuse and invalidating the `count` memo (slots may be
    /// recycled for a structurally different node afterwards). Operation
    /// cache entries hold references on everything they mention, so no live
    /// cache entry can point at anything `clean` removes.
    pub fn clean(&mut self) {
        let dead: Vec<(V, NodeId, NodeId)> = self
            .unique
            .iter()
            .filter(|(_, &id)| self.slot(id).refcount == 0)
            .map(|(key, _)| key.clone())
            .collect();
        for key in dead {
            if let Some(id) = self.unique.remove(&key) {
                self.free.push(id);
            }
        }
        self.count_memo.clear();
    }

    /// Lifetime operation-cache hit count (spec §4.3).
    pub fn cache_hits(&self) -> u64 {
        self.cache.hits()
    }

    /// Lifetime operation-cache miss count (spec §4.3).
    pub fn cache_misses(&self) -> u64 {
        self.cache.misses()
    }

    /// Looks up a memoised result for `(op, a, b, proj)`, bumping its
    /// refcount on a hit (the caller takes ownership of that reference, the
    /// cache keeps its own).
    pub(crate) fn cache_lookup(
        &mut self,
        op: OpTag,
        a: NodeId,
        b: NodeId,
        proj: Option<&Projection>,
    ) -> Option<NodeId> {
        match self.cache.get(op, a, b, proj) {
            Some(result) => {
                self.cache.record_hit();
                Some(self.use_ref(result))
            }
            None => {
                self.cache.record_miss();
                None
            }
        }
    }

    /// Stores `result` for `(op, a, b, proj)`, taking out the cache's own
    /// references on `a`, `b`, and `result` (`proj`'s reference lives in its
    /// own `Clone`).
    pub(crate) fn cache_store(
        &mut self,
        op: OpTag,
        a: NodeId,
        b: NodeId,
        proj: Option<Projection>,
        result: NodeId,
    ) {
        let a = self.use_ref(a);
        let b = self.use_ref(b);
        let result = self.use_ref(result);
        self.cache.insert(op, a, b, proj, result);
    }

    /// Empties the operation cache, dropping every reference it held.
    pub fn clear_cache(&mut self) {
        for (a, b, _proj, result) in self.cache.drain() {
            self.unuse(a);
            self.unuse(b);
            self.unuse(result);
        }
    }

    pub(crate) fn count_memo_get(&self, id: NodeId) -> Option<f64> {
        self.count_memo.get(&id).copied()
    }

    pub(crate) fn count_memo_put(&mut self, id: NodeId, value: f64) {
        self.count_memo.insert(id, value);
    }

    /// Number of nodes reachable from `id` (including `id` itself, excluding
    /// the sentinels), each counted once however many parents it has — a
    /// structural-sharing diagnostic distinct from [`crate::ops::set_ops::count`]
    /// (spec.md `set_count.h` counts both nodes and paths; this engine keeps
    /// only the node count, the path count being exactly `count`).
    pub fn node_count_reachable(&self, id: NodeId) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if cur.is_sentinel() || !seen.insert(cur) {
                continue;
            }
            stack.push(self.right_of(cur));
            stack.push(self.down_of(cur));
        }
        seen.len()
    }

    /// Plain textual dump of every live node, for debugging (grounded on
    /// the original source's `print_nodes`; no graphviz/dot output, which
    /// stays out of scope per `SPEC_FULL.md` §C).
    pub fn dump(&self) -> String
    where
        V: std::fmt::Display,
    {
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.refcount == 0 {
                continue;
            }
            let id = NodeId(i as u32 + 2);
            out.push_str(&format!(
                "{id}: value={} right={} down={} refcount={}\n",
                node.value, node.right, node.down, node.refcount
            ));
        }
        out
    }
}

/// Checks that `other` was produced by `self` before an operation combines
/// them; used by the wrapper layer (spec §5, §7) since [`NodeId`] alone
/// carries no factory identity.
pub(crate) fn require_same_factory<V>(lhs: &Factory<V>, rhs: &Factory<V>) -> Result<()> {
    if std::ptr::eq(lhs, rhs) {
        Ok(())
    } else {
        Err(MddError::ForeignFactory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_hash_conses_identical_triples() {
        let mut f: Factory<u32> = Factory::new();
        let a = f.create(1, TRUE, TRUE);
        let b = f.create(1, TRUE, TRUE);
        assert_eq!(a, b);
        assert_eq!(f.refcount(a), 2);
    }

    #[test]
    fn unuse_recurses_into_children() {
        let mut f: Factory<u32> = Factory::new();
        let child = f.create(2, TRUE, TRUE);
        let parent = f.create(1, TRUE, child);
        assert_eq!(f.refcount(child), 1);
        f.unuse(parent);
        assert_eq!(f.refcount(child), 0);
    }

    #[test]
    fn revival_reuses_the_same_id() {
        let mut f: Factory<u32> = Factory::new();
        let n = f.create(5, TRUE, TRUE);
        f.unuse(n);
        assert_eq!(f.refcount(n), 0);
        let r = f.use_ref(TRUE);
        let d = f.use_ref(TRUE);
        let revived = f.create(5, r, d);
        assert_eq!(revived, n);
        assert_eq!(f.refcount(n), 1);
    }

    #[test]
    fn clean_frees_only_zero_count_nodes() {
        let mut f: Factory<u32> = Factory::new();
        let kept = f.create(1, TRUE, TRUE);
        let doomed = f.create(2, TRUE, TRUE);
        f.unuse(doomed);
        assert_eq!(f.size(), 2);
        f.clean();
        assert_eq!(f.size(), 1);
        assert_eq!(f.refcount(kept), 1);
    }

    #[test]
    fn size_counts_zero_refcount_nodes_until_swept() {
        let mut f: Factory<u32> = Factory::new();
        let n = f.create(1, TRUE, TRUE);
        f.unuse(n);
        assert_eq!(f.size(), 1);
    }
}
