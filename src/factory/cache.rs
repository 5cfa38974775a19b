//! The operation cache (spec §4.3): a memoisation map from
//! `(op_tag, a, b, p)` to a result node, tolerant of the nodes it references
//! later dying and being revived.
//!
//! The cache is owned by [`crate::factory::Factory`] and is not itself
//! generic over the value domain `V` — its keys are [`NodeId`]s scoped to
//! whichever factory owns it, plus an optional [`Projection`] scoped to a
//! *different* factory (projections are always `usize`-valued, spec §4.5).
//! `Factory` is responsible for bumping/dropping the held references on
//! `a`/`b`/`result` on store/clear; the `Projection` component carries its
//! own reference-counting via its `Clone`/`Drop` impls (see
//! [`crate::ops::projection`]), so the cache simply keeps a clone of it
//! alive for as long as the entry is cached.
//!
//! The "clear bit" staleness sketch of spec §4.3 (a key that compares equal
//! to any key agreeing on the remaining fields, used for targeted eviction)
//! is named as an optional enhancement there; this engine omits it, relying
//! instead on the blanket `clear_cache()` spec §4.3 already requires.

use std::collections::HashMap;

use crate::node::NodeId;
use crate::ops::projection::Projection;

/// The fixed enumeration of cacheable operations (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum OpTag {
    SetUnion,
    SetMinus,
    SetIntersection,
    RelCompositionII,
    RelCompositionIS,
    RelRelabel,
    RelNext,
    RelPrev,
    SetProject,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    op: OpTag,
    a: NodeId,
    b: NodeId,
    proj: Option<Projection>,
}

/// Memoisation table plus lifetime hit/miss counters.
///
/// `lookup`/`store` are intentionally `pub(crate)`: callers outside this
/// crate only ever see the effect of caching (determinism, hit counters)
/// through [`crate::factory::Factory::cache_hits`] /
/// [`crate::factory::Factory::cache_misses`], never the cache directly.
#[derive(Default)]
pub(crate) struct OperationCache {
    table: HashMap<CacheKey, NodeId>,
    hits: u64,
    misses: u64,
}

impl OperationCache {
    pub fn get(&self, op: OpTag, a: NodeId, b: NodeId, proj: Option<&Projection>) -> Option<NodeId> {
        self.table
            .get(&CacheKey {
                op,
                a,
                b,
                proj: proj.cloned(),
            })
            .copied()
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn insert(&mut self, op: OpTag, a: NodeId, b: NodeId, proj: Option<Projection>, result: NodeId) {
        self.table.insert(CacheKey { op, a, b, proj }, result);
    }

    /// Drains every entry, handing `(a, b, proj, result)` back to the caller
    /// so it can drop the held references on the owning factory (and, for
    /// `proj`, on the projection's own factory via its `Drop` impl).
    pub fn drain(&mut self) -> Vec<(NodeId, NodeId, Option<Projection>, NodeId)> {
        self.table
            .drain()
            .map(|(k, v)| (k.a, k.b, k.proj, v))
            .collect()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
