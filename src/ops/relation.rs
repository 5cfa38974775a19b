//! Relation operations (spec §4.7): composition, transitive closure, image
//! and pre-image, over interleaved relations (level pairs `x_0, y_0, x_1,
//! y_1, ...`) and sequential relations (`y_0, ..., y_{k-1}, z_0, ...,
//! z_{k-1}`).
//!
//! `compose_ii` and the `next`/`prev` image operations are relational joins
//! existentially quantifying out the shared dimension; they are written as
//! one matching pass per level-pair rather than full path enumeration, so
//! their cost tracks the number of matching branches rather than the
//! number of distinct vectors. `compose_is` composes an interleaved
//! relation against a sequential one; because the two operands disagree on
//! traversal order (interleaved alternates source/target per index,
//! sequential groups all of one side first) there is no way to walk both
//! level-by-level in lockstep, so it is built instead by enumerating the
//! interleaved operand's distinct `(x, y)` paths (spec §4.9's iterator) and
//! rejoining each against the sequential operand's matching continuation —
//! correct, but its cost is proportional to the number of distinct paths in
//! the interleaved operand rather than to shared structure. This trade-off
//! is recorded in `DESIGN.md`.

use crate::factory::{Factory, OpTag};
use crate::iter::MddIterator;
use crate::node::{NodeId, FALSE, TRUE};
use crate::ops::projection::Projection;

impl<V> Factory<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    fn collect_chain(&self, mut node: NodeId) -> Vec<(V, NodeId)> {
        let mut entries = Vec::new();
        while node != FALSE {
            entries.push((self.value(node).clone(), self.down_of(node)));
            node = self.right_of(node);
        }
        entries
    }

    /// `r ; s`: the interleaved relation `{(x, z) : exists y, (x, y) in r
    /// and (y, z) in s}`, itself interleaved over `(x, z)` (spec §4.7.1).
    pub fn compose_ii(&mut self, r: NodeId, s: NodeId) -> NodeId {
        if r == FALSE || s == FALSE {
            return FALSE;
        }
        if r == TRUE {
            return self.use_ref(s);
        }
        if let Some(hit) = self.cache_lookup(OpTag::RelCompositionII, r, s, None) {
            return hit;
        }
        let x_branches = self.collect_chain(r);
        let mut result = FALSE;
        for (xv, y_chain_r) in x_branches.into_iter().rev() {
            let z_node = self.join_on_shared(y_chain_r, s, Self::compose_ii);
            if z_node == FALSE {
                continue;
            }
            result = self.create(xv, result, z_node);
        }
        self.cache_store(OpTag::RelCompositionII, r, s, None, result);
        result
    }

    /// Matches `lhs_chain`'s branch values against `rhs_chain`'s (the
    /// shared existentially-quantified dimension), and for each match
    /// rebuilds the chain exposed one level below the match (via
    /// [`Factory::transform_chain`]), replacing its `down` fields with
    /// `continue_with(lhs_next, ...)`. Used where that next-level chain is
    /// itself part of the result: `compose_ii`'s `z` and `next`'s `y`, both
    /// exposed at the same join step as the matched dimension. `prev` has no
    /// such chain here (its next state is one full pair-index deeper) and
    /// uses [`Factory::join_and_accumulate`] instead.
    fn join_on_shared(
        &mut self,
        lhs_chain: NodeId,
        rhs_chain: NodeId,
        continue_with: fn(&mut Self, NodeId, NodeId) -> NodeId,
    ) -> NodeId {
        let lhs_entries = self.collect_chain(lhs_chain);
        let mut merged = FALSE;
        let mut cur = rhs_chain;
        while cur != FALSE {
            let shared_value = self.value(cur).clone();
            if let Some(&(_, lhs_next)) = lhs_entries.iter().find(|(v, _)| *v == shared_value) {
                let rhs_next_chain = self.down_of(cur);
                let transformed = self.transform_chain(rhs_next_chain, lhs_next, continue_with);
                let next_merged = self.union(merged, transformed);
                self.unuse(merged);
                self.unuse(transformed);
                merged = next_merged;
            }
            cur = self.right_of(cur);
        }
        merged
    }

    /// Rebuilds `chain` (a value chain whose `down` fields are states to
    /// continue from) replacing each `down` with
    /// `continue_with(self, lhs_next, down)`, dropping branches that
    /// collapse to `FALSE`.
    fn transform_chain(
        &mut self,
        chain: NodeId,
        lhs_next: NodeId,
        continue_with: fn(&mut Self, NodeId, NodeId) -> NodeId,
    ) -> NodeId {
        if chain == FALSE {
            return FALSE;
        }
        let value = self.value(chain).clone();
        let next_state = self.down_of(chain);
        let new_down = continue_with(self, lhs_next, next_state);
        let new_right = self.transform_chain(self.right_of(chain), lhs_next, continue_with);
        if new_down == FALSE {
            new_right
        } else {
            self.create(value, new_right, new_down)
        }
    }

    /// Composes interleaved relation `r` (`width` pairs) with sequential
    /// relation `s` (`y_0..y_{width-1}, z_0..z_{width-1}`), producing the
    /// sequential relation `{(x, z) : exists y, (x, y) in r and (y, z) in
    /// s}` over `x_0..x_{width-1}, z_0..z_{width-1}`.
    pub fn compose_is(&mut self, r: NodeId, s: NodeId, width: usize) -> NodeId {
        if r == FALSE || s == FALSE {
            return FALSE;
        }
        let mut result = FALSE;
        for vector in MddIterator::new(self, r) {
            let mut x_tuple = Vec::with_capacity(width);
            let mut y_tuple = Vec::with_capacity(width);
            for (i, value) in vector.into_iter().enumerate() {
                if i % 2 == 0 {
                    x_tuple.push(value);
                } else {
                    y_tuple.push(value);
                }
            }
            let z_node = self.descend_sequential(s, &y_tuple);
            if z_node == FALSE {
                continue;
            }
            let mut path = z_node;
            for xv in x_tuple.into_iter().rev() {
                path = self.create(xv, FALSE, path);
            }
            let merged = self.union(result, path);
            self.unuse(result);
            self.unuse(path);
            result = merged;
        }
        result
    }

    /// Composes `r` with `s` as [`Factory::compose_is`], then existentially
    /// restricts the result to the levels selected by `proj` (spec §4.7.1's
    /// projected variant).
    pub fn compose_is_projected(&mut self, r: NodeId, s: NodeId, width: usize, proj: &Projection) -> NodeId {
        let full = self.compose_is(r, s, width);
        let result = self.project(full, proj);
        self.unuse(full);
        result
    }

    /// Walks `node` consuming one level of `prefix` at a time (as
    /// [`Factory::contains`] does for a boolean answer), returning the
    /// continuation subdiagram reached, or `FALSE` if `prefix` has no
    /// matching path.
    fn descend_sequential(&mut self, node: NodeId, prefix: &[V]) -> NodeId {
        let mut cur = node;
        for v in prefix {
            loop {
                if cur == FALSE {
                    return FALSE;
                }
                let cv = self.value(cur);
                if cv == v {
                    break;
                } else if cv > v {
                    return FALSE;
                }
                cur = self.right_of(cur);
            }
            cur = self.down_of(cur);
        }
        self.use_ref(cur)
    }

    /// The image of `set` under interleaved relation `rel`: `{y : exists x
    /// in set, (x, y) in rel}` (spec §4.7.2).
    pub fn next(&mut self, rel: NodeId, set: NodeId) -> NodeId {
        if rel == FALSE || set == FALSE {
            return FALSE;
        }
        if rel == TRUE {
            return self.use_ref(set);
        }
        if let Some(hit) = self.cache_lookup(OpTag::RelNext, rel, set, None) {
            return hit;
        }
        let result = self.join_on_shared(set, rel, Self::next_continuation);
        self.cache_store(OpTag::RelNext, rel, set, None, result);
        result
    }

    /// `transform_chain`'s `continue_with` calls back as
    /// `f(lhs_next, next_state)`; `next`'s recursive call wants `(rel,
    /// set)` order, i.e. `(next_state, lhs_next)` here. This adapter makes
    /// that swap so `next` can reuse the same join as `compose_ii`.
    fn next_continuation(&mut self, lhs_next: NodeId, next_state: NodeId) -> NodeId {
        self.next(next_state, lhs_next)
    }

    /// `next`, then restricted to the levels `proj` selects (spec §4.7.2's
    /// projected variant).
    pub fn next_projected(&mut self, rel: NodeId, set: NodeId, proj: &Projection) -> NodeId {
        let full = self.next(rel, set);
        let result = self.project(full, proj);
        self.unuse(full);
        result
    }

    /// The pre-image of `set` under interleaved relation `rel`: `{x :
    /// exists y in set, (x, y) in rel}` (spec §4.7.2).
    pub fn prev(&mut self, rel: NodeId, set: NodeId) -> NodeId {
        if rel == FALSE {
            return FALSE;
        }
        if rel == TRUE {
            return self.use_ref(set);
        }
        if let Some(hit) = self.cache_lookup(OpTag::RelPrev, rel, set, None) {
            return hit;
        }
        let x_branches = self.collect_chain(rel);
        let mut result = FALSE;
        for (xv, y_chain) in x_branches.into_iter().rev() {
            let matched = self.join_and_accumulate(set, y_chain, Self::prev);
            if matched == FALSE {
                continue;
            }
            result = self.create(xv, result, matched);
        }
        self.cache_store(OpTag::RelPrev, rel, set, None, result);
        result
    }

    /// Matches `lhs_chain`'s branch values against `rhs_chain`'s (the shared
    /// dimension, existentially quantified away), and for each match unions
    /// `recurse(rhs_next, lhs_next)` into the result. Unlike
    /// [`Factory::join_on_shared`], there is no further dimension exposed at
    /// this same level to preserve structurally — the match fully
    /// determines the recursive continuation — so this plainly accumulates
    /// rather than rebuilding a value chain. Used by `prev`, whose next
    /// pair-index state (`x` at `i+1`) only appears one recursion deeper,
    /// inside `rhs_next` itself, rather than alongside this join the way
    /// `compose_ii`'s `z` and `next`'s `y` do.
    fn join_and_accumulate(
        &mut self,
        lhs_chain: NodeId,
        rhs_chain: NodeId,
        recurse: fn(&mut Self, NodeId, NodeId) -> NodeId,
    ) -> NodeId {
        let lhs_entries = self.collect_chain(lhs_chain);
        let mut merged = FALSE;
        let mut cur = rhs_chain;
        while cur != FALSE {
            let shared_value = self.value(cur).clone();
            if let Some(&(_, lhs_next)) = lhs_entries.iter().find(|(v, _)| *v == shared_value) {
                let rhs_next = self.down_of(cur);
                let sub = recurse(self, rhs_next, lhs_next);
                let next_merged = self.union(merged, sub);
                self.unuse(merged);
                self.unuse(sub);
                merged = next_merged;
            }
            cur = self.right_of(cur);
        }
        merged
    }

    /// The transitive closure of interleaved relation `rel`: the smallest
    /// superset of `rel` closed under composition with itself, computed as
    /// the fixpoint of repeated `union`+`compose_ii` (spec §4.7.3).
    pub fn closure(&mut self, rel: NodeId) -> NodeId {
        let mut acc = self.use_ref(rel);
        loop {
            let composed = self.compose_ii(acc, rel);
            let merged = self.union(acc, composed);
            self.unuse(composed);
            if merged == acc {
                self.unuse(merged);
                break;
            }
            self.unuse(acc);
            acc = merged;
        }
        acc
    }
}
