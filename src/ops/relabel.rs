//! Partition-refinement relabelling (spec §4.8): a recursive descent that
//! replaces subdiagrams matching a caller-supplied predicate wholesale,
//! leaving the rest of the structure untouched.

use std::collections::HashMap;

use crate::factory::Factory;
use crate::node::{NodeId, FALSE, TRUE};

/// Caller-supplied policy for [`Factory::relabel`]. Typically stateful — a
/// partition-refinement caller assigns fresh block ids as it matches
/// (spec §8.2 S6).
pub trait Relabeller<V> {
    /// Whether `node` (at `level`) should be replaced wholesale rather than
    /// descended into.
    fn matches(&mut self, factory: &Factory<V>, level: usize, node: NodeId) -> bool;

    /// The replacement for `node` at `level`, called at most once per
    /// distinct `node` a given `relabel` call sees (the result is memoised
    /// locally so two equal inputs receive the same replacement). Returns a
    /// freshly owned reference, following the convention every `ops`
    /// function does.
    fn replace(&mut self, factory: &mut Factory<V>, level: usize, node: NodeId) -> NodeId;
}

impl<V> Factory<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    /// Replaces every subdiagram of `a` that `g.matches` selects with
    /// `g.replace`'s result (spec §4.8). Memoised locally, keyed on the
    /// input subdiagram's `NodeId`, rather than through the shared operation
    /// cache: a `Relabeller` is arbitrary caller state, which the cache's
    /// fixed `(op, a, b, proj)` key shape has no room for — the same reason
    /// [`crate::ops::projected_ops::match_proj`] keeps its own memo instead
    /// of sharing the cache.
    pub fn relabel(&mut self, a: NodeId, g: &mut impl Relabeller<V>) -> NodeId {
        let mut memo = HashMap::new();
        let result = self.relabel_rec(a, g, 0, &mut memo);
        for replacement in memo.into_values() {
            self.unuse(replacement);
        }
        result
    }

    fn relabel_rec(
        &mut self,
        a: NodeId,
        g: &mut impl Relabeller<V>,
        level: usize,
        memo: &mut HashMap<NodeId, NodeId>,
    ) -> NodeId {
        if a == TRUE {
            return TRUE;
        }
        if g.matches(self, level, a) {
            if let Some(&cached) = memo.get(&a) {
                return self.use_ref(cached);
            }
            let replacement = g.replace(self, level, a);
            memo.insert(a, replacement);
            return self.use_ref(replacement);
        }
        if a == FALSE {
            return FALSE;
        }
        let value = self.value(a).clone();
        let right = self.relabel_rec(self.right_of(a), g, level, memo);
        let down = self.relabel_rec(self.down_of(a), g, level + 1, memo);
        self.create(value, right, down)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(f: &mut Factory<u32>, values: &[u32]) -> NodeId {
        let mut node = TRUE;
        for v in values.iter().rev() {
            node = f.create(*v, FALSE, node);
        }
        node
    }

    /// Replaces any interior node whose own value is `5`, wherever it
    /// occurs, with a fixed singleton path `[9]`, counting how many times
    /// `replace` actually ran.
    struct ReplaceFives {
        replace_calls: u32,
    }

    impl Relabeller<u32> for ReplaceFives {
        fn matches(&mut self, factory: &Factory<u32>, _level: usize, node: NodeId) -> bool {
            node != FALSE && node != TRUE && *factory.value(node) == 5
        }

        fn replace(&mut self, factory: &mut Factory<u32>, _level: usize, _node: NodeId) -> NodeId {
            self.replace_calls += 1;
            path(factory, &[9])
        }
    }

    #[test]
    fn relabel_replaces_matching_subdiagrams() {
        let mut f: Factory<u32> = Factory::new();
        let a = path(&mut f, &[5, 2]);
        let mut g = ReplaceFives { replace_calls: 0 };
        let replaced = f.relabel(a, &mut g);
        assert!(f.contains(replaced, &[9]));
        assert!(!f.contains(replaced, &[5, 2]));
        assert_eq!(g.replace_calls, 1);
    }

    #[test]
    fn relabel_memoises_a_shared_subdiagram_to_one_replacement() {
        let mut f: Factory<u32> = Factory::new();
        let shared = path(&mut f, &[5]);
        let s1 = f.use_ref(shared);
        let s2 = f.use_ref(shared);
        let branch1 = f.create(1, FALSE, s1);
        let branch2 = f.create(2, FALSE, s2);
        let a = f.union(branch1, branch2);
        let mut g = ReplaceFives { replace_calls: 0 };
        let replaced = f.relabel(a, &mut g);
        assert!(f.contains(replaced, &[1, 9]));
        assert!(f.contains(replaced, &[2, 9]));
        assert_eq!(g.replace_calls, 1, "the shared subdiagram is only replaced once");
    }

    #[test]
    fn relabel_leaves_non_matching_structure_intact() {
        let mut f: Factory<u32> = Factory::new();
        let a = path(&mut f, &[1, 2]);
        let mut g = ReplaceFives { replace_calls: 0 };
        let replaced = f.relabel(a, &mut g);
        assert_eq!(replaced, a);
        assert_eq!(g.replace_calls, 0);
    }
}
