//! Set operations over value-ordered diagrams (spec §4.4).
//!
//! Every function here **borrows** its `NodeId` arguments — it never
//! consumes the caller's reference — and returns a **freshly owned**
//! reference to the result. Callers (the wrapper layer, or another
//! operation) are responsible for `unuse`-ing operands they no longer need.
//! This mirrors the original source's `operator()` methods, which take
//! `node_ptr` by value and always return a newly `use`d pointer.

use crate::factory::{Factory, OpTag};
use crate::node::{NodeId, FALSE, TRUE};
use crate::ops::canonical_order;

impl<V> Factory<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    /// The set containing every vector in `a` or in `b` (spec §4.4.1).
    pub fn union(&mut self, a: NodeId, b: NodeId) -> NodeId {
        if a == b {
            return self.use_ref(a);
        }
        if a == FALSE {
            return self.use_ref(b);
        }
        if b == FALSE {
            return self.use_ref(a);
        }
        if a == TRUE {
            return self.add_empty_vector(b);
        }
        if b == TRUE {
            return self.add_empty_vector(a);
        }
        let (a, b) = canonical_order(a, b);
        if let Some(hit) = self.cache_lookup(OpTag::SetUnion, a, b, None) {
            return hit;
        }
        let av = self.value(a).clone();
        let bv = self.value(b).clone();
        let result = if av < bv {
            let r = self.union(self.right_of(a), b);
            let d = self.use_ref(self.down_of(a));
            self.create(av, r, d)
        } else if av > bv {
            let r = self.union(a, self.right_of(b));
            let d = self.use_ref(self.down_of(b));
            self.create(bv, r, d)
        } else {
            let d = self.union(self.down_of(a), self.down_of(b));
            let r = self.union(self.right_of(a), self.right_of(b));
            self.create(av, r, d)
        };
        self.cache_store(OpTag::SetUnion, a, b, None, result);
        result
    }

    /// Adds the zero-length vector to the set denoted by `n` — the
    /// singleton operation behind `union`'s TRUE-operand case (spec §4.4.1,
    /// §4.4.4's `add_element(a, ε)`). A chain's terminator records whether
    /// the level it ends also accepts the empty remaining vector (spec
    /// §3.2: a right-chain "terminates at FALSE ... or TRUE"), so this
    /// walks to the end of `n`'s right-chain and flips that terminator from
    /// FALSE to TRUE, leaving every other branch untouched.
    fn add_empty_vector(&mut self, n: NodeId) -> NodeId {
        if n == FALSE || n == TRUE {
            return TRUE;
        }
        let value = self.value(n).clone();
        let right = self.add_empty_vector(self.right_of(n));
        let down = self.use_ref(self.down_of(n));
        self.create(value, right, down)
    }

    /// The set containing every vector present in both `a` and `b` (spec
    /// §4.4.2). A branch whose `down` intersection collapses to `FALSE` is
    /// dropped rather than handed to `create`, preserving the "no empty
    /// subtree as down" invariant (spec §3.2).
    pub fn intersect(&mut self, a: NodeId, b: NodeId) -> NodeId {
        if a == b {
            return self.use_ref(a);
        }
        if a == FALSE || b == FALSE {
            return FALSE;
        }
        if a == TRUE {
            return self.intersect(a, self.right_of(b));
        }
        if b == TRUE {
            return self.intersect(self.right_of(a), b);
        }
        let (a, b) = canonical_order(a, b);
        if let Some(hit) = self.cache_lookup(OpTag::SetIntersection, a, b, None) {
            return hit;
        }
        let av = self.value(a).clone();
        let bv = self.value(b).clone();
        let result = if av < bv {
            self.intersect(self.right_of(a), b)
        } else if av > bv {
            self.intersect(a, self.right_of(b))
        } else {
            let d = self.intersect(self.down_of(a), self.down_of(b));
            let r = self.intersect(self.right_of(a), self.right_of(b));
            if d == FALSE {
                r
            } else {
                self.create(av, r, d)
            }
        };
        self.cache_store(OpTag::SetIntersection, a, b, None, result);
        result
    }

    /// The set of vectors in `a` that are not in `b` (spec §4.4.3). Not
    /// commutative, so operand order is never canonicalised.
    pub fn minus(&mut self, a: NodeId, b: NodeId) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        if b == FALSE {
            return self.use_ref(a);
        }
        if a == b {
            return FALSE;
        }
        if a == TRUE {
            return self.minus(a, self.right_of(b));
        }
        if b == TRUE {
            let value = self.value(a).clone();
            let right = self.minus(self.right_of(a), b);
            let down = self.use_ref(self.down_of(a));
            return self.create(value, right, down);
        }
        if let Some(hit) = self.cache_lookup(OpTag::SetMinus, a, b, None) {
            return hit;
        }
        let av = self.value(a).clone();
        let bv = self.value(b).clone();
        let result = if av < bv {
            let r = self.minus(self.right_of(a), b);
            let d = self.use_ref(self.down_of(a));
            self.create(av, r, d)
        } else if av > bv {
            self.minus(a, self.right_of(b))
        } else {
            let d = self.minus(self.down_of(a), self.down_of(b));
            let r = self.minus(self.right_of(a), self.right_of(b));
            if d == FALSE {
                r
            } else {
                self.create(av, r, d)
            }
        };
        self.cache_store(OpTag::SetMinus, a, b, None, result);
        result
    }

    /// Inserts `vector` into the set denoted by `a`, returning the new root
    /// (spec §4.4.4). Built as the union of `a` with the single-path
    /// diagram encoding `vector` — the same merge `union` already performs,
    /// specialised to one operand being a single path costs nothing extra
    /// to derive separately.
    pub fn add_element(&mut self, a: NodeId, vector: &[V]) -> NodeId {
        let mut path = TRUE;
        for v in vector.iter().rev() {
            path = self.create(v.clone(), FALSE, path);
        }
        let result = self.union(a, path);
        self.unuse(path);
        result
    }

    /// Whether `vector` is a member of the set denoted by `a` (spec
    /// §4.4.5). A chain's terminator can itself be TRUE rather than FALSE
    /// (spec §3.2), recording that this level also accepts no further
    /// elements alongside whatever real branches precede it — so neither
    /// "is `v` among this chain's values" nor "does the vector end here"
    /// can stop at the first sentinel found; both walk the chain out to
    /// its terminator.
    pub fn contains(&self, a: NodeId, vector: &[V]) -> bool {
        let mut node = a;
        for v in vector {
            loop {
                if node == FALSE || node == TRUE {
                    return false;
                }
                let nv = self.value(node);
                if nv == v {
                    break;
                } else if nv > v {
                    return false;
                }
                node = self.right_of(node);
            }
            node = self.down_of(node);
        }
        self.chain_accepts_empty(node)
    }

    /// Whether the right-chain starting at `node` terminates in TRUE
    /// (accepts the empty remaining vector) rather than FALSE.
    fn chain_accepts_empty(&self, mut node: NodeId) -> bool {
        loop {
            if node == TRUE {
                return true;
            }
            if node == FALSE {
                return false;
            }
            node = self.right_of(node);
        }
    }

    /// Number of distinct vectors denoted by `a` (spec §4.4.6). Memoised
    /// per node — without memoisation this is exponential in the diagram's
    /// depth, since shared subtrees would be re-walked once per parent
    /// (spec §9 prefers this plain per-node memo over the original source's
    /// LSB-pointer-marking traversal).
    pub fn count(&mut self, a: NodeId) -> f64 {
        if a == FALSE {
            return 0.0;
        }
        if a == TRUE {
            return 1.0;
        }
        if let Some(cached) = self.count_memo_get(a) {
            return cached;
        }
        let down = self.down_of(a);
        let right = self.right_of(a);
        let total = self.count(down) + self.count(right);
        self.count_memo_put(a, total);
        total
    }
}
