//! Set operations restricted to a [`Projection`] (spec §4.6): `project`
//! reduces a diagram's width to just the selected levels, existentially
//! unioning away the rest; `match_proj` keeps the full width but filters to
//! the elements whose selected levels equal a given partial vector.

use crate::factory::{Factory, OpTag};
use crate::node::{NodeId, FALSE, TRUE};
use crate::ops::projection::Projection;

impl<V> Factory<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    /// The diagram over just `proj`'s selected levels, each vector of `a`
    /// contracted by dropping its unselected positions (duplicates produced
    /// by that contraction are merged, i.e. this is existential
    /// quantification over the dropped levels).
    pub fn project(&mut self, a: NodeId, proj: &Projection) -> NodeId {
        self.project_rec(a, proj.clone())
    }

    fn project_rec(&mut self, a: NodeId, cursor: Projection) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        if a == TRUE {
            return self.use_ref(TRUE);
        }
        if let Some(hit) = self.cache_lookup(OpTag::SetProject, a, FALSE, Some(&cursor)) {
            return hit;
        }
        let (selected, next) = cursor.advance();
        let result = if selected {
            self.project_keep(a, &next)
        } else {
            self.project_drop(a, &next)
        };
        self.cache_store(OpTag::SetProject, a, FALSE, Some(cursor), result);
        result
    }

    fn project_keep(&mut self, a: NodeId, cursor: &Projection) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        let av = self.value(a).clone();
        let d = self.project_rec(self.down_of(a), cursor.clone());
        let r = self.project_keep(self.right_of(a), cursor);
        if d == FALSE {
            r
        } else {
            self.create(av, r, d)
        }
    }

    fn project_drop(&mut self, a: NodeId, cursor: &Projection) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        let down = self.project_rec(self.down_of(a), cursor.clone());
        let right = self.project_drop(self.right_of(a), cursor);
        let merged = self.union(down, right);
        self.unuse(down);
        self.unuse(right);
        merged
    }

    /// The elements of `a` whose values at `proj`'s selected levels equal
    /// `values` (given in level order, one per selected level); unselected
    /// levels pass through unfiltered and the diagram keeps its full width.
    /// Not memoised in the shared operation cache: `values` does not fit
    /// its three-field key shape, the same reason [`crate::ops::relabel`]
    /// does its own local memoisation instead of using it.
    pub fn match_proj(&mut self, a: NodeId, proj: &Projection, values: &[V]) -> NodeId {
        self.match_rec(a, proj.clone(), values, 0)
    }

    fn match_rec(&mut self, a: NodeId, cursor: Projection, values: &[V], vi: usize) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        if a == TRUE {
            return self.use_ref(TRUE);
        }
        let (selected, next) = cursor.advance();
        if selected {
            self.match_select(a, &values[vi], &next, values, vi + 1)
        } else {
            self.match_keep_all(a, &next, values, vi)
        }
    }

    fn match_select(
        &mut self,
        a: NodeId,
        target: &V,
        cursor: &Projection,
        values: &[V],
        vi: usize,
    ) -> NodeId {
        let mut node = a;
        loop {
            if node == FALSE {
                return FALSE;
            }
            let v = self.value(node);
            if v == target {
                break;
            } else if v > target {
                return FALSE;
            }
            node = self.right_of(node);
        }
        let d = self.match_rec(self.down_of(node), cursor.clone(), values, vi);
        if d == FALSE {
            FALSE
        } else {
            self.create(target.clone(), FALSE, d)
        }
    }

    fn match_keep_all(&mut self, a: NodeId, cursor: &Projection, values: &[V], vi: usize) -> NodeId {
        if a == FALSE {
            return FALSE;
        }
        let av = self.value(a).clone();
        let d = self.match_rec(self.down_of(a), cursor.clone(), values, vi);
        let r = self.match_keep_all(self.right_of(a), cursor, values, vi);
        if d == FALSE {
            r
        } else {
            self.create(av, r, d)
        }
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

    #[test]
    fn project_drops_unselected_levels() {
        let mut f: Factory<u32> = Factory::new();
        let a = path(&mut f, &[1, 2, 3]);
        let proj = Projection::from_indices(&[0, 2], 3);
        let projected = f.project(a, &proj);
        assert!(f.contains(projected, &[1, 3]));
        assert_eq!(f.count(projected), 1.0);
    }

    #[test]
    fn project_merges_vectors_that_agree_after_dropping() {
        let mut f: Factory<u32> = Factory::new();
        let p1 = path(&mut f, &[1, 2]);
        let p2 = path(&mut f, &[1, 9]);
        let a = f.union(p1, p2);
        let proj = Projection::from_indices(&[0], 2);
        let projected = f.project(a, &proj);
        assert!(f.contains(projected, &[1]));
        assert_eq!(f.count(projected), 1.0);
    }

    #[test]
    fn match_proj_filters_to_matching_selected_levels() {
        let mut f: Factory<u32> = Factory::new();
        let p1 = path(&mut f, &[1, 2]);
        let p2 = path(&mut f, &[1, 3]);
        let a = f.union(p1, p2);
        let proj = Projection::from_indices(&[1], 2);
        let matched = f.match_proj(a, &proj, &[2]);
        assert!(f.contains(matched, &[1, 2]));
        assert!(!f.contains(matched, &[1, 3]));
    }
}
