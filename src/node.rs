//! Node identity and the interior-node record for the MDD engine.
//!
//! An MDD is a rooted DAG of three node kinds: the `FALSE` sentinel (empty
//! set), the `TRUE` sentinel (the set containing only the empty vector), and
//! interior nodes carrying `(value, right, down)`. Interior nodes live in a
//! [`crate::factory::Factory`]'s arena and are addressed by [`NodeId`]; the
//! two sentinels are fixed, reserved ids so that `is_sentinel` is a plain
//! integer comparison instead of a pointer-tag check.

use std::fmt;

/// An index into a [`Factory`](crate::factory::Factory)'s node arena.
///
/// `NodeId(0)` and `NodeId(1)` are the reserved sentinels [`FALSE`] and
/// [`TRUE`]; every other value addresses a live or zero-count interior node.
/// `NodeId`s from different factories must never be mixed — the factory
/// layer rejects that (spec §5, §7) via [`crate::error::MddError::ForeignFactory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

/// The empty-set sentinel: "no vectors".
pub const FALSE: NodeId = NodeId(0);

/// The empty-list sentinel: "the set containing exactly the zero-length vector".
pub const TRUE: NodeId = NodeId(1);

impl NodeId {
    /// True for either of the two fixed sentinels.
    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.0 < 2
    }

    /// Raw arena index, exposed for diagnostics (e.g. `Factory::dump`).
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FALSE => write!(f, "FALSE"),
            TRUE => write!(f, "TRUE"),
            NodeId(i) => write!(f, "#{i}"),
        }
    }
}

/// An interior node: `value` extends every vector denoted by `down` (the
/// next level), unioned with every vector denoted by `right` (the same
/// level). `refcount` is the node lifecycle's single piece of mutable state;
/// `value`/`right`/`down` never change once the node exists (revival resets
/// `refcount` to 1 on an exact structural match — see
/// [`Factory::create`](crate::factory::Factory::create) — but never alters
/// the triple).
#[derive(Debug, Clone)]
pub(crate) struct NodeData<V> {
    pub value: V,
    pub right: NodeId,
    pub down: NodeId,
    pub refcount: u32,
}

impl<V> NodeData<V> {
    pub fn new(value: V, right: NodeId, down: NodeId) -> Self {
        NodeData {
            value,
            right,
            down,
            refcount: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_distinguished() {
        assert!(FALSE.is_sentinel());
        assert!(TRUE.is_sentinel());
        assert_ne!(FALSE, TRUE);
    }

    #[test]
    fn interior_ids_are_not_sentinels() {
        let id = NodeId(2);
        assert!(!id.is_sentinel());
    }

    #[test]
    fn ordering_matches_index() {
        assert!(FALSE < TRUE);
        assert!(TRUE < NodeId(2));
    }
}
