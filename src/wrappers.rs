//! Value wrapper types (spec §6): `MddSet`, `Irel`, `Srel`. Each is a
//! `(factory handle, node)` pair owning one counted reference to `node` for
//! its lifetime, giving `Clone`/`Drop` the same use/unuse discipline the
//! original source's `mdd<Value>` copy-constructor and destructor have.
//!
//! The original models the factory as a raw, externally-owned pointer
//! (`factory_ptr`) — sound there because the caller's object lifetimes
//! already guarantee the factory outlives every wrapper. This engine is
//! explicitly single-threaded (spec §5) but has no such external lifetime
//! guarantee, so wrappers share a `Rc<RefCell<Factory<V>>>` instead: the
//! idiomatic Rust substitute for "many owners, one thread, interior
//! mutability, no need for atomics".

use std::cell::RefCell;
use std::ops::{Add, BitAnd, BitOr, Sub};
use std::rc::Rc;

use crate::error::{MddError, Result};
use crate::factory::{require_same_factory, Factory};
use crate::iter::MddIterator;
use crate::node::{NodeId, FALSE, TRUE};
use crate::ops::projection::Projection;
use crate::ops::relabel::Relabeller;

/// The shared, single-owner-thread handle every wrapper type holds a clone
/// of.
pub type FactoryHandle<V> = Rc<RefCell<Factory<V>>>;

fn use_in<V>(factory: &FactoryHandle<V>, node: NodeId) -> NodeId
where
    V: Clone + Eq + std::hash::Hash,
{
    factory.borrow_mut().use_ref(node)
}

/// A set of fixed-width vectors (spec §6).
pub struct MddSet<V> {
    factory: FactoryHandle<V>,
    node: NodeId,
}

impl<V> MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    /// The empty set.
    pub fn empty(factory: FactoryHandle<V>) -> Self {
        MddSet { factory, node: FALSE }
    }

    /// The set containing exactly the zero-length vector.
    pub fn singleton(factory: FactoryHandle<V>) -> Self {
        MddSet { factory, node: TRUE }
    }

    pub(crate) fn from_node(factory: FactoryHandle<V>, node: NodeId) -> Self {
        MddSet { factory, node }
    }

    fn check_factory(&self, other: &FactoryHandle<V>) -> Result<()> {
        require_same_factory(&self.factory.borrow(), &other.borrow())
    }

    /// `self & other` without panicking on mismatched factories.
    pub fn try_intersect(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().intersect(self.node, other.node);
        Ok(MddSet::from_node(self.factory.clone(), node))
    }

    /// `self | other` without panicking on mismatched factories.
    pub fn try_union(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().union(self.node, other.node);
        Ok(MddSet::from_node(self.factory.clone(), node))
    }

    /// `self - other` without panicking on mismatched factories.
    pub fn try_minus(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().minus(self.node, other.node);
        Ok(MddSet::from_node(self.factory.clone(), node))
    }

    /// Inserts `vector` into this set, returning the result.
    pub fn add_element(&self, vector: &[V]) -> Self {
        let node = self.factory.borrow_mut().add_element(self.node, vector);
        MddSet::from_node(self.factory.clone(), node)
    }

    pub fn contains(&self, vector: &[V]) -> bool {
        self.factory.borrow().contains(self.node, vector)
    }

    /// Number of distinct vectors (spec §4.4 `count`).
    pub fn size(&self) -> f64 {
        self.factory.borrow_mut().count(self.node)
    }

    /// The elements of this set whose values at `proj`'s selected levels
    /// equal `values`.
    pub fn match_proj(&self, proj: &Projection, values: &[V]) -> Self {
        let node = self.factory.borrow_mut().match_proj(self.node, proj, values);
        MddSet::from_node(self.factory.clone(), node)
    }

    /// This set restricted to `proj`'s selected levels.
    pub fn project(&self, proj: &Projection) -> Self {
        let node = self.factory.borrow_mut().project(self.node, proj);
        MddSet::from_node(self.factory.clone(), node)
    }

    /// Walks `right` at the top level until `value` is found, returning the
    /// set denoted by the `down` reached. Spec §6: "missing key is an
    /// error".
    pub fn subscript(&self, value: &V) -> Result<Self> {
        let f = self.factory.borrow();
        let mut cur = self.node;
        loop {
            if cur == FALSE {
                return Err(MddError::MissingKey);
            }
            let v = f.value(cur);
            if v == value {
                break;
            } else if v > value {
                return Err(MddError::MissingKey);
            }
            cur = f.right_of(cur);
        }
        let down = f.down_of(cur);
        drop(f);
        Ok(MddSet::from_node(self.factory.clone(), use_in(&self.factory, down)))
    }

    pub fn iter(&self) -> MddIterator<V> {
        MddIterator::new(&self.factory.borrow(), self.node)
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn factory_handle(&self) -> &FactoryHandle<V> {
        &self.factory
    }
}

impl<V> Clone for MddSet<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn clone(&self) -> Self {
        MddSet {
            factory: self.factory.clone(),
            node: use_in(&self.factory, self.node),
        }
    }
}

impl<V> Drop for MddSet<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn drop(&mut self) {
        self.factory.borrow_mut().unuse(self.node);
    }
}

impl<V> PartialEq for MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    fn eq(&self, other: &Self) -> bool {
        assert!(
            self.check_factory(&other.factory).is_ok(),
            "compared MddSets from different factories"
        );
        self.node == other.node
    }
}

impl<V> BitAnd for &MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = MddSet<V>;

    fn bitand(self, other: &MddSet<V>) -> MddSet<V> {
        self.try_intersect(other).expect("operands belong to different MDD factories")
    }
}

impl<V> BitOr for &MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = MddSet<V>;

    fn bitor(self, other: &MddSet<V>) -> MddSet<V> {
        self.try_union(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Sub for &MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = MddSet<V>;

    fn sub(self, other: &MddSet<V>) -> MddSet<V> {
        self.try_minus(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Add<&[V]> for &MddSet<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = MddSet<V>;

    fn add(self, vector: &[V]) -> MddSet<V> {
        self.add_element(vector)
    }
}

/// An interleaved relation over `V^k x V^k` (spec §3.3, §6).
pub struct Irel<V> {
    factory: FactoryHandle<V>,
    node: NodeId,
}

impl<V> Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    pub fn empty(factory: FactoryHandle<V>) -> Self {
        Irel { factory, node: FALSE }
    }

    pub(crate) fn from_node(factory: FactoryHandle<V>, node: NodeId) -> Self {
        Irel { factory, node }
    }

    fn check_factory(&self, other: &FactoryHandle<V>) -> Result<()> {
        require_same_factory(&self.factory.borrow(), &other.borrow())
    }

    /// `self & other` without panicking on mismatched factories.
    pub fn try_intersect(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().intersect(self.node, other.node);
        Ok(Irel::from_node(self.factory.clone(), node))
    }

    /// `self | other` without panicking on mismatched factories.
    pub fn try_union(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().union(self.node, other.node);
        Ok(Irel::from_node(self.factory.clone(), node))
    }

    /// `self - other` without panicking on mismatched factories.
    pub fn try_minus(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().minus(self.node, other.node);
        Ok(Irel::from_node(self.factory.clone(), node))
    }

    /// Inserts an interleaved pair path (`x_0, y_0, x_1, y_1, ...`) into this
    /// relation, returning the result.
    pub fn add_element(&self, pair: &[V]) -> Self {
        let node = self.factory.borrow_mut().add_element(self.node, pair);
        Irel::from_node(self.factory.clone(), node)
    }

    pub fn contains(&self, pair: &[V]) -> bool {
        self.factory.borrow().contains(self.node, pair)
    }

    /// Number of distinct pairs (spec §4.4 `count`).
    pub fn size(&self) -> f64 {
        self.factory.borrow_mut().count(self.node)
    }

    pub fn iter(&self) -> MddIterator<V> {
        MddIterator::new(&self.factory.borrow(), self.node)
    }

    /// `self ; other`, both interleaved over the same arity (spec §4.7.1).
    pub fn compose(&self, other: &Self) -> Self {
        self.check_factory(&other.factory)
            .expect("operands belong to different MDD factories");
        let node = self.factory.borrow_mut().compose_ii(self.node, other.node);
        Irel::from_node(self.factory.clone(), node)
    }

    /// `self ; other` against a sequential relation (spec §4.7.2).
    pub fn compose_sequential(&self, other: &Srel<V>, width: usize) -> Srel<V> {
        self.check_factory(other.factory_handle())
            .expect("operands belong to different MDD factories");
        let node = self
            .factory
            .borrow_mut()
            .compose_is(self.node, other.node(), width);
        Srel::from_node(self.factory.clone(), node)
    }

    /// The transitive closure of `self` (spec §4.7.3).
    pub fn closure(&self) -> Self {
        let node = self.factory.borrow_mut().closure(self.node);
        Irel::from_node(self.factory.clone(), node)
    }

    /// The image of `set` under `self` (spec §4.7.4).
    pub fn apply(&self, set: &MddSet<V>) -> MddSet<V> {
        self.check_factory(set.factory_handle())
            .expect("operands belong to different MDD factories");
        let node = self.factory.borrow_mut().next(self.node, set.node());
        MddSet::from_node(self.factory.clone(), node)
    }

    /// [`Irel::apply`] restricted to `proj`'s selected levels.
    pub fn apply_projected(&self, set: &MddSet<V>, proj: &Projection) -> MddSet<V> {
        self.check_factory(set.factory_handle())
            .expect("operands belong to different MDD factories");
        let node = self
            .factory
            .borrow_mut()
            .next_projected(self.node, set.node(), proj);
        MddSet::from_node(self.factory.clone(), node)
    }

    /// The pre-image of `set` under `self` (spec §4.7.5).
    pub fn pre(&self, set: &MddSet<V>) -> MddSet<V> {
        self.check_factory(set.factory_handle())
            .expect("operands belong to different MDD factories");
        let node = self.factory.borrow_mut().prev(self.node, set.node());
        MddSet::from_node(self.factory.clone(), node)
    }
}

impl<V> BitAnd for &Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Irel<V>;

    fn bitand(self, other: &Irel<V>) -> Irel<V> {
        self.try_intersect(other).expect("operands belong to different MDD factories")
    }
}

impl<V> BitOr for &Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Irel<V>;

    fn bitor(self, other: &Irel<V>) -> Irel<V> {
        self.try_union(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Sub for &Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Irel<V>;

    fn sub(self, other: &Irel<V>) -> Irel<V> {
        self.try_minus(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Add<&[V]> for &Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Irel<V>;

    fn add(self, pair: &[V]) -> Irel<V> {
        self.add_element(pair)
    }
}

impl<V> Clone for Irel<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn clone(&self) -> Self {
        Irel {
            factory: self.factory.clone(),
            node: use_in(&self.factory, self.node),
        }
    }
}

impl<V> Drop for Irel<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn drop(&mut self) {
        self.factory.borrow_mut().unuse(self.node);
    }
}

impl<V> PartialEq for Irel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    fn eq(&self, other: &Self) -> bool {
        assert!(
            self.check_factory(&other.factory).is_ok(),
            "compared Irels from different factories"
        );
        self.node == other.node
    }
}

/// A sequential relation over `V^k x V^m` (spec §3.3, §6).
pub struct Srel<V> {
    factory: FactoryHandle<V>,
    node: NodeId,
}

impl<V> Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    pub fn empty(factory: FactoryHandle<V>) -> Self {
        Srel { factory, node: FALSE }
    }

    pub(crate) fn from_node(factory: FactoryHandle<V>, node: NodeId) -> Self {
        Srel { factory, node }
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }

    pub(crate) fn factory_handle(&self) -> &FactoryHandle<V> {
        &self.factory
    }

    /// Partition-refinement relabelling (spec §4.8).
    pub fn relabel(&self, g: &mut impl Relabeller<V>) -> Self {
        let node = self.factory.borrow_mut().relabel(self.node, g);
        Srel::from_node(self.factory.clone(), node)
    }

    fn check_factory(&self, other: &FactoryHandle<V>) -> Result<()> {
        require_same_factory(&self.factory.borrow(), &other.borrow())
    }

    /// `self & other` without panicking on mismatched factories.
    pub fn try_intersect(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().intersect(self.node, other.node);
        Ok(Srel::from_node(self.factory.clone(), node))
    }

    /// `self | other` without panicking on mismatched factories.
    pub fn try_union(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().union(self.node, other.node);
        Ok(Srel::from_node(self.factory.clone(), node))
    }

    /// `self - other` without panicking on mismatched factories.
    pub fn try_minus(&self, other: &Self) -> Result<Self> {
        self.check_factory(&other.factory)?;
        let node = self.factory.borrow_mut().minus(self.node, other.node);
        Ok(Srel::from_node(self.factory.clone(), node))
    }

    /// Inserts a sequential pair path (`y_0, ..., y_{k-1}, z_0, ...,
    /// z_{k-1}`) into this relation, returning the result.
    pub fn add_element(&self, pair: &[V]) -> Self {
        let node = self.factory.borrow_mut().add_element(self.node, pair);
        Srel::from_node(self.factory.clone(), node)
    }

    pub fn contains(&self, pair: &[V]) -> bool {
        self.factory.borrow().contains(self.node, pair)
    }

    /// Number of distinct pairs (spec §4.4 `count`).
    pub fn size(&self) -> f64 {
        self.factory.borrow_mut().count(self.node)
    }

    pub fn iter(&self) -> MddIterator<V> {
        MddIterator::new(&self.factory.borrow(), self.node)
    }
}

impl<V> BitAnd for &Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Srel<V>;

    fn bitand(self, other: &Srel<V>) -> Srel<V> {
        self.try_intersect(other).expect("operands belong to different MDD factories")
    }
}

impl<V> BitOr for &Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Srel<V>;

    fn bitor(self, other: &Srel<V>) -> Srel<V> {
        self.try_union(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Sub for &Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Srel<V>;

    fn sub(self, other: &Srel<V>) -> Srel<V> {
        self.try_minus(other).expect("operands belong to different MDD factories")
    }
}

impl<V> Add<&[V]> for &Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    type Output = Srel<V>;

    fn add(self, pair: &[V]) -> Srel<V> {
        self.add_element(pair)
    }
}

impl<V> Clone for Srel<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn clone(&self) -> Self {
        Srel {
            factory: self.factory.clone(),
            node: use_in(&self.factory, self.node),
        }
    }
}

impl<V> Drop for Srel<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    fn drop(&mut self) {
        self.factory.borrow_mut().unuse(self.node);
    }
}

impl<V> PartialEq for Srel<V>
where
    V: Clone + Eq + std::hash::Hash + Ord,
{
    fn eq(&self, other: &Self) -> bool {
        assert!(
            self.check_factory(&other.factory).is_ok(),
            "compared Srels from different factories"
        );
        self.node == other.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_factory() -> FactoryHandle<u32> {
        Rc::new(RefCell::new(Factory::new()))
    }

    #[test]
    fn union_and_intersect_via_operators() {
        let f = new_factory();
        let a = MddSet::empty(f.clone()).add_element(&[1, 2]);
        let b = MddSet::empty(f.clone()).add_element(&[1, 3]);
        let u = &a | &b;
        assert!(u.contains(&[1, 2]));
        assert!(u.contains(&[1, 3]));
        let i = &a & &b;
        assert!(!i.contains(&[1, 2]));
        assert_eq!(i.size(), 0.0);
    }

    #[test]
    fn mismatched_factories_are_rejected() {
        let f1 = new_factory();
        let f2 = new_factory();
        let a = MddSet::empty(f1).add_element(&[1]);
        let b = MddSet::empty(f2).add_element(&[1]);
        assert!(matches!(a.try_union(&b), Err(MddError::ForeignFactory)));
    }

    #[test]
    fn subscript_descends_into_the_matching_branch() {
        let f = new_factory();
        let a = MddSet::empty(f.clone()).add_element(&[1, 2]);
        let sub = a.subscript(&1).unwrap();
        assert!(sub.contains(&[2]));
        assert!(matches!(a.subscript(&9), Err(MddError::MissingKey)));
    }

    #[test]
    fn clone_and_drop_keep_the_refcount_balanced() {
        let f = new_factory();
        let a = MddSet::empty(f.clone()).add_element(&[1, 2]);
        let node = a.node();
        let before = f.borrow().refcount(node);
        {
            let _b = a.clone();
            assert_eq!(f.borrow().refcount(node), before + 1);
        }
        assert_eq!(f.borrow().refcount(node), before);
    }

    #[test]
    fn irel_image_and_preimage_round_trip() {
        let f = new_factory();
        let mut fm = f.borrow_mut();
        let down = fm.create(2, FALSE, TRUE);
        let rel_node = fm.create(1, FALSE, down);
        drop(fm);
        let rel = Irel::from_node(f.clone(), rel_node);
        let set = MddSet::empty(f.clone()).add_element(&[1]);
        let image = rel.apply(&set);
        assert!(image.contains(&[2]));
        let preimage = rel.pre(&image);
        assert!(preimage.contains(&[1]));
    }
}
