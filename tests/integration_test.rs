//! Black-box end-to-end scenarios (spec §8.2 S1-S6), exercised entirely
//! through the public wrapper API.

use std::cell::RefCell;
use std::rc::Rc;

use mdd_engine::{Factory, FactoryHandle, Irel, MddError, MddSet, Relabeller, Srel, FALSE};

fn factory<V>() -> FactoryHandle<V>
where
    V: Clone + Eq + std::hash::Hash,
{
    Rc::new(RefCell::new(Factory::new()))
}

/// S1: string set build-up.
#[test]
fn string_set_build_up() {
    let f = factory::<&'static str>();
    let set = MddSet::empty(f.clone());
    let set = set.add_element(&["a"]);
    let set = set.add_element(&["a", "b"]);
    let set = set.add_element(&["b", "c"]);
    let set = set.add_element(&["b", "c"]);

    let empty_vector: [&str; 0] = [];
    assert_eq!(MddSet::singleton(f.clone()), &MddSet::empty(f.clone()) + &empty_vector);

    let mut vectors: Vec<Vec<&str>> = set.iter().collect();
    vectors.sort();
    assert_eq!(vectors, vec![vec!["a"], vec!["a", "b"], vec!["b", "c"]]);

    drop(set);
    f.borrow_mut().clean();
    assert_eq!(f.borrow().size(), 0);
}

/// S2: union cache hit/miss deltas.
#[test]
fn union_cache_hits() {
    let f = factory::<&'static str>();
    let m1 = MddSet::empty(f.clone()).add_element(&["a"]);
    let m2 = MddSet::empty(f.clone()).add_element(&["a", "b"]);

    let hits0 = f.borrow().cache_hits();
    let misses0 = f.borrow().cache_misses();

    let _ = &m1 | &m2;
    let _ = &m2 | &m1;
    let _ = &m1 | &m1;
    let _ = &m2 | &MddSet::empty(f.clone());
    let _ = &MddSet::empty(f.clone()) | &m2;

    assert_eq!(f.borrow().cache_hits(), hits0 + 2);
    assert_eq!(f.borrow().cache_misses(), misses0);
}

/// S3: image of a set under an interleaved relation.
#[test]
fn image_of_a_set() {
    let f = factory::<u32>();
    let r = Irel::empty(f.clone());
    let r = r.add_element(&[0, 0, 1, 1]);
    let r = r.add_element(&[1, 1, 2, 2]);
    let r = r.add_element(&[0, 0, 2, 2]);
    let r = r.add_element(&[2, 2, 3, 3]);

    let s = MddSet::empty(f.clone()).add_element(&[0, 0]).add_element(&[1, 1]);
    let image = r.apply(&s);

    assert!(image.contains(&[1, 1]));
    assert!(image.contains(&[2, 2]));
    assert_eq!(image.size(), 2.0);
}

/// S4: composition and closure.
#[test]
fn composition_and_closure() {
    let f = factory::<u32>();
    // a=0 b=1 c=2 d=3 e=4
    let r = Irel::empty(f.clone());
    let r = r.add_element(&[0, 1]);
    let r = r.add_element(&[1, 2]);
    let r = r.add_element(&[1, 3]);
    let r = r.add_element(&[2, 4]);

    let composed = r.compose(&r);
    assert!(composed.contains(&[0, 2]));
    assert!(composed.contains(&[0, 3]));
    assert!(composed.contains(&[1, 4]));
    assert_eq!(composed.size(), 3.0);

    let closed = r.closure();
    assert!(closed.contains(&[0, 1]));
    assert!(closed.contains(&[0, 2]));
    assert!(closed.contains(&[0, 3]));
    assert!(closed.contains(&[1, 2]));
    assert!(closed.contains(&[1, 3]));
    assert!(closed.contains(&[1, 4]));
    assert!(closed.contains(&[2, 4]));
    assert!(closed.contains(&[0, 4]));
    assert_eq!(closed.size(), 8.0);

    // f=5 maps to 1/2/3 via a sequential relation over (y, z).
    let s = Srel::empty(f.clone());
    let s = s.add_element(&[3, 100]);
    let s = s.add_element(&[4, 200]);
    let joined = closed.compose_sequential(&s, 1);
    assert!(joined.contains(&[0, 100]));
    assert!(joined.contains(&[0, 200]));
    assert!(joined.contains(&[1, 100]));
    assert!(joined.contains(&[1, 200]));
    assert!(joined.contains(&[2, 200]));
    assert_eq!(joined.size(), 5.0);
}

/// S5: projected image passes non-selected levels through unfiltered.
#[test]
fn projected_image() {
    use mdd_engine::Projection;

    let f = factory::<u32>();
    let r = Irel::empty(f.clone());
    // pairs over a width-2 state (v0, v1) -> (v0, v1): only v0 changes.
    let r = r.add_element(&[0, 9, 1, 9]);
    let r = r.add_element(&[1, 9, 2, 9]);

    let s = MddSet::empty(f.clone()).add_element(&[0, 9]);
    let proj = Projection::from_indices(&[0], 2);
    let image = r.apply_projected(&s, &proj);
    assert!(image.contains(&[1]));
    assert_eq!(image.size(), 1.0);
}

/// S6: a relabel-based refinement loop converges to a stable partition.
#[test]
fn partition_refinement_converges() {
    use std::collections::HashMap;
    use mdd_engine::NodeId;

    struct BlockAssigner {
        seen: HashMap<Vec<u32>, u32>,
        next_id: u32,
    }

    impl Relabeller<u32> for BlockAssigner {
        fn matches(&mut self, _factory: &Factory<u32>, level: usize, node: NodeId) -> bool {
            level == 1 && node != FALSE
        }

        fn replace(&mut self, factory: &mut Factory<u32>, _level: usize, node: NodeId) -> NodeId {
            let mut signature: Vec<u32> = mdd_engine::MddIterator::new(factory, node)
                .map(|path| path[0])
                .collect();
            signature.sort_unstable();
            signature.dedup();
            let next_id = &mut self.next_id;
            let id = *self.seen.entry(signature).or_insert_with(|| {
                let id = *next_id;
                *next_id += 1;
                id
            });
            factory.add_element(FALSE, &[id])
        }
    }

    let f = factory::<u32>();
    let t = Irel::empty(f.clone());
    let t = t.add_element(&[0, 1]);
    let t = t.add_element(&[0, 2]);
    let t = t.add_element(&[1, 3]);
    let t = t.add_element(&[2, 3]);

    let p0 = Srel::empty(f.clone());
    let p0 = p0.add_element(&[0, 0]);
    let p0 = p0.add_element(&[1, 0]);
    let p0 = p0.add_element(&[2, 0]);
    let p0 = p0.add_element(&[3, 0]);

    let mut p = p0.clone();
    let mut assigner = BlockAssigner { seen: HashMap::new(), next_id: 0 };
    let mut rounds = 0;
    loop {
        rounds += 1;
        assert!(rounds < 10, "partition refinement did not stabilise");
        let composed = t.compose_sequential(&p, 1);
        let merged = &composed | &p0;
        let refined = merged.relabel(&mut assigner);
        let stable = refined == p;
        p = refined;
        if stable {
            break;
        }
    }

    // Every state ended up with exactly one block assignment.
    assert_eq!(p.size(), 4.0);
}

#[test]
fn mismatched_factories_reject_cleanly() {
    let f1 = factory::<u32>();
    let f2 = factory::<u32>();
    let a = MddSet::empty(f1).add_element(&[1]);
    let b = MddSet::empty(f2).add_element(&[1]);
    assert!(matches!(a.try_union(&b), Err(MddError::ForeignFactory)));
}
