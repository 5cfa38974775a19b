//! Relational operations over a small labelled transition system: image,
//! pre-image, composition, transitive closure, and a partition-refinement
//! (bisimulation) loop built on `relabel` (spec §8.2 S3/S4/S6).
//!
//! Run with: cargo run --example reachability

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use mdd_engine::{Factory, FactoryHandle, Irel, MddSet, Relabeller, Srel, FALSE};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let factory: FactoryHandle<u32> = Rc::new(RefCell::new(Factory::<u32>::new()));

    println!("=== Image / pre-image ===\n");

    // R = { 0->1, 1->2, 0->2, 2->3 }
    let r = Irel::empty(factory.clone());
    let r = r.add_element(&[0, 1]);
    let r = r.add_element(&[1, 2]);
    let r = r.add_element(&[0, 2]);
    let r = r.add_element(&[2, 3]);

    let s = MddSet::empty(factory.clone()).add_element(&[0]).add_element(&[1]);

    let image = r.apply(&s);
    println!("next(R, {{0, 1}}) = {:?}", collect(&image));

    let preimage = r.pre(&image);
    println!("prev(R, next(R, {{0,1}})) = {:?}", collect(&preimage));

    println!("\n=== Composition and closure ===\n");

    // R2 = { a->b, b->c, b->d, c->e } encoded as u32 (a=0 b=1 c=2 d=3 e=4)
    let r2 = Irel::empty(factory.clone());
    let r2 = r2.add_element(&[0, 1]);
    let r2 = r2.add_element(&[1, 2]);
    let r2 = r2.add_element(&[1, 3]);
    let r2 = r2.add_element(&[2, 4]);

    let composed = r2.compose(&r2);
    println!("R;R  = {:?}", collect(&composed));

    let closed = r2.closure();
    println!("R* = {:?}", collect(&closed));

    println!("\n=== Partition refinement (bisimulation) ===\n");

    // Transition relation T over 4 states, two behaviourally equivalent
    // leaves (2 and 3) that both only reach state 4 (which has no outgoing
    // transitions).
    let t = Irel::empty(factory.clone());
    let t = t.add_element(&[0, 1]);
    let t = t.add_element(&[0, 2]);
    let t = t.add_element(&[1, 3]);
    let t = t.add_element(&[2, 3]);
    let t = t.add_element(&[3, 4]);

    // Initial partition P0: every state starts in block 0.
    let p0 = Srel::empty(factory.clone());
    let p0 = p0.add_element(&[0, 0]);
    let p0 = p0.add_element(&[1, 0]);
    let p0 = p0.add_element(&[2, 0]);
    let p0 = p0.add_element(&[3, 0]);
    let p0 = p0.add_element(&[4, 0]);

    let mut p = p0.clone();
    let mut assigner = BlockAssigner::new();
    let mut round = 0;
    loop {
        round += 1;
        let composed = t.compose_sequential(&p, 1);
        let merged = &composed | &p0;
        let refined = merged.relabel(&mut assigner);
        let stable = refined == p;
        p = refined;
        print_partition(round, &p);
        if stable {
            break;
        }
    }
}

fn print_partition(round: u32, p: &Srel<u32>) {
    let mut rows: Vec<Vec<u32>> = p.iter().collect();
    rows.sort();
    println!("round {round}:");
    for row in rows {
        println!("  state {} -> block {}", row[0], row[1]);
    }
}

fn collect<V: Clone + Eq + std::hash::Hash + Ord + std::fmt::Debug>(rel: &Irel<V>) -> Vec<Vec<V>> {
    let mut rows: Vec<Vec<V>> = rel.iter().collect();
    rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
    rows
}

/// Assigns a fresh block id to each distinct set of blocks a state's
/// successors currently land in, memoising so two states with the same
/// successor-block signature land in the same (not merely equal-looking)
/// fresh id.
struct BlockAssigner {
    seen: HashMap<Vec<u32>, u32>,
    next_id: u32,
}

impl BlockAssigner {
    fn new() -> Self {
        BlockAssigner { seen: HashMap::new(), next_id: 0 }
    }
}

impl Relabeller<u32> for BlockAssigner {
    fn matches(&mut self, _factory: &Factory<u32>, level: usize, node: mdd_engine::NodeId) -> bool {
        level == 1 && node != FALSE
    }

    fn replace(&mut self, factory: &mut Factory<u32>, _level: usize, node: mdd_engine::NodeId) -> mdd_engine::NodeId {
        let mut signature: Vec<u32> = mdd_engine::MddIterator::new(factory, node)
            .map(|path| path[0])
            .collect();
        signature.sort_unstable();
        signature.dedup();
        let next_id = &mut self.next_id;
        let id = *self
            .seen
            .entry(signature)
            .or_insert_with(|| {
                let id = *next_id;
                *next_id += 1;
                id
            });
        factory.add_element(FALSE, &[id])
    }
}
