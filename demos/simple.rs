//! Basic set usage: build-up, membership, iteration, and the operation
//! cache (spec §8.2 S1/S2).
//!
//! Run with: cargo run --example simple

use std::cell::RefCell;
use std::rc::Rc;

use mdd_engine::{Factory, MddSet};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== MDD set build-up ===\n");

    let factory = Rc::new(RefCell::new(Factory::<&'static str>::new()));

    let set = MddSet::empty(factory.clone());
    let set = set.add_element(&["a"]);
    let set = set.add_element(&["a", "b"]);
    let set = set.add_element(&["b", "c"]);
    let set = set.add_element(&["b", "c"]); // duplicate, no-op

    println!("size: {}", set.size());
    println!("contains [a]: {}", set.contains(&["a"]));
    println!("contains [b, c]: {}", set.contains(&["b", "c"]));
    println!("contains [x]: {}", set.contains(&["x"]));

    println!("\nvectors in lexicographic order:");
    for vector in set.iter() {
        println!("  {vector:?}");
    }

    let singleton = MddSet::singleton(factory.clone());
    let empty_vector: [&str; 0] = [];
    let also_singleton = &MddSet::empty(factory.clone()) + &empty_vector;
    assert_eq!(singleton, also_singleton);
    println!("\nsingleton_set == empty_set + []: {}", singleton == also_singleton);

    println!("\n=== Operation cache hit/miss behaviour ===\n");

    let m1 = MddSet::empty(factory.clone()).add_element(&["a"]);
    let m2 = MddSet::empty(factory.clone()).add_element(&["a", "b"]);

    let (hits0, misses0) = (factory.borrow().cache_hits(), factory.borrow().cache_misses());
    let _ = &m1 | &m2; // miss: first evaluation
    let _ = &m2 | &m1; // hit: canonicalised to the same cache key
    let _ = &m1 | &m1; // trivial shortcut, never touches the cache
    let _ = &m2 | &MddSet::empty(factory.clone()); // trivial shortcut
    let _ = &MddSet::empty(factory.clone()) | &m2; // trivial shortcut
    let (hits1, misses1) = (factory.borrow().cache_hits(), factory.borrow().cache_misses());

    println!("hit delta:  {}", hits1 - hits0);
    println!("miss delta: {}", misses1 - misses0);

    drop(set);
    drop(singleton);
    drop(also_singleton);
    drop(m1);
    drop(m2);
    factory.borrow_mut().clear_cache();
    factory.borrow_mut().clean();
    println!("\nnodes remaining after clear_cache + clean: {}", factory.borrow().size());
}
