//! # mdd-engine - Multi-valued Decision Diagram engine
//!
//! A compact, canonical, maximally-shared representation of sets of
//! fixed-width vectors over a totally ordered value domain, together with a
//! library of set-theoretic and relational operations over it: union,
//! intersection, difference, projection, relation composition, image and
//! pre-image under a relation, transitive closure, and partition-refinement
//! relabelling.
//!
//! ## Design
//!
//! - **Hash-consed storage**: a [`Factory<V>`](factory::Factory) owns every
//!   node for one family of diagrams; structurally equal nodes are the same
//!   [`NodeId`](node::NodeId), so set equality is a pointer comparison.
//! - **Reference-counted lifecycle**: nodes are born at count 1, `use`/
//!   `unuse`d by every operation that touches them, and can be revived from
//!   a zero count before an explicit [`Factory::clean`](factory::Factory::clean)
//!   sweeps them away.
//! - **Memoised recursion**: every binary operation consults a shared
//!   operation cache keyed on `(operation, operand, operand, projection)`
//!   before recursing, so cost tracks diagram size rather than set size.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use mdd_engine::factory::Factory;
//! use mdd_engine::wrappers::MddSet;
//!
//! let factory = Rc::new(RefCell::new(Factory::<u32>::new()));
//! let a = MddSet::empty(factory.clone()).add_element(&[1, 2]);
//! let b = MddSet::empty(factory).add_element(&[1, 3]);
//! let both = &a | &b;
//! assert!(both.contains(&[1, 2]));
//! assert!(both.contains(&[1, 3]));
//! assert_eq!(both.size(), 2.0);
//! ```

pub mod error;
pub mod factory;
pub mod iter;
pub mod node;
pub mod ops;
pub mod wrappers;

pub use error::{MddError, Result};
pub use factory::Factory;
pub use iter::MddIterator;
pub use node::{NodeId, FALSE, TRUE};
pub use ops::projection::Projection;
pub use ops::relabel::Relabeller;
pub use wrappers::{FactoryHandle, Irel, MddSet, Srel};
