//! Intrusive binary min-heap with external storage and O(log n) removal
//! from anywhere.
//!
//! This crate provides a priority queue for latency-critical systems like
//! timer wheels and order schedulers. The key insight: separate storage
//! from structure, and thread the tree through links embedded in the
//! elements themselves.
//!
//! # Design Philosophy
//!
//! A traditional binary heap owns its data in an array:
//!
//! ```text
//! BinaryHeap<Timer>  - owns timers, no handle to an element once pushed,
//!                      cancelling one means O(n) search + O(n) shift
//! ```
//!
//! This crate inverts the model:
//!
//! ```text
//! Storage (Pool)   - owns data, provides stable indices
//! LinkedHeap       - coordinates indices, doesn't own data
//! HeapNode         - tree links embedded in each element
//! ```
//!
//! Benefits:
//! - **Stable handles**: the index you got at insert stays valid until you
//!   remove the element, no matter what else is pushed or popped
//! - **O(log n) removal from anywhere**: cancel an element by handle, no
//!   search, no position bookkeeping
//! - **Zero allocation on the hot path**: pre-allocate storage at startup;
//!   push, pop, and remove never touch the allocator
//! - **Shared storage**: elements can live in a pool alongside other
//!   structures that reference them
//!
//! There is no backing array. The heap finds the next insertion point and
//! the last occupied position arithmetically, by translating the position
//! number into a root-to-leaf turn sequence ([`TraversePath`]) and walking
//! the embedded links.
//!
//! # Quick Start
//!
//! ```
//! use linked_heap::{HeapLinked, HeapNode, LinkedHeap, Pool, Storage};
//! use std::cmp::Ordering;
//!
//! #[derive(Debug)]
//! struct Timer {
//!     deadline: u64,
//!     node: HeapNode<u32>,
//! }
//!
//! impl HeapLinked<u32> for Timer {
//!     fn heap_node(&self) -> &HeapNode<u32> { &self.node }
//!     fn heap_node_mut(&mut self) -> &mut HeapNode<u32> { &mut self.node }
//! }
//!
//! impl Ord for Timer {
//!     fn cmp(&self, other: &Self) -> Ordering {
//!         self.deadline.cmp(&other.deadline)
//!     }
//! }
//! impl PartialOrd for Timer {
//!     fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
//!         Some(self.cmp(other))
//!     }
//! }
//! impl PartialEq for Timer {
//!     fn eq(&self, other: &Self) -> bool { self.deadline == other.deadline }
//! }
//! impl Eq for Timer {}
//!
//! // Storage owns the timers
//! let mut pool: Pool<Timer> = Pool::with_capacity(1000);
//! // The heap coordinates indices into storage
//! let mut heap: LinkedHeap<u32> = LinkedHeap::new();
//!
//! let t1 = pool.try_insert(Timer { deadline: 100, node: HeapNode::new() }).unwrap();
//! let t2 = pool.try_insert(Timer { deadline: 50, node: HeapNode::new() }).unwrap();
//!
//! heap.push(&mut pool, t1);
//! heap.push(&mut pool, t2);
//!
//! // Next timer to fire
//! assert_eq!(heap.peek(), Some(t2));
//!
//! // Cancel by handle - O(log n), no search
//! heap.remove(&mut pool, t1);
//! ```
//!
//! For single-structure use, [`OwnedHeap`] bundles the pool and the heap
//! behind one value-oriented API.
//!
//! # Critical Invariant: Same Storage Instance
//!
//! All operations on a heap must use the same storage instance. This is
//! the caller's responsibility (same discipline as the `slab` crate).
//! Passing a different storage causes link corruption.
//!
//! Equal priorities pop in insertion order: every push stamps the element
//! with a sequence number, and ties are broken by the stamp. The FIFO
//! guarantee holds as long as fewer than 2^31 pushes separate two live
//! elements.
//!
//! # Storage Options
//!
//! | Storage | Capacity | Allocation | Use Case |
//! |---------|----------|------------|----------|
//! | [`Pool`] | Fixed (runtime) | Single heap alloc | Default choice |
//! | `slab::Slab` | Growable | May reallocate | When size unknown |
//!
//! Enable the `slab` feature for the `slab::Slab` backend, or implement
//! [`Storage`] for your own.
//!
//! # Feature Flags
//!
//! - `slab` - Enable [`Storage`] impl for `slab::Slab`
//! - `verify-mutations` - Re-check every heap invariant after each
//!   mutating operation (debugging aid; O(n) per mutation)

#![warn(missing_docs)]

pub mod heap;
pub mod index;
pub mod node;
pub mod owned;
pub mod path;
pub mod storage;

pub use heap::{LinkedHeap, VerifyError};
pub use index::Index;
pub use node::{HeapLinked, HeapNode};
pub use owned::{DrainWhile, OwnedHeap};
pub use path::{Side, TraversePath};
pub use storage::{Full, Pool, Storage};
