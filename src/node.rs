//! The link block embedded in heap payloads.
//!
//! A payload joins a heap by embedding a [`HeapNode`] and exposing it
//! through the [`HeapLinked`] trait. The node carries the three tree links,
//! the owning-heap tag, and the insertion-order stamp used to break
//! priority ties. The heap itself stores nothing per element.

use crate::Index;

use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU32, Ordering};

static NEXT_HEAP_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique identity of one heap instance.
///
/// Nodes are tagged with their owner's id on push, which makes membership
/// queries O(1) and catches cross-heap mix-ups in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeapId(NonZeroU32);

impl HeapId {
    /// Allocates the next id.
    ///
    /// Panics once the 32-bit id space is exhausted; that takes four
    /// billion heap constructions in one process.
    pub(crate) fn next() -> Self {
        let raw = NEXT_HEAP_ID.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU32::new(raw).expect("heap id space exhausted"))
    }
}

/// Tree links and bookkeeping embedded in a heap payload.
///
/// A fresh node is fully unlinked. The heap fills in the links on push and
/// resets them on pop/remove, so the node can be reused afterwards.
/// Payload types must not touch these fields through their own code; the
/// only valid interactions are construction and handing out access via
/// [`HeapLinked`].
#[derive(Debug, Clone, Copy)]
pub struct HeapNode<Idx: Index> {
    pub(crate) parent: Idx,
    pub(crate) left: Idx,
    pub(crate) right: Idx,
    pub(crate) heap: Option<HeapId>,
    pub(crate) sequence: u32,
}

impl<Idx: Index> HeapNode<Idx> {
    /// Creates an unlinked node.
    pub const fn new() -> Self {
        Self {
            parent: Idx::NONE,
            left: Idx::NONE,
            right: Idx::NONE,
            heap: None,
            sequence: 0,
        }
    }

    /// Index of the parent node, or [`Index::NONE`] at the root.
    #[inline]
    pub const fn parent(&self) -> Idx {
        self.parent
    }

    /// Index of the left child, or [`Index::NONE`].
    #[inline]
    pub const fn left(&self) -> Idx {
        self.left
    }

    /// Index of the right child, or [`Index::NONE`].
    #[inline]
    pub const fn right(&self) -> Idx {
        self.right
    }

    /// Insertion-order stamp; meaningful only while linked.
    #[inline]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns `true` while the node is linked into a heap.
    #[inline]
    pub const fn is_linked(&self) -> bool {
        self.heap.is_some()
    }
}

impl<Idx: Index> Default for HeapNode<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for payloads that embed a [`HeapNode`].
///
/// The `Ord` impl defines priority (smaller sorts out first) and must
/// ignore the embedded node; ties between equal payloads are broken
/// internally by insertion order, so equal priorities pop FIFO.
///
/// # Example
///
/// ```
/// use linked_heap::{HeapLinked, HeapNode};
/// use std::cmp::Ordering;
///
/// struct Timer {
///     fire_at: u64,
///     callback_id: u32,
///     node: HeapNode<u32>,
/// }
///
/// impl HeapLinked<u32> for Timer {
///     fn heap_node(&self) -> &HeapNode<u32> { &self.node }
///     fn heap_node_mut(&mut self) -> &mut HeapNode<u32> { &mut self.node }
/// }
///
/// impl Ord for Timer {
///     fn cmp(&self, other: &Self) -> Ordering {
///         self.fire_at.cmp(&other.fire_at)
///     }
/// }
///
/// impl PartialOrd for Timer {
///     fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
///         Some(self.cmp(other))
///     }
/// }
///
/// impl PartialEq for Timer {
///     fn eq(&self, other: &Self) -> bool {
///         self.fire_at == other.fire_at
///     }
/// }
///
/// impl Eq for Timer {}
/// ```
pub trait HeapLinked<Idx: Index>: Ord {
    /// Returns the embedded node.
    fn heap_node(&self) -> &HeapNode<Idx>;

    /// Returns the embedded node mutably.
    fn heap_node_mut(&mut self) -> &mut HeapNode<Idx>;

    /// Returns `true` if this payload is currently linked into a heap.
    #[inline]
    fn in_heap(&self) -> bool {
        self.heap_node().is_linked()
    }
}

/// Wraparound-aware ordering on sequence stamps: `a` counts as after `b`
/// when the unsigned distance from `a` up to `b` crosses the halfway
/// point. Valid while fewer than 2^31 stamps separate two live nodes.
#[inline]
pub(crate) const fn sequence_after(a: u32, b: u32) -> bool {
    b.wrapping_sub(a) & 0x8000_0000 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_node_is_unlinked() {
        let node: HeapNode<u32> = HeapNode::new();
        assert!(!node.is_linked());
        assert!(node.parent().is_none());
        assert!(node.left().is_none());
        assert!(node.right().is_none());
        assert_eq!(node.sequence(), 0);

        let default: HeapNode<u32> = HeapNode::default();
        assert!(!default.is_linked());
    }

    #[test]
    fn heap_ids_are_unique() {
        let a = HeapId::next();
        let b = HeapId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn sequence_order_without_wrap() {
        assert!(sequence_after(20, 10));
        assert!(!sequence_after(10, 20));
        assert!(!sequence_after(10, 10));
    }

    #[test]
    fn sequence_order_across_wrap() {
        // A stamp minted just after the counter wrapped still sorts after
        // one minted just before.
        assert!(sequence_after(0, u32::MAX));
        assert!(!sequence_after(u32::MAX, 0));

        assert!(sequence_after(10, u32::MAX - 10));
        assert!(!sequence_after(u32::MAX - 10, 10));

        assert!(sequence_after(u32::MAX / 2 + 10, u32::MAX / 2 - 10));
        assert!(!sequence_after(u32::MAX / 2 - 10, u32::MAX / 2 + 10));
    }
}
