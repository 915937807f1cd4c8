//! Pointer-linked binary min-heap with O(log n) removal by handle.
//!
//! Unlike an array heap, the tree is held together entirely by the links
//! embedded in each payload; there is no backing array to reindex. A caller
//! holding a storage index can cancel that element from the middle of the
//! queue in O(log n), with no search and no position bookkeeping.
//!
//! The shape invariant (complete tree, last level filled left to right) is
//! maintained arithmetically: the next insertion point and the last
//! occupied position are found by translating the position number into a
//! root-to-leaf turn sequence and walking it.

use crate::node::{HeapId, HeapLinked, HeapNode, sequence_after};
use crate::path::{Side, TraversePath};
use crate::{Index, Storage};

use core::cmp::Ordering;
use core::fmt;

/// Consistency violations reported by [`LinkedHeap::verify`].
///
/// Nodes are identified by their raw storage slot (`Index::as_usize`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Reachable node count does not match the heap's recorded size.
    CountMismatch {
        /// Size the heap believes it has.
        declared: usize,
        /// Nodes actually reachable from the root.
        counted: usize,
    },
    /// A linked index no longer resolves in storage.
    Dangling {
        /// Slot of the missing node.
        node: usize,
    },
    /// A reachable node is not tagged as belonging to this heap.
    NotOwned {
        /// Slot of the foreign node.
        node: usize,
    },
    /// The root still carries a parent link.
    RootHasParent {
        /// Slot of the root node.
        node: usize,
    },
    /// A child's parent link does not point back at its actual parent.
    BadParentLink {
        /// Slot of the actual parent.
        parent: usize,
        /// Slot of the child with the stale link.
        child: usize,
    },
    /// A parent orders after its child.
    OrderViolation {
        /// Slot of the offending parent.
        parent: usize,
        /// Slot of the child it should precede.
        child: usize,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { declared, counted } => write!(
                f,
                "reachable node count {counted} does not match declared size {declared}"
            ),
            Self::Dangling { node } => {
                write!(f, "node {node} is linked but missing from storage")
            }
            Self::NotOwned { node } => {
                write!(f, "node {node} is not tagged as owned by this heap")
            }
            Self::RootHasParent { node } => write!(f, "root node {node} has a parent link"),
            Self::BadParentLink { parent, child } => {
                write!(f, "node {child} does not link back to its parent {parent}")
            }
            Self::OrderViolation { parent, child } => {
                write!(f, "node {parent} orders after its child {child}")
            }
        }
    }
}

impl std::error::Error for VerifyError {}

/// Where a tree position attaches: the root slot, or one child slot of a
/// parent node. Writing an index through a slot is the only way the tree
/// gains or loses a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot<Idx> {
    Root,
    Child { parent: Idx, side: Side },
}

/// A binary min-heap threaded through caller-owned storage.
///
/// The heap itself stores only the root index, the size, and a version
/// counter. Elements live in external storage, embed a [`HeapNode`], and
/// are addressed by index; push links an element in, pop/remove unlink it
/// and hand the index back. Equal priorities pop in insertion order.
///
/// All operations on one heap must use one storage instance; that is the
/// caller's responsibility (same discipline as the `slab` crate).
///
/// # Example
///
/// ```
/// use linked_heap::{HeapLinked, HeapNode, LinkedHeap, Pool, Storage};
/// use std::cmp::Ordering;
///
/// #[derive(Debug)]
/// struct Job {
///     priority: u32,
///     name: &'static str,
///     node: HeapNode<u32>,
/// }
///
/// impl Job {
///     fn new(priority: u32, name: &'static str) -> Self {
///         Self { priority, name, node: HeapNode::new() }
///     }
/// }
///
/// impl HeapLinked<u32> for Job {
///     fn heap_node(&self) -> &HeapNode<u32> { &self.node }
///     fn heap_node_mut(&mut self) -> &mut HeapNode<u32> { &mut self.node }
/// }
///
/// impl Ord for Job {
///     fn cmp(&self, other: &Self) -> Ordering {
///         self.priority.cmp(&other.priority)
///     }
/// }
/// impl PartialOrd for Job {
///     fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
///         Some(self.cmp(other))
///     }
/// }
/// impl PartialEq for Job {
///     fn eq(&self, other: &Self) -> bool {
///         self.priority == other.priority
///     }
/// }
/// impl Eq for Job {}
///
/// let mut pool: Pool<Job> = Pool::with_capacity(16);
/// let mut heap: LinkedHeap<u32> = LinkedHeap::new();
///
/// let a = pool.try_insert(Job::new(10, "low")).unwrap();
/// let b = pool.try_insert(Job::new(1, "high")).unwrap();
/// let c = pool.try_insert(Job::new(5, "medium")).unwrap();
///
/// heap.push(&mut pool, a);
/// heap.push(&mut pool, b);
/// heap.push(&mut pool, c);
///
/// // Pops in priority order.
/// let idx = heap.pop(&mut pool).unwrap();
/// assert_eq!(pool.get(idx).unwrap().name, "high");
///
/// // Cancel from the middle by handle, no search.
/// assert!(heap.remove(&mut pool, a));
/// let idx = heap.pop(&mut pool).unwrap();
/// assert_eq!(pool.get(idx).unwrap().name, "medium");
/// assert!(heap.is_empty());
/// ```
#[derive(Debug)]
pub struct LinkedHeap<Idx: Index> {
    root: Idx,
    size: usize,
    /// Bumped on every structural mutation; also the sequence stamp source.
    mod_count: u32,
    id: HeapId,
}

impl<Idx: Index> Default for LinkedHeap<Idx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Idx: Index> LinkedHeap<Idx> {
    /// Creates an empty heap with a fresh identity tag.
    pub fn new() -> Self {
        Self {
            root: Idx::NONE,
            size: 0,
            mod_count: 0,
            id: HeapId::next(),
        }
    }

    /// Returns the number of elements in the heap.
    #[inline]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the heap is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the version stamp, bumped by every structural mutation
    /// (wrapping). Reads never change it, so two equal stamps taken around
    /// a stretch of code prove the heap was not modified in between.
    #[inline]
    pub const fn version(&self) -> u32 {
        self.mod_count
    }

    /// Returns the index of the minimum element without unlinking it.
    ///
    /// Returns `None` if the heap is empty.
    #[inline]
    pub fn peek(&self) -> Option<Idx> {
        if self.size > 0 {
            debug_assert!(self.root.is_some(), "non-empty heap must have a root");
            Some(self.root)
        } else {
            None
        }
    }

    /// Returns `true` if the element at `idx` is linked into this heap.
    ///
    /// O(1): the element's owner tag is compared, nothing is searched.
    #[inline]
    pub fn contains<T, S>(&self, storage: &S, idx: Idx) -> bool
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        storage
            .get(idx)
            .is_some_and(|entry| entry.heap_node().heap == Some(self.id))
    }

    /// Returns the element occupying tree position `position`.
    ///
    /// Positions number the tree level by level, left to right; position 0
    /// is the root and position `len() - 1` the last leaf. O(log n).
    ///
    /// Returns `None` if `position >= len()`.
    pub fn node_at<T, S>(&self, storage: &S, position: usize) -> Option<Idx>
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if position >= self.size {
            return None;
        }
        let slot = self.locate(storage, position)?;
        let idx = self.slot_get(storage, slot);
        debug_assert!(idx.is_some(), "occupied position resolved to an empty slot");
        if idx.is_none() { None } else { Some(idx) }
    }

    /// Links the element at `idx` into the heap.
    ///
    /// The element must already exist in storage with its node in the
    /// unlinked state (freshly constructed, or cleared by a previous
    /// pop/remove). It is stamped with the current version so that equal
    /// priorities pop in push order.
    ///
    /// O(log n): one slot walk plus the sift toward the root.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage, and in debug builds if the
    /// element is already linked into a heap (release builds leave the
    /// heap untouched instead).
    pub fn push<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let already = storage.get(idx).expect("invalid index").heap_node().heap;
        debug_assert!(already.is_none(), "node is already linked into a heap");
        if already.is_some() {
            return;
        }

        // The empty slot one past the last leaf.
        let slot = self
            .locate(storage, self.size)
            .expect("next leaf slot must resolve");
        let parent = match slot {
            Slot::Root => Idx::NONE,
            Slot::Child { parent, .. } => parent,
        };

        self.slot_set(storage, slot, idx);
        {
            let n = node_mut(storage, idx);
            n.heap = Some(self.id);
            n.parent = parent;
            n.sequence = self.mod_count;
        }
        self.size += 1;
        self.mod_count = self.mod_count.wrapping_add(1);

        self.sift_up(storage, idx);
        self.verify_after_mutation(storage);
    }

    /// Unlinks and returns the index of the minimum element.
    ///
    /// The element stays in storage; only its node is cleared. Returns
    /// `None` if the heap is empty.
    pub fn pop<T, S>(&mut self, storage: &mut S) -> Option<Idx>
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let top = self.peek()?;
        self.remove(storage, top);
        Some(top)
    }

    /// Unlinks the element at `idx` from anywhere in the heap.
    ///
    /// The last leaf takes over the vacated position and is sifted to
    /// where it belongs, so the cost is O(log n) regardless of where the
    /// removed element sat. The element stays in storage with its node
    /// cleared, ready for a future push.
    ///
    /// Returns `true` if the element was linked into this heap and has
    /// been removed.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the element is linked into a different
    /// heap or not linked at all (release builds return `false` instead).
    pub fn remove<T, S>(&mut self, storage: &mut S, idx: Idx) -> bool
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let Some(entry) = storage.get(idx) else {
            return false;
        };
        let owner = entry.heap_node().heap;
        debug_assert!(owner == Some(self.id), "node is not linked into this heap");
        if owner != Some(self.id) {
            return false;
        }

        self.size -= 1;
        self.mod_count = self.mod_count.wrapping_add(1);

        if self.size > 0 {
            // Position `size` is the last leaf of the pre-removal tree.
            let last_slot = self
                .locate(storage, self.size)
                .expect("last position must resolve");
            let last = self.slot_get(storage, last_slot);
            debug_assert!(last.is_some(), "last position resolved to an empty slot");

            self.swap_nodes(storage, idx, last);

            // The removed node now sits at the old last position; detach it
            // from its parent. Its own links are cleared below.
            let parent = node(storage, idx).parent;
            match child_side(storage, parent, idx) {
                Some(Side::Left) => node_mut(storage, parent).left = Idx::NONE,
                Some(Side::Right) => node_mut(storage, parent).right = Idx::NONE,
                None => return false,
            }

            self.sift_down(storage, last);
            self.sift_up(storage, last);
        } else {
            self.root = Idx::NONE;
        }

        let n = node_mut(storage, idx);
        n.left = Idx::NONE;
        n.right = Idx::NONE;
        n.parent = Idx::NONE;
        n.heap = None;
        n.sequence = 0;

        self.verify_after_mutation(storage);
        true
    }

    /// Restores heap order after an element's priority decreased.
    ///
    /// Call this after editing the payload in place to a *smaller* value.
    /// Counts as a structural mutation for [`version`](Self::version).
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage, and in debug builds if the
    /// element is not linked into this heap.
    pub fn decrease_key<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let owner = storage.get(idx).expect("invalid index").heap_node().heap;
        debug_assert!(owner == Some(self.id), "node is not linked into this heap");
        if owner != Some(self.id) {
            return;
        }
        self.mod_count = self.mod_count.wrapping_add(1);
        self.sift_up(storage, idx);
        self.verify_after_mutation(storage);
    }

    /// Restores heap order after an element's priority increased.
    ///
    /// Call this after editing the payload in place to a *larger* value.
    /// Counts as a structural mutation for [`version`](Self::version).
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage, and in debug builds if the
    /// element is not linked into this heap.
    pub fn increase_key<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let owner = storage.get(idx).expect("invalid index").heap_node().heap;
        debug_assert!(owner == Some(self.id), "node is not linked into this heap");
        if owner != Some(self.id) {
            return;
        }
        self.mod_count = self.mod_count.wrapping_add(1);
        self.sift_down(storage, idx);
        self.verify_after_mutation(storage);
    }

    /// Restores heap order after an element's priority changed in an
    /// unknown direction. Slightly slower than the directional variants.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is not valid in storage, and in debug builds if the
    /// element is not linked into this heap.
    pub fn update_key<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let owner = storage.get(idx).expect("invalid index").heap_node().heap;
        debug_assert!(owner == Some(self.id), "node is not linked into this heap");
        if owner != Some(self.id) {
            return;
        }
        self.mod_count = self.mod_count.wrapping_add(1);
        self.sift_down(storage, idx);
        self.sift_up(storage, idx);
        self.verify_after_mutation(storage);
    }

    /// Unlinks every element, leaving all nodes cleared for reuse.
    ///
    /// The elements stay in storage. O(n).
    pub fn clear<T, S>(&mut self, storage: &mut S)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if self.size == 0 {
            return;
        }

        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            let n = node_mut(storage, idx);
            let (left, right) = (n.left, n.right);
            n.parent = Idx::NONE;
            n.left = Idx::NONE;
            n.right = Idx::NONE;
            n.heap = None;
            n.sequence = 0;
            if left.is_some() {
                stack.push(left);
            }
            if right.is_some() {
                stack.push(right);
            }
        }

        self.root = Idx::NONE;
        self.size = 0;
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    /// Checks every structural invariant and reports the first violation.
    ///
    /// Walks the whole tree iteratively (an explicit stack, not
    /// recursion), checking the node count, ownership tags, parent
    /// back-links, and heap order, in that order. O(n); intended for
    /// tests and debugging, not hot paths.
    pub fn verify<T, S>(&self, storage: &S) -> Result<(), VerifyError>
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let mut stack: Vec<Idx> = Vec::new();

        // Count every node reachable from the root. Bailing out as soon as
        // the count exceeds the declared size keeps a corrupted link cycle
        // from walking forever.
        let mut counted = 0usize;
        if self.root.is_some() {
            stack.push(self.root);
        }
        while let Some(idx) = stack.pop() {
            counted += 1;
            if counted > self.size {
                return Err(VerifyError::CountMismatch {
                    declared: self.size,
                    counted,
                });
            }
            let Some(entry) = storage.get(idx) else {
                return Err(VerifyError::Dangling {
                    node: idx.as_usize(),
                });
            };
            let n = *entry.heap_node();
            if n.left.is_some() {
                stack.push(n.left);
            }
            if n.right.is_some() {
                stack.push(n.right);
            }
        }
        if counted != self.size {
            return Err(VerifyError::CountMismatch {
                declared: self.size,
                counted,
            });
        }

        // Ownership tags and parent back-links.
        if self.root.is_some() {
            stack.push(self.root);
        }
        while let Some(idx) = stack.pop() {
            let n = node(storage, idx);
            if n.heap != Some(self.id) {
                return Err(VerifyError::NotOwned {
                    node: idx.as_usize(),
                });
            }
            if idx == self.root && n.parent.is_some() {
                return Err(VerifyError::RootHasParent {
                    node: idx.as_usize(),
                });
            }
            for child in [n.left, n.right] {
                if child.is_some() {
                    if node(storage, child).parent != idx {
                        return Err(VerifyError::BadParentLink {
                            parent: idx.as_usize(),
                            child: child.as_usize(),
                        });
                    }
                    stack.push(child);
                }
            }
        }

        // Heap order along every parent link.
        if self.root.is_some() {
            stack.push(self.root);
        }
        while let Some(idx) = stack.pop() {
            let n = node(storage, idx);
            if n.parent.is_some() && order(storage, n.parent, idx).is_gt() {
                return Err(VerifyError::OrderViolation {
                    parent: n.parent.as_usize(),
                    child: idx.as_usize(),
                });
            }
            if n.left.is_some() {
                stack.push(n.left);
            }
            if n.right.is_some() {
                stack.push(n.right);
            }
        }

        Ok(())
    }

    /// Renders the tree sideways for debugging: the right subtree above
    /// its parent, the left below, 10 columns of indent per level.
    /// Payloads are written with their `Debug` impl.
    pub fn render_tree<T, S>(&self, storage: &S) -> String
    where
        T: HeapLinked<Idx> + fmt::Debug,
        S: Storage<T, Index = Idx>,
    {
        use fmt::Write as _;

        let mut out = String::new();
        let mut stack: Vec<(Idx, usize)> = Vec::new();
        let mut cur = self.root;
        let mut depth = 0usize;

        // Reverse in-order, so the output reads as the tree rotated a
        // quarter turn counterclockwise.
        loop {
            while cur.is_some() {
                stack.push((cur, depth));
                cur = node(storage, cur).right;
                depth += 1;
            }
            let Some((idx, d)) = stack.pop() else {
                break;
            };
            let payload = storage.get(idx).expect("invalid index");
            let _ = writeln!(out, "{:indent$}{payload:?}", "", indent = d * 10);
            cur = node(storage, idx).left;
            depth = d + 1;
        }
        out
    }

    // ------------------------------------------------------------------
    // Position machinery
    // ------------------------------------------------------------------

    /// Resolves tree position `position` to the slot that holds it.
    ///
    /// `position == size` resolves to the empty slot where the next push
    /// lands. Returns `None` when `position > size`.
    fn locate<T, S>(&self, storage: &S, position: usize) -> Option<Slot<Idx>>
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if position > self.size {
            return None;
        }

        let mut slot = Slot::Root;
        for side in TraversePath::from_index(position).steps() {
            let parent = self.slot_get(storage, slot);
            debug_assert!(parent.is_some(), "interior node missing on traverse path");
            if parent.is_none() {
                return None;
            }
            slot = Slot::Child { parent, side };
        }
        Some(slot)
    }

    /// Reads the occupant of a slot, [`Index::NONE`] if empty.
    fn slot_get<T, S>(&self, storage: &S, slot: Slot<Idx>) -> Idx
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        match slot {
            Slot::Root => self.root,
            Slot::Child { parent, side } => {
                let p = node(storage, parent);
                match side {
                    Side::Left => p.left,
                    Side::Right => p.right,
                }
            }
        }
    }

    /// Writes `value` into a slot.
    fn slot_set<T, S>(&mut self, storage: &mut S, slot: Slot<Idx>, value: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        match slot {
            Slot::Root => self.root = value,
            Slot::Child { parent, side } => {
                let p = node_mut(storage, parent);
                match side {
                    Side::Left => p.left = value,
                    Side::Right => p.right = value,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Swap engine
    // ------------------------------------------------------------------

    /// Exchanges the tree positions of two linked nodes.
    fn swap_nodes<T, S>(&mut self, storage: &mut S, a: Idx, b: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let an = node(storage, a);
        let bn = node(storage, b);

        debug_assert!(an.heap == bn.heap, "nodes belong to different heaps");
        if an.heap != bn.heap {
            return;
        }
        debug_assert!(
            an.heap == Some(self.id),
            "nodes are not linked into this heap"
        );
        if an.heap != Some(self.id) {
            return;
        }
        if a == b {
            return;
        }

        if an.parent == b {
            self.swap_with_parent(storage, a);
        } else if bn.parent == a {
            self.swap_with_parent(storage, b);
        } else {
            self.swap_non_adjacent(storage, a, b);
        }
    }

    /// Exchanges a node with its parent, rewiring up to ten links: the
    /// grandparent's child slot, both nodes' parent links, the adopted
    /// children's back-links, and the sibling.
    fn swap_with_parent<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let n = node(storage, idx);
        debug_assert!(
            n.heap == Some(self.id),
            "node is not linked into this heap"
        );
        if n.heap != Some(self.id) {
            return;
        }

        let parent = n.parent;
        if parent.is_none() {
            return;
        }
        let p = node(storage, parent);
        let parent_was_root = parent == self.root;

        let grandparent_side = if p.parent.is_some() {
            match child_side(storage, p.parent, parent) {
                Some(side) => Some(side),
                // Inconsistent links; already reported by the debug assert.
                None => return,
            }
        } else {
            None
        };

        node_mut(storage, idx).parent = p.parent;
        if let Some(side) = grandparent_side {
            let gp = node_mut(storage, p.parent);
            match side {
                Side::Left => gp.left = idx,
                Side::Right => gp.right = idx,
            }
        }
        node_mut(storage, parent).parent = idx;

        // The demoted parent adopts the rising node's children.
        if n.left.is_some() {
            node_mut(storage, n.left).parent = parent;
        }
        if n.right.is_some() {
            node_mut(storage, n.right).parent = parent;
        }
        {
            let pm = node_mut(storage, parent);
            pm.right = n.right;
            pm.left = n.left;
        }

        // The rising node keeps its old sibling on the side it came from.
        if idx == p.left {
            {
                let nm = node_mut(storage, idx);
                nm.left = parent;
                nm.right = p.right;
            }
            if p.right.is_some() {
                node_mut(storage, p.right).parent = idx;
            }
        } else {
            {
                let nm = node_mut(storage, idx);
                nm.right = parent;
                nm.left = p.left;
            }
            if p.left.is_some() {
                node_mut(storage, p.left).parent = idx;
            }
        }

        if parent_was_root {
            self.root = idx;
        }
    }

    /// Exchanges two nodes that are neither identical nor parent/child.
    /// With no shared links between the two neighborhoods, the two sets of
    /// saved links can simply be cross-assigned.
    fn swap_non_adjacent<T, S>(&mut self, storage: &mut S, a: Idx, b: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        let an = node(storage, a);
        let bn = node(storage, b);

        debug_assert!(an.heap == bn.heap, "nodes belong to different heaps");
        if an.heap != bn.heap {
            return;
        }
        debug_assert!(
            an.heap == Some(self.id),
            "nodes are not linked into this heap"
        );
        if an.heap != Some(self.id) {
            return;
        }
        debug_assert!(an.parent != b && bn.parent != a, "nodes are adjacent");
        if an.parent == b || bn.parent == a {
            return;
        }

        let a_from_parent = if an.parent.is_some() {
            match child_side(storage, an.parent, a) {
                Some(side) => Some(side),
                None => return,
            }
        } else {
            None
        };
        let b_from_parent = if bn.parent.is_some() {
            match child_side(storage, bn.parent, b) {
                Some(side) => Some(side),
                None => return,
            }
        } else {
            None
        };

        // a takes over b's neighborhood.
        node_mut(storage, a).left = bn.left;
        if bn.left.is_some() {
            node_mut(storage, bn.left).parent = a;
        }
        node_mut(storage, a).right = bn.right;
        if bn.right.is_some() {
            node_mut(storage, bn.right).parent = a;
        }
        node_mut(storage, a).parent = bn.parent;
        if let Some(side) = b_from_parent {
            let bp = node_mut(storage, bn.parent);
            match side {
                Side::Left => bp.left = a,
                Side::Right => bp.right = a,
            }
        }

        // b takes over a's neighborhood.
        node_mut(storage, b).left = an.left;
        if an.left.is_some() {
            node_mut(storage, an.left).parent = b;
        }
        node_mut(storage, b).right = an.right;
        if an.right.is_some() {
            node_mut(storage, an.right).parent = b;
        }
        node_mut(storage, b).parent = an.parent;
        if let Some(side) = a_from_parent {
            let ap = node_mut(storage, an.parent);
            match side {
                Side::Left => ap.left = b,
                Side::Right => ap.right = b,
            }
        }

        if self.root == a {
            self.root = b;
        } else if self.root == b {
            self.root = a;
        }
    }

    // ------------------------------------------------------------------
    // Sift operations
    // ------------------------------------------------------------------

    /// Swaps the node with its parent until the parent orders first.
    fn sift_up<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        loop {
            let parent = node(storage, idx).parent;
            if parent.is_none() {
                break;
            }
            if order(storage, idx, parent).is_gt() {
                break;
            }
            self.swap_with_parent(storage, idx);
        }
    }

    /// Swaps the smaller child up past the node until neither child
    /// orders before it.
    fn sift_down<T, S>(&mut self, storage: &mut S, idx: Idx)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        // A tree of depth usize::BITS would be past addressable memory;
        // the bound stops a corrupted link cycle from walking forever.
        for _ in 0..usize::BITS {
            let n = node(storage, idx);
            let mut smallest = idx;
            if n.left.is_some() && order(storage, n.left, smallest).is_lt() {
                smallest = n.left;
            }
            if n.right.is_some() && order(storage, n.right, smallest).is_lt() {
                smallest = n.right;
            }
            if smallest == idx {
                return;
            }
            self.swap_with_parent(storage, smallest);
        }
        debug_assert!(false, "sift-down exceeded the depth bound");
    }

    #[cfg(feature = "verify-mutations")]
    fn verify_after_mutation<T, S>(&self, storage: &S)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
        if let Err(err) = self.verify(storage) {
            panic!("heap invariant violated after mutation: {err}");
        }
    }

    #[cfg(not(feature = "verify-mutations"))]
    #[inline(always)]
    fn verify_after_mutation<T, S>(&self, _storage: &S)
    where
        T: HeapLinked<Idx>,
        S: Storage<T, Index = Idx>,
    {
    }
}

/// Reads a copy of the node embedded at `idx`.
#[inline]
fn node<Idx, T, S>(storage: &S, idx: Idx) -> HeapNode<Idx>
where
    Idx: Index,
    T: HeapLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    *storage.get(idx).expect("invalid index").heap_node()
}

/// Borrows the node embedded at `idx` mutably.
#[inline]
fn node_mut<'a, Idx, T, S>(storage: &'a mut S, idx: Idx) -> &'a mut HeapNode<Idx>
where
    Idx: Index,
    T: HeapLinked<Idx> + 'a,
    S: Storage<T, Index = Idx>,
{
    storage.get_mut(idx).expect("invalid index").heap_node_mut()
}

/// Which child slot of `parent` references `child`.
///
/// Returns `None` for an unset parent, and (with a debug assert) when the
/// parent links to neither side, which means the tree is inconsistent.
fn child_side<Idx, T, S>(storage: &S, parent: Idx, child: Idx) -> Option<Side>
where
    Idx: Index,
    T: HeapLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    if parent.is_none() {
        return None;
    }
    let p = node(storage, parent);
    if p.left == child {
        Some(Side::Left)
    } else if p.right == child {
        Some(Side::Right)
    } else {
        debug_assert!(false, "parent does not link to the expected child");
        None
    }
}

/// Total order over linked nodes: payload priority first, insertion
/// sequence as the tie-break. Distinct nodes never compare equal, which
/// makes extraction order deterministic.
fn order<Idx, T, S>(storage: &S, a: Idx, b: Idx) -> Ordering
where
    Idx: Index,
    T: HeapLinked<Idx>,
    S: Storage<T, Index = Idx>,
{
    if a == b {
        return Ordering::Equal;
    }
    let pa = storage.get(a).expect("invalid index");
    let pb = storage.get(b).expect("invalid index");
    let by_priority = pa.cmp(pb);
    if by_priority != Ordering::Equal {
        return by_priority;
    }

    let (sa, sb) = (pa.heap_node().sequence, pb.heap_node().sequence);
    if sa == sb {
        debug_assert!(false, "distinct nodes with identical sequence stamps");
        return Ordering::Equal;
    }
    if sequence_after(sa, sb) {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}
