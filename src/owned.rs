//! OwnedHeap - a linked heap that owns its storage.

use crate::heap::VerifyError;
use crate::storage::{Full, Pool};
use crate::{HeapLinked, Index, LinkedHeap, Storage};

/// A linked heap that owns its storage.
///
/// This is a convenience wrapper around [`LinkedHeap`] + [`Pool`] for
/// cases where you don't need to share storage across multiple data
/// structures. Push takes the value, pop and remove hand it back; the
/// index returned by push stays valid until the element leaves the heap.
///
/// For shared storage scenarios (e.g., timers that also sit on a list),
/// use [`LinkedHeap`] directly with external storage.
///
/// # Example
///
/// ```
/// use linked_heap::{HeapLinked, HeapNode, OwnedHeap};
/// use std::cmp::Ordering;
///
/// #[derive(Debug)]
/// struct Task {
///     priority: u32,
///     node: HeapNode<u32>,
/// }
///
/// impl Task {
///     fn new(priority: u32) -> Self {
///         Self { priority, node: HeapNode::new() }
///     }
/// }
///
/// impl HeapLinked<u32> for Task {
///     fn heap_node(&self) -> &HeapNode<u32> { &self.node }
///     fn heap_node_mut(&mut self) -> &mut HeapNode<u32> { &mut self.node }
/// }
///
/// impl Ord for Task {
///     fn cmp(&self, other: &Self) -> Ordering {
///         self.priority.cmp(&other.priority)
///     }
/// }
/// impl PartialOrd for Task {
///     fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
///         Some(self.cmp(other))
///     }
/// }
/// impl PartialEq for Task {
///     fn eq(&self, other: &Self) -> bool { self.priority == other.priority }
/// }
/// impl Eq for Task {}
///
/// let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(100);
///
/// heap.try_push(Task::new(5)).unwrap();
/// heap.try_push(Task::new(1)).unwrap();
/// let c = heap.try_push(Task::new(3)).unwrap();
///
/// assert_eq!(heap.len(), 3);
/// assert_eq!(heap.peek().unwrap().priority, 1);
///
/// // Cancel from the middle by handle
/// assert_eq!(heap.remove(c).unwrap().priority, 3);
///
/// // Pop minimum
/// assert_eq!(heap.pop().unwrap().priority, 1);
/// assert_eq!(heap.pop().unwrap().priority, 5);
/// assert!(heap.pop().is_none());
/// ```
pub struct OwnedHeap<T: HeapLinked<Idx>, Idx: Index = u32> {
    storage: Pool<T, Idx>,
    heap: LinkedHeap<Idx>,
}

impl<T: HeapLinked<Idx>, Idx: Index> OwnedHeap<T, Idx> {
    /// Creates a new heap with the given capacity.
    ///
    /// Capacity is rounded up to the next power of 2.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Pool::with_capacity(capacity),
            heap: LinkedHeap::new(),
        }
    }

    /// Returns the number of elements in the heap.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if the heap is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the storage capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Returns the version stamp, bumped by every structural mutation.
    ///
    /// See [`LinkedHeap::version`].
    #[inline]
    pub fn version(&self) -> u32 {
        self.heap.version()
    }

    // ========================================================================
    // Insert operations
    // ========================================================================

    /// Pushes a value onto the heap.
    ///
    /// Returns the index of the inserted element, which can be used for
    /// O(1) access, O(log n) removal, or priority updates.
    ///
    /// # Errors
    ///
    /// Returns `Err(Full(value))` if storage is full.
    pub fn try_push(&mut self, value: T) -> Result<Idx, Full<T>> {
        let idx = self.storage.try_insert(value)?;
        self.heap.push(&mut self.storage, idx);
        Ok(idx)
    }

    // ========================================================================
    // Remove operations
    // ========================================================================

    /// Removes and returns the minimum element.
    ///
    /// Returns `None` if the heap is empty.
    pub fn pop(&mut self) -> Option<T> {
        let idx = self.heap.pop(&mut self.storage)?;
        self.storage.remove(idx)
    }

    /// Removes and returns the element at the given index.
    ///
    /// Returns `None` if the index is invalid or not in the heap.
    pub fn remove(&mut self, idx: Idx) -> Option<T> {
        if !self.heap.contains(&self.storage, idx) {
            return None;
        }
        self.heap.remove(&mut self.storage, idx);
        self.storage.remove(idx)
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Returns a reference to the minimum element.
    ///
    /// Returns `None` if the heap is empty.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        self.storage.get(self.heap.peek()?)
    }

    /// Returns the index of the minimum element.
    ///
    /// Returns `None` if the heap is empty.
    #[inline]
    pub fn peek_idx(&self) -> Option<Idx> {
        self.heap.peek()
    }

    /// Returns a reference to the element at the given index.
    ///
    /// Returns `None` if the index is invalid.
    #[inline]
    pub fn get(&self, idx: Idx) -> Option<&T> {
        self.storage.get(idx)
    }

    /// Returns a mutable reference to the element at the given index.
    ///
    /// **Warning:** Modifying the value may violate the heap property.
    /// Call the appropriate key update method after modification:
    /// - [`decrease_key`](Self::decrease_key) if priority decreased
    /// - [`increase_key`](Self::increase_key) if priority increased
    /// - [`update_key`](Self::update_key) if direction unknown
    #[inline]
    pub fn get_mut(&mut self, idx: Idx) -> Option<&mut T> {
        self.storage.get_mut(idx)
    }

    /// Returns `true` if the index is valid and the element is in the heap.
    #[inline]
    pub fn contains(&self, idx: Idx) -> bool {
        self.heap.contains(&self.storage, idx)
    }

    // ========================================================================
    // Priority updates
    // ========================================================================

    /// Restores heap order after decreasing an element's priority.
    ///
    /// Call this after modifying an element to a *smaller* value.
    /// This is O(log n) but faster than [`update_key`](Self::update_key)
    /// when you know the direction of change.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is invalid.
    #[inline]
    pub fn decrease_key(&mut self, idx: Idx) {
        self.heap.decrease_key(&mut self.storage, idx);
    }

    /// Restores heap order after increasing an element's priority.
    ///
    /// Call this after modifying an element to a *larger* value.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is invalid.
    #[inline]
    pub fn increase_key(&mut self, idx: Idx) {
        self.heap.increase_key(&mut self.storage, idx);
    }

    /// Restores heap order after modifying an element's priority in an
    /// unknown direction. Slightly slower than the directional variants.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is invalid.
    #[inline]
    pub fn update_key(&mut self, idx: Idx) {
        self.heap.update_key(&mut self.storage, idx);
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Clears the heap, removing all elements.
    ///
    /// This unlinks every node first, then drops all values.
    pub fn clear(&mut self) {
        self.heap.clear(&mut self.storage);
        self.storage.clear();
    }

    /// Removes elements while the predicate returns `true`.
    ///
    /// The predicate receives a reference to the current minimum.
    /// Elements are removed in sorted order (smallest first), equal
    /// priorities in insertion order.
    #[inline]
    pub fn drain_while<F>(&mut self, pred: F) -> DrainWhile<'_, T, Idx, F>
    where
        F: FnMut(&T) -> bool,
    {
        DrainWhile {
            heap: &mut self.heap,
            storage: &mut self.storage,
            pred,
        }
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Checks every structural invariant and reports the first violation.
    ///
    /// See [`LinkedHeap::verify`]. O(n); intended for tests.
    pub fn verify(&self) -> Result<(), VerifyError> {
        self.heap.verify(&self.storage)
    }
}

impl<T: HeapLinked<Idx>, Idx: Index> Default for OwnedHeap<T, Idx> {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

/// An iterator that drains elements while a predicate holds.
///
/// Created by [`OwnedHeap::drain_while`].
pub struct DrainWhile<'a, T: HeapLinked<Idx>, Idx: Index, F>
where
    F: FnMut(&T) -> bool,
{
    heap: &'a mut LinkedHeap<Idx>,
    storage: &'a mut Pool<T, Idx>,
    pred: F,
}

impl<'a, T: HeapLinked<Idx>, Idx: Index, F> Iterator for DrainWhile<'a, T, Idx, F>
where
    F: FnMut(&T) -> bool,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let min = self.heap.peek()?;
        if (self.pred)(self.storage.get(min)?) {
            let idx = self.heap.pop(self.storage)?;
            self.storage.remove(idx)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeapNode;

    use core::cmp::Ordering;

    #[derive(Debug)]
    struct Task {
        priority: i64,
        node: HeapNode<u32>,
    }

    impl Task {
        fn new(priority: i64) -> Self {
            Self {
                priority,
                node: HeapNode::new(),
            }
        }
    }

    impl HeapLinked<u32> for Task {
        fn heap_node(&self) -> &HeapNode<u32> {
            &self.node
        }
        fn heap_node_mut(&mut self) -> &mut HeapNode<u32> {
            &mut self.node
        }
    }

    impl Ord for Task {
        fn cmp(&self, other: &Self) -> Ordering {
            self.priority.cmp(&other.priority)
        }
    }

    impl PartialOrd for Task {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
            Some(self.cmp(other))
        }
    }

    impl PartialEq for Task {
        fn eq(&self, other: &Self) -> bool {
            self.priority == other.priority
        }
    }

    impl Eq for Task {}

    fn priorities(heap: &mut OwnedHeap<Task>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(task) = heap.pop() {
            out.push(task.priority);
        }
        out
    }

    #[test]
    fn new_is_empty() {
        let heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);
        assert!(heap.is_empty());
        assert_eq!(heap.len(), 0);
        assert!(heap.peek().is_none());
        assert!(heap.peek_idx().is_none());
    }

    #[test]
    fn push_pop_order() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        for priority in [5, 1, 3, 2, 4] {
            heap.try_push(Task::new(priority)).unwrap();
        }
        assert_eq!(heap.len(), 5);
        heap.verify().unwrap();

        assert_eq!(priorities(&mut heap), vec![1, 2, 3, 4, 5]);
        assert!(heap.pop().is_none());
    }

    #[test]
    fn peek() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        assert!(heap.peek().is_none());

        heap.try_push(Task::new(5)).unwrap();
        assert_eq!(heap.peek().unwrap().priority, 5);

        heap.try_push(Task::new(1)).unwrap();
        assert_eq!(heap.peek().unwrap().priority, 1);

        heap.try_push(Task::new(3)).unwrap();
        assert_eq!(heap.peek().unwrap().priority, 1);
    }

    #[test]
    fn remove_by_index() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        let a = heap.try_push(Task::new(5)).unwrap();
        let b = heap.try_push(Task::new(1)).unwrap();
        let c = heap.try_push(Task::new(3)).unwrap();

        // Remove middle element
        assert_eq!(heap.remove(c).unwrap().priority, 3);
        assert_eq!(heap.len(), 2);
        heap.verify().unwrap();

        // Min unchanged
        assert_eq!(heap.peek().unwrap().priority, 1);

        // Remove min
        assert_eq!(heap.remove(b).unwrap().priority, 1);
        assert_eq!(heap.peek().unwrap().priority, 5);

        // a still valid
        assert_eq!(heap.get(a).unwrap().priority, 5);

        // A spent index no longer removes anything
        assert!(heap.remove(c).is_none());
    }

    #[test]
    fn contains() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        let a = heap.try_push(Task::new(5)).unwrap();
        let b = heap.try_push(Task::new(1)).unwrap();

        assert!(heap.contains(a));
        assert!(heap.contains(b));

        heap.remove(a);
        assert!(!heap.contains(a));
        assert!(heap.contains(b));
    }

    #[test]
    fn decrease_key() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        heap.try_push(Task::new(10)).unwrap();
        heap.try_push(Task::new(20)).unwrap();
        let c = heap.try_push(Task::new(30)).unwrap();

        assert_eq!(heap.peek().unwrap().priority, 10);

        // Decrease c to become minimum
        heap.get_mut(c).unwrap().priority = 5;
        heap.decrease_key(c);
        heap.verify().unwrap();

        assert_eq!(heap.peek().unwrap().priority, 5);
        assert_eq!(priorities(&mut heap), vec![5, 10, 20]);
    }

    #[test]
    fn increase_key() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        let a = heap.try_push(Task::new(10)).unwrap();
        heap.try_push(Task::new(20)).unwrap();
        heap.try_push(Task::new(30)).unwrap();

        // Increase a so it's no longer minimum
        heap.get_mut(a).unwrap().priority = 25;
        heap.increase_key(a);
        heap.verify().unwrap();

        assert_eq!(heap.peek().unwrap().priority, 20);
        assert_eq!(priorities(&mut heap), vec![20, 25, 30]);
    }

    #[test]
    fn update_key() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        heap.try_push(Task::new(10)).unwrap();
        heap.try_push(Task::new(20)).unwrap();
        let c = heap.try_push(Task::new(30)).unwrap();

        // Decrease
        heap.get_mut(c).unwrap().priority = 5;
        heap.update_key(c);
        assert_eq!(heap.peek().unwrap().priority, 5);

        // Increase
        heap.get_mut(c).unwrap().priority = 100;
        heap.update_key(c);
        assert_eq!(heap.peek().unwrap().priority, 10);
    }

    #[test]
    fn clear() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        for priority in [1, 2, 3] {
            heap.try_push(Task::new(priority)).unwrap();
        }

        heap.clear();

        assert!(heap.is_empty());
        assert!(heap.peek().is_none());
        heap.verify().unwrap();

        // Storage slots are free again
        let idx = heap.try_push(Task::new(7)).unwrap();
        assert_eq!(heap.peek_idx(), Some(idx));
    }

    #[test]
    fn drain_while() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        for priority in [1, 5, 3, 7, 2] {
            heap.try_push(Task::new(priority)).unwrap();
        }

        // Drain elements < 4
        let removed: Vec<i64> = heap.drain_while(|t| t.priority < 4).map(|t| t.priority).collect();
        assert_eq!(removed, vec![1, 2, 3]);

        assert_eq!(heap.len(), 2);
        assert_eq!(heap.peek().unwrap().priority, 5);
        heap.verify().unwrap();
    }

    #[test]
    fn drain_while_empty() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        let removed: Vec<Task> = heap.drain_while(|_| true).collect();
        assert!(removed.is_empty());
    }

    #[test]
    fn drain_while_none_match() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        heap.try_push(Task::new(10)).unwrap();
        heap.try_push(Task::new(20)).unwrap();

        let removed: Vec<Task> = heap.drain_while(|t| t.priority < 5).collect();
        assert!(removed.is_empty());
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn full_returns_error() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(2);

        heap.try_push(Task::new(1)).unwrap();
        heap.try_push(Task::new(2)).unwrap();

        let err = heap.try_push(Task::new(3));
        assert_eq!(err.unwrap_err().into_inner().priority, 3);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn duplicates_pop_fifo() {
        let mut heap: OwnedHeap<Task> = OwnedHeap::with_capacity(16);

        let first = heap.try_push(Task::new(5)).unwrap();
        let second = heap.try_push(Task::new(5)).unwrap();
        let third = heap.try_push(Task::new(5)).unwrap();

        assert_eq!(heap.peek_idx(), Some(first));
        heap.pop().unwrap();
        assert_eq!(heap.peek_idx(), Some(second));
        heap.pop().unwrap();
        assert_eq!(heap.peek_idx(), Some(third));
        heap.pop().unwrap();
        assert!(heap.pop().is_none());
    }

    #[test]
    fn default() {
        let heap: OwnedHeap<Task> = OwnedHeap::default();
        assert!(heap.is_empty());
        assert_eq!(heap.capacity(), 16);
    }

    #[test]
    fn timer_use_case() {
        // Simulates a timer facility: schedule, cancel, reschedule, fire.
        #[derive(Debug)]
        struct Timer {
            deadline: u64,
            id: u64,
            node: HeapNode<u32>,
        }

        impl HeapLinked<u32> for Timer {
            fn heap_node(&self) -> &HeapNode<u32> {
                &self.node
            }
            fn heap_node_mut(&mut self) -> &mut HeapNode<u32> {
                &mut self.node
            }
        }

        impl Ord for Timer {
            fn cmp(&self, other: &Self) -> Ordering {
                self.deadline.cmp(&other.deadline)
            }
        }
        impl PartialOrd for Timer {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }
        impl PartialEq for Timer {
            fn eq(&self, other: &Self) -> bool {
                self.deadline == other.deadline
            }
        }
        impl Eq for Timer {}

        fn timer(deadline: u64, id: u64) -> Timer {
            Timer {
                deadline,
                id,
                node: HeapNode::new(),
            }
        }

        let mut timers: OwnedHeap<Timer> = OwnedHeap::with_capacity(100);

        timers.try_push(timer(100, 1)).unwrap();
        let t2 = timers.try_push(timer(50, 2)).unwrap();
        let t3 = timers.try_push(timer(150, 3)).unwrap();

        // Next timer to fire
        assert_eq!(timers.peek().unwrap().id, 2);

        // Cancel a timer
        timers.remove(t2);
        assert_eq!(timers.peek().unwrap().id, 1);

        // Reschedule timer 3 to fire sooner
        timers.get_mut(t3).unwrap().deadline = 75;
        timers.decrease_key(t3);
        assert_eq!(timers.peek().unwrap().id, 3);

        // Fire expired timers (current time = 80)
        let fired: Vec<u64> = timers.drain_while(|t| t.deadline <= 80).map(|t| t.id).collect();
        assert_eq!(fired, vec![3]);
        assert_eq!(timers.len(), 1);
    }
}
