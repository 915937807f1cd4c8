//! Storage trait for the pools that own heap payloads.
//!
//! The heap never owns data. Payloads live in a storage backend that hands
//! out stable indices, and the heap threads its tree links through whatever
//! those indices address. Any backend works as long as indices stay valid
//! until the entry is explicitly removed.

use crate::Index;

use core::mem::MaybeUninit;

/// Slab-like storage with stable indices.
///
/// # Requirements
///
/// Implementations must provide:
/// - **Stable indices**: an index remains valid until explicitly removed
/// - **O(1)** insert, remove, get operations
/// - **Slot reuse**: removed slots can be reused by future inserts
/// - **No sentinel indices**: [`Index::NONE`] is never handed out
///
/// # Implementations
///
/// - [`Pool<T>`] - fixed capacity, pre-allocated (in this crate)
/// - `slab::Slab<T>` - growable (feature `slab`)
pub trait Storage<T> {
    /// Index type for this storage.
    type Index: Index;

    /// Error type for failed insertions.
    ///
    /// - `Full<T>` for fixed-capacity storage
    /// - `Infallible` for growable storage
    type Error;

    /// Inserts a value, returning its stable index.
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Self::Error>;

    /// Removes and returns the value at `index`, if present.
    fn remove(&mut self, index: Self::Index) -> Option<T>;

    /// Returns a reference to the value at `index`, if present.
    fn get(&self, index: Self::Index) -> Option<&T>;

    /// Returns a mutable reference to the value at `index`, if present.
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T>;

    /// Returns a reference without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be valid and occupied.
    unsafe fn get_unchecked(&self, index: Self::Index) -> &T;

    /// Returns a mutable reference without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be valid and occupied.
    unsafe fn get_unchecked_mut(&mut self, index: Self::Index) -> &mut T;

    /// Removes an element without bounds checking.
    ///
    /// # Safety
    ///
    /// The index must be valid and occupied.
    unsafe fn remove_unchecked(&mut self, index: Self::Index) -> T;
}

/// Error returned when fixed-capacity storage is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Full<T>(pub T);

impl<T> Full<T> {
    /// Returns the value that could not be inserted.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> core::fmt::Display for Full<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "storage is full")
    }
}

impl<T: core::fmt::Debug> std::error::Error for Full<T> {}

// =============================================================================
// Pool - fixed capacity, bitmap occupancy, LIFO slot reuse
// =============================================================================

/// Fixed-capacity storage with runtime-determined size.
///
/// Entries live in one flat uninitialized slice; a word bitmap records
/// which slots hold live values and a stack of free indices drives O(1)
/// insertion with LIFO slot reuse. Capacity is rounded up to the next
/// power of 2 so the bitmap stays word-aligned.
///
/// All allocation happens in [`with_capacity`](Pool::with_capacity);
/// insert, remove, and get never touch the allocator.
///
/// # Example
///
/// ```
/// use linked_heap::{Pool, Storage};
///
/// let mut pool: Pool<u64> = Pool::with_capacity(1000);
/// assert!(pool.capacity() >= 1000); // Rounded to 1024
///
/// let idx = pool.try_insert(42).unwrap();
/// assert_eq!(pool.get(idx), Some(&42));
/// ```
pub struct Pool<T, Idx: Index = u32> {
    entries: Box<[MaybeUninit<T>]>,
    /// One bit per slot, set while the slot holds a live value.
    occupied: Box<[u64]>,
    /// Vacant slot indices; popped on insert, pushed on remove.
    free: Vec<Idx>,
}

impl<T, Idx: Index> Pool<T, Idx> {
    /// Creates a pool with at least `min_capacity` slots.
    ///
    /// Actual capacity is rounded up to the next power of 2.
    ///
    /// # Panics
    ///
    /// Panics if `min_capacity` is 0 or the rounded capacity exceeds the
    /// index type's maximum.
    pub fn with_capacity(min_capacity: usize) -> Self {
        assert!(min_capacity > 0, "capacity must be > 0");

        let capacity = min_capacity.next_power_of_two();
        assert!(
            capacity <= Idx::NONE.as_usize(),
            "capacity exceeds index type maximum"
        );

        // Reverse order so the first inserts hand out 0, 1, 2, ...
        let free: Vec<Idx> = (0..capacity).rev().map(Idx::from_usize).collect();

        Self {
            entries: Box::new_uninit_slice(capacity),
            occupied: vec![0u64; bitmap_words(capacity)].into_boxed_slice(),
            free,
        }
    }

    /// Returns the capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Returns `true` if no slots are occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.free.len() == self.capacity()
    }

    /// Returns `true` if all slots are occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Removes all values from the pool.
    ///
    /// # Warning
    ///
    /// Any heap still holding indices into this pool is left dangling.
    /// Clear those structures first, or use [`OwnedHeap`](crate::OwnedHeap)
    /// which handles the ordering for you.
    pub fn clear(&mut self) {
        for i in 0..self.capacity() {
            if self.is_occupied(i) {
                // Safety: the occupancy bit says the slot holds a live value
                unsafe {
                    self.entries[i].assume_init_drop();
                }
            }
        }
        self.occupied.fill(0);
        self.free.clear();
        self.free
            .extend((0..self.capacity()).rev().map(Idx::from_usize));
    }

    #[inline]
    fn is_occupied(&self, slot: usize) -> bool {
        self.occupied[slot / 64] & (1 << (slot % 64)) != 0
    }

    #[inline]
    fn mark_occupied(&mut self, slot: usize) {
        self.occupied[slot / 64] |= 1 << (slot % 64);
    }

    #[inline]
    fn mark_vacant(&mut self, slot: usize) {
        self.occupied[slot / 64] &= !(1 << (slot % 64));
    }
}

impl<T, Idx: Index> Storage<T> for Pool<T, Idx> {
    type Index = Idx;
    type Error = Full<T>;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Self::Error> {
        let Some(idx) = self.free.pop() else {
            return Err(Full(value));
        };

        let slot = idx.as_usize();
        self.entries[slot].write(value);
        self.mark_occupied(slot);
        Ok(idx)
    }

    #[inline]
    fn remove(&mut self, index: Self::Index) -> Option<T> {
        let slot = index.as_usize();
        if slot >= self.capacity() || !self.is_occupied(slot) {
            return None;
        }

        self.mark_vacant(slot);
        // Safety: the occupancy bit was set, so the slot holds a live value
        let value = unsafe { self.entries[slot].assume_init_read() };
        self.free.push(index);
        Some(value)
    }

    #[inline]
    fn get(&self, index: Self::Index) -> Option<&T> {
        let slot = index.as_usize();
        if slot >= self.capacity() || !self.is_occupied(slot) {
            return None;
        }
        // Safety: occupied slots are initialized
        Some(unsafe { self.entries[slot].assume_init_ref() })
    }

    #[inline]
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T> {
        let slot = index.as_usize();
        if slot >= self.capacity() || !self.is_occupied(slot) {
            return None;
        }
        // Safety: occupied slots are initialized
        Some(unsafe { self.entries[slot].assume_init_mut() })
    }

    #[inline]
    unsafe fn get_unchecked(&self, index: Self::Index) -> &T {
        unsafe { self.entries.get_unchecked(index.as_usize()).assume_init_ref() }
    }

    #[inline]
    unsafe fn get_unchecked_mut(&mut self, index: Self::Index) -> &mut T {
        unsafe {
            self.entries
                .get_unchecked_mut(index.as_usize())
                .assume_init_mut()
        }
    }

    #[inline]
    unsafe fn remove_unchecked(&mut self, index: Self::Index) -> T {
        let slot = index.as_usize();
        self.mark_vacant(slot);
        let value = unsafe { self.entries[slot].assume_init_read() };
        self.free.push(index);
        value
    }
}

impl<T, Idx: Index> Drop for Pool<T, Idx> {
    fn drop(&mut self) {
        for i in 0..self.capacity() {
            if self.is_occupied(i) {
                // Safety: the occupancy bit says the slot holds a live value
                unsafe {
                    self.entries[i].assume_init_drop();
                }
            }
        }
    }
}

// =============================================================================
// slab::Slab implementation
// =============================================================================

#[cfg(feature = "slab")]
impl<T> Storage<T> for slab::Slab<T> {
    type Index = usize;
    type Error = core::convert::Infallible;

    #[inline]
    fn try_insert(&mut self, value: T) -> Result<Self::Index, Self::Error> {
        Ok(self.insert(value))
    }

    #[inline]
    fn remove(&mut self, index: Self::Index) -> Option<T> {
        self.try_remove(index)
    }

    #[inline]
    fn get(&self, index: Self::Index) -> Option<&T> {
        self.get(index)
    }

    #[inline]
    fn get_mut(&mut self, index: Self::Index) -> Option<&mut T> {
        self.get_mut(index)
    }

    #[inline]
    unsafe fn get_unchecked(&self, index: Self::Index) -> &T {
        unsafe { self.get(index).unwrap_unchecked() }
    }

    #[inline]
    unsafe fn get_unchecked_mut(&mut self, index: Self::Index) -> &mut T {
        unsafe { self.get_mut(index).unwrap_unchecked() }
    }

    #[inline]
    unsafe fn remove_unchecked(&mut self, index: Self::Index) -> T {
        self.remove(index)
    }
}

#[inline]
const fn bitmap_words(capacity: usize) -> usize {
    capacity.div_ceil(64)
}
