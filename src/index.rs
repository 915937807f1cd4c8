//! Sentinel-based index trait for the links embedded in heap nodes.
//!
//! Tree links are plain unsigned integers with a reserved sentinel (e.g.
//! `u32::MAX`) standing in for "no node". Compared to `Option<Idx>` this
//! keeps every link at its bare integer size, which matters when a node
//! carries three of them.

/// A copyable index type with a sentinel "none" value.
///
/// The sentinel is the type's maximum value, so storage backends must
/// never hand it out as a live index.
///
/// # Example
///
/// ```
/// use linked_heap::Index;
///
/// let parent: u32 = 7;
/// let unset: u32 = u32::NONE;
///
/// assert!(parent.is_some());
/// assert!(unset.is_none());
/// ```
pub trait Index: Copy + Eq {
    /// Sentinel value representing "no index" / null.
    const NONE: Self;

    /// Returns `true` if this is the sentinel value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Returns `true` if this is not the sentinel value.
    #[inline]
    fn is_some(self) -> bool {
        !self.is_none()
    }

    /// Converts to usize for positional arithmetic.
    fn as_usize(self) -> usize;

    /// Creates an index from a usize value.
    ///
    /// Used when storage assigns sequential indices.
    fn from_usize(val: usize) -> Self;
}

macro_rules! impl_index {
    ($($ty:ty),*) => {
        $(
            impl Index for $ty {
                const NONE: Self = <$ty>::MAX;

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }

                #[inline]
                fn from_usize(val: usize) -> Self {
                    val as Self
                }
            }
        )*
    };
}

impl_index!(u8, u16, u32, u64, usize);
