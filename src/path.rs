//! Position-to-path translation for a complete binary tree.
//!
//! Positions number the tree level by level, left to right, root = 0. The
//! translator turns a position into the sequence of left/right turns that
//! reaches it from the root, using only arithmetic; it never looks at the
//! tree. The heap walks these turns to find any position in O(depth).

/// One branch decision on the way down from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Descend into the left child.
    Left,
    /// Descend into the right child.
    Right,
}

/// The turn sequence from the root to one tree position.
///
/// Turns are packed into `path` starting at bit 0: bit `k` is the decision
/// taken at depth `k`, set for right. The root itself has an empty path.
///
/// # Example
///
/// ```
/// use linked_heap::{Side, TraversePath};
///
/// // Position 4 is the right child of position 1.
/// let path = TraversePath::from_index(4);
/// assert_eq!(path.depth(), 2);
/// let turns: Vec<Side> = path.steps().collect();
/// assert_eq!(turns, vec![Side::Left, Side::Right]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversePath {
    path: usize,
    depth: u8,
}

impl TraversePath {
    /// Computes the root-to-position turn sequence for `index`.
    ///
    /// Climbs from the position toward the root; each level contributes
    /// one bit, set when the position is an even (right-child) slot. The
    /// bit order comes out root-first because later levels shift earlier
    /// bits up.
    pub fn from_index(index: usize) -> Self {
        let mut path = 0usize;
        let mut depth = 0u8;
        let mut pos = index;
        while pos != 0 {
            path <<= 1;
            path |= (pos % 2 == 0) as usize;
            pos = (pos - 1) / 2;
            depth += 1;
        }
        Self { path, depth }
    }

    /// Number of turns, i.e. the position's depth below the root.
    #[inline]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// The turn taken at `level` (0 = directly below the root).
    #[inline]
    pub const fn step(&self, level: u8) -> Side {
        if self.path & (1usize << level) != 0 {
            Side::Right
        } else {
            Side::Left
        }
    }

    /// Iterates the turns root-first.
    #[inline]
    pub fn steps(self) -> impl Iterator<Item = Side> {
        (0..self.depth).map(move |level| self.step(level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_positions() {
        // (position, packed path, depth)
        let expected = [
            (0, 0, 0),
            (1, 0, 1),
            (2, 1, 1),
            (3, 0, 2),
            (4, 2, 2),
            (5, 1, 2),
            (6, 3, 2),
            (7, 0, 3),
            (8, 4, 3),
            (9, 2, 3),
        ];
        for (index, path, depth) in expected {
            let got = TraversePath::from_index(index);
            assert_eq!(got.path, path, "path for position {index}");
            assert_eq!(got.depth, depth, "depth for position {index}");
        }
    }

    #[test]
    fn steps_reach_the_position() {
        // Following the turns with position arithmetic lands back on the
        // starting position.
        for index in 0..1000 {
            let mut pos = 0usize;
            for side in TraversePath::from_index(index).steps() {
                pos = match side {
                    Side::Left => 2 * pos + 1,
                    Side::Right => 2 * pos + 2,
                };
            }
            assert_eq!(pos, index);
        }
    }

    #[test]
    fn leftmost_and_rightmost_spines() {
        // 2^k - 1 sits at the end of the all-left spine.
        let path = TraversePath::from_index((1 << 5) - 1);
        assert_eq!(path.depth(), 5);
        assert!(path.steps().all(|side| side == Side::Left));

        // 2^(k+1) - 2 sits at the end of the all-right spine.
        let path = TraversePath::from_index((1 << 6) - 2);
        assert_eq!(path.depth(), 5);
        assert!(path.steps().all(|side| side == Side::Right));
    }
}
