//! Index algebra over the canonical binary tree.
//!
//! The tree is implicit in the indices of the global array: node `i > 0` is a
//! child of `i & (i - 1)`, index 0 is the root. All functions are total for
//! positive indices.

/// Parent of index `i` in the canonical tree: clears the lowest set bit.
///
/// Index 0 is the root and has no parent.
#[inline]
pub fn parent(i: u64) -> u64 {
    assert!(i != 0, "index 0 is the tree root");
    i & (i - 1)
}

/// Largest index inside the subtree rooted at `i`.
#[inline]
pub fn largest_child(i: u64) -> u64 {
    i | (i - 1)
}

/// Number of indices spanned by the subtree rooted at `i > 0`.
///
/// Always a power of two; the covered range may still be cut short by the
/// global array length.
#[inline]
pub fn subtree_size(i: u64) -> u64 {
    largest_child(i) + 1 - i
}

/// Level of index `i > 0` when its subtree is taken whole.
#[inline]
pub fn level(i: u64) -> u32 {
    subtree_size(i).trailing_zeros()
}

/// Integer ceiling of log2(n). Returns 0 for n <= 1.
#[inline]
pub fn ceil_log2(n: u64) -> u32 {
    if n <= 1 {
        return 0;
    }
    u64::BITS - (n - 1).leading_zeros()
}
