//! Fixed-order local accumulation.
//!
//! Every rank folds the values of a fully-local subtree with the same
//! parenthesization: groups of eight collapsed over three binary-tree levels,
//! `((v0+v1) + (v2+v3)) + ((v4+v5) + (v6+v7))`, with a deterministic handler
//! for the 0..7 tail. The parenthesization depends only on the element count,
//! so any rank that ever holds the same index range produces the same bits.
//!
//! The scalar kernel is the normative order. The AVX2 kernel evaluates the
//! identical tree through horizontal adds and must stay bit-equal; it is
//! selected at runtime.

#[cfg(target_arch = "x86_64")]
mod x86_64;

/// Fold the subtree values in `buf` down to their sum.
///
/// `buf` holds the `min(x + 2^max_y, N) - x` elements covered by the subtree
/// rooted at `(x, max_y)` and is overwritten by intermediate results.
pub(crate) fn tree_sum(buf: &mut [f64], max_y: u32) -> f64 {
    if max_y == 0 {
        return buf[0];
    }

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { x86_64::tree_sum_avx2(buf, max_y) };
        }
    }

    tree_sum_scalar(buf, max_y)
}

/// Normative scalar kernel. Three tree levels per outer iteration.
pub(crate) fn tree_sum_scalar(buf: &mut [f64], max_y: u32) -> f64 {
    let mut in_buffer = buf.len();

    let mut y = 1;
    while y <= max_y {
        let mut written = 0;
        let mut i = 0;
        while i + 8 <= in_buffer {
            buf[written] = ((buf[i] + buf[i + 1]) + (buf[i + 2] + buf[i + 3]))
                + ((buf[i + 4] + buf[i + 5]) + (buf[i + 6] + buf[i + 7]));
            written += 1;
            i += 8;
        }

        if i < in_buffer {
            let tail = fold_tail(&mut buf[i..in_buffer]);
            buf[written] = tail;
            written += 1;
        }

        in_buffer = written;
        y += 3;
    }

    debug_assert_eq!(in_buffer, 1);
    buf[0]
}

/// Collapse a 1..=7 element tail by three half-levels of pairwise adds.
///
/// An odd count carries the trailing element unchanged into the next
/// half-level: it stands for a subtree shorter than its siblings and pairs up
/// only once its natural partner appears.
fn fold_tail(buf: &mut [f64]) -> f64 {
    let mut remaining = buf.len();

    for _ in 0..3 {
        let mut written = 0;
        let mut i = 0;
        while i + 1 < remaining {
            buf[written] = buf[i] + buf[i + 1];
            written += 1;
            i += 2;
        }

        if remaining % 2 == 1 {
            buf[written] = buf[remaining - 1];
            remaining += 1;
        }

        remaining /= 2;
    }

    debug_assert_eq!(remaining, 1);
    buf[0]
}

/// Canonical serial tree sum of a whole array.
///
/// This is the single-rank reference every distributed reduction must match
/// bit-for-bit. Returns 0.0 for an empty slice.
pub fn serial_sum(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut scratch = values.to_vec();
    let height = crate::tree::ceil_log2(values.len() as u64);
    tree_sum(&mut scratch, height)
}
