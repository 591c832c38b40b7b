//! AVX2 kernel for the fixed-order accumulation.
//!
//! Evaluates exactly the tree of the scalar kernel: `hadd` pairs neighbors,
//! the cross-lane add joins the two halves, the final `hadd` joins the group.
//! Operand order inside each node differs from the scalar kernel only by
//! commutation, which IEEE-754 addition preserves bit-for-bit.

use std::arch::x86_64::*;

/// # Safety
/// Caller must ensure the `avx2` target feature is available.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn tree_sum_avx2(buf: &mut [f64], max_y: u32) -> f64 {
    let mut in_buffer = buf.len();

    let mut y = 1;
    while y <= max_y {
        let mut written = 0usize;
        let mut i = 0usize;
        while i + 8 <= in_buffer {
            unsafe {
                let ptr = buf.as_mut_ptr();
                let a = _mm256_loadu_pd(ptr.add(i));
                let b = _mm256_loadu_pd(ptr.add(i + 4));
                let level1 = _mm256_hadd_pd(a, b);

                let hi = _mm256_extractf128_pd(level1, 1);
                let lo = _mm256_castpd256_pd128(level1);
                let level2 = _mm_add_pd(hi, lo);

                let level3 = _mm_hadd_pd(level2, level2);
                *ptr.add(written) = _mm_cvtsd_f64(level3);
            }
            written += 1;
            i += 8;
        }

        if i < in_buffer {
            let tail = super::fold_tail(&mut buf[i..in_buffer]);
            buf[written] = tail;
            written += 1;
        }

        in_buffer = written;
        y += 3;
    }

    debug_assert_eq!(in_buffer, 1);
    buf[0]
}
