use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use reprosum::serial_sum;

use super::helpers::{distribute_randomly, random_array, reduce_distributed_with_fanout};

// Deterministic, CI-sized rendition of the exhaustive fuzz campaign: random
// arrays × random shuffled distributions × varying rank counts and fan-out
// values, every run compared bit-for-bit against the single-rank reference.
#[tokio::test]
async fn test_fuzz_matches_single_rank_reference() {
    const NUM_ARRAYS: usize = 25;
    const NUM_DISTRIBUTIONS: usize = 40;
    const MAX_RANKS: u32 = 5;

    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let mut checks = 0u64;

    for _ in 0..NUM_ARRAYS {
        let len = rng.gen_range(1..=20usize);
        let array = random_array(len, &mut rng);
        let reference = serial_sum(&array);

        for _ in 0..NUM_DISTRIBUTIONS {
            let ranks = rng.gen_range(1..=MAX_RANKS);
            let fanout = rng.gen_range(1..=30);
            let dist = distribute_randomly(len as u64, ranks, &mut rng);

            let sum = reduce_distributed_with_fanout(&array, &dist, fanout).await;
            assert_eq!(
                sum.to_bits(),
                reference.to_bits(),
                "len {len}, ranks {ranks}, dist {dist:?}"
            );
            checks += 1;
        }
    }

    assert_eq!(checks, (NUM_ARRAYS * NUM_DISTRIBUTIONS) as u64);
}

// Longer arrays cross the 8-wide group boundary and several truncated
// levels; keep the distribution count smaller.
#[tokio::test]
async fn test_fuzz_larger_arrays() {
    const NUM_ARRAYS: usize = 10;
    const NUM_DISTRIBUTIONS: usize = 15;
    const MAX_RANKS: u32 = 6;

    let mut rng = StdRng::seed_from_u64(0xfeed_beef);

    for _ in 0..NUM_ARRAYS {
        let len = rng.gen_range(16..=200usize);
        let array = random_array(len, &mut rng);
        let reference = serial_sum(&array);

        for _ in 0..NUM_DISTRIBUTIONS {
            let ranks = rng.gen_range(2..=MAX_RANKS);
            let dist = distribute_randomly(len as u64, ranks, &mut rng);

            let sum = reduce_distributed_with_fanout(&array, &dist, 1).await;
            assert_eq!(
                sum.to_bits(),
                reference.to_bits(),
                "len {len}, ranks {ranks}, dist {dist:?}"
            );
        }
    }
}
