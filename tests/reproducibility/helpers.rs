use std::sync::Arc;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use reprosum::{Communicator, LocalComm, ReduceConfig, Reducer, Region};

/// A distribution in scatter terms: per-rank element counts and the offset of
/// each rank's block in the global array, indexed by native rank.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub send_counts: Vec<u64>,
    pub displs: Vec<u64>,
}

impl Distribution {
    pub fn regions(&self) -> Vec<Region> {
        self.send_counts
            .iter()
            .zip(&self.displs)
            .map(|(&size, &start)| Region::new(start, size))
            .collect()
    }
}

pub fn displacements(send_counts: &[u64]) -> Vec<u64> {
    let mut displs = Vec::with_capacity(send_counts.len());
    let mut start = 0;
    for &count in send_counts {
        displs.push(start);
        start += count;
    }
    displs
}

/// Even split with the remainder on the leading ranks: 9 over 4 is [3,2,2,2].
pub fn distribute_evenly(total: u64, ranks: u32) -> Distribution {
    let per_rank = total / ranks as u64;
    let remainder = total % ranks as u64;

    let send_counts: Vec<u64> = (0..ranks as u64)
        .map(|i| if i < remainder { per_rank + 1 } else { per_rank })
        .collect();
    let displs = displacements(&send_counts);
    Distribution {
        send_counts,
        displs,
    }
}

/// Random split points over `[0, total]`, then a shuffle of which rank owns
/// which block, so start indices are not monotonic in rank order.
pub fn distribute_randomly(total: u64, ranks: u32, rng: &mut StdRng) -> Distribution {
    let mut points: Vec<u64> = vec![0, total];
    for _ in 1..ranks {
        points.push(rng.gen_range(0..=total));
    }
    points.sort_unstable();

    let send_counts: Vec<u64> = points.windows(2).map(|w| w[1] - w[0]).collect();
    let displs = displacements(&send_counts);

    let mut order: Vec<usize> = (0..ranks as usize).collect();
    order.shuffle(rng);

    Distribution {
        send_counts: order.iter().map(|&i| send_counts[i]).collect(),
        displs: order.iter().map(|&i| displs[i]).collect(),
    }
}

pub fn random_array(len: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..len).map(|_| rng.gen::<f64>()).collect()
}

/// Run one task per rank over a fresh in-process cluster; results are
/// returned in rank order.
pub async fn run_cluster<T, F, Fut>(world_size: u32, f: F) -> Vec<T>
where
    F: Fn(Arc<LocalComm>) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let f = Arc::new(f);
    let mut handles = Vec::new();
    for comm in LocalComm::bootstrap_local(world_size) {
        let f = Arc::clone(&f);
        handles.push(tokio::spawn(async move { f(Arc::new(comm)).await }));
    }

    let mut results = Vec::new();
    for h in handles {
        results.push(h.await.unwrap());
    }
    results
}

/// Reduce `array` under `dist` and return the sum, asserting that the
/// broadcast left every rank with the same bits.
pub async fn reduce_distributed(array: &[f64], dist: &Distribution) -> f64 {
    reduce_distributed_with_fanout(array, dist, 1).await
}

pub async fn reduce_distributed_with_fanout(
    array: &[f64],
    dist: &Distribution,
    fanout: u32,
) -> f64 {
    let world_size = dist.send_counts.len() as u32;
    let array = Arc::new(array.to_vec());
    let regions = Arc::new(dist.regions());

    let results = run_cluster(world_size, move |comm| {
        let array = Arc::clone(&array);
        let regions = Arc::clone(&regions);
        async move {
            let config = ReduceConfig {
                fanout,
                ..ReduceConfig::default()
            };
            let rank = comm.rank() as usize;
            let mut reducer = Reducer::new(comm, &regions, config).await.unwrap();

            // Scatter: this rank's block lives at its displacement.
            let region = reducer.region();
            let start = region.start as usize;
            reducer
                .buffer_mut()
                .copy_from_slice(&array[start..start + region.size as usize]);
            debug_assert_eq!(region, regions[rank]);

            reducer.reduce().await.unwrap()
        }
    })
    .await;

    for (rank, result) in results.iter().enumerate().skip(1) {
        assert_eq!(
            result.to_bits(),
            results[0].to_bits(),
            "rank {rank} saw a different broadcast value"
        );
    }
    results[0]
}
