//! The messaging-substrate seam.
//!
//! The reduction engine consumes a narrow contract: tagged point-to-point
//! byte messages, a one-double broadcast, a one-integer all-gather, and
//! rank/size queries. Anything that provides these (an in-process cluster,
//! an MPI binding, a network mesh) can drive a reduction.

mod local;

pub use local::LocalComm;

use std::future::Future;

use crate::error::Result;
use crate::types::{Rank, Tag};

/// Point-to-point and collective primitives the reduction engine requires.
///
/// Messages between a fixed (sender, receiver) pair must be delivered in
/// send order; messages with different tags must not be confused. A send
/// completes without waiting for the matching receive, so a posted message
/// is buffered until the receiver asks for it.
pub trait Communicator: Send + Sync + 'static {
    /// This participant's rank (0-indexed, stable for the communicator's
    /// lifetime).
    fn rank(&self) -> Rank;

    /// Total number of ranks.
    fn world_size(&self) -> u32;

    /// Send `payload` to `dest`, discriminated by `tag`.
    fn send(
        &self,
        dest: Rank,
        tag: Tag,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Receive the next message from `src` carrying `tag`.
    fn recv(&self, src: Rank, tag: Tag) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Broadcast one double from `root`; every rank returns the root's value.
    fn broadcast_f64(&self, root: Rank, value: f64) -> impl Future<Output = Result<f64>> + Send;

    /// Gather one integer from every rank; every rank returns the full
    /// vector indexed by rank.
    fn all_gather_u64(&self, value: u64) -> impl Future<Output = Result<Vec<u64>>> + Send;
}
