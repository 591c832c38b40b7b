//! The reduction driver: one instance per rank, one straight-line procedure
//! per reduction.
//!
//! Construction validates the distribution, exchanges outgoing-coordinate
//! descriptors along the communication tree (children before parents), and
//! freezes the op program. A reduction then runs local accumulation, executes
//! the program on a stack machine (awaiting each child's value block just
//! before its first slot is pushed), ships the surviving stack to the
//! communication parent, and optionally broadcasts the root's result.

use std::sync::Arc;

use crate::accumulate;
use crate::comm::Communicator;
use crate::config::{ReduceConfig, ReduceMode};
use crate::error::{ReduceError, Result};
use crate::topology::{Op, OpProgram, Topology};
use crate::types::{Rank, Region, TAG_COORD_COUNT, TAG_COORD_LIST, TAG_VALUES};
use crate::wire;

#[derive(Debug)]
pub struct Reducer<C: Communicator> {
    comm: Arc<C>,
    mode: ReduceMode,
    topology: Topology,
    program: OpProgram,
    /// Native rank of the communication parent.
    comm_parent: Option<Rank>,
    /// Native ranks of the communication children, ascending array order.
    comm_children: Vec<Rank>,
    /// Doubles expected from each child per reduction, same order.
    incoming_counts: Vec<usize>,
    accumulation_buffer: Vec<f64>,
    inbox: Vec<f64>,
    stack: Vec<f64>,
}

impl<C: Communicator> Reducer<C> {
    /// Build a reducer for this rank.
    ///
    /// `regions` lists every rank's slice of the global array in native rank
    /// order; all ranks must pass the same list. Construction refuses
    /// distributions that do not partition the array and performs the
    /// coordinate handshake, so every rank of the communicator must
    /// construct its reducer concurrently.
    pub async fn new(comm: Arc<C>, regions: &[Region], config: ReduceConfig) -> Result<Self> {
        if config.fanout == 0 {
            return Err(ReduceError::InvalidFanout);
        }
        if regions.len() != comm.world_size() as usize {
            return Err(ReduceError::RegionCountMismatch {
                regions: regions.len(),
                world_size: comm.world_size(),
            });
        }

        let topology = Topology::new(comm.rank(), regions)?;

        // Receive every child's outgoing list, in ascending child order so
        // the concatenation is sorted left to right.
        let children = topology.comm_children();
        let mut incoming = Vec::new();
        let mut incoming_counts = Vec::with_capacity(children.len());
        let mut comm_children = Vec::with_capacity(children.len());
        for &child in &children {
            let native = topology.native_rank(child);
            let count = wire::decode_count(&comm.recv(native, TAG_COORD_COUNT).await?)? as usize;
            let coords = wire::decode_coords(&comm.recv(native, TAG_COORD_LIST).await?)?;
            if coords.len() != count {
                return Err(ReduceError::ProtocolMismatch {
                    rank: native,
                    expected: count,
                    actual: coords.len(),
                });
            }
            incoming_counts.push(count);
            incoming.extend(coords);
            comm_children.push(native);
        }

        let program = topology.compute_program(&incoming)?;

        // Our own outgoing list is complete only now (it may forward
        // coordinates received from descendants), so the handshake ripples
        // from the leaves of the communication tree to the root.
        let comm_parent = topology.comm_parent().map(|p| topology.native_rank(p));
        if let Some(parent) = comm_parent {
            comm.send(
                parent,
                TAG_COORD_COUNT,
                wire::encode_count(program.outgoing.len() as u64),
            )
            .await?;
            comm.send(parent, TAG_COORD_LIST, wire::encode_coords(&program.outgoing))
                .await?;
        }

        tracing::debug!(
            rank = comm.rank(),
            array_rank = topology.array_rank(),
            region = %topology.my_region(),
            outgoing = program.outgoing.len(),
            incoming = incoming.len(),
            max_stack = program.max_stack,
            "reduction topology ready"
        );

        let local_size = topology.my_region().size as usize;
        let inbox_len = program.local_coords.len() + incoming.len();
        let max_stack = program.max_stack;
        Ok(Self {
            comm,
            mode: config.mode,
            topology,
            program,
            comm_parent,
            comm_children,
            incoming_counts,
            accumulation_buffer: vec![0.0; local_size],
            inbox: vec![0.0; inbox_len],
            stack: Vec::with_capacity(max_stack),
        })
    }

    /// Build a reducer from this rank's element count alone: the counts are
    /// all-gathered and laid out contiguously in native rank order.
    pub async fn from_local_count(
        comm: Arc<C>,
        local_count: u64,
        config: ReduceConfig,
    ) -> Result<Self> {
        let counts = comm.all_gather_u64(local_count).await?;
        let mut regions = Vec::with_capacity(counts.len());
        let mut start = 0;
        for count in counts {
            regions.push(Region::new(start, count));
            start += count;
        }
        Self::new(comm, &regions, config).await
    }

    /// This rank's slice of the global array.
    pub fn region(&self) -> Region {
        self.topology.my_region()
    }

    /// Does the final sum originate on this rank?
    pub fn is_root(&self) -> bool {
        self.topology.is_root()
    }

    pub fn buffer_len(&self) -> usize {
        self.accumulation_buffer.len()
    }

    /// The input buffer. Load the local elements before every reduction;
    /// accumulation folds the buffer in place.
    pub fn buffer_mut(&mut self) -> &mut [f64] {
        &mut self.accumulation_buffer
    }

    /// Store one summand at a local offset.
    pub fn store(&mut self, local_index: usize, value: f64) {
        self.accumulation_buffer[local_index] = value;
    }

    /// Run one reduction.
    ///
    /// Returns the global sum on the root, and on every rank when the mode is
    /// [`ReduceMode::Broadcast`]; otherwise non-root ranks get 0.0. Any
    /// messaging or protocol failure is fatal: the program is consumed
    /// linearly and a retry must restart from freshly loaded buffers.
    pub async fn reduce(&mut self) -> Result<f64> {
        let begin = self.topology.my_region().start;
        let global_size = self.topology.global_size();

        for (slot, coords) in self.program.local_coords.iter().enumerate() {
            let span = 1u64.checked_shl(coords.y).unwrap_or(u64::MAX);
            let len = (coords.x.saturating_add(span).min(global_size) - coords.x) as usize;
            let offset = (coords.x - begin) as usize;
            self.inbox[slot] =
                accumulate::tree_sum(&mut self.accumulation_buffer[offset..offset + len], coords.y);
        }

        self.stack.clear();
        let mut inbox_index = 0;
        // First inbox slot whose value may still be in flight, and the child
        // whose block starts there.
        let mut next_pending = self.program.local_coords.len();
        let mut child_index = 0;

        for op in &self.program.ops {
            match op {
                Op::Push => {
                    while child_index < self.comm_children.len() && inbox_index >= next_pending {
                        let count = self.incoming_counts[child_index];
                        let native = self.comm_children[child_index];
                        if count > 0 {
                            let values =
                                wire::decode_values(&self.comm.recv(native, TAG_VALUES).await?)?;
                            if values.len() != count {
                                return Err(ReduceError::ProtocolMismatch {
                                    rank: native,
                                    expected: count,
                                    actual: values.len(),
                                });
                            }
                            self.inbox[next_pending..next_pending + count]
                                .copy_from_slice(&values);
                        }
                        next_pending += count;
                        child_index += 1;
                    }

                    self.stack.push(self.inbox[inbox_index]);
                    inbox_index += 1;
                }
                Op::Reduce => {
                    let b = self.stack.pop().expect("op program validated at construction");
                    let a = self.stack.pop().expect("op program validated at construction");
                    self.stack.push(a + b);
                }
            }
        }
        debug_assert_eq!(self.stack.len(), self.program.outgoing.len());

        if let Some(parent) = self.comm_parent {
            if !self.stack.is_empty() {
                self.comm
                    .send(parent, TAG_VALUES, wire::encode_values(&self.stack))
                    .await?;
            }
        }

        let local_result = if self.topology.is_root() {
            self.stack[0]
        } else {
            0.0
        };

        match self.mode {
            ReduceMode::Broadcast => {
                let root = self.topology.native_rank(0);
                self.comm.broadcast_f64(root, local_result).await
            }
            ReduceMode::RootOnly => Ok(local_result),
        }
    }
}
