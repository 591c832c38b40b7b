//! In-process communicator: one rank per tokio task, unbounded channels
//! between every pair. Used by the CLI driver and the test harness; a
//! cross-machine substrate would implement [`Communicator`] instead.

use std::collections::VecDeque;

use futures::future::try_join_all;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::Communicator;
use crate::error::{ReduceError, Result};
use crate::types::{Rank, Tag};

// Collective traffic rides the same channels as p2p, on tags of its own.
const TAG_BROADCAST: Tag = 100;
const TAG_GATHER: Tag = 101;

#[derive(Debug)]
struct Envelope {
    tag: Tag,
    payload: Vec<u8>,
}

/// Receive side for one peer: the channel plus a stash of messages that
/// arrived ahead of the tag currently being waited on.
#[derive(Debug)]
struct PeerInbox {
    rx: UnboundedReceiver<Envelope>,
    stash: VecDeque<Envelope>,
}

/// An in-process cluster member.
#[derive(Debug)]
pub struct LocalComm {
    rank: Rank,
    world_size: u32,
    /// Send handles indexed by destination rank.
    peers: Vec<UnboundedSender<Envelope>>,
    /// Inboxes indexed by source rank.
    inboxes: Vec<Mutex<PeerInbox>>,
}

impl LocalComm {
    /// Wire up a full cluster and return one communicator per rank.
    pub fn bootstrap_local(world_size: u32) -> Vec<LocalComm> {
        let n = world_size as usize;

        let mut txs: Vec<Vec<UnboundedSender<Envelope>>> = (0..n).map(|_| Vec::new()).collect();
        let mut rxs: Vec<Vec<PeerInbox>> = (0..n).map(|_| Vec::new()).collect();
        for src in 0..n {
            for dst in 0..n {
                let (tx, rx) = mpsc::unbounded_channel();
                txs[src].push(tx);
                rxs[dst].push(PeerInbox {
                    rx,
                    stash: VecDeque::new(),
                });
            }
        }
        let mut comms = Vec::with_capacity(n);
        for (rank, (peers, inboxes)) in txs.into_iter().zip(rxs).enumerate() {
            comms.push(LocalComm {
                rank: rank as Rank,
                world_size,
                peers,
                inboxes: inboxes.into_iter().map(Mutex::new).collect(),
            });
        }
        comms
    }

    fn check_rank(&self, rank: Rank) -> Result<()> {
        if rank >= self.world_size {
            return Err(ReduceError::InvalidRank {
                rank,
                world_size: self.world_size,
            });
        }
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    async fn send(&self, dest: Rank, tag: Tag, payload: Vec<u8>) -> Result<()> {
        self.check_rank(dest)?;
        self.peers[dest as usize]
            .send(Envelope { tag, payload })
            .map_err(|_| ReduceError::PeerDisconnected { rank: dest })
    }

    async fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        self.check_rank(src)?;
        let mut inbox = self.inboxes[src as usize].lock().await;

        if let Some(pos) = inbox.stash.iter().position(|e| e.tag == tag) {
            return Ok(inbox.stash.remove(pos).expect("position is in range").payload);
        }

        loop {
            match inbox.rx.recv().await {
                Some(e) if e.tag == tag => return Ok(e.payload),
                Some(e) => inbox.stash.push_back(e),
                None => return Err(ReduceError::PeerDisconnected { rank: src }),
            }
        }
    }

    async fn broadcast_f64(&self, root: Rank, value: f64) -> Result<f64> {
        self.check_rank(root)?;
        if self.world_size == 1 {
            return Ok(value);
        }

        if self.rank == root {
            let payload = value.to_le_bytes().to_vec();
            let sends = (0..self.world_size)
                .filter(|&r| r != root)
                .map(|r| self.send(r, TAG_BROADCAST, payload.clone()));
            try_join_all(sends).await?;
            Ok(value)
        } else {
            let buf = self.recv(root, TAG_BROADCAST).await?;
            let bytes: [u8; 8] = buf.as_slice().try_into().map_err(|_| {
                ReduceError::DecodeFailed(format!("broadcast frame of {} bytes", buf.len()))
            })?;
            Ok(f64::from_le_bytes(bytes))
        }
    }

    async fn all_gather_u64(&self, value: u64) -> Result<Vec<u64>> {
        if self.world_size == 1 {
            return Ok(vec![value]);
        }

        if self.rank == 0 {
            let mut gathered = vec![0u64; self.world_size as usize];
            gathered[0] = value;
            for src in 1..self.world_size {
                let buf = self.recv(src, TAG_GATHER).await?;
                let bytes: [u8; 8] = buf.as_slice().try_into().map_err(|_| {
                    ReduceError::DecodeFailed(format!("gather frame of {} bytes", buf.len()))
                })?;
                gathered[src as usize] = u64::from_le_bytes(bytes);
            }

            let mut payload = Vec::with_capacity(gathered.len() * 8);
            for v in &gathered {
                payload.extend_from_slice(&v.to_le_bytes());
            }
            let sends =
                (1..self.world_size).map(|r| self.send(r, TAG_GATHER, payload.clone()));
            try_join_all(sends).await?;

            Ok(gathered)
        } else {
            self.send(0, TAG_GATHER, value.to_le_bytes().to_vec())
                .await?;
            let buf = self.recv(0, TAG_GATHER).await?;
            if buf.len() != self.world_size as usize * 8 {
                return Err(ReduceError::DecodeFailed(format!(
                    "gather reply of {} bytes for {} ranks",
                    buf.len(),
                    self.world_size
                )));
            }
            Ok(buf
                .chunks_exact(8)
                .map(|c| u64::from_le_bytes(c.try_into().expect("chunk holds 8 bytes")))
                .collect())
        }
    }
}
