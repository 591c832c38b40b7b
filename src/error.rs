use crate::types::Rank;

pub type Result<T> = std::result::Result<T, ReduceError>;

#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("{regions} regions for a communicator of {world_size} ranks")]
    RegionCountMismatch { regions: usize, world_size: u32 },

    #[error("global array is empty")]
    EmptyGlobalArray,

    #[error("no region starts at index 0")]
    MissingAnchor,

    #[error(
        "regions do not partition the array: array-order rank {array_rank} \
         starts at {actual_start}, expected {expected_start}"
    )]
    RegionsNotPartition {
        array_rank: Rank,
        expected_start: u64,
        actual_start: u64,
    },

    #[error("rank {rank} received coordinate ({x}, {y}) it can neither fold nor forward")]
    UnexpectedCoordinate { rank: Rank, x: u64, y: u32 },

    #[error("no subtree value available for node ({x}, {y}) on rank {rank}")]
    CoverageGap { rank: Rank, x: u64, y: u32 },

    #[error("value block from rank {rank} holds {actual} doubles, expected {expected}")]
    ProtocolMismatch {
        rank: Rank,
        expected: usize,
        actual: usize,
    },

    #[error("message decode failed: {0}")]
    DecodeFailed(String),

    #[error("invalid rank {rank}: world size is {world_size}")]
    InvalidRank { rank: Rank, world_size: u32 },

    #[error("peer {rank} disconnected unexpectedly")]
    PeerDisconnected { rank: Rank },

    #[error("invalid fan-out parameter: must be non-zero")]
    InvalidFanout,

    #[error("{path}:{line}: not a floating-point value: {value:?}")]
    ParseValue {
        path: String,
        line: usize,
        value: String,
    },

    #[error("{path}: {trailing} trailing bytes do not form a whole double")]
    TruncatedBinaryFile { path: String, trailing: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
