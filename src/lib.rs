pub mod accumulate;
pub mod comm;
pub mod config;
pub mod error;
pub mod io;
pub mod reducer;
pub mod topology;
pub mod tree;
pub mod types;
mod wire;

pub use accumulate::serial_sum;
pub use comm::{Communicator, LocalComm};
pub use config::{ReduceConfig, ReduceMode};
pub use error::{ReduceError, Result};
pub use reducer::Reducer;
pub use types::{Rank, Region, TreeCoords, even_regions};
