//! Sum a `.psllh` / `.binpsllh` file over an in-process cluster.
//!
//! ```bash
//! cargo run --bin reprosum -- data.psllh 4
//! ```
//!
//! The file is split evenly over the requested number of ranks (trailing
//! ranks take the remainder) and reduced once; the reproducible sum is
//! printed with full precision. Set `REPROSUM_DEBUG_RANK` to an index
//! (`"2"`) or a per-rank bitmap (`"0100"`) to pause ranks for debugger
//! attach.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use reprosum::{Communicator, LocalComm, ReduceConfig, Reducer, even_regions};

/// Flip from an attached debugger to release a paused rank.
static DEBUGGER_ATTACHED: AtomicBool = AtomicBool::new(false);

fn debug_this_rank(selector: &str, rank: u32, world_size: u32) -> bool {
    if selector.len() == world_size as usize {
        selector.as_bytes()[rank as usize] == b'1'
    } else {
        selector.parse::<u32>().is_ok_and(|r| r == rank)
    }
}

async fn wait_for_debugger(rank: u32) {
    eprintln!(
        "rank {rank} paused (pid {}); set reprosum::DEBUGGER_ATTACHED = true to continue",
        std::process::id()
    );
    while !DEBUGGER_ATTACHED.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} file.psllh|file.binpsllh <ranks>", args[0]);
        return ExitCode::FAILURE;
    }

    let filename = &args[1];
    let ranks: u32 = match args[2].parse() {
        Ok(r) if r > 0 => r,
        _ => {
            eprintln!("Invalid rank count: {}", args[2]);
            return ExitCode::FAILURE;
        }
    };

    let data = if filename.ends_with(".psllh") {
        reprosum::io::read_psllh(filename)
    } else if filename.ends_with(".binpsllh") {
        reprosum::io::read_binpsllh(filename)
    } else {
        eprintln!("File must end with .psllh or .binpsllh");
        return ExitCode::FAILURE;
    };
    let data = match data {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Summing {} summands", data.len());
    println!("Cluster size: {ranks}");

    let debug_selector = std::env::var("REPROSUM_DEBUG_RANK").ok();
    let regions = even_regions(data.len() as u64, ranks);
    let data = Arc::new(data);
    let config = ReduceConfig::from_env();

    let mut tasks = Vec::new();
    for comm in LocalComm::bootstrap_local(ranks) {
        let data = Arc::clone(&data);
        let regions = regions.clone();
        let config = config.clone();
        let debug_selector = debug_selector.clone();
        tasks.push(tokio::spawn(async move {
            let rank = comm.rank();
            if let Some(sel) = &debug_selector {
                if debug_this_rank(sel, rank, ranks) {
                    wait_for_debugger(rank).await;
                }
            }

            let mut reducer = Reducer::new(Arc::new(comm), &regions, config).await?;
            let region = reducer.region();
            let start = region.start as usize;
            let end = region.end() as usize;
            reducer.buffer_mut().copy_from_slice(&data[start..end]);

            let sum = reducer.reduce().await?;
            reprosum::Result::Ok((rank, sum))
        }));
    }

    let mut total = 0.0;
    for task in tasks {
        match task.await.expect("rank task panicked") {
            Ok((0, sum)) => total = sum,
            Ok(_) => {}
            Err(e) => {
                eprintln!("reduction failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    println!("{total:.32}");
    ExitCode::SUCCESS
}
