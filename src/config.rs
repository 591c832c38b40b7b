//! Construction-time options for a reducer.
//!
//! All values have defaults matching the classic behavior (broadcast the
//! result to every rank). Override via environment variables (prefixed
//! `REPROSUM_`) or by constructing a custom `ReduceConfig`.

/// Where the final sum ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceMode {
    /// The result is returned on the logical root only; other ranks get an
    /// unspecified value.
    RootOnly,
    /// The root broadcasts its result so every rank returns the same sum.
    Broadcast,
}

/// Options fixed at reducer construction.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    pub mode: ReduceMode,

    /// Reserved fan-out parameter. Must be non-zero; the binary-tree schedule
    /// accepts and ignores it.
    pub fanout: u32,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        Self {
            mode: ReduceMode::Broadcast,
            fanout: 1,
        }
    }
}

impl ReduceConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `REPROSUM_REDUCE_MODE` (`root` or `broadcast`)
    /// - `REPROSUM_FANOUT`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("REPROSUM_REDUCE_MODE") {
            match v.as_str() {
                "root" => cfg.mode = ReduceMode::RootOnly,
                "broadcast" => cfg.mode = ReduceMode::Broadcast,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("REPROSUM_FANOUT") {
            if let Ok(k) = v.parse::<u32>() {
                cfg.fanout = k;
            }
        }

        cfg
    }
}
