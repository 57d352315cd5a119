//! Operational modes for simulated modules.
//!
//! - **Instant**: reads complete immediately, for unit tests
//! - **Realistic**: each read costs one bus round trip
//! - **Chaos**: bus round trips plus random read failures

use std::time::Duration;

/// Operational modes for simulated modules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockMode {
    /// No latency, deterministic
    #[default]
    Instant,
    /// Bus round-trip latency on every read
    Realistic,
    /// Latency plus random read failures
    Chaos,
}

/// Typical request/response round trip through the bus daemon.
const BUS_ROUND_TRIP: Duration = Duration::from_millis(2);

impl MockMode {
    /// Latency added to each read.
    pub fn read_latency(&self) -> Duration {
        match self {
            MockMode::Instant => Duration::ZERO,
            MockMode::Realistic | MockMode::Chaos => BUS_ROUND_TRIP,
        }
    }

    /// Failure rate applied to reads that have no explicit rate configured.
    pub fn failure_rate(&self) -> f64 {
        match self {
            MockMode::Chaos => 0.1,
            _ => 0.0,
        }
    }
}
