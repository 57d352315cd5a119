//! Common infrastructure for simulated modules.
//!
//! - **mode**: latency and failure profile (Instant, Realistic, Chaos)
//! - **errors**: error injection keyed by read kind
//! - **rng**: seeded random number generator

pub mod errors;
pub mod mode;
pub mod rng;

pub use errors::{ErrorConfig, ErrorScenario, Injection};
pub use mode::MockMode;
pub use rng::MockRng;
