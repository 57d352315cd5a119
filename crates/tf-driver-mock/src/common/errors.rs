//! Error injection for simulated modules.
//!
//! Failures are keyed by [`SampleKind`] and surface the way a real module's
//! would: a [`SensorError::Read`] carrying a negative bus status, or a read
//! that never completes so the caller's timeout fires.

use super::rng::MockRng;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tf_core::{BusStatus, SampleKind, SensorError, SensorResult};

/// What a read should do after passing error injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// Return the sample
    Pass,
    /// Never complete
    Stall,
}

/// An injected failure pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorScenario {
    /// Fail every read of `operation` after `count` successes
    FailAfterN { operation: SampleKind, count: u32 },
    /// Every read of `operation` fails with `status`
    Status {
        operation: SampleKind,
        status: BusStatus,
    },
    /// Reads of `operation` never complete
    Stall { operation: SampleKind },
    /// Module dropped off the bus: every read fails with `NotConnected`
    CommunicationLoss,
}

#[derive(Default, Debug)]
struct ErrorState {
    /// Successful reads per kind, for FailAfterN
    operation_counts: HashMap<SampleKind, u32>,
}

/// Error injection configuration for one simulated module
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    /// Per-kind failure rate (0.0 to 1.0); `None` key applies to every kind
    failure_rates: Arc<HashMap<Option<SampleKind>, f64>>,
    scenarios: Arc<Vec<ErrorScenario>>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<ErrorState>>,
}

impl ErrorConfig {
    /// No injected errors.
    pub fn none() -> Self {
        Self::scenarios(Vec::new())
    }

    /// Uniform random failures on every kind.
    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        let mut rates = HashMap::new();
        rates.insert(None, rate);
        Self {
            failure_rates: Arc::new(rates),
            scenarios: Arc::new(Vec::new()),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// A single scenario.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several scenarios, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self {
            failure_rates: Arc::new(HashMap::new()),
            scenarios: Arc::new(scenarios),
            rng: Arc::new(MockRng::new(None)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// Decide the fate of one read of `operation` on module `uid`.
    ///
    /// # Errors
    /// The injected [`SensorError::Read`].
    pub fn check_operation(&self, uid: &str, operation: SampleKind) -> SensorResult<Injection> {
        let mut state = self.state.lock();

        for scenario in self.scenarios.iter() {
            match scenario {
                ErrorScenario::CommunicationLoss => {
                    return Err(read_error(uid, operation, BusStatus::NotConnected));
                }
                ErrorScenario::Status {
                    operation: op,
                    status,
                } if *op == operation => {
                    return Err(read_error(uid, operation, *status));
                }
                ErrorScenario::Stall { operation: op } if *op == operation => {
                    return Ok(Injection::Stall);
                }
                ErrorScenario::FailAfterN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let current = state.operation_counts.entry(operation).or_insert(0);
                    if *current >= *count {
                        return Err(read_error(uid, operation, BusStatus::Timeout));
                    }
                    *current += 1;
                }
                _ => {}
            }
        }

        let rate = self
            .failure_rates
            .get(&Some(operation))
            .or_else(|| self.failure_rates.get(&None))
            .copied()
            .unwrap_or(0.0);
        if self.rng.should_fail(rate) {
            return Err(read_error(uid, operation, BusStatus::Timeout));
        }

        Ok(Injection::Pass)
    }

    /// Clear scenario counters.
    pub fn reset(&self) {
        *self.state.lock() = ErrorState::default();
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}

fn read_error(uid: &str, operation: SampleKind, status: BusStatus) -> SensorError {
    SensorError::Read {
        uid: uid.to_string(),
        what: operation.label(),
        status,
    }
}
