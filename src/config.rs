//! Runtime configuration of the harness.

use crate::error::{validation_error, Result};

/// Back-to-back kernel launches averaged by the accelerated path.
///
/// Enough to amortize per-dispatch overhead without running long enough to
/// change cache or thermal state.
pub const DEFAULT_ITERATIONS: u32 = 20;

/// Seed used for test data unless overridden.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Launches averaged per accelerated measurement.
    pub iterations: u32,
    /// Seed of the random matrix generator.
    pub seed: u64,
    /// Whether row-major problems may be timed on the reference path.
    pub allow_row_major: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            allow_row_major: true,
        }
    }
}

impl BenchConfig {
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_row_major(mut self, allowed: bool) -> Self {
        self.allow_row_major = allowed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(validation_error("iteration count must be positive"));
        }
        Ok(())
    }
}
