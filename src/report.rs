//! Timing samples, verdicts and the per-instance report.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::HarnessError;
use crate::params::{BlasFunction, ProblemDescriptor};

/// Floating-point operations per element of the `N * N * K` problem size.
pub const OP_FACTOR: u64 = 8;

/// A measured duration in nanoseconds.
///
/// Negative values never come from a clock; [`TimingSample::FAILED`] marks a
/// measurement that did not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimingSample(i64);

impl TimingSample {
    pub const FAILED: TimingSample = TimingSample(-1);

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
    }

    pub const fn nanos(self) -> i64 {
        self.0
    }

    pub const fn is_failed(self) -> bool {
        self.0 < 0
    }

    pub fn as_duration(self) -> Option<Duration> {
        u64::try_from(self.0).ok().map(Duration::from_nanos)
    }

    /// Throughput for `flop` operations, in GFLOP/s.
    pub fn gflops(self, flop: u64) -> Option<f64> {
        match self.0 {
            n if n > 0 => Some(flop as f64 / n as f64),
            _ => None,
        }
    }
}

impl fmt::Display for TimingSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_failed() {
            write!(f, "FAILED")
        } else {
            write!(f, "{} ns", self.0)
        }
    }
}

/// Why an instance was not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    DoublePrecisionUnsupported,
    InsufficientResources,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::DoublePrecisionUnsupported => {
                write!(f, "device lacks native double precision")
            }
            SkipReason::InsufficientResources => write!(f, "insufficient device resources"),
        }
    }
}

/// Outcome of one benchmark instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Skip(SkipReason),
    /// A resource, device or timing failure.
    Fatal,
    /// The accelerated path was slower than the reference.
    Regression,
    Acceptable,
}

impl Verdict {
    /// Verdict for a completed pair of measurements.
    pub fn decide(reference: TimingSample, accelerated: TimingSample) -> Self {
        if reference.is_failed() || accelerated.is_failed() {
            Verdict::Fatal
        } else if accelerated > reference {
            Verdict::Regression
        } else {
            Verdict::Acceptable
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Skip(reason) => write!(f, "skipped ({reason})"),
            Verdict::Fatal => write!(f, "fatal"),
            Verdict::Regression => write!(f, "regression"),
            Verdict::Acceptable => write!(f, "acceptable"),
        }
    }
}

/// Lifecycle of a benchmark instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Unstarted,
    ResourceChecked,
    Staged,
    ReferenceTimed,
    AcceleratedTimed,
    Done,
    Skipped,
    Fatal,
}

/// Everything one instance produced.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub function: BlasFunction,
    pub params: ProblemDescriptor,
    pub started_at: DateTime<Utc>,
    pub stage: Stage,
    pub verdict: Verdict,
    pub reference: TimingSample,
    pub accelerated: TimingSample,
    pub error: Option<HarnessError>,
}

impl BenchReport {
    pub fn new(function: BlasFunction, params: ProblemDescriptor) -> Self {
        Self {
            function,
            params,
            started_at: Utc::now(),
            stage: Stage::Unstarted,
            verdict: Verdict::Fatal,
            reference: TimingSample::FAILED,
            accelerated: TimingSample::FAILED,
            error: None,
        }
    }

    /// Total floating-point operations of one her2k call.
    pub fn flop(&self) -> u64 {
        self.params.problem_size().saturating_mul(OP_FACTOR)
    }

    pub fn reference_gflops(&self) -> Option<f64> {
        self.reference.gflops(self.flop())
    }

    pub fn accelerated_gflops(&self) -> Option<f64> {
        self.accelerated.gflops(self.flop())
    }

    /// Reference time over accelerated time; above one means faster.
    pub fn speedup(&self) -> Option<f64> {
        if self.reference.is_failed() || self.accelerated.nanos() <= 0 {
            return None;
        }
        Some(self.reference.nanos() as f64 / self.accelerated.nanos() as f64)
    }

    /// Status code: negative for fatal, 1 for a regression, 0 otherwise.
    pub fn exit_status(&self) -> i32 {
        match self.verdict {
            Verdict::Fatal => -1,
            Verdict::Regression => 1,
            Verdict::Skip(_) | Verdict::Acceptable => 0,
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        writeln!(
            f,
            "{} N={} K={} {:?} {:?} {:?} ({})",
            self.function,
            p.n,
            p.k,
            p.order,
            p.uplo,
            p.trans_a,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        let gflops = |g: Option<f64>| g.map(|v| format!("{v:.3} GFLOPS")).unwrap_or_default();
        writeln!(
            f,
            "  reference:   {:>16}  {}",
            self.reference.to_string(),
            gflops(self.reference_gflops())
        )?;
        writeln!(
            f,
            "  accelerated: {:>16}  {}",
            self.accelerated.to_string(),
            gflops(self.accelerated_gflops())
        )?;
        write!(f, "  verdict:     {}", self.verdict)?;
        if let Some(err) = &self.error {
            write!(f, " ({err})")?;
        }
        Ok(())
    }
}
