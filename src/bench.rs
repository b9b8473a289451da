//! Benchmark orchestration for one her2k instance.
//!
//! An instance walks `Unstarted -> ResourceChecked -> Staged ->
//! ReferenceTimed -> AcceleratedTimed -> Done`, leaving early for
//! `Skipped` or `Fatal`. Host and device buffers are owned by the running
//! instance and released before its report is handed back, whichever way the
//! run ends.

use std::marker::PhantomData;

use tracing::{debug, error, info, warn};

use crate::config::BenchConfig;
use crate::device::Device;
use crate::element::{Precision, Real};
use crate::error::{validation_error, HarnessError};
use crate::executor::{accelerated, reference};
use crate::feasibility::{check_allocations, is_feasible};
use crate::kernel::Her2kKernel;
use crate::params::{BlasFunction, ProblemDescriptor};
use crate::report::{BenchReport, SkipReason, Stage, Verdict};
use crate::stage::{self, DeviceBufferSet, HostMatrixSet};

/// One her2k benchmark instance in precision `F`.
pub struct Her2kPerformanceTest<'d, F: Real, D: Device, K: Her2kKernel> {
    params: ProblemDescriptor,
    config: BenchConfig,
    device: &'d D,
    kernel: &'d K,
    report: BenchReport,
    _precision: PhantomData<F>,
}

impl<'d, F: Real, D: Device, K: Her2kKernel> Her2kPerformanceTest<'d, F, D, K> {
    pub fn new(
        function: BlasFunction,
        params: ProblemDescriptor,
        device: &'d D,
        kernel: &'d K,
        config: BenchConfig,
    ) -> Self {
        Self {
            params,
            config,
            device,
            kernel,
            report: BenchReport::new(function, params),
            _precision: PhantomData,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(function = %self.report.function, from = ?self.report.stage, to = ?next, "stage transition");
        self.report.stage = next;
    }

    fn skip(mut self, reason: SkipReason) -> BenchReport {
        warn!(function = %self.report.function, "{reason}; skipping test");
        self.report.verdict = Verdict::Skip(reason);
        self.advance(Stage::Skipped);
        self.finish()
    }

    fn fail(mut self, err: HarnessError) -> BenchReport {
        error!(function = %self.report.function, stage = ?self.report.stage, "{err}");
        self.report.verdict = Verdict::Fatal;
        self.report.error = Some(err);
        self.advance(Stage::Fatal);
        self.finish()
    }

    fn finish(self) -> BenchReport {
        self.report
    }

    /// Precision, parameter and resource checks made before anything is
    /// allocated.
    fn admission(&self) -> Result<Option<SkipReason>, HarnessError> {
        if F::PRECISION == Precision::Double && !self.device.info().double_precision {
            return Ok(Some(SkipReason::DoublePrecisionUnsupported));
        }
        if self.params.precision != F::PRECISION
            || self.report.function.precision() != F::PRECISION
        {
            return Err(validation_error(format!(
                "{} needs {} precision, descriptor declares {}",
                self.report.function, F::PRECISION, self.params.precision
            )));
        }
        self.params.validate()?;
        self.config.validate()?;

        let info = self.device.info();
        if !is_feasible(
            &self.params,
            self.device.available_global_mem_size(),
            info.max_mem_alloc_size,
        ) {
            return Ok(Some(SkipReason::InsufficientResources));
        }
        check_allocations(
            &self.params,
            self.device.available_global_mem_size(),
            info.max_mem_alloc_size,
        )?;
        Ok(None)
    }

    fn stage_matrices(&self) -> Result<(HostMatrixSet<F>, DeviceBufferSet<F>), HarnessError> {
        let host = stage::generate::<F>(&self.params, self.config.seed)?;
        let buffers = stage::upload(&host, &self.params, self.device)?;
        Ok((host, buffers))
    }

    /// Runs the instance to completion.
    ///
    /// The staged matrices live in this frame, so they are released before
    /// the report is returned on every path.
    pub fn run(mut self) -> BenchReport {
        match self.admission() {
            Ok(Some(reason)) => return self.skip(reason),
            Ok(None) => self.advance(Stage::ResourceChecked),
            Err(err) => return self.fail(err),
        }

        let (mut host, buffers) = match self.stage_matrices() {
            Ok(staged) => staged,
            Err(err) => return self.fail(err),
        };
        self.advance(Stage::Staged);

        match reference::run_once(&self.params, &mut host, &self.config) {
            Ok(sample) => {
                self.report.reference = sample;
                self.advance(Stage::ReferenceTimed);
            }
            Err(err) => return self.fail(err),
        }

        let accelerated = accelerated::run_timed(
            &self.params,
            &host,
            &buffers,
            self.device,
            self.kernel,
            self.config.iterations,
        );
        drop(buffers);
        drop(host);
        match accelerated {
            Ok(sample) => {
                self.report.accelerated = sample;
                self.advance(Stage::AcceleratedTimed);
            }
            Err(err) => return self.fail(err),
        }

        self.complete()
    }

    fn complete(mut self) -> BenchReport {
        let verdict = Verdict::decide(self.report.reference, self.report.accelerated);
        self.report.verdict = verdict;
        match verdict {
            Verdict::Regression => warn!(
                function = %self.report.function,
                reference = %self.report.reference,
                accelerated = %self.report.accelerated,
                "accelerated her2k is slower than the reference"
            ),
            Verdict::Fatal => {
                let err = validation_error("a timing sample is the failure sentinel");
                return self.fail(err);
            }
            _ => info!(
                function = %self.report.function,
                reference = %self.report.reference,
                accelerated = %self.report.accelerated,
                "her2k benchmark passed"
            ),
        }
        self.advance(Stage::Done);
        self.finish()
    }
}

/// Runs one benchmark instance, dispatching on the routine's precision.
pub fn run_instance<D: Device, K: Her2kKernel>(
    function: BlasFunction,
    params: ProblemDescriptor,
    device: &D,
    kernel: &K,
    config: &BenchConfig,
) -> BenchReport {
    info!(%function, n = params.n, k = params.k, order = ?params.order, uplo = ?params.uplo, "starting her2k benchmark");
    match function {
        BlasFunction::Cher2k => {
            Her2kPerformanceTest::<f32, D, K>::new(function, params, device, kernel, config.clone())
                .run()
        }
        BlasFunction::Zher2k => {
            Her2kPerformanceTest::<f64, D, K>::new(function, params, device, kernel, config.clone())
                .run()
        }
    }
}

/// Single-precision complex her2k test case.
pub fn cher2k<D: Device, K: Her2kKernel>(
    params: ProblemDescriptor,
    device: &D,
    kernel: &K,
    config: &BenchConfig,
) -> BenchReport {
    run_instance(
        BlasFunction::Cher2k,
        params.with_precision(Precision::Single),
        device,
        kernel,
        config,
    )
}

/// Double-precision complex her2k test case.
pub fn zher2k<D: Device, K: Her2kKernel>(
    params: ProblemDescriptor,
    device: &D,
    kernel: &K,
    config: &BenchConfig,
) -> BenchReport {
    run_instance(
        BlasFunction::Zher2k,
        params.with_precision(Precision::Double),
        device,
        kernel,
        config,
    )
}
