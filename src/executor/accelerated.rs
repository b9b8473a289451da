//! Accelerated path: averaged back-to-back kernel launches on a device.

use std::time::Instant;

use tracing::debug;

use crate::device::{CommandQueue, Device};
use crate::element::{convert_multiplier, Real};
use crate::error::{validation_error, Result};
use crate::kernel::{Her2kArgs, Her2kKernel};
use crate::params::ProblemDescriptor;
use crate::report::TimingSample;
use crate::stage::{DeviceBufferSet, HostMatrixSet};

/// Average time of one kernel launch over `iterations` launches.
///
/// Device `C` is restored from the host backup and the queue drained before
/// the clock starts; the clock stops once the queue has drained again. `C`
/// is not reset between launches, so only the timing is meaningful.
///
/// On failure every command still queued is discarded, so no launch keeps
/// the staged buffers alive past the return.
pub fn run_timed<F, D, K>(
    params: &ProblemDescriptor,
    host: &HostMatrixSet<F>,
    buffers: &DeviceBufferSet<F>,
    device: &D,
    kernel: &K,
    iterations: u32,
) -> Result<TimingSample>
where
    F: Real,
    D: Device,
    K: Her2kKernel,
{
    if iterations == 0 {
        return Err(validation_error("run_timed requires at least one iteration"));
    }
    let queues: Vec<&CommandQueue> = device.queues().iter().collect();
    let result = time_launches(params, host, buffers, device, kernel, &queues, iterations);
    if result.is_err() {
        for queue in &queues {
            match queue.discard_pending() {
                Ok(0) => {}
                Ok(count) => debug!(queue = queue.id(), count, "discarded commands after failure"),
                Err(e) => debug!(queue = queue.id(), "could not discard commands: {e}"),
            }
        }
    }
    result
}

fn time_launches<F, D, K>(
    params: &ProblemDescriptor,
    host: &HostMatrixSet<F>,
    buffers: &DeviceBufferSet<F>,
    device: &D,
    kernel: &K,
    queues: &[&CommandQueue],
    iterations: u32,
) -> Result<TimingSample>
where
    F: Real,
    D: Device,
    K: Her2kKernel,
{
    let queue = *queues
        .first()
        .ok_or_else(|| validation_error("device exposes no command queue"))?;

    let event = device
        .enqueue_write_buffer(queue, &buffers.c, &host.back_c)
        .inspect_err(|e| debug!("Matrix C buffer object enqueueing error: {e}"))?;
    queue
        .wait_for_events(&[event])
        .inspect_err(|e| debug!("Wait on event failed: {e}"))?;
    queue.finish()?;

    let args = Her2kArgs::new(
        params,
        convert_multiplier::<F>(params.alpha),
        F::from_f64_lossy(params.beta),
        buffers,
    );

    let start = Instant::now();
    for i in 0..iterations {
        kernel
            .her2k(&args, queues, &[])
            .inspect_err(|e| debug!(iteration = i, "her2k enqueue failed: {e}"))?;
    }
    queue
        .finish()
        .inspect_err(|e| debug!("Draining the command queue failed: {e}"))?;
    let elapsed = start.elapsed();

    let sample = TimingSample::from_duration(elapsed / iterations);
    debug!(iterations, total_ns = elapsed.as_nanos() as u64, %sample, "accelerated her2k timed");
    Ok(sample)
}
