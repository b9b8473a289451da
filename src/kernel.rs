//! Accelerated her2k kernel contract and the in-process implementation.

use num::Complex;
use tracing::trace;

use crate::device::{CommandQueue, DeviceBuffer, Event};
use crate::element::Real;
use crate::error::{device_error, validation_error, Result};
use crate::linalg::{blas, check_her2k_operands};
use crate::params::{Order, ProblemDescriptor, Transpose, Uplo};
use crate::stage::DeviceBufferSet;

/// Arguments of one her2k launch on device buffers.
#[derive(Debug, Clone)]
pub struct Her2kArgs<'a, F: Real> {
    pub order: Order,
    pub uplo: Uplo,
    pub trans_a: Transpose,
    pub n: usize,
    pub k: usize,
    pub alpha: Complex<F>,
    pub a: &'a DeviceBuffer<F>,
    pub off_a: usize,
    pub lda: usize,
    pub b: &'a DeviceBuffer<F>,
    pub off_b: usize,
    pub ldb: usize,
    pub beta: F,
    pub c: &'a DeviceBuffer<F>,
    pub off_c: usize,
    pub ldc: usize,
}

impl<'a, F: Real> Her2kArgs<'a, F> {
    /// Launch arguments for `params` on the staged `buffers`.
    pub fn new(
        params: &ProblemDescriptor,
        alpha: Complex<F>,
        beta: F,
        buffers: &'a DeviceBufferSet<F>,
    ) -> Self {
        Self {
            order: params.order,
            uplo: params.uplo,
            trans_a: params.trans_a,
            n: params.n,
            k: params.k,
            alpha,
            a: &buffers.a,
            off_a: params.off_a,
            lda: params.lda,
            b: &buffers.b,
            off_b: params.off_b,
            ldb: params.ldb,
            beta,
            c: &buffers.c,
            off_c: params.off_c,
            ldc: params.ldc,
        }
    }
}

/// A her2k implementation that runs on a device queue.
///
/// `her2k` only enqueues work: the returned event completes once the queue
/// is drained. An `Err` is the equivalent of a non-zero launch status.
pub trait Her2kKernel {
    fn her2k<F: Real>(
        &self,
        args: &Her2kArgs<'_, F>,
        queues: &[&CommandQueue],
        wait_list: &[Event],
    ) -> Result<Event>;
}

/// Rayon-parallel her2k launched on in-process device buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostHer2k;

impl Her2kKernel for HostHer2k {
    fn her2k<F: Real>(
        &self,
        args: &Her2kArgs<'_, F>,
        queues: &[&CommandQueue],
        wait_list: &[Event],
    ) -> Result<Event> {
        let queue = queues
            .first()
            .ok_or_else(|| validation_error("her2k: no command queue given"))?;

        // The queue is in order, so its own events need no extra wait.
        if let Some(foreign) = wait_list.iter().find(|e| e.queue_id() != queue.id()) {
            return Err(validation_error(format!(
                "her2k: wait event from queue {} cannot be ordered on queue {}",
                foreign.queue_id(),
                queue.id()
            )));
        }

        let operands = [
            ("A", args.a, args.off_a),
            ("B", args.b, args.off_b),
            ("C", args.c, args.off_c),
        ];
        for (name, buffer, offset) in operands {
            if offset > buffer.len() {
                return Err(device_error(
                    -30,
                    format!("her2k: offset of {name} is past the buffer end"),
                ));
            }
        }
        let region = |buffer: &DeviceBuffer<F>, offset: usize| buffer.len() - offset;
        check_her2k_operands(
            args.order,
            args.trans_a,
            args.n,
            args.k,
            region(args.a, args.off_a),
            args.lda,
            region(args.b, args.off_b),
            args.ldb,
            region(args.c, args.off_c),
            args.ldc,
        )
        .map_err(|e| device_error(-30, e.to_string()))?;
        if args.c.shares_storage(args.a) || args.c.shares_storage(args.b) {
            return Err(device_error(-30, "her2k: C must not alias A or B"));
        }

        let (a, b, c) = (args.a.clone(), args.b.clone(), args.c.clone());
        let (order, uplo, trans, n, k) = (args.order, args.uplo, args.trans_a, args.n, args.k);
        let (alpha, beta) = (args.alpha, args.beta);
        let (off_a, lda, off_b, ldb, off_c, ldc) =
            (args.off_a, args.lda, args.off_b, args.ldb, args.off_c, args.ldc);

        let event = queue.enqueue(move || {
            let a = a.read()?;
            let b = b.read()?;
            let mut c = c.write()?;
            blas::her2k::her2k(
                order,
                uplo,
                trans,
                n,
                k,
                alpha,
                &a[off_a..],
                lda,
                &b[off_b..],
                ldb,
                beta,
                &mut c[off_c..],
                ldc,
            )
        })?;
        trace!(n, k, queue = queue.id(), "her2k enqueued");
        Ok(event)
    }
}
