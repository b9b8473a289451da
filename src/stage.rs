//! Host test data generation and staging onto a device.

use num::{Complex, Zero};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::device::{Device, DeviceBuffer, MemFlags};
use crate::element::{convert_multiplier, Real};
use crate::error::Result;
use crate::matrix::random_gemm_matrices;
use crate::params::ProblemDescriptor;

/// Host copies of the operands.
///
/// `c` is both input and output of her2k, so `back_c` keeps the pristine
/// initial state every timed run starts from.
#[derive(Debug, Clone, PartialEq)]
pub struct HostMatrixSet<F: Real> {
    pub a: Vec<Complex<F>>,
    pub b: Vec<Complex<F>>,
    pub c: Vec<Complex<F>>,
    pub back_c: Vec<Complex<F>>,
}

/// Device mirrors of `A`, `B` (read-only) and `C` (read-write).
#[derive(Debug)]
pub struct DeviceBufferSet<F: Real> {
    pub a: DeviceBuffer<F>,
    pub b: DeviceBuffer<F>,
    pub c: DeviceBuffer<F>,
}

/// Generates the host matrices for `params`, reproducibly from `seed`.
///
/// `B` is generated with the Hermitian complement of `A`'s transpose mode so
/// both share the stored shape her2k expects.
pub fn generate<F: Real>(params: &ProblemDescriptor, seed: u64) -> Result<HostMatrixSet<F>> {
    params.validate()?;

    let alpha = convert_multiplier::<F>(params.alpha);
    let beta = Complex::new(F::from_f64_lossy(params.beta), F::zero());

    let mut a = vec![Complex::zero(); params.host_len_a()?];
    let mut b = vec![Complex::zero(); params.host_len_b()?];
    let mut back_c = vec![Complex::zero(); params.host_len_c()?];

    let mut rng = StdRng::seed_from_u64(seed);
    random_gemm_matrices(
        &mut rng,
        params.order,
        params.trans_a,
        params.trans_a.conj_complement(),
        params.n,
        params.n,
        params.k,
        true,
        alpha,
        &mut a,
        params.lda,
        &mut b,
        params.ldb,
        true,
        beta,
        &mut back_c,
        params.ldc,
    )?;

    debug!(
        seed,
        a = a.len(),
        b = b.len(),
        c = back_c.len(),
        "generated host matrices"
    );
    Ok(HostMatrixSet {
        a,
        b,
        c: back_c.clone(),
        back_c,
    })
}

/// Creates the device buffers for `host`, each placed at its offset.
///
/// On failure the buffers created so far are dropped, which releases them,
/// before the error is returned.
pub fn upload<F: Real, D: Device>(
    host: &HostMatrixSet<F>,
    params: &ProblemDescriptor,
    device: &D,
) -> Result<DeviceBufferSet<F>> {
    let a = device
        .create_buffer(&host.a, params.off_a, MemFlags::ReadOnly)
        .inspect_err(|e| debug!("Matrix A buffer object creation failed: {e}"))?;
    let b = device
        .create_buffer(&host.b, params.off_b, MemFlags::ReadOnly)
        .inspect_err(|e| debug!("Matrix B buffer object creation failed: {e}"))?;
    let c = device
        .create_buffer(&host.back_c, params.off_c, MemFlags::ReadWrite)
        .inspect_err(|e| debug!("Matrix C buffer object creation failed: {e}"))?;

    Ok(DeviceBufferSet { a, b, c })
}
