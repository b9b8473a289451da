//! Reference path: one timed her2k on host memory.
//!
//! The reference routine only understands column-major storage. A row-major
//! her2k is the same computation on the transposed view of every matrix:
//! with `C^T` stored row-major being `C` stored column-major, the update
//! holds once alpha is conjugated, `NoTrans` and `ConjTrans` are exchanged
//! and the filled triangle is flipped.

use tracing::debug;

use crate::config::BenchConfig;
use crate::element::Real;
use crate::error::{HarnessError, Result};
use crate::params::{Order, ProblemDescriptor, Transpose};
use crate::report::TimingSample;
use crate::stage::HostMatrixSet;

/// Reinterprets the problem in the opposite storage order.
///
/// Applying it twice restores the original descriptor exactly.
pub fn flip_layout(params: &ProblemDescriptor) -> ProblemDescriptor {
    let mut flipped = *params;
    flipped.order = match params.order {
        Order::RowMajor => Order::ColumnMajor,
        Order::ColumnMajor => Order::RowMajor,
    };
    flipped.alpha = params.alpha.conj();
    flipped.trans_a = match params.trans_a {
        Transpose::NoTrans => Transpose::ConjTrans,
        Transpose::ConjTrans => Transpose::NoTrans,
        Transpose::Trans => Transpose::Trans,
    };
    flipped.uplo = params.uplo.flip();
    flipped
}

/// Column-major equivalent of `params`; column-major input is returned as is.
pub fn normalize(params: &ProblemDescriptor) -> ProblemDescriptor {
    match params.order {
        Order::RowMajor => flip_layout(params),
        Order::ColumnMajor => *params,
    }
}

/// Times a single reference her2k.
///
/// `C` is reset from the backup first so the run starts from the generated
/// state regardless of earlier runs.
pub fn run_once<F: Real>(
    params: &ProblemDescriptor,
    host: &mut HostMatrixSet<F>,
    config: &BenchConfig,
) -> Result<TimingSample> {
    if params.order == Order::RowMajor && !config.allow_row_major {
        return Err(HarnessError::RowMajorDisallowed);
    }
    host.c.copy_from_slice(&host.back_c);

    let normalized = normalize(params);
    debug!(
        order = ?normalized.order,
        uplo = ?normalized.uplo,
        trans = ?normalized.trans_a,
        "running reference her2k"
    );
    time_reference(&normalized, host)
}

#[cfg(feature = "reference")]
fn time_reference<F: Real>(
    params: &ProblemDescriptor,
    host: &mut HostMatrixSet<F>,
) -> Result<TimingSample> {
    use std::time::Instant;

    use crate::element::convert_multiplier;
    use crate::linalg::reference;

    let alpha = convert_multiplier::<F>(params.alpha);
    let beta = F::from_f64_lossy(params.beta);

    let start = Instant::now();
    reference::her2k(
        params.order,
        params.uplo,
        params.trans_a,
        params.n,
        params.k,
        alpha,
        &host.a,
        0,
        params.lda,
        &host.b,
        0,
        params.ldb,
        beta,
        &mut host.c,
        0,
        params.ldc,
    )?;
    Ok(TimingSample::from_duration(start.elapsed()))
}

#[cfg(not(feature = "reference"))]
fn time_reference<F: Real>(
    _params: &ProblemDescriptor,
    _host: &mut HostMatrixSet<F>,
) -> Result<TimingSample> {
    Err(HarnessError::ReferenceUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Precision;
    use crate::params::Uplo;
    use crate::stage::generate;
    use num::Complex;

    fn row_major() -> ProblemDescriptor {
        ProblemDescriptor::new(
            Precision::Single,
            Order::RowMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            6,
            3,
        )
        .with_multipliers(Complex::new(0.5, -2.0), 0.25)
    }

    #[test]
    fn test_normalize_row_major() {
        let n = normalize(&row_major());
        assert_eq!(n.order, Order::ColumnMajor);
        assert_eq!(n.uplo, Uplo::Lower);
        assert_eq!(n.trans_a, Transpose::ConjTrans);
        assert_eq!(n.alpha, Complex::new(0.5, 2.0));
        // strides and sizes are untouched
        assert_eq!((n.lda, n.ldb, n.ldc), (3, 3, 6));
        assert!(n.validate().is_ok());
    }

    #[test]
    fn test_normalize_keeps_column_major() {
        let p = flip_layout(&row_major());
        assert_eq!(normalize(&p), p);
    }

    #[test]
    fn test_row_major_can_be_disallowed() {
        let p = row_major();
        let mut host = generate::<f32>(&p, 3).unwrap();
        let config = BenchConfig::default().with_row_major(false);
        assert_eq!(
            run_once(&p, &mut host, &config),
            Err(HarnessError::RowMajorDisallowed)
        );
    }

    #[cfg(feature = "reference")]
    #[test]
    fn test_run_once_resets_c_first() {
        let p = row_major();
        let mut host = generate::<f32>(&p, 3).unwrap();
        host.c.iter_mut().for_each(|v| *v = Complex::new(1e6, 1e6));

        let sample = run_once(&p, &mut host, &BenchConfig::default()).unwrap();
        assert!(!sample.is_failed());
        assert!(host.c.iter().all(|v| v.re.abs() < 1e3));
    }

    #[cfg(not(feature = "reference"))]
    #[test]
    fn test_without_backend() {
        let p = flip_layout(&row_major());
        let mut host = generate::<f32>(&p, 3).unwrap();
        assert_eq!(
            run_once(&p, &mut host, &BenchConfig::default()),
            Err(HarnessError::ReferenceUnavailable)
        );
    }
}
