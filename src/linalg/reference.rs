//! Host reference her2k used as the timing baseline.
//!
//! A plain serial translation of the textbook algorithm. It only understands
//! column-major storage; callers holding row-major data normalize the problem
//! first.

use num::{Complex, Zero};

use crate::element::Real;
use crate::error::{validation_error, Result};
use crate::linalg::check_her2k_operands;
use crate::params::{Order, Transpose, Uplo};

/// Column-major `C := alpha*op(A)*op(B)^H + conj(alpha)*op(B)*op(A)^H + beta*C`.
///
/// Offsets are in elements from the start of each slice.
#[allow(clippy::too_many_arguments)]
pub fn her2k<F: Real>(
    order: Order,
    uplo: Uplo,
    trans: Transpose,
    n: usize,
    k: usize,
    alpha: Complex<F>,
    a: &[Complex<F>],
    off_a: usize,
    lda: usize,
    b: &[Complex<F>],
    off_b: usize,
    ldb: usize,
    beta: F,
    c: &mut [Complex<F>],
    off_c: usize,
    ldc: usize,
) -> Result<()> {
    if order != Order::ColumnMajor {
        return Err(validation_error(
            "reference her2k supports column-major storage only",
        ));
    }
    let a = a.get(off_a..).unwrap_or_default();
    let b = b.get(off_b..).unwrap_or_default();
    let c = match c.get_mut(off_c..) {
        Some(c) => c,
        None => return Err(validation_error("reference her2k: offC is past the end of C")),
    };
    check_her2k_operands(order, trans, n, k, a.len(), lda, b.len(), ldb, c.len(), ldc)?;

    let alpha_conj = alpha.conj();
    for j in 0..n {
        let rows = match uplo {
            Uplo::Upper => 0..j + 1,
            Uplo::Lower => j..n,
        };
        for i in rows {
            let mut ab = Complex::zero();
            let mut ba = Complex::zero();
            for l in 0..k {
                let (a_il, a_jl, b_il, b_jl) = match trans {
                    Transpose::NoTrans => (
                        a[i + l * lda],
                        a[j + l * lda],
                        b[i + l * ldb],
                        b[j + l * ldb],
                    ),
                    _ => (
                        a[l + i * lda].conj(),
                        a[l + j * lda].conj(),
                        b[l + i * ldb].conj(),
                        b[l + j * ldb].conj(),
                    ),
                };
                ab = ab + a_il * b_jl.conj();
                ba = ba + b_il * a_jl.conj();
            }

            let idx = i + j * ldc;
            let prior = if beta.is_zero() {
                Complex::zero()
            } else {
                c[idx].scale(beta)
            };
            let mut value = alpha * ab + alpha_conj * ba + prior;
            if i == j {
                value.im = F::zero();
            }
            c[idx] = value;
        }
    }
    Ok(())
}
