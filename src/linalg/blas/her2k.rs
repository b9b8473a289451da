use num::{Complex, Zero};
use rayon::prelude::*;

use crate::element::Real;
use crate::error::Result;
use crate::linalg::check_her2k_operands;
use crate::matrix::{index, required_len};
use crate::params::{Order, Transpose, Uplo};

/// Gathers the `n` rows of `op(X)` (each `k` long) into a contiguous buffer.
///
/// `op(X)(i, p)` is `X(i, p)` for `NoTrans` and `conj(X(p, i))` for `ConjTrans`.
fn gather_op_rows<F: Real>(
    order: Order,
    trans: Transpose,
    n: usize,
    k: usize,
    x: &[Complex<F>],
    ldx: usize,
) -> Vec<Complex<F>> {
    let mut rows = vec![Complex::zero(); n * k];
    for (i, row) in rows.chunks_exact_mut(k.max(1)).take(n).enumerate() {
        for (p, dst) in row.iter_mut().enumerate().take(k) {
            *dst = match trans {
                Transpose::NoTrans => x[index(order, i, p, ldx)],
                Transpose::Trans | Transpose::ConjTrans => x[index(order, p, i, ldx)].conj(),
            };
        }
    }
    rows
}

#[inline(always)]
fn dot_conj<F: Real>(x: &[Complex<F>], y: &[Complex<F>]) -> Complex<F> {
    x.iter()
        .zip(y)
        .fold(Complex::zero(), |acc, (xv, yv)| acc + *xv * yv.conj())
}

/// Hermitian rank-2k update:
/// `C := alpha*op(A)*op(B)^H + conj(alpha)*op(B)*op(A)^H + beta*C`.
///
/// `op(A)` and `op(B)` are `n x k`; only the `uplo` triangle of the `n x n`
/// matrix `C` is referenced and the imaginary parts of its diagonal are set to
/// zero. Both storage orders are handled natively.
///
/// The rows of `op(A)` and `op(B)` are first gathered into contiguous buffers,
/// then the columns of `C` (rows for row-major storage) are updated in
/// parallel with Rayon.
///
/// # Errors
///
/// Returns a validation error if `trans` is `Trans`, a leading dimension is
/// too small, or a slice is too short for the requested shape.
#[allow(clippy::too_many_arguments)]
pub fn her2k<F: Real>(
    order: Order,
    uplo: Uplo,
    trans: Transpose,
    n: usize,
    k: usize,
    alpha: Complex<F>,
    a: &[Complex<F>],
    lda: usize,
    b: &[Complex<F>],
    ldb: usize,
    beta: F,
    c: &mut [Complex<F>],
    ldc: usize,
) -> Result<()> {
    check_her2k_operands(order, trans, n, k, a.len(), lda, b.len(), ldb, c.len(), ldc)?;

    if n == 0 || ((alpha.is_zero() || k == 0) && beta == F::one()) {
        return Ok(());
    }

    let op_a = gather_op_rows(order, trans, n, k, a, lda);
    let op_b = gather_op_rows(order, trans, n, k, b, ldb);
    let alpha_conj = alpha.conj();
    let span = required_len(order, n, n, ldc);

    // Each chunk is one column (column-major) or one row (row-major) of C.
    c[..span]
        .par_chunks_mut(ldc)
        .take(n)
        .enumerate()
        .for_each(|(major, lane)| {
            for (minor, cij) in lane.iter_mut().enumerate().take(n) {
                let (i, j) = match order {
                    Order::ColumnMajor => (minor, major),
                    Order::RowMajor => (major, minor),
                };
                if !uplo.contains(i, j) {
                    continue;
                }

                let a_i = &op_a[i * k..(i + 1) * k];
                let a_j = &op_a[j * k..(j + 1) * k];
                let b_i = &op_b[i * k..(i + 1) * k];
                let b_j = &op_b[j * k..(j + 1) * k];

                let prior = if beta.is_zero() {
                    Complex::zero()
                } else {
                    cij.scale(beta)
                };
                let mut value = alpha * dot_conj(a_i, b_j) + alpha_conj * dot_conj(b_i, a_j) + prior;
                if i == j {
                    value.im = F::zero();
                }
                *cij = value;
            }
        });

    Ok(())
}
