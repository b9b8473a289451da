//! Matrix indexing helpers and the seeded random matrix generator.

use num::{Complex, Zero};
use rand::Rng;

use crate::element::Real;
use crate::error::{validation_error, Result};
use crate::params::{Order, Transpose};

/// Linear index of element `(row, col)` in a matrix with leading dimension `ld`.
#[inline(always)]
pub fn index(order: Order, row: usize, col: usize, ld: usize) -> usize {
    match order {
        Order::ColumnMajor => row + col * ld,
        Order::RowMajor => row * ld + col,
    }
}

/// Minimum slice length holding a `rows x cols` matrix with leading dimension `ld`.
pub fn required_len(order: Order, rows: usize, cols: usize, ld: usize) -> usize {
    if rows == 0 || cols == 0 {
        return 0;
    }
    match order {
        Order::ColumnMajor => (cols - 1) * ld + rows,
        Order::RowMajor => (rows - 1) * ld + cols,
    }
}

/// Stored `(rows, cols)` of a matrix whose operation yields `rows x cols`.
pub fn stored_shape(trans: Transpose, rows: usize, cols: usize) -> (usize, usize) {
    match trans {
        Transpose::NoTrans => (rows, cols),
        Transpose::Trans | Transpose::ConjTrans => (cols, rows),
    }
}

fn random_complex<F: Real, R: Rng + ?Sized>(rng: &mut R) -> Complex<F> {
    let one = F::one();
    Complex::new(rng.random_range(-one..one), rng.random_range(-one..one))
}

fn damping<F: Real>(enabled: bool, multiplier: Complex<F>) -> F {
    let norm = multiplier.norm();
    if enabled && norm > F::one() {
        F::one() / norm
    } else {
        F::one()
    }
}

fn check_len(name: &str, len: usize, order: Order, rows: usize, cols: usize, ld: usize) -> Result<()> {
    let need = required_len(order, rows, cols, ld);
    if len < need {
        return Err(validation_error(format!(
            "{name} holds {len} elements, {rows}x{cols} with ld {ld} needs {need}"
        )));
    }
    Ok(())
}

/// Fills the operands of `C := alpha*op(A)*op(B) + beta*C` with random values.
///
/// `op(A)` is `m x k`, `op(B)` is `k x n`, `C` is `m x n`. Entries of `A` and
/// `B` are uniform in (-1, 1) on both components; with `use_alpha` they are
/// divided by `|alpha|` when it exceeds one, and likewise `C` by `|beta|`
/// with `use_beta`. A square `C` is generated Hermitian: the lower triangle
/// mirrors the conjugate of the upper one and the diagonal is real. Only the
/// logical region is written, padding keeps its contents.
///
/// The sequence of draws depends only on the shapes, so a seeded `rng`
/// reproduces the same matrices.
#[allow(clippy::too_many_arguments)]
pub fn random_gemm_matrices<F: Real, R: Rng + ?Sized>(
    rng: &mut R,
    order: Order,
    trans_a: Transpose,
    trans_b: Transpose,
    m: usize,
    n: usize,
    k: usize,
    use_alpha: bool,
    alpha: Complex<F>,
    a: &mut [Complex<F>],
    lda: usize,
    b: &mut [Complex<F>],
    ldb: usize,
    use_beta: bool,
    beta: Complex<F>,
    c: &mut [Complex<F>],
    ldc: usize,
) -> Result<()> {
    let (a_rows, a_cols) = stored_shape(trans_a, m, k);
    let (b_rows, b_cols) = stored_shape(trans_b, k, n);
    check_len("A", a.len(), order, a_rows, a_cols, lda)?;
    check_len("B", b.len(), order, b_rows, b_cols, ldb)?;
    check_len("C", c.len(), order, m, n, ldc)?;

    let scale_ab = damping(use_alpha, alpha);
    let scale_c = damping(use_beta, beta);

    for col in 0..a_cols {
        for row in 0..a_rows {
            a[index(order, row, col, lda)] = random_complex::<F, R>(rng).scale(scale_ab);
        }
    }
    for col in 0..b_cols {
        for row in 0..b_rows {
            b[index(order, row, col, ldb)] = random_complex::<F, R>(rng).scale(scale_ab);
        }
    }

    if m == n {
        for col in 0..n {
            for row in 0..=col {
                let mut value = random_complex::<F, R>(rng).scale(scale_c);
                if row == col {
                    value.im = F::zero();
                } else {
                    c[index(order, col, row, ldc)] = value.conj();
                }
                c[index(order, row, col, ldc)] = value;
            }
        }
    } else {
        for col in 0..n {
            for row in 0..m {
                c[index(order, row, col, ldc)] = random_complex::<F, R>(rng).scale(scale_c);
            }
        }
    }
    Ok(())
}

/// Whether the `n x n` matrix in `c` equals its own conjugate transpose.
pub fn is_hermitian<F: Real>(order: Order, n: usize, c: &[Complex<F>], ldc: usize) -> bool {
    (0..n).all(|col| {
        (0..=col).all(|row| {
            let upper = c[index(order, row, col, ldc)];
            let lower = c[index(order, col, row, ldc)];
            upper == lower.conj() && (row != col || upper.im.is_zero())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_index_and_required_len() {
        assert_eq!(index(Order::ColumnMajor, 2, 3, 10), 32);
        assert_eq!(index(Order::RowMajor, 2, 3, 10), 23);
        assert_eq!(required_len(Order::ColumnMajor, 4, 3, 6), 16);
        assert_eq!(required_len(Order::RowMajor, 4, 3, 6), 21);
        assert_eq!(required_len(Order::RowMajor, 0, 3, 6), 0);
    }

    #[test]
    fn test_generated_c_is_hermitian() {
        let mut rng = StdRng::seed_from_u64(7);
        let (n, k) = (5, 3);
        let mut a = vec![Complex::<f64>::zero(); n * k];
        let mut b = vec![Complex::<f64>::zero(); n * k];
        let mut c = vec![Complex::<f64>::zero(); 7 * n];
        random_gemm_matrices(
            &mut rng,
            Order::ColumnMajor,
            Transpose::NoTrans,
            Transpose::ConjTrans,
            n,
            n,
            k,
            true,
            Complex::new(1.0, 0.0),
            &mut a,
            n,
            &mut b,
            n,
            true,
            Complex::new(1.0, 0.0),
            &mut c,
            7,
        )
        .unwrap();
        assert!(is_hermitian(Order::ColumnMajor, n, &c, 7));
        // padding rows are untouched
        assert!(c[5].is_zero() && c[6].is_zero());
    }

    #[test]
    fn test_large_multipliers_damp_values() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = vec![Complex::<f32>::zero(); 16];
        let mut b = vec![Complex::<f32>::zero(); 16];
        let mut c = vec![Complex::<f32>::zero(); 16];
        random_gemm_matrices(
            &mut rng,
            Order::RowMajor,
            Transpose::NoTrans,
            Transpose::ConjTrans,
            4,
            4,
            4,
            true,
            Complex::new(0.0, 100.0),
            &mut a,
            4,
            &mut b,
            4,
            true,
            Complex::new(50.0, 0.0),
            &mut c,
            4,
        )
        .unwrap();
        assert!(a.iter().chain(b.iter()).all(|v| v.re.abs() <= 0.0101 && v.im.abs() <= 0.0101));
        assert!(c.iter().all(|v| v.re.abs() <= 0.0201));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = vec![Complex::<f32>::zero(); 3];
        let mut b = vec![Complex::<f32>::zero(); 4];
        let mut c = vec![Complex::<f32>::zero(); 4];
        let result = random_gemm_matrices(
            &mut rng,
            Order::ColumnMajor,
            Transpose::NoTrans,
            Transpose::ConjTrans,
            2,
            2,
            2,
            false,
            Complex::new(1.0, 0.0),
            &mut a,
            2,
            &mut b,
            2,
            false,
            Complex::new(1.0, 0.0),
            &mut c,
            2,
        );
        assert!(result.is_err());
    }
}
