//! Problem description for one her2k benchmark instance.

use std::fmt;

use num::Complex;

use crate::element::{Complex64, Precision};
use crate::error::{validation_error, Result};

/// Storage order of every matrix in the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    RowMajor,
    ColumnMajor,
}

/// Triangle of `C` that is stored and updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uplo {
    Upper,
    Lower,
}

impl Uplo {
    /// The opposite triangle.
    pub const fn flip(self) -> Self {
        match self {
            Uplo::Upper => Uplo::Lower,
            Uplo::Lower => Uplo::Upper,
        }
    }

    /// Whether element `(row, col)` lies in this triangle (diagonal included).
    #[inline(always)]
    pub const fn contains(self, row: usize, col: usize) -> bool {
        match self {
            Uplo::Upper => row <= col,
            Uplo::Lower => row >= col,
        }
    }
}

/// Operation applied to `A` (and, complemented, to `B`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    NoTrans,
    Trans,
    ConjTrans,
}

impl Transpose {
    /// Hermitian complement: `NoTrans` <-> `ConjTrans`.
    ///
    /// Anything other than `NoTrans` maps to `NoTrans`.
    pub const fn conj_complement(self) -> Self {
        match self {
            Transpose::NoTrans => Transpose::ConjTrans,
            Transpose::Trans | Transpose::ConjTrans => Transpose::NoTrans,
        }
    }
}

/// The two benchmarked routines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlasFunction {
    /// Single-precision complex her2k.
    Cher2k,
    /// Double-precision complex her2k.
    Zher2k,
}

impl BlasFunction {
    pub const fn precision(self) -> Precision {
        match self {
            BlasFunction::Cher2k => Precision::Single,
            BlasFunction::Zher2k => Precision::Double,
        }
    }
}

impl fmt::Display for BlasFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlasFunction::Cher2k => write!(f, "cher2k"),
            BlasFunction::Zher2k => write!(f, "zher2k"),
        }
    }
}

/// Immutable description of one benchmark instance.
///
/// Offsets and leading dimensions are in elements. `A` and `B` share the
/// same stored shape: `N x K` when `trans_a` is `NoTrans`, `K x N`
/// otherwise. `C` is `N x N`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemDescriptor {
    pub precision: Precision,
    pub order: Order,
    pub uplo: Uplo,
    pub trans_a: Transpose,
    pub n: usize,
    pub k: usize,
    pub lda: usize,
    pub ldb: usize,
    pub ldc: usize,
    pub off_a: usize,
    pub off_b: usize,
    pub off_c: usize,
    pub alpha: Complex64,
    pub beta: f64,
}

impl ProblemDescriptor {
    /// Builds a tightly packed descriptor: minimal leading dimensions, zero
    /// offsets, `alpha = 1`, `beta = 1`.
    pub fn new(
        precision: Precision,
        order: Order,
        uplo: Uplo,
        trans_a: Transpose,
        n: usize,
        k: usize,
    ) -> Self {
        let (rows, cols) = Self::logical_ab(trans_a, n, k);
        let ld_ab = match order {
            Order::ColumnMajor => rows,
            Order::RowMajor => cols,
        }
        .max(1);

        Self {
            precision,
            order,
            uplo,
            trans_a,
            n,
            k,
            lda: ld_ab,
            ldb: ld_ab,
            ldc: n.max(1),
            off_a: 0,
            off_b: 0,
            off_c: 0,
            alpha: Complex::new(1.0, 0.0),
            beta: 1.0,
        }
    }

    pub fn with_leading_dims(mut self, lda: usize, ldb: usize, ldc: usize) -> Self {
        self.lda = lda;
        self.ldb = ldb;
        self.ldc = ldc;
        self
    }

    pub fn with_offsets(mut self, off_a: usize, off_b: usize, off_c: usize) -> Self {
        self.off_a = off_a;
        self.off_b = off_b;
        self.off_c = off_c;
        self
    }

    pub fn with_multipliers(mut self, alpha: Complex64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    fn logical_ab(trans_a: Transpose, n: usize, k: usize) -> (usize, usize) {
        match trans_a {
            Transpose::NoTrans => (n, k),
            Transpose::Trans | Transpose::ConjTrans => (k, n),
        }
    }

    /// Allocated `(rows, columns)` for a matrix with the given logical shape.
    fn allocated(&self, rows: usize, cols: usize, ld: usize) -> (usize, usize) {
        match self.order {
            Order::ColumnMajor => (ld, cols),
            Order::RowMajor => (rows, ld),
        }
    }

    /// Logical `(rows, columns)` of the stored `A` and `B`.
    pub fn logical_shape_ab(&self) -> (usize, usize) {
        Self::logical_ab(self.trans_a, self.n, self.k)
    }

    pub fn rows_a(&self) -> usize {
        let (rows, cols) = self.logical_shape_ab();
        self.allocated(rows, cols, self.lda).0
    }

    pub fn columns_a(&self) -> usize {
        let (rows, cols) = self.logical_shape_ab();
        self.allocated(rows, cols, self.lda).1
    }

    pub fn rows_b(&self) -> usize {
        let (rows, cols) = self.logical_shape_ab();
        self.allocated(rows, cols, self.ldb).0
    }

    pub fn columns_b(&self) -> usize {
        let (rows, cols) = self.logical_shape_ab();
        self.allocated(rows, cols, self.ldb).1
    }

    pub fn rows_c(&self) -> usize {
        self.allocated(self.n, self.n, self.ldc).0
    }

    pub fn columns_c(&self) -> usize {
        self.allocated(self.n, self.n, self.ldc).1
    }

    fn checked_len(name: &str, rows: usize, cols: usize) -> Result<usize> {
        rows.checked_mul(cols).ok_or_else(|| {
            validation_error(format!("{name} of {rows} x {cols} elements overflows"))
        })
    }

    /// Host element count of `A`.
    pub fn host_len_a(&self) -> Result<usize> {
        Self::checked_len("A", self.rows_a(), self.columns_a())
    }

    /// Host element count of `B`.
    pub fn host_len_b(&self) -> Result<usize> {
        Self::checked_len("B", self.rows_b(), self.columns_b())
    }

    /// Host element count of `C`.
    pub fn host_len_c(&self) -> Result<usize> {
        Self::checked_len("C", self.rows_c(), self.columns_c())
    }

    /// Device element counts of `A`, `B` and `C`: offset plus host length.
    pub fn device_lens(&self) -> Result<[usize; 3]> {
        let lens = [
            ("A", self.host_len_a()?, self.off_a),
            ("B", self.host_len_b()?, self.off_b),
            ("C", self.host_len_c()?, self.off_c),
        ];
        let mut out = [0; 3];
        for (slot, (name, len, offset)) in out.iter_mut().zip(lens) {
            *slot = len.checked_add(offset).ok_or_else(|| {
                validation_error(format!("offset of {name} ({offset}) overflows its buffer length"))
            })?;
        }
        Ok(out)
    }

    pub fn element_size(&self) -> usize {
        self.precision.element_size()
    }

    /// Number of complex multiply-add groups, `N * N * K`.
    pub fn problem_size(&self) -> u64 {
        (self.n as u64)
            .saturating_mul(self.n as u64)
            .saturating_mul(self.k as u64)
    }

    /// Checks leading dimensions against the declared order and the
    /// transpose mode accepted by her2k.
    pub fn validate(&self) -> Result<()> {
        if self.trans_a == Transpose::Trans {
            return Err(validation_error(
                "her2k accepts only NoTrans or ConjTrans for A",
            ));
        }

        let (rows, cols) = self.logical_shape_ab();
        let (min_ld_ab, min_ldc) = match self.order {
            Order::ColumnMajor => (rows.max(1), self.n.max(1)),
            Order::RowMajor => (cols.max(1), self.n.max(1)),
        };

        for (name, ld) in [("lda", self.lda), ("ldb", self.ldb)] {
            if ld < min_ld_ab {
                return Err(validation_error(format!(
                    "{name} ({ld}) must be >= {min_ld_ab} for {:?}",
                    self.order
                )));
            }
        }
        if self.ldc < min_ldc {
            return Err(validation_error(format!(
                "ldc ({}) must be >= {min_ldc}",
                self.ldc
            )));
        }
        if !self.beta.is_finite() || !self.alpha.re.is_finite() || !self.alpha.im.is_finite() {
            return Err(validation_error("multipliers must be finite"));
        }
        self.device_lens().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_column_major_shapes() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            6,
            3,
        );
        assert_eq!((p.lda, p.ldb, p.ldc), (6, 6, 6));
        assert_eq!((p.rows_a(), p.columns_a()), (6, 3));
        assert_eq!(p.host_len_c().unwrap(), 36);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_packed_row_major_conj_trans_shapes() {
        let p = ProblemDescriptor::new(
            Precision::Double,
            Order::RowMajor,
            Uplo::Lower,
            Transpose::ConjTrans,
            5,
            2,
        );
        // A is stored K x N = 2 x 5, row-major: ld spans the N columns.
        assert_eq!(p.lda, 5);
        assert_eq!((p.rows_a(), p.columns_a()), (2, 5));
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_padded_leading_dimension() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            4,
            2,
        )
        .with_leading_dims(7, 5, 9);
        assert_eq!(p.host_len_a().unwrap(), 7 * 2);
        assert_eq!(p.host_len_b().unwrap(), 5 * 2);
        assert_eq!(p.host_len_c().unwrap(), 9 * 4);
        assert_eq!(p.with_offsets(1, 2, 3).device_lens().unwrap(), [15, 12, 39]);
    }

    #[test]
    fn test_rejects_short_leading_dimension() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            8,
            4,
        )
        .with_leading_dims(7, 8, 8);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("lda"));
    }

    #[test]
    fn test_rejects_overflowing_leading_dimension() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            4,
            4,
        )
        .with_leading_dims(usize::MAX / 2, 4, 4);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn test_rejects_overflowing_offset() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::RowMajor,
            Uplo::Upper,
            Transpose::NoTrans,
            4,
            4,
        )
        .with_offsets(usize::MAX, 0, 0);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("offset of A"));
    }

    #[test]
    fn test_rejects_plain_transpose() {
        let p = ProblemDescriptor::new(
            Precision::Single,
            Order::ColumnMajor,
            Uplo::Upper,
            Transpose::Trans,
            4,
            4,
        );
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_complement_and_flip() {
        assert_eq!(Transpose::NoTrans.conj_complement(), Transpose::ConjTrans);
        assert_eq!(Transpose::ConjTrans.conj_complement(), Transpose::NoTrans);
        assert_eq!(Uplo::Upper.flip(), Uplo::Lower);
        assert!(Uplo::Upper.contains(1, 3));
        assert!(!Uplo::Lower.contains(1, 3));
    }

    #[test]
    fn test_function_precision() {
        assert_eq!(BlasFunction::Cher2k.precision(), Precision::Single);
        assert_eq!(BlasFunction::Zher2k.to_string(), "zher2k");
    }
}
