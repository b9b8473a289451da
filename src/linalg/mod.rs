pub mod blas;
#[cfg(feature = "reference")]
pub mod reference;

use crate::error::{validation_error, Result};
use crate::matrix::{required_len, stored_shape};
use crate::params::{Order, Transpose};

/// Argument checks shared by every her2k routine.
///
/// Slice lengths are measured from the first element of each matrix, i.e.
/// after any buffer offset has been applied.
#[allow(clippy::too_many_arguments)]
pub(crate) fn check_her2k_operands(
    order: Order,
    trans: Transpose,
    n: usize,
    k: usize,
    a_len: usize,
    lda: usize,
    b_len: usize,
    ldb: usize,
    c_len: usize,
    ldc: usize,
) -> Result<()> {
    if trans == Transpose::Trans {
        return Err(validation_error("her2k: trans must be NoTrans or ConjTrans"));
    }

    let (rows, cols) = stored_shape(trans, n, k);
    let min_ld = match order {
        Order::ColumnMajor => rows,
        Order::RowMajor => cols,
    }
    .max(1);
    if lda < min_ld || ldb < min_ld {
        return Err(validation_error(format!(
            "her2k: lda ({lda}) and ldb ({ldb}) must be >= {min_ld}"
        )));
    }
    if ldc < n.max(1) {
        return Err(validation_error(format!("her2k: ldc ({ldc}) must be >= {n}")));
    }

    let operands = [
        ("A", a_len, required_len(order, rows, cols, lda)),
        ("B", b_len, required_len(order, rows, cols, ldb)),
        ("C", c_len, required_len(order, n, n, ldc)),
    ];
    for (name, len, need) in operands {
        if len < need {
            return Err(validation_error(format!(
                "her2k: {name} holds {len} elements, needs {need}"
            )));
        }
    }
    Ok(())
}
