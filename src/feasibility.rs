//! Admission check run before any device allocation.
//!
//! The check is conservative: only half of the reported global memory is
//! considered usable, and the footprint of `A`, `B` and `C` must fit below
//! both that and the maximum single allocation. Passing the check does not
//! guarantee the allocations succeed.

use crate::error::{allocation_error, validation_error, Result};
use crate::params::ProblemDescriptor;

/// Bytes needed by `A`, `B` (`N x K` each) and `C` (`N x N`).
///
/// Returns `None` on overflow.
pub fn required_bytes(params: &ProblemDescriptor) -> Option<u64> {
    let n = params.n as u64;
    let k = params.k as u64;
    let elem = params.element_size() as u64;

    let ab = 2u64.checked_mul(n)?.checked_mul(k)?.checked_mul(elem)?;
    let c = n.checked_mul(n)?.checked_mul(elem)?;
    ab.checked_add(c)
}

/// Whether the instance may be staged on a device with the given limits.
pub fn is_feasible(
    params: &ProblemDescriptor,
    available_global_memory: u64,
    max_single_allocation: u64,
) -> bool {
    let cap = (available_global_memory / 2).min(max_single_allocation);
    match required_bytes(params) {
        Some(bytes) => bytes < cap,
        None => false,
    }
}

/// Checks the padded buffers `params` will stage against the device limits.
///
/// Leading dimensions and offsets can make the actual buffers far larger
/// than the `N`/`K` footprint, so this runs before any host memory is
/// allocated. Exceeding a limit is an allocation failure.
pub fn check_allocations(
    params: &ProblemDescriptor,
    available_global_memory: u64,
    max_single_allocation: u64,
) -> Result<()> {
    let elem = params.element_size() as u64;
    let mut total = 0u64;
    for (name, len) in ["A", "B", "C"].into_iter().zip(params.device_lens()?) {
        let bytes = (len as u64)
            .checked_mul(elem)
            .ok_or_else(|| validation_error(format!("size of {name} in bytes overflows")))?;
        if bytes > max_single_allocation {
            return Err(allocation_error(
                bytes,
                max_single_allocation,
                format!("matrix {name} exceeds maximum single allocation"),
            ));
        }
        total = total.saturating_add(bytes);
    }
    if total > available_global_memory {
        return Err(allocation_error(
            total,
            available_global_memory,
            "matrices exceed available global memory",
        ));
    }
    Ok(())
}
