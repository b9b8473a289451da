//! Numeric kinds the harness is generic over.
//!
//! The harness benchmarks complex single (`cher2k`) and complex double
//! (`zher2k`) precision. Rather than duplicating every call site, the code is
//! generic over the real component type `F: Real`; matrix elements are
//! always `Complex<F>`.

use std::fmt::{self, Debug};

use num::{Complex, Float};
use rand::distr::uniform::SampleUniform;

/// Single-precision complex element.
pub type Complex32 = Complex<f32>;
/// Double-precision complex element.
pub type Complex64 = Complex<f64>;

/// Precision of the complex elements of a benchmark instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// `Complex<f32>`, 8 bytes per element.
    Single,
    /// `Complex<f64>`, 16 bytes per element.
    Double,
}

impl Precision {
    /// Size in bytes of one complex element.
    pub const fn element_size(self) -> usize {
        match self {
            Precision::Single => std::mem::size_of::<Complex32>(),
            Precision::Double => std::mem::size_of::<Complex64>(),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "single complex"),
            Precision::Double => write!(f, "double complex"),
        }
    }
}

/// Real component type of a benchmark element.
pub trait Real: Float + SampleUniform + Default + Debug + Send + Sync + 'static {
    /// Precision tag of `Complex<Self>`.
    const PRECISION: Precision;

    /// Lossy conversion used for multipliers supplied as `f64`.
    fn from_f64_lossy(value: f64) -> Self;
}

impl Real for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline(always)]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline(always)]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }
}

/// Converts a multiplier given in double precision to the element type.
pub fn convert_multiplier<F: Real>(value: Complex64) -> Complex<F> {
    Complex::new(F::from_f64_lossy(value.re), F::from_f64_lossy(value.im))
}
