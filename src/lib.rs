//! Performance harness for the Hermitian rank-2k update (`cher2k`, `zher2k`).
//!
//! Each benchmark instance checks that the device can hold the problem,
//! generates seeded test matrices, times one call of the host reference
//! routine and the average of repeated accelerated kernel launches, and
//! turns the two timings into a [`report::Verdict`].
//!
//! ```no_run
//! use her2kbench::bench::cher2k;
//! use her2kbench::config::BenchConfig;
//! use her2kbench::device::HostDevice;
//! use her2kbench::element::Precision;
//! use her2kbench::kernel::HostHer2k;
//! use her2kbench::params::{Order, ProblemDescriptor, Transpose, Uplo};
//!
//! let params = ProblemDescriptor::new(
//!     Precision::Single,
//!     Order::ColumnMajor,
//!     Uplo::Upper,
//!     Transpose::NoTrans,
//!     256,
//!     64,
//! );
//! let report = cher2k(params, &HostDevice::default(), &HostHer2k, &BenchConfig::default());
//! println!("{report}");
//! ```

pub mod bench;
pub mod config;
pub mod device;
pub mod element;
pub mod error;
pub mod executor;
pub mod feasibility;
pub mod kernel;
pub mod linalg;
pub mod matrix;
pub mod params;
pub mod report;
pub mod stage;

pub use bench::{cher2k, run_instance, zher2k, Her2kPerformanceTest};
pub use config::BenchConfig;
pub use error::{HarnessError, Result};
pub use params::{BlasFunction, ProblemDescriptor};
pub use report::{BenchReport, TimingSample, Verdict};
