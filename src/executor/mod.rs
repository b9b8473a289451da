//! The two timed paths of a benchmark instance.
//!
//! [`reference`] times one call of the host routine on host memory;
//! [`accelerated`] times back-to-back kernel launches on device buffers.

pub mod accelerated;
pub mod reference;

pub use accelerated::run_timed;
pub use reference::{flip_layout, normalize, run_once};
