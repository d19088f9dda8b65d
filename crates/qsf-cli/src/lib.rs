//! Library surface of the `qsf-convert` binary.

pub mod convert;
pub mod logging;
pub mod types;
