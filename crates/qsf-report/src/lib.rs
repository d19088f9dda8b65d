//! Report generation for parsed surveys.
//!
//! - **CSV table**: one row per response, one column per question column
//! - **R script**: a `read_csv` import whose column specification mirrors the
//!   table header, with categorical levels shared through named scales

pub mod error;
pub mod r_script;
pub mod scale;
pub mod table;

pub use error::{ReportError, Result};
pub use r_script::{RScriptOptions, generate_r_script, write_r_script};
pub use scale::{NO_RESPONSE_LEVEL, NOT_GROUPED_LEVEL, Scale, ScaleRegistry, scale_name};
pub use table::{render_csv, write_csv};
