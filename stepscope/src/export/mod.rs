//! Profile and trace files
//!
//! - **`chrome_trace`**: Chrome Trace Event Format for chrome://tracing
//! - **`profile_json`**: the profile itself, as written by `end()` and
//!   read back as a diff baseline

pub mod chrome_trace;
pub mod profile_json;

pub use chrome_trace::{export_to, export_trace, ChromeTrace, ChromeTraceEvent};
pub use profile_json::{read_baseline, read_profile, write_profile};
