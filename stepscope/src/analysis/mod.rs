//! Analysis of finished profiles
//!
//! Pure functions over [`Profile`](crate::domain::Profile) values, usable on
//! a live snapshot or on profiles loaded from disk.

pub mod diff;
pub mod summary;

pub use diff::diff_profiles;
pub use summary::{summarize, Summary, SummaryEntry, SummaryOptions, DEFAULT_SUMMARY_TOP};
