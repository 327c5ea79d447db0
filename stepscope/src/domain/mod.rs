//! Domain model for stepscope
//!
//! This module contains core domain types and errors that provide:
//! - The serializable profile format (events, locations, regressions)
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{
    top_level, Event, EventId, EventSource, OriginalPosition, Profile, RegressionEntry,
    SourceLocation, StackViolation, StepKind,
};

pub use errors::{ExportError, ProfileError, SourceMapError};
