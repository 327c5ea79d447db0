//! # Source Location for Steps
//!
//! When a step finishes slow or hot, the report is much more useful if it
//! can point at the code that started it. This module turns a captured
//! snapshot of "where are we" into a `file:line:column`, and, when the file
//! is generated code with a source map next to it, into the original
//! position.
//!
//! ## Snapshots
//!
//! Two capture modes are supported (see [`SourceCapture`]):
//!
//! - **Call site** (default): `step` is `#[track_caller]`, so the location
//!   of the call is known at entry for free. It stays exact across `.await`
//!   points.
//! - **Backtrace**: a `std::backtrace::Backtrace` is captured when the step
//!   finishes and parsed for the first caller frame. Costly, and for futures
//!   it is taken after the last suspension, so it may point into the
//!   executor rather than at the caller. This is a known accuracy limit.
//!
//! ## Resolution Flow
//!
//! ```text
//! 1. Snapshot → (file, line, column)
//!    backtrace text is split into frames (frames.rs), std / runtime /
//!    profiler frames are skipped, the first caller frame is parsed;
//!    nothing parsable → { raw: "<frame text>" }
//!
//! 2. Source map capability present?   no → return position as-is
//!
//! 3. "<file>.map" exists?               no → return position as-is
//!
//! 4. Decode map (source_map.rs), look up (line, column)
//!    → original { source, line, column, name }
//!    any failure is logged and swallowed
//! ```
//!
//! ## Module Structure
//!
//! - **`frames`**: backtrace text parsing and frame origin classification
//! - **`source_map`**: Source Map v3 decoding and the resolver capability
//! - **`locator`**: ties the two together
//!
//! [`SourceCapture`]: crate::config::SourceCapture

pub mod frames;
pub mod locator;
pub mod source_map;

pub use frames::{classify_frame, parse_backtrace, parse_location, Frame, FrameOrigin};
pub use locator::{locate_in_backtrace, Snapshot, SourceLocator};
pub use source_map::{JsonSourceMapResolver, SourceMap, SourceMapResolver};
