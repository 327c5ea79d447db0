//! # stepscope - Nested Step Profiler
//!
//! stepscope times named, nested steps of a program (closures, futures or
//! manually opened scopes), builds them into a tree, flags the slow and hot
//! ones, and at the end prints a report, writes a Chrome trace and compares
//! the run against a saved baseline.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       User Application                          │
//! │        profiler.step("load", || ...)  /  .step_future(..)       │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ open / close
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    stepscope (This Crate)                       │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │  Profiling   │──▶│Classification│──▶│ Symbolization│         │
//! │  │ (step stack) │   │ (slow / hot) │   │ (source loc) │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! │         │ end()                                                 │
//! │         ▼                                                       │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │    Report    │   │    Export    │   │   Analysis   │         │
//! │  │ (console,    │   │ (trace.json, │   │ (diff,       │         │
//! │  │  html)       │   │ profile.json)│   │  summary)    │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiling`]: the [`Profiler`] handle, step guards and the step stack
//! - [`classification`]: slow / hot / CPU-vs-IO rules
//! - [`symbolization`]: call-site and backtrace locations, source maps
//! - [`analysis`]: regression diff and top-N summary
//! - [`export`]: Chrome Trace Event Format and profile files
//! - [`report`]: console and HTML reports
//! - [`config`]: [`ProfilerConfig`]
//! - [`domain`]: events, profiles and error types
//! - [`cli`]: argument parsing for the `stepscope` binary
//!
//! ## Typical Usage
//!
//! ```no_run
//! use stepscope::{Profiler, ProfilerConfig};
//!
//! let config = ProfilerConfig::default()
//!     .with_enabled(true)
//!     .with_flame(true)
//!     .with_trace_file("trace.json")
//!     .with_diff_base_file("baseline.json");
//! let profiler = Profiler::new(config);
//!
//! let rows = profiler.step("load", || vec![1, 2, 3]);
//! profiler.step("process", || rows.iter().sum::<i32>());
//!
//! let outcome = profiler.end("Total")?;
//! if outcome.should_fail() {
//!     std::process::exit(1);
//! }
//! # Ok::<(), stepscope::ProfileError>(())
//! ```
//!
//! ## Key Concepts
//!
//! - **Slow**: a step whose own duration reaches `slow_threshold` ms
//! - **Hot**: a step whose duration reaches `hot_threshold` of the total
//! - **CPU / IO**: synchronous steps are CPU, future-based steps IO
//! - **Regression**: a step at least `diff_threshold` slower than in the
//!   baseline profile

pub mod analysis;
pub mod classification;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod profiling;
pub mod report;
pub mod symbolization;

pub use analysis::{Summary, SummaryEntry, SummaryOptions};
pub use config::{ProfilerConfig, SourceCapture, ViolationPolicy};
pub use domain::{
    Event, EventSource, ExportError, Profile, ProfileError, RegressionEntry, SourceLocation,
    StackViolation, StepKind,
};
pub use profiling::{ProfileOutcome, Profiler, StepGuard, Timed};
