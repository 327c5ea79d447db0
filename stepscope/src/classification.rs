//! Hot/slow step classification.
//!
//! Two independent thresholds decide how a step is flagged:
//!
//! - **slow**: absolute duration, `duration >= slow_threshold` (milliseconds)
//! - **hot**: share of elapsed time, `duration / elapsed >= hot_threshold`
//!
//! # Two denominators
//!
//! The hot ratio is computed twice with different denominators and the two
//! results are kept apart:
//!
//! 1. **Provisional** (at finalization): `elapsed` is the time from profiler
//!    start to the instant the step finished. Stored in [`Event::hot`] and
//!    used to decide whether the step pays for source capture. It depends on
//!    the order steps finish in.
//! 2. **Authoritative** (at `end()`): `elapsed` is the final profile total.
//!    Drives the console `HOT` marker and `fail_on_hot`.
//!
//! [`Event::hot`]: crate::domain::Event::hot

use crate::domain::StepKind;

/// Default absolute duration for a slow step, in milliseconds.
pub const DEFAULT_SLOW_THRESHOLD_MS: f64 = 500.0;

/// Default share of total time for a hot step.
pub const DEFAULT_HOT_THRESHOLD: f64 = 0.8;

/// Threshold pair used at finalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub slow_ms: f64,
    pub hot_ratio: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { slow_ms: DEFAULT_SLOW_THRESHOLD_MS, hot_ratio: DEFAULT_HOT_THRESHOLD }
    }
}

/// Result of classifying one finished step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub slow: bool,
    /// Provisional hot flag (see module docs).
    pub hot: bool,
    pub ratio: f64,
    pub kind: StepKind,
}

impl Classification {
    /// Only slow or hot steps get a source location.
    #[must_use]
    pub fn wants_source(&self) -> bool {
        self.slow || self.hot
    }
}

/// `duration / denominator`, or 0 when nothing has elapsed yet.
#[must_use]
pub fn ratio(duration: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        duration / denominator
    } else {
        0.0
    }
}

#[must_use]
pub fn is_hot(duration: f64, denominator: f64, hot_threshold: f64) -> bool {
    denominator > 0.0 && ratio(duration, denominator) >= hot_threshold
}

#[must_use]
pub fn is_slow(duration: f64, slow_threshold: f64) -> bool {
    duration >= slow_threshold
}

/// Classify a step at its finalization instant.
///
/// `elapsed_so_far` is the time from profiler start to now, not the final
/// total.
#[must_use]
pub fn classify(
    duration: f64,
    elapsed_so_far: f64,
    is_async: bool,
    thresholds: Thresholds,
) -> Classification {
    Classification {
        slow: is_slow(duration, thresholds.slow_ms),
        hot: is_hot(duration, elapsed_so_far, thresholds.hot_ratio),
        ratio: ratio(duration, elapsed_so_far),
        kind: StepKind::from_async(is_async),
    }
}
