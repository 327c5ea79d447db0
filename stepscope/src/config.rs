//! Profiler configuration
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to change:
//!
//! ```json
//! { "flame": true, "hotThreshold": 0.5, "traceFile": "trace.json" }
//! ```

use crate::classification::{Thresholds, DEFAULT_HOT_THRESHOLD, DEFAULT_SLOW_THRESHOLD_MS};
use crate::domain::ProfileError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default regression threshold for baseline diffs (20 %).
pub const DEFAULT_DIFF_THRESHOLD: f64 = 0.2;

/// Default path for the saved profile when `enabled` is set.
pub const DEFAULT_PROFILE_FILE: &str = "profile.json";

/// How the call site of a slow or hot step is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCapture {
    /// `#[track_caller]` location of the `step` call. Exact and free.
    #[default]
    CallSite,
    /// A `std::backtrace::Backtrace` captured when the step finishes, parsed
    /// for the first user frame. For futures this runs after the last
    /// suspension and may point at the executor instead of the caller.
    Backtrace,
}

/// What to do when a step finishes while it is not on top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationPolicy {
    /// Record a `StackViolation`, log it and repair the stack.
    #[default]
    Flag,
    /// Panic (unless the thread is already unwinding).
    Panic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfilerConfig {
    /// Print the console report and write `profile_file` on `end()`.
    pub enabled: bool,
    /// Print the console report without writing files.
    pub verbose: bool,
    /// Print one line per event in the console report.
    pub flame: bool,
    /// Milliseconds.
    pub slow_threshold: f64,
    /// Fraction of elapsed time, 0..=1.
    pub hot_threshold: f64,
    pub trace_file: Option<PathBuf>,
    pub fail_on_hot: bool,
    pub diff_base_file: Option<PathBuf>,
    pub diff_threshold: f64,
    pub capture_source: bool,
    pub profile_file: PathBuf,
    pub source_capture: SourceCapture,
    pub on_stack_violation: ViolationPolicy,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verbose: false,
            flame: false,
            slow_threshold: DEFAULT_SLOW_THRESHOLD_MS,
            hot_threshold: DEFAULT_HOT_THRESHOLD,
            trace_file: None,
            fail_on_hot: false,
            diff_base_file: None,
            diff_threshold: DEFAULT_DIFF_THRESHOLD,
            capture_source: true,
            profile_file: PathBuf::from(DEFAULT_PROFILE_FILE),
            source_capture: SourceCapture::default(),
            on_stack_violation: ViolationPolicy::default(),
        }
    }
}

impl ProfilerConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProfileError::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ProfileError::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        Thresholds { slow_ms: self.slow_threshold, hot_ratio: self.hot_threshold }
    }

    /// Whether `end()` renders the console report.
    #[must_use]
    pub fn prints(&self) -> bool {
        self.enabled || self.verbose
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_flame(mut self, flame: bool) -> Self {
        self.flame = flame;
        self
    }

    #[must_use]
    pub fn with_slow_threshold(mut self, ms: f64) -> Self {
        self.slow_threshold = ms;
        self
    }

    #[must_use]
    pub fn with_hot_threshold(mut self, ratio: f64) -> Self {
        self.hot_threshold = ratio;
        self
    }

    #[must_use]
    pub fn with_trace_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_fail_on_hot(mut self, fail: bool) -> Self {
        self.fail_on_hot = fail;
        self
    }

    #[must_use]
    pub fn with_diff_base_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.diff_base_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_diff_threshold(mut self, ratio: f64) -> Self {
        self.diff_threshold = ratio;
        self
    }

    #[must_use]
    pub fn with_capture_source(mut self, capture: bool) -> Self {
        self.capture_source = capture;
        self
    }

    #[must_use]
    pub fn with_profile_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.profile_file = path.into();
        self
    }

    #[must_use]
    pub fn with_source_capture(mut self, capture: SourceCapture) -> Self {
        self.source_capture = capture;
        self
    }

    #[must_use]
    pub fn with_violation_policy(mut self, policy: ViolationPolicy) -> Self {
        self.on_stack_violation = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProfilerConfig::default();
        assert!((config.slow_threshold - 500.0).abs() < f64::EPSILON);
        assert!((config.hot_threshold - 0.8).abs() < f64::EPSILON);
        assert!((config.diff_threshold - 0.2).abs() < f64::EPSILON);
        assert!(config.capture_source);
        assert!(!config.prints());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ProfilerConfig =
            serde_json::from_str(r#"{"flame":true,"hotThreshold":0.5,"sourceCapture":"backtrace"}"#)
                .unwrap();
        assert!(config.flame);
        assert!((config.hot_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.source_capture, SourceCapture::Backtrace);
        assert!((config.slow_threshold - 500.0).abs() < f64::EPSILON);
        assert_eq!(config.profile_file, PathBuf::from("profile.json"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"enabled":true,"diffThreshold":0.1}}"#).unwrap();

        let config = ProfilerConfig::load(file.path()).unwrap();
        assert!(config.enabled);
        assert!(config.prints());
        assert!((config.diff_threshold - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let err = ProfilerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ProfileError::ConfigLoadFailed { .. }));
    }
}
