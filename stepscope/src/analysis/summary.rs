//! Top-N summary of a profile.
//!
//! The event tree is flattened with a depth-first walk from the top-level
//! events ([`top_level`](crate::domain::top_level)) so every entry carries
//! its full ancestry as a path:
//!
//! ```text
//! build                        build
//! ├── parse              →     build > parse
//! └── codegen                  build > codegen
//!     └── optimize             build > codegen > optimize
//! ```
//!
//! Entries are then ranked by duration. Unlike the hot flag stored on each
//! event, `hot` here is measured against the profile total.

use crate::classification::{is_hot, ratio};
use crate::domain::{Event, EventSource, Profile};
use serde::Serialize;

/// Entries kept when no `top` is given.
pub const DEFAULT_SUMMARY_TOP: usize = 10;

const PATH_SEPARATOR: &str = " > ";

/// Caller overrides for [`Profiler::summary`](crate::Profiler::summary).
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryOptions {
    /// Number of entries to keep (default 10).
    pub top: Option<usize>,
    /// Hot threshold for this summary only.
    pub hot_threshold: Option<f64>,
}

impl SummaryOptions {
    #[must_use]
    pub fn top(mut self, n: usize) -> Self {
        self.top = Some(n);
        self
    }

    #[must_use]
    pub fn hot_threshold(mut self, ratio: f64) -> Self {
        self.hot_threshold = Some(ratio);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub name: String,
    /// Ancestor names and this one, joined with `" > "`.
    pub path: String,
    pub duration: f64,
    pub depth: usize,
    /// Short source (`file:line`), when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Share of the profile total.
    pub ratio: f64,
    pub hot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: f64,
    pub top: Vec<SummaryEntry>,
}

/// Flatten and rank `profile`.
///
/// Ties keep their walk order. `top` defaults to [`DEFAULT_SUMMARY_TOP`].
#[must_use]
pub fn summarize(profile: &Profile, top: Option<usize>, hot_threshold: f64) -> Summary {
    let mut entries = Vec::new();
    for root in profile.roots() {
        walk(root, None, profile.total, hot_threshold, &mut entries);
    }

    entries.sort_by(|a, b| b.duration.total_cmp(&a.duration));
    entries.truncate(top.unwrap_or(DEFAULT_SUMMARY_TOP));

    Summary { total: profile.total, top: entries }
}

fn walk(
    event: &Event,
    parent: Option<&str>,
    total: f64,
    hot_threshold: f64,
    out: &mut Vec<SummaryEntry>,
) {
    let path = match parent {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{}", event.name),
        None => event.name.clone(),
    };

    out.push(SummaryEntry {
        name: event.name.clone(),
        path: path.clone(),
        duration: event.duration,
        depth: event.depth,
        source: event.source.as_ref().map(EventSource::short),
        ratio: ratio(event.duration, total),
        hot: is_hot(event.duration, total, hot_threshold),
    });

    for child in &event.children {
        walk(child, Some(&path), total, hot_threshold, out);
    }
}
