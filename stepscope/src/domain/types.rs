//! Profile data model
//!
//! These are the plain, serializable values produced by a profiling session.
//! A [`Profile`] written by one run can be read back as the regression
//! baseline of the next, so every field added after the first format has a
//! serde default.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Index of a node in a profiler's arena.
///
/// Ids are only meaningful for the profiler that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub usize);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event#{}", self.0)
    }
}

/// How a step spent its time.
///
/// Steps whose completion was deferred to a future are `Io`, everything
/// else is `Cpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepKind {
    #[default]
    Cpu,
    Io,
}

impl StepKind {
    #[must_use]
    pub fn from_async(is_async: bool) -> Self {
        if is_async {
            StepKind::Io
        } else {
            StepKind::Cpu
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Cpu => "CPU",
            StepKind::Io => "IO",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position in the original source, as resolved through a source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalPosition {
    pub source: String,
    pub line: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A parsed `file:line:column` location, optionally mapped back to its
/// original source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalPosition>,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self { file: file.into(), line, column, original: None }
    }

    /// Short `source:line` form, preferring the original position.
    #[must_use]
    pub fn short(&self) -> String {
        match self.original {
            Some(ref orig) => format!("{}:{}", orig.source, orig.line),
            None => format!("{}:{}", self.file, self.line),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Where a step came from.
///
/// `Raw` carries the unparsed frame text when no `file:line:column` could be
/// extracted from a captured backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventSource {
    Location(SourceLocation),
    Raw { raw: String },
}

impl EventSource {
    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            EventSource::Location(loc) => Some(loc),
            EventSource::Raw { .. } => None,
        }
    }

    /// Short label used by the trace exporter and the reports.
    #[must_use]
    pub fn short(&self) -> String {
        match self {
            EventSource::Location(loc) => loc.short(),
            EventSource::Raw { raw } => raw.clone(),
        }
    }
}

/// A finalized step.
///
/// `start` and `duration` are milliseconds relative to the profiler epoch.
/// `children` are in creation order while the flat [`Profile::events`] list
/// is in finalization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub start: f64,
    pub duration: f64,
    pub depth: usize,
    #[serde(default)]
    pub children: Vec<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<EventSource>,
    #[serde(default, rename = "async")]
    pub is_async: bool,
    #[serde(default, rename = "type")]
    pub kind: StepKind,
    /// `duration >= slow_threshold` at finalization.
    #[serde(default)]
    pub slow: bool,
    /// Provisional hot flag: ratio against the time elapsed when this step
    /// finished, not against the final total.
    #[serde(default)]
    pub hot: bool,
}

/// The output of one profiling session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Milliseconds from profiler creation to `end()`.
    pub total: f64,
    /// Every finalized event, in finalization order.
    pub events: Vec<Event>,
}

impl Profile {
    /// Events not nested under another event of this profile, in list order.
    #[must_use]
    pub fn roots(&self) -> Vec<&Event> {
        top_level(&self.events)
    }

    /// Share of the final total taken by `duration`.
    #[must_use]
    pub fn ratio(&self, duration: f64) -> f64 {
        crate::classification::ratio(duration, self.total)
    }

    /// Events that are hot against the final total.
    pub fn hot_events(&self, hot_threshold: f64) -> impl Iterator<Item = &Event> + '_ {
        self.events
            .iter()
            .filter(move |e| crate::classification::is_hot(e.duration, self.total, hot_threshold))
    }

    /// Authoritative hot signal used by `fail_on_hot`.
    #[must_use]
    pub fn has_hot(&self, hot_threshold: f64) -> bool {
        self.hot_events(hot_threshold).next().is_some()
    }
}

/// Events of `events` that are not a descendant of another event in the
/// same list, in list order.
///
/// Walking these pre-order reaches every listed event exactly once, even when
/// an ancestor never finished (a cancelled parent, `end()` inside a step) or
/// the list holds only nested events.
#[must_use]
pub fn top_level(events: &[Event]) -> Vec<&Event> {
    fn collect<'a>(event: &'a Event, nested: &mut HashSet<EventKey<'a>>) {
        for child in &event.children {
            nested.insert(EventKey::of(child));
            collect(child, nested);
        }
    }

    let mut nested = HashSet::new();
    for event in events {
        collect(event, &mut nested);
    }
    events.iter().filter(|e| !nested.contains(&EventKey::of(e))).collect()
}

/// Identity of an event within one profile.
#[derive(PartialEq, Eq, Hash)]
struct EventKey<'a> {
    name: &'a str,
    depth: usize,
    start: u64,
    duration: u64,
}

impl<'a> EventKey<'a> {
    fn of(event: &'a Event) -> Self {
        Self {
            name: &event.name,
            depth: event.depth,
            start: event.start.to_bits(),
            duration: event.duration.to_bits(),
        }
    }
}

/// A step that got slower than its baseline by at least the diff threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionEntry {
    pub name: String,
    pub before: f64,
    pub after: f64,
    /// `(after - before) / before`
    pub diff: f64,
}

/// A finalize that did not pop the node it expected.
///
/// Produced when steps on the same profiler overlap instead of nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackViolation {
    /// Step that finalized.
    pub name: String,
    /// Step that was on top of the stack at that moment, if any.
    pub expected_top: Option<String>,
}

impl fmt::Display for StackViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected_top {
            Some(ref top) => write!(f, "step '{}' finished while '{top}' was still open", self.name),
            None => write!(f, "step '{}' finished with an empty stack", self.name),
        }
    }
}
