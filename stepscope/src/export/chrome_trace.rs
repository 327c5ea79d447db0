//! Chrome Trace Event export.
//!
//! Every finished step becomes one complete (`"X"`) span. Spans are placed
//! on one track per nesting depth (`tid = depth`) so the viewer stacks them
//! like a flame chart:
//!
//! ```text
//! tid 0  [build.........................]  [lint..]
//! tid 1    [parse..] [codegen..........]
//! tid 2                [optimize...]
//! ```
//!
//! Load the output in `chrome://tracing` or <https://ui.perfetto.dev>.

// Depth never gets anywhere near u32::MAX
#![allow(clippy::cast_possible_truncation)]

use crate::domain::{top_level, Event, ExportError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Trace files only ever contain one process.
const TRACE_PID: u32 = 1;

/// Chrome Trace Event format
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeTraceEvent {
    /// Step name
    pub name: String,
    /// Category: "CPU" or "IO"
    pub cat: String,
    /// Phase: "X" = complete
    pub ph: String,
    /// Start, microseconds since the profiler epoch
    pub ts: f64,
    /// Duration in microseconds
    pub dur: f64,
    pub pid: u32,
    /// Nesting depth
    pub tid: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub args: BTreeMap<String, JsonValue>,
}

/// Chrome Trace Format container
#[derive(Debug, Serialize, Deserialize)]
pub struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    pub display_time_unit: String,
}

impl ChromeTrace {
    /// Build the trace for a flat event list.
    ///
    /// Walks pre-order from every event that is not nested under another
    /// listed event, so each listed step yields exactly one span whatever
    /// its depth.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let mut trace_events = Vec::with_capacity(events.len());
        for root in top_level(events) {
            push_spans(root, &mut trace_events);
        }
        Self { trace_events, display_time_unit: "ms".to_string() }
    }
}

fn push_spans(event: &Event, out: &mut Vec<ChromeTraceEvent>) {
    let mut args = BTreeMap::new();
    args.insert("durationMs".to_string(), serde_json::json!(event.duration));
    args.insert("depth".to_string(), serde_json::json!(event.depth));
    if let Some(ref source) = event.source {
        args.insert("source".to_string(), serde_json::json!(source.short()));
    }

    out.push(ChromeTraceEvent {
        name: event.name.clone(),
        cat: event.kind.as_str().to_string(),
        ph: "X".to_string(),
        ts: event.start * 1000.0,
        dur: event.duration * 1000.0,
        pid: TRACE_PID,
        tid: event.depth as u32,
        args,
    });

    for child in &event.children {
        push_spans(child, out);
    }
}

/// Export the trace to any writer (file, stdout, buffer, etc.)
///
/// # Errors
/// Returns an error if serialization or the underlying writer fails.
pub fn export_to<W: Write>(events: &[Event], writer: W) -> Result<(), ExportError> {
    let trace = ChromeTrace::from_events(events);
    serde_json::to_writer_pretty(writer, &trace)?;
    Ok(())
}

/// Write the trace for `events` to `path`, replacing any existing file.
///
/// # Errors
/// Returns [`ExportError::WriteFailed`] if the file cannot be created or
/// written.
pub fn export_trace(events: &[Event], path: &Path) -> Result<(), ExportError> {
    let write_failed = |source| ExportError::WriteFailed { path: path.to_path_buf(), source };

    let file = File::create(path).map_err(write_failed)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &ChromeTrace::from_events(events))
        .map_err(|e| write_failed(e.into()))?;
    writer.flush().map_err(write_failed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventSource, OriginalPosition, SourceLocation, StepKind};

    fn event(name: &str, start: f64, duration: f64, depth: usize, children: Vec<Event>) -> Event {
        Event {
            name: name.to_string(),
            start,
            duration,
            depth,
            children,
            source: None,
            is_async: false,
            kind: StepKind::Cpu,
            slow: false,
            hot: false,
        }
    }

    #[test]
    fn test_nested_events_yield_one_span_each() {
        let child = event("child", 1.0, 2.0, 1, vec![]);
        let parent = event("parent", 0.5, 3.0, 0, vec![child.clone()]);
        // flat list in finalize order: child first
        let trace = ChromeTrace::from_events(&[child, parent]);

        assert_eq!(trace.trace_events.len(), 2);
        assert_eq!(trace.trace_events[0].name, "parent");
        assert_eq!(trace.trace_events[0].tid, 0);
        assert_eq!(trace.trace_events[1].name, "child");
        assert_eq!(trace.trace_events[1].tid, 1);
        assert!((trace.trace_events[1].ts - 1000.0).abs() < 1e-9);
        assert!((trace.trace_events[1].dur - 2000.0).abs() < 1e-9);
        assert_eq!(trace.display_time_unit, "ms");
    }

    #[test]
    fn test_nested_leaves_without_parent_are_exported() {
        let leaves = [event("load", 0.1, 1.0, 1, vec![]), event("run", 1.2, 2.0, 2, vec![])];
        let trace = ChromeTrace::from_events(&leaves);

        assert_eq!(trace.trace_events.len(), 2);
        assert_eq!(trace.trace_events[0].tid, 1);
        assert_eq!(trace.trace_events[1].tid, 2);
    }

    #[test]
    fn test_span_fields() {
        let mut io = event("fetch", 0.0, 4.0, 0, vec![]);
        io.kind = StepKind::Io;
        io.is_async = true;
        io.source = Some(EventSource::Location(SourceLocation {
            file: "dist/app.js".to_string(),
            line: 10,
            column: 4,
            original: Some(OriginalPosition {
                source: "src/app.ts".to_string(),
                line: 3,
                column: 1,
                name: None,
            }),
        }));

        let trace = ChromeTrace::from_events(&[io]);
        let span = &trace.trace_events[0];
        assert_eq!(span.cat, "IO");
        assert_eq!(span.ph, "X");
        assert_eq!(span.pid, 1);
        assert_eq!(span.args["source"], "src/app.ts:3");
        assert_eq!(span.args["depth"], 0);
        assert_eq!(span.args["durationMs"], 4.0);
    }

    #[test]
    fn test_export_to_buffer() {
        let mut buffer = Vec::new();
        export_to(&[event("a", 0.0, 1.0, 0, vec![])], &mut buffer).unwrap();

        let json: JsonValue = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(json["displayTimeUnit"], "ms");
        assert_eq!(json["traceEvents"][0]["name"], "a");
        assert_eq!(json["traceEvents"][0]["dur"], 1000.0);
        assert!(json["traceEvents"][0]["args"].get("source").is_none());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_export_to_failing_writer() {
        let err = export_to(&[event("a", 0.0, 1.0, 0, vec![])], BrokenPipe).unwrap_err();
        assert!(matches!(err, ExportError::Json(ref e) if e.is_io()));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("trace.json");
        let err = export_trace(&[], &path).unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed { .. }));
    }
}
