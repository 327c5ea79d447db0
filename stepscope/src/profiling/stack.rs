//! Arena of step nodes and the stack of open steps.
//!
//! Nodes are never removed: a node id stays valid for the lifetime of the
//! profiler. Parent links are ids into the arena, which keeps the tree
//! acyclic and lets a finished step be listed once in `finished` while also
//! appearing under its parent's `children`.

use crate::classification::Classification;
use crate::domain::{Event, EventId, EventSource, Profile, StackViolation, StepKind};
use std::panic::Location;
use std::time::Instant;

#[derive(Debug)]
struct Node {
    name: String,
    started: Instant,
    start_ms: f64,
    depth: usize,
    is_async: bool,
    call_site: &'static Location<'static>,
    children: Vec<EventId>,
    outcome: Option<Outcome>,
}

#[derive(Debug, Clone)]
struct Outcome {
    duration: f64,
    kind: StepKind,
    slow: bool,
    hot: bool,
    source: Option<EventSource>,
}

/// Timing of a node at the moment it finishes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Timing {
    pub duration: f64,
    pub elapsed: f64,
    pub is_async: bool,
}

#[derive(Debug)]
pub(crate) struct StepStack {
    epoch: Instant,
    nodes: Vec<Node>,
    open: Vec<EventId>,
    finished: Vec<EventId>,
    violations: Vec<StackViolation>,
}

impl StepStack {
    pub(crate) fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            nodes: Vec::new(),
            open: Vec::new(),
            finished: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Milliseconds since the profiler was created.
    pub(crate) fn elapsed_ms(&self, now: Instant) -> f64 {
        millis(now.duration_since(self.epoch))
    }

    /// Open a node under the current stack top and make it the new top.
    pub(crate) fn push(
        &mut self,
        name: String,
        is_async: bool,
        call_site: &'static Location<'static>,
    ) -> EventId {
        let started = Instant::now();
        let id = EventId(self.nodes.len());
        let depth = self.open.len();

        if let Some(&parent) = self.open.last() {
            self.nodes[parent.0].children.push(id);
        }

        self.nodes.push(Node {
            name,
            started,
            start_ms: self.elapsed_ms(started),
            depth,
            is_async,
            call_site,
            children: Vec::new(),
            outcome: None,
        });
        self.open.push(id);
        id
    }

    pub(crate) fn timing(&self, id: EventId, now: Instant) -> Timing {
        let node = &self.nodes[id.0];
        Timing {
            duration: millis(now.duration_since(node.started)),
            elapsed: self.elapsed_ms(now),
            is_async: node.is_async,
        }
    }

    pub(crate) fn name(&self, id: EventId) -> &str {
        &self.nodes[id.0].name
    }

    pub(crate) fn depth(&self, id: EventId) -> usize {
        self.nodes[id.0].depth
    }

    pub(crate) fn call_site(&self, id: EventId) -> &'static Location<'static> {
        self.nodes[id.0].call_site
    }

    /// Pop `id`, which must be the stack top.
    ///
    /// If it is not, the node is removed from wherever it sits so the stack
    /// stays usable, and the mismatch is returned.
    pub(crate) fn pop(&mut self, id: EventId) -> Result<(), StackViolation> {
        if self.open.last() == Some(&id) {
            self.open.pop();
            return Ok(());
        }

        let violation = StackViolation {
            name: self.name(id).to_string(),
            expected_top: self.open.last().map(|top| self.name(*top).to_string()),
        };
        self.open.retain(|open| *open != id);
        Err(violation)
    }

    /// Forget an open node that will never finish.
    pub(crate) fn abandon(&mut self, id: EventId) {
        self.open.retain(|open| *open != id);
    }

    pub(crate) fn record_violation(&mut self, violation: StackViolation) {
        self.violations.push(violation);
    }

    pub(crate) fn violations(&self) -> &[StackViolation] {
        &self.violations
    }

    /// Store the result of a finished node and append it to the flat list.
    pub(crate) fn finish(
        &mut self,
        id: EventId,
        timing: Timing,
        class: Classification,
        source: Option<EventSource>,
    ) {
        let node = &mut self.nodes[id.0];
        debug_assert!(node.outcome.is_none(), "step finalized twice");
        node.outcome = Some(Outcome {
            duration: timing.duration,
            kind: class.kind,
            slow: class.slow,
            hot: class.hot,
            source,
        });
        self.finished.push(id);
    }

    pub(crate) fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Build the event tree rooted at `id`, skipping unfinished children.
    ///
    /// Returns `None` if `id` itself has not finished.
    pub(crate) fn event(&self, id: EventId) -> Option<Event> {
        let node = &self.nodes[id.0];
        let outcome = node.outcome.as_ref()?;

        Some(Event {
            name: node.name.clone(),
            start: node.start_ms,
            duration: outcome.duration,
            depth: node.depth,
            children: node.children.iter().filter_map(|child| self.event(*child)).collect(),
            source: outcome.source.clone(),
            is_async: node.is_async,
            kind: outcome.kind,
            slow: outcome.slow,
            hot: outcome.hot,
        })
    }

    /// Snapshot of every finished event with `total` measured at `now`.
    pub(crate) fn profile(&self, now: Instant) -> Profile {
        Profile {
            total: self.elapsed_ms(now),
            events: self.finished.iter().filter_map(|id| self.event(*id)).collect(),
        }
    }
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::{classify, Thresholds};

    fn finish(stack: &mut StepStack, id: EventId) {
        let timing = stack.timing(id, Instant::now());
        let class = classify(timing.duration, timing.elapsed, timing.is_async, Thresholds::default());
        stack.pop(id).unwrap();
        stack.finish(id, timing, class, None);
    }

    #[test]
    fn test_push_links_parent_and_depth() {
        let mut stack = StepStack::new(Instant::now());
        let outer = stack.push("outer".to_string(), false, Location::caller());
        let inner = stack.push("inner".to_string(), false, Location::caller());

        assert_eq!(stack.depth(outer), 0);
        assert_eq!(stack.depth(inner), 1);
        assert_eq!(stack.open_len(), 2);

        finish(&mut stack, inner);
        finish(&mut stack, outer);

        let profile = stack.profile(Instant::now());
        assert_eq!(profile.events.len(), 2);
        // finalize order, not start order
        assert_eq!(profile.events[0].name, "inner");
        assert_eq!(profile.events[1].name, "outer");
        assert_eq!(profile.events[1].children[0].name, "inner");
    }

    #[test]
    fn test_pop_out_of_order_is_reported_and_repaired() {
        let mut stack = StepStack::new(Instant::now());
        let first = stack.push("first".to_string(), true, Location::caller());
        let second = stack.push("second".to_string(), true, Location::caller());

        let violation = stack.pop(first).unwrap_err();
        assert_eq!(violation.name, "first");
        assert_eq!(violation.expected_top.as_deref(), Some("second"));
        assert_eq!(stack.open_len(), 1);

        assert!(stack.pop(second).is_ok());
        assert_eq!(stack.open_len(), 0);
    }

    #[test]
    fn test_unfinished_children_are_omitted() {
        let mut stack = StepStack::new(Instant::now());
        let parent = stack.push("parent".to_string(), false, Location::caller());
        let child = stack.push("child".to_string(), true, Location::caller());

        stack.abandon(child);
        finish(&mut stack, parent);

        let event = stack.event(parent).unwrap();
        assert!(event.children.is_empty());
        assert!(stack.event(child).is_none());
    }
}
