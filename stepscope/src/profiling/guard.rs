//! RAII step handles.
//!
//! A [`StepGuard`] owns one open node. Dropping it finalizes the node on
//! every exit path, including unwinding out of a panicking body, which is
//! what gives `step` its "finalize, then propagate" behavior.
//!
//! Guards created for futures only finalize when the future completes (or
//! panics). A future dropped half-way is a cancelled step: its node is
//! taken off the stack and never recorded.

use super::profiler::Profiler;
use crate::domain::{Event, EventId};
use log::warn;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Finalize whenever the guard goes away.
    OnDrop,
    /// Finalize only through an explicit call or a panic; a plain drop
    /// means the step was abandoned.
    Explicit,
}

/// Handle to an open step. The step finishes when this is dropped or
/// [`finish`](StepGuard::finish)ed.
#[must_use = "the step finishes as soon as the guard is dropped"]
pub struct StepGuard {
    profiler: Profiler,
    id: EventId,
    completion: Completion,
    done: bool,
}

impl StepGuard {
    pub(crate) fn new(profiler: Profiler, id: EventId, completion: Completion) -> Self {
        Self { profiler, id, completion, done: false }
    }

    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Nesting level of this step (0 = top level).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.profiler.depth_of(self.id)
    }

    /// Finish the step now and return its finalized event.
    ///
    /// Returns `None` if the step could not be recorded.
    pub fn finish(mut self) -> Option<Event> {
        self.close();
        self.profiler.event(self.id)
    }

    pub(crate) fn close(&mut self) {
        if !self.done {
            self.done = true;
            self.profiler.close(self.id);
        }
    }
}

impl Drop for StepGuard {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        if std::thread::panicking() || self.completion == Completion::OnDrop {
            self.close();
        } else {
            self.done = true;
            warn!(
                "Step '{}' was dropped before completing; it will not be recorded",
                self.profiler.name_of(self.id)
            );
            self.profiler.abandon(self.id);
        }
    }
}

/// Future returned by [`Profiler::step_future`].
///
/// The node was opened when `step_future` was called; it finishes when the
/// wrapped future completes.
#[must_use = "futures do nothing unless polled; dropping this cancels the step"]
pub struct Timed<F> {
    future: Pin<Box<F>>,
    guard: Option<StepGuard>,
}

impl<F: Future> Timed<F> {
    pub(crate) fn new(future: F, guard: StepGuard) -> Self {
        Self { future: Box::pin(future), guard: Some(guard) }
    }
}

impl<F: Future> Future for Timed<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.future.as_mut().poll(cx) {
            Poll::Ready(value) => {
                if let Some(mut guard) = this.guard.take() {
                    guard.close();
                }
                Poll::Ready(value)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
