//! The profiler handle: opening and closing steps, and ending the session.

use super::guard::{Completion, StepGuard, Timed};
use super::stack::StepStack;
use crate::analysis::{diff_profiles, summarize, Summary, SummaryOptions};
use crate::classification::classify;
use crate::config::{ProfilerConfig, SourceCapture, ViolationPolicy};
use crate::domain::{Event, EventId, Profile, ProfileError, RegressionEntry, StackViolation};
use crate::export::{export_trace, read_baseline, write_profile};
use crate::report::console;
use crate::symbolization::{Snapshot, SourceLocator};
use log::{debug, error, info};
use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Everything `end()` produces.
///
/// The core only reports the hot and regression signals; turning them into
/// a process exit code is up to the caller (see [`should_fail`]).
///
/// [`should_fail`]: ProfileOutcome::should_fail
#[derive(Debug, Clone)]
pub struct ProfileOutcome {
    pub profile: Profile,
    /// Any event at or above `hot_threshold` of the final total.
    pub has_hot: bool,
    /// `fail_on_hot && has_hot`
    pub fail_on_hot_triggered: bool,
    /// Steps slower than the baseline; empty without a baseline.
    pub regressions: Vec<RegressionEntry>,
    /// Steps that finished out of stack order.
    pub stack_violations: Vec<StackViolation>,
}

impl ProfileOutcome {
    #[must_use]
    pub fn should_fail(&self) -> bool {
        self.fail_on_hot_triggered || !self.regressions.is_empty()
    }
}

struct Shared {
    config: ProfilerConfig,
    locator: SourceLocator,
    state: Mutex<StepStack>,
}

/// Collects nested, timed steps into a [`Profile`].
///
/// Cloning is cheap and every clone records into the same profile, so a
/// handle can be moved into futures.
///
/// # Nesting contract
///
/// Steps nest through an implicit stack: a step started while another is
/// open becomes its child. Each step must finish before a sibling starts on
/// the same profiler. Overlapping futures break that contract; the profiler
/// detects it when a step finishes while it is not the innermost open step
/// and reports a [`StackViolation`] (or panics, per
/// [`ViolationPolicy`]).
///
/// ```
/// use stepscope::{Profiler, ProfilerConfig};
///
/// let profiler = Profiler::new(ProfilerConfig::default());
/// let sum = profiler.step("sum", || {
///     profiler.step("evens", || (0..100).filter(|n| n % 2 == 0).sum::<u64>())
///         + profiler.step("odds", || (0..100).filter(|n| n % 2 == 1).sum::<u64>())
/// });
/// assert_eq!(sum, 4950);
///
/// let outcome = profiler.end("Total").unwrap();
/// assert_eq!(outcome.profile.events.len(), 3);
/// assert_eq!(outcome.profile.events[2].children.len(), 2);
/// ```
#[derive(Clone)]
pub struct Profiler {
    inner: Arc<Shared>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(ProfilerConfig::default())
    }
}

impl std::fmt::Debug for Profiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profiler")
            .field("config", &self.inner.config)
            .field("locator", &self.inner.locator)
            .finish_non_exhaustive()
    }
}

impl Profiler {
    /// Start profiling now. The epoch for every `start` offset and for the
    /// final total is this call.
    #[must_use]
    pub fn new(config: ProfilerConfig) -> Self {
        Self::with_locator(config, SourceLocator::new())
    }

    #[must_use]
    pub fn with_locator(config: ProfilerConfig, locator: SourceLocator) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                locator,
                state: Mutex::new(StepStack::new(Instant::now())),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProfilerConfig {
        &self.inner.config
    }

    /// Time `body` as a step named `name`.
    ///
    /// The step finishes when `body` returns or panics; a panic continues
    /// after the step is recorded. An `Err` returned by `body` is passed
    /// through untouched.
    #[track_caller]
    pub fn step<T>(&self, name: impl Into<String>, body: impl FnOnce() -> T) -> T {
        let mut guard = self.open(name.into(), false, Location::caller(), Completion::OnDrop);
        let value = body();
        guard.close();
        value
    }

    /// Same as [`step`](Profiler::step).
    #[track_caller]
    pub fn measure<T>(&self, name: impl Into<String>, body: impl FnOnce() -> T) -> T {
        self.step(name, body)
    }

    /// Time a body that returns a future.
    ///
    /// The step opens and `body` runs right away; the returned future
    /// passes the inner output through and finishes the step when it
    /// completes. The step is recorded as async (`IO`).
    #[track_caller]
    pub fn step_future<F, Fut>(&self, name: impl Into<String>, body: F) -> Timed<Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let guard = self.open(name.into(), true, Location::caller(), Completion::Explicit);
        let future = body();
        Timed::new(future, guard)
    }

    /// Same as [`step_future`](Profiler::step_future).
    #[track_caller]
    pub fn measure_future<F, Fut>(&self, name: impl Into<String>, body: F) -> Timed<Fut>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.step_future(name, body)
    }

    /// Await `body` inside a step that is always recorded as async (`IO`).
    ///
    /// Unlike [`step_future`](Profiler::step_future), the step opens when
    /// the returned future is first polled.
    #[track_caller]
    pub fn step_async<F, Fut>(
        &self,
        name: impl Into<String>,
        body: F,
    ) -> impl Future<Output = Fut::Output>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let profiler = self.clone();
        let name = name.into();
        let call_site = Location::caller();
        async move {
            let mut guard = profiler.open(name, true, call_site, Completion::Explicit);
            let value = body().await;
            guard.close();
            value
        }
    }

    /// Open a step by hand. It finishes when the guard is dropped.
    #[track_caller]
    pub fn enter(&self, name: impl Into<String>) -> StepGuard {
        self.open(name.into(), false, Location::caller(), Completion::OnDrop)
    }

    /// Current profile, with `total` measured now. Open steps are not
    /// included.
    #[must_use]
    pub fn snapshot(&self) -> Profile {
        self.lock().profile(Instant::now())
    }

    /// Flatten the profile so far into a top-N list.
    ///
    /// `options.hot_threshold` overrides the configured threshold for this
    /// call only.
    #[must_use]
    pub fn summary(&self, options: SummaryOptions) -> Summary {
        let hot_threshold = options.hot_threshold.unwrap_or(self.inner.config.hot_threshold);
        summarize(&self.snapshot(), options.top, hot_threshold)
    }

    /// Finish the session: measure the total, print the console report,
    /// export the trace, diff against the baseline and save the profile, as
    /// configured.
    ///
    /// May be called more than once; each call measures a new total over
    /// the same events.
    ///
    /// # Errors
    /// Fails if the trace or profile cannot be written, or if the baseline
    /// exists but cannot be read or parsed. A missing baseline is not an
    /// error. The recorded steps are left untouched either way.
    pub fn end(&self, label: &str) -> Result<ProfileOutcome, ProfileError> {
        let config = &self.inner.config;
        let (profile, stack_violations, still_open) = {
            let state = self.lock();
            (state.profile(Instant::now()), state.violations().to_vec(), state.open_len())
        };

        if still_open > 0 {
            debug!("{still_open} step(s) still open at end(); they are not part of the profile");
        }

        let has_hot = profile.has_hot(config.hot_threshold);

        if config.prints() {
            console::print_profile(label, &profile, config);
        }

        if let Some(ref path) = config.trace_file {
            export_trace(&profile.events, path)?;
            info!("Trace written to {}", path.display());
        }

        let regressions = match config.diff_base_file {
            Some(ref path) => match read_baseline(path)? {
                Some(baseline) => diff_profiles(&baseline, &profile, config.diff_threshold),
                None => {
                    debug!("No baseline at {}, skipping regression check", path.display());
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        if !regressions.is_empty() {
            console::print_regressions(&regressions);
        }

        if config.enabled {
            write_profile(&profile, &config.profile_file)?;
            info!("Profile written to {}", config.profile_file.display());
        }

        let fail_on_hot_triggered = config.fail_on_hot && has_hot;
        if fail_on_hot_triggered {
            console::print_hot_failure();
        }

        Ok(ProfileOutcome { profile, has_hot, fail_on_hot_triggered, regressions, stack_violations })
    }

    // =========================================================================
    // STEP LIFECYCLE
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, StepStack> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(
        &self,
        name: String,
        is_async: bool,
        call_site: &'static Location<'static>,
        completion: Completion,
    ) -> StepGuard {
        let id = self.lock().push(name, is_async, call_site);
        StepGuard::new(self.clone(), id, completion)
    }

    /// Finalize a step: time it, classify it, pop it, record it and, if it
    /// is slow or hot, locate it.
    pub(crate) fn close(&self, id: EventId) {
        let config = &self.inner.config;
        let mut state = self.lock();

        let timing = state.timing(id, Instant::now());
        let class = classify(timing.duration, timing.elapsed, timing.is_async, config.thresholds());

        if let Err(violation) = state.pop(id) {
            error!("Overlapping steps on one profiler: {violation}");
            if config.on_stack_violation == ViolationPolicy::Panic && !std::thread::panicking() {
                drop(state);
                panic!("overlapping steps on one profiler: {violation}");
            }
            state.record_violation(violation);
        }

        let source = if config.capture_source && class.wants_source() {
            let snapshot = match config.source_capture {
                SourceCapture::CallSite => Snapshot::CallSite(state.call_site(id)),
                SourceCapture::Backtrace => Snapshot::capture_backtrace(),
            };
            self.inner.locator.locate(&snapshot)
        } else {
            None
        };

        debug!(
            "step '{}' finished in {:.3}ms (depth {}, {}{}{})",
            state.name(id),
            timing.duration,
            state.depth(id),
            class.kind,
            if class.slow { ", slow" } else { "" },
            if class.hot { ", hot" } else { "" },
        );

        state.finish(id, timing, class, source);
    }

    pub(crate) fn abandon(&self, id: EventId) {
        self.lock().abandon(id);
    }

    pub(crate) fn event(&self, id: EventId) -> Option<Event> {
        self.lock().event(id)
    }

    pub(crate) fn name_of(&self, id: EventId) -> String {
        self.lock().name(id).to_string()
    }

    pub(crate) fn depth_of(&self, id: EventId) -> usize {
        self.lock().depth(id)
    }
}
