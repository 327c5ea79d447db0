//! Regression detection between two profiles.
//!
//! Steps are matched by name only. The baseline's flat event list is folded
//! into a `name → duration` map where a repeated name keeps the duration of
//! its **last** occurrence, so a step that ran several times is compared
//! against its final run in the baseline.
//!
//! ```text
//! baseline  [a:10, b:4, a:20]   →   { a: 20, b: 4 }
//! current   [a:30, c:1]
//!                │     └── no baseline entry, skipped
//!                └────── (30 - 20) / 20 = 0.5  ≥ threshold → reported
//! ```

use crate::domain::{Profile, RegressionEntry};
use std::collections::HashMap;

/// Compare `current` against `baseline`.
///
/// Returns one entry per current event whose baseline duration is positive
/// and whose relative slowdown is at least `threshold`, in current order.
/// A baseline duration of zero cannot yield a ratio and is skipped.
#[must_use]
pub fn diff_profiles(baseline: &Profile, current: &Profile, threshold: f64) -> Vec<RegressionEntry> {
    let before: HashMap<&str, f64> =
        baseline.events.iter().map(|e| (e.name.as_str(), e.duration)).collect();

    current
        .events
        .iter()
        .filter_map(|event| {
            let before = *before.get(event.name.as_str())?;
            if before <= 0.0 {
                return None;
            }
            let diff = (event.duration - before) / before;
            (diff >= threshold).then(|| RegressionEntry {
                name: event.name.clone(),
                before,
                after: event.duration,
                diff,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, StepKind};

    fn event(name: &str, duration: f64) -> Event {
        Event {
            name: name.to_string(),
            start: 0.0,
            duration,
            depth: 0,
            children: Vec::new(),
            source: None,
            is_async: false,
            kind: StepKind::Cpu,
            slow: false,
            hot: false,
        }
    }

    fn profile(events: &[(&str, f64)]) -> Profile {
        Profile {
            total: events.iter().map(|(_, d)| d).sum(),
            events: events.iter().map(|(n, d)| event(n, *d)).collect(),
        }
    }

    #[test]
    fn test_reports_slowdown_at_threshold() {
        let base = profile(&[("job", 10.0)]);
        let cur = profile(&[("job", 12.0)]);

        let entries = diff_profiles(&base, &cur, 0.1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "job");
        assert_eq!(entries[0].before, 10.0);
        assert_eq!(entries[0].after, 12.0);
        assert!((entries[0].diff - 0.2).abs() < 1e-9);

        assert!(diff_profiles(&base, &cur, 0.3).is_empty());
    }

    #[test]
    fn test_identical_profiles_have_no_regressions() {
        let p = profile(&[("a", 5.0), ("b", 7.5), ("c", 0.0)]);
        assert!(diff_profiles(&p, &p, 0.01).is_empty());
    }

    #[test]
    fn test_last_baseline_occurrence_wins() {
        let base = profile(&[("a", 10.0), ("a", 20.0)]);
        let cur = profile(&[("a", 30.0)]);

        let entries = diff_profiles(&base, &cur, 0.2);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].before, 20.0);
        assert!((entries[0].diff - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_baseline_and_unknown_names_are_skipped() {
        let base = profile(&[("zero", 0.0), ("gone", 3.0)]);
        let cur = profile(&[("zero", 50.0), ("new", 50.0)]);
        assert!(diff_profiles(&base, &cur, 0.0).is_empty());
    }

    #[test]
    fn test_preserves_current_order() {
        let base = profile(&[("a", 1.0), ("b", 1.0)]);
        let cur = profile(&[("b", 2.0), ("a", 3.0)]);
        let names: Vec<_> = diff_profiles(&base, &cur, 0.5).into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_speedups_are_not_regressions() {
        let base = profile(&[("a", 10.0)]);
        let cur = profile(&[("a", 5.0)]);
        assert!(diff_profiles(&base, &cur, 0.0).is_empty());
    }
}
