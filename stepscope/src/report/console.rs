//! Console report printed by `end()`.
//!
//! ```text
//! ⏱ Total 1.42 s
//! ├─ load                   120.31 ms ███
//!   ├─ parse                  98.02 ms ██
//! ├─ render                    1.21 s  ███████████████████████████ 🔥 HOT
//! ```
//!
//! Rendering goes to any `Write`; write errors are ignored since a broken
//! stdout must not fail the profiled program.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use crate::config::ProfilerConfig;
use crate::domain::{Profile, RegressionEntry};
use crossterm::style::Stylize;
use std::io::{self, Write};

/// Bar width at ratio 1.0.
pub const DEFAULT_BAR_WIDTH: usize = 32;

const NAME_WIDTH: usize = 22;

/// Human-readable duration.
///
/// ```
/// use stepscope::report::format_time;
///
/// assert_eq!(format_time(0.5), "500.00 μs");
/// assert_eq!(format_time(12.345), "12.35 ms");
/// assert_eq!(format_time(2500.0), "2.50 s");
/// assert_eq!(format_time(90_000.0), "1.50 min");
/// ```
#[must_use]
pub fn format_time(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.2} μs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{ms:.2} ms")
    } else if ms < 60_000.0 {
        format!("{:.2} s", ms / 1000.0)
    } else {
        format!("{:.2} min", ms / 60_000.0)
    }
}

/// A bar of `round(ratio × width)` blocks, never shorter than one.
#[must_use]
pub fn make_bar(ratio: f64, width: usize) -> String {
    let len = ((ratio * width as f64).round() as usize).max(1);
    "█".repeat(len)
}

/// Header line, then one line per event when `config.flame` is set.
///
/// HOT is judged against the final `profile.total`.
pub fn render_profile<W: Write>(out: &mut W, label: &str, profile: &Profile, config: &ProfilerConfig) {
    let _ = writeln!(out, "{} {} {}", "⏱".cyan(), label.bold(), format_time(profile.total).yellow());

    if !config.flame {
        return;
    }

    for event in &profile.events {
        let ratio = profile.ratio(event.duration);
        let hot = ratio >= config.hot_threshold;
        let slow = event.duration >= config.slow_threshold;

        let branch = format!("{}├─", "  ".repeat(event.depth));
        let marker = if hot {
            format!(" {}", "🔥 HOT".red().bold())
        } else if slow {
            format!(" {}", "⚠ SLOW".yellow())
        } else {
            String::new()
        };

        let _ = writeln!(
            out,
            "{} {} {} {}{marker}",
            branch.dark_grey(),
            format!("{:<NAME_WIDTH$}", event.name).white(),
            format_time(event.duration).yellow(),
            make_bar(ratio, DEFAULT_BAR_WIDTH).dark_grey(),
        );
    }
}

/// `name: before → after (+pct%)` per regression.
pub fn render_regressions<W: Write>(out: &mut W, regressions: &[RegressionEntry]) {
    if regressions.is_empty() {
        return;
    }

    let _ = writeln!(out, "\n{}\n", "⚠ Performance Regression Detected:".red());
    for r in regressions {
        let line = format!(
            "  {}: {} → {} (+{:.1}%)",
            r.name,
            format_time(r.before),
            format_time(r.after),
            r.diff * 100.0
        );
        let _ = writeln!(out, "{}", line.red());
    }
}

pub fn render_hot_failure<W: Write>(out: &mut W) {
    let _ = writeln!(out, "\n{}", "🔥 HOT step detected, failing".red());
}

pub(crate) fn print_profile(label: &str, profile: &Profile, config: &ProfilerConfig) {
    render_profile(&mut io::stdout().lock(), label, profile, config);
}

pub(crate) fn print_regressions(regressions: &[RegressionEntry]) {
    render_regressions(&mut io::stdout().lock(), regressions);
}

pub(crate) fn print_hot_failure() {
    render_hot_failure(&mut io::stdout().lock());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Event, StepKind};

    fn event(name: &str, duration: f64, depth: usize) -> Event {
        Event {
            name: name.to_string(),
            start: 0.0,
            duration,
            depth,
            children: vec![],
            source: None,
            is_async: false,
            kind: StepKind::Cpu,
            slow: false,
            hot: false,
        }
    }

    fn render(profile: &Profile, config: &ProfilerConfig) -> String {
        let mut out = Vec::new();
        render_profile(&mut out, "Total", profile, config);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_time_boundaries() {
        assert_eq!(format_time(0.0), "0.00 μs");
        assert_eq!(format_time(1.0), "1.00 ms");
        assert_eq!(format_time(999.994), "999.99 ms");
        assert_eq!(format_time(1000.0), "1.00 s");
        assert_eq!(format_time(60_000.0), "1.00 min");
    }

    #[test]
    fn test_make_bar() {
        assert_eq!(make_bar(1.0, 32).chars().count(), 32);
        assert_eq!(make_bar(0.5, 32).chars().count(), 16);
        assert_eq!(make_bar(0.0, 32).chars().count(), 1);
        assert_eq!(make_bar(0.01, 10), "█");
    }

    #[test]
    fn test_header_only_without_flame() {
        let profile = Profile { total: 10.0, events: vec![event("step", 5.0, 0)] };
        let text = render(&profile, &ProfilerConfig::default());
        assert!(text.contains("Total"));
        assert!(text.contains("10.00 ms"));
        assert!(!text.contains("step"));
    }

    #[test]
    fn test_flame_marks_hot_and_slow() {
        let profile = Profile {
            total: 1000.0,
            events: vec![event("hot_one", 900.0, 0), event("slow_one", 600.0, 1), event("quick", 1.0, 1)],
        };
        let config = ProfilerConfig::default().with_flame(true).with_hot_threshold(0.8);
        let text = render(&profile, &config);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("hot_one") && lines[1].contains("🔥 HOT"));
        assert!(lines[2].contains("slow_one") && lines[2].contains("⚠ SLOW"));
        assert!(lines[2].contains("  ├─"));
        assert!(!lines[3].contains("HOT") && !lines[3].contains("SLOW"));
    }

    #[test]
    fn test_regression_lines() {
        let mut out = Vec::new();
        let entries = [RegressionEntry { name: "job".to_string(), before: 10.0, after: 12.0, diff: 0.2 }];
        render_regressions(&mut out, &entries);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("job: 10.00 ms → 12.00 ms (+20.0%)"));
    }

    #[test]
    fn test_no_regressions_prints_nothing() {
        let mut out = Vec::new();
        render_regressions(&mut out, &[]);
        assert!(out.is_empty());
    }
}
