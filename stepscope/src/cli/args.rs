//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stepscope",
    version,
    about = "Inspect, compare and convert stepscope profile files",
    after_help = "\
EXAMPLES:
    stepscope diff base.json profile.json            Report steps 20% slower than base
    stepscope summary profile.json --top 5           Five slowest steps
    stepscope trace profile.json -o trace.json       Open in chrome://tracing
    stepscope report profile.json -o report.html     Static HTML table"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a profile against a baseline; exits 1 on regressions
    Diff {
        /// Baseline profile
        base: PathBuf,
        /// Profile to check
        current: PathBuf,
        /// Relative slowdown to report (0.2 = 20%)
        #[arg(long, default_value_t = crate::config::DEFAULT_DIFF_THRESHOLD)]
        threshold: f64,
        /// Print regressions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a profile into a Chrome trace file
    Trace {
        profile: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print the slowest steps with their full paths
    Summary {
        profile: PathBuf,
        /// Number of steps to show
        #[arg(long, default_value_t = crate::analysis::DEFAULT_SUMMARY_TOP)]
        top: usize,
        /// Share of the total that marks a step hot
        #[arg(long, default_value_t = crate::classification::DEFAULT_HOT_THRESHOLD)]
        hot_threshold: f64,
        /// Exit 1 if any step is hot
        #[arg(long)]
        fail_on_hot: bool,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a standalone HTML report
    Report {
        profile: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        #[arg(long, default_value_t = crate::classification::DEFAULT_HOT_THRESHOLD)]
        hot_threshold: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_defaults() {
        let args = Args::try_parse_from(["stepscope", "diff", "a.json", "b.json"]).unwrap();
        match args.command {
            Command::Diff { base, current, threshold, json } => {
                assert_eq!(base, PathBuf::from("a.json"));
                assert_eq!(current, PathBuf::from("b.json"));
                assert!((threshold - 0.2).abs() < f64::EPSILON);
                assert!(!json);
            }
            _ => panic!("expected diff"),
        }
    }

    #[test]
    fn test_summary_flags() {
        let args = Args::try_parse_from([
            "stepscope",
            "summary",
            "p.json",
            "--top",
            "3",
            "--hot-threshold",
            "0.5",
            "--fail-on-hot",
        ])
        .unwrap();
        match args.command {
            Command::Summary { top, hot_threshold, fail_on_hot, .. } => {
                assert_eq!(top, 3);
                assert!((hot_threshold - 0.5).abs() < f64::EPSILON);
                assert!(fail_on_hot);
            }
            _ => panic!("expected summary"),
        }
    }

    #[test]
    fn test_trace_requires_output() {
        assert!(Args::try_parse_from(["stepscope", "trace", "p.json"]).is_err());
    }

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
