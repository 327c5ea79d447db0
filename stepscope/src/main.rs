//! # stepscope - Profile File Tool
//!
//! Works on the `profile.json` files written by `Profiler::end()`:
//! - **diff**: regression check against a baseline, for CI
//! - **summary**: slowest steps with their paths, optionally failing on hot steps
//! - **trace** / **report**: Chrome trace and HTML renderings

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::Path;

use stepscope::analysis::{diff_profiles, summarize};
use stepscope::cli::{Args, Command};
use stepscope::domain::Profile;
use stepscope::export::{export_trace, read_profile};
use stepscope::report::{format_time, html_report, render_regressions};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_DETECTED: i32 = 1;
const EXIT_ERROR: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn load(path: &Path) -> Result<Profile> {
    read_profile(path).with_context(|| format!("cannot load profile {}", path.display()))
}

fn run() -> Result<i32> {
    let args = Args::parse();

    match args.command {
        Command::Diff { base, current, threshold, json } => {
            let regressions = diff_profiles(&load(&base)?, &load(&current)?, threshold);
            info!("{} regression(s) at threshold {threshold}", regressions.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&regressions)?);
            } else if regressions.is_empty() {
                if !args.quiet {
                    println!("no regressions");
                }
            } else {
                render_regressions(&mut std::io::stdout().lock(), &regressions);
            }

            Ok(if regressions.is_empty() { EXIT_SUCCESS } else { EXIT_DETECTED })
        }

        Command::Trace { profile, output } => {
            let profile = load(&profile)?;
            export_trace(&profile.events, &output)?;
            if !args.quiet {
                println!("trace: {} ({} events)", output.display(), profile.events.len());
            }
            Ok(EXIT_SUCCESS)
        }

        Command::Summary { profile, top, hot_threshold, fail_on_hot, json } => {
            let profile = load(&profile)?;
            let summary = summarize(&profile, Some(top), hot_threshold);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("total: {}", format_time(summary.total));
                for entry in &summary.top {
                    let marker = if entry.hot { "  HOT" } else { "" };
                    let source = entry.source.as_deref().map(|s| format!("  ({s})")).unwrap_or_default();
                    println!(
                        "{:>12}  {:>5.1}%  {}{source}{marker}",
                        format_time(entry.duration),
                        entry.ratio * 100.0,
                        entry.path
                    );
                }
            }

            let hot = profile.has_hot(hot_threshold);
            if fail_on_hot && hot {
                eprintln!("hot step detected");
                return Ok(EXIT_DETECTED);
            }
            Ok(EXIT_SUCCESS)
        }

        Command::Report { profile, output, hot_threshold } => {
            let html = html_report(&load(&profile)?, hot_threshold);
            fs::write(&output, html)
                .with_context(|| format!("cannot write report {}", output.display()))?;
            if !args.quiet {
                println!("report: {}", output.display());
            }
            Ok(EXIT_SUCCESS)
        }
    }
}
