//! Stack frame parsing and origin classification.
//!
//! A captured backtrace is plain text. This module splits it into frames,
//! pulls a `file:line:column` out of each one, and classifies frames so the
//! locator can skip past the standard library, async runtimes and the
//! profiler itself to the first frame that belongs to the caller.
//!
//! # Accepted location forms
//!
//! The parser is permissive on purpose, it accepts both layouts seen in the
//! wild:
//!
//! ```text
//!    3: my_app::load_config
//!              at ./src/config.rs:42:17          ← Rust std backtrace
//!     at loadConfig (/srv/app/dist/config.js:42:17)  ← parenthesized form
//!     at /srv/app/dist/config.js:42:17               ← bare form
//! ```
//!
//! # Classification Strategy
//!
//! 1. **File path patterns**, most reliable when a location is present
//!    - `.cargo/registry/` → third-party crate (or runtime, see below)
//!    - `.rustup/toolchains/`, `/rustc/` → Rust toolchain (std, core, alloc)
//! 2. **Function name prefixes**, the fallback for frames without a location

/// Origin of a stack frame, used to find the first frame worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameOrigin {
    /// Caller code: relative paths, unknown absolute paths, unknown functions
    UserCode,
    /// Rust standard library (std, core, alloc)
    StdLib,
    /// Async runtime libraries (tokio, async-std, futures)
    RuntimeLib,
    /// Other third-party crates from cargo registry
    ThirdParty,
    /// stepscope's own capture and bookkeeping frames
    Profiler,
    /// Nothing to go on (header lines, `<unknown>` symbols)
    #[default]
    Unknown,
}

impl FrameOrigin {
    #[must_use]
    pub fn is_user_code(&self) -> bool {
        matches!(self, FrameOrigin::UserCode)
    }
}

/// One frame of a textual backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: Option<String>,
    pub location: Option<(String, u32, u32)>,
    /// Trimmed text of the line that opened this frame.
    pub text: String,
}

impl Frame {
    #[must_use]
    pub fn origin(&self) -> FrameOrigin {
        classify_frame(
            self.function.as_deref(),
            self.location.as_ref().map(|(file, _, _)| file.as_str()),
        )
    }
}

/// Parse `FILE:LINE:COLUMN` out of a single frame line.
///
/// Accepts `(FILE:LINE:COLUMN)` anywhere at the end of the line, a leading
/// `at `, or a bare location. Returns `None` if line or column are not
/// numbers.
#[must_use]
pub fn parse_location(text: &str) -> Option<(String, u32, u32)> {
    let trimmed = text.trim();

    let candidate = match (trimmed.rfind('('), trimmed.strip_suffix(')')) {
        (Some(open), Some(without_close)) if open < without_close.len() => {
            &without_close[open + 1..]
        }
        _ => trimmed.strip_prefix("at ").unwrap_or(trimmed).trim(),
    };

    let mut parts = candidate.rsplitn(3, ':');
    let column = parts.next()?.trim().parse::<u32>().ok()?;
    let line = parts.next()?.trim().parse::<u32>().ok()?;
    let file = parts.next()?.trim();
    if file.is_empty() {
        return None;
    }

    Some((file.to_string(), line, column))
}

/// Split backtrace text into frames.
///
/// Numbered lines (`  3: symbol`) open a frame and a following `at` line
/// attaches its location. An `at` line with no open frame waiting for a
/// location is a frame on its own.
#[must_use]
pub fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut awaiting_location = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(symbol) = numbered_symbol(trimmed) {
            frames.push(Frame {
                function: Some(symbol.to_string()),
                location: None,
                text: trimmed.to_string(),
            });
            awaiting_location = true;
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("at ") {
            let location = parse_location(trimmed);
            if awaiting_location {
                if let Some(frame) = frames.last_mut() {
                    frame.location = location;
                    awaiting_location = false;
                    continue;
                }
            }
            let function = rest
                .find(" (")
                .map(|idx| rest[..idx].trim().to_string())
                .filter(|f| !f.is_empty());
            frames.push(Frame { function, location, text: trimmed.to_string() });
            continue;
        }

        frames.push(Frame {
            function: None,
            location: parse_location(trimmed),
            text: trimmed.to_string(),
        });
        awaiting_location = false;
    }

    frames
}

/// `"12: my_app::main"` → `Some("my_app::main")`
fn numbered_symbol(line: &str) -> Option<&str> {
    let (index, rest) = line.split_once(':')?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let symbol = rest.trim();
    (!symbol.is_empty()).then_some(symbol)
}

/// Classify a frame based on its function name and file path.
#[must_use]
pub fn classify_frame(function: Option<&str>, file: Option<&str>) -> FrameOrigin {
    if let Some(function) = function {
        if function == "<unknown>" || function.starts_with("0x") {
            return FrameOrigin::Unknown;
        }
        if is_profiler_function(function) {
            return FrameOrigin::Profiler;
        }
    }

    // === FILE PATH CLASSIFICATION ===
    if let Some(path) = file {
        if path.contains(".cargo/registry/") || path.contains(".cargo\\registry\\") {
            if is_runtime_path(path) {
                return FrameOrigin::RuntimeLib;
            }
            return FrameOrigin::ThirdParty;
        }

        if path.contains(".rustup/toolchains/")
            || path.contains(".rustup\\toolchains\\")
            || path.contains("/rustc/")
            || path.contains("\\rustc\\")
        {
            return FrameOrigin::StdLib;
        }

        if path.starts_with("node:") || path.contains("/node_modules/") {
            return FrameOrigin::ThirdParty;
        }

        if path.starts_with("/usr/") || path.starts_with("/lib/") {
            return FrameOrigin::ThirdParty;
        }

        return FrameOrigin::UserCode;
    }

    // === FUNCTION NAME CLASSIFICATION ===
    match function {
        Some(function) => classify_by_function_prefix(function).unwrap_or(FrameOrigin::UserCode),
        None => FrameOrigin::Unknown,
    }
}

// =============================================================================
// CLASSIFICATION TABLES
// =============================================================================

/// Standard library module prefixes
const STD_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "<alloc::", "<core::", "<std::"];

/// Async runtime crate prefixes (function names)
const RUNTIME_PREFIXES: &[&str] = &[
    "tokio::",
    "<tokio::",
    "async_std::",
    "futures::",
    "futures_util::",
    "futures_core::",
    "futures_executor::",
    "mio::",
];

/// Third-party crates that show up around test harnesses and logging
const THIRD_PARTY_PREFIXES: &[&str] = &["test::", "log::", "env_logger::", "__rust_", "_start"];

/// Profiler internals: capture, finalization and guard drops
const PROFILER_PREFIXES: &[&str] = &[
    "stepscope::profiling::",
    "stepscope::symbolization::",
    "<stepscope::profiling::",
    "core::ptr::drop_in_place<stepscope::",
];

/// Runtime crate patterns in cargo registry paths
const RUNTIME_CRATE_PATTERNS: &[&str] =
    &["/tokio-", "/async-std-", "/futures-", "/futures-util-", "/futures-core-", "/mio-"];

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn is_profiler_function(function: &str) -> bool {
    !function.contains("::tests::") && PROFILER_PREFIXES.iter().any(|p| function.starts_with(p))
}

fn classify_by_function_prefix(function: &str) -> Option<FrameOrigin> {
    [
        (STD_PREFIXES, FrameOrigin::StdLib),
        (RUNTIME_PREFIXES, FrameOrigin::RuntimeLib),
        (THIRD_PARTY_PREFIXES, FrameOrigin::ThirdParty),
    ]
    .into_iter()
    .find(|(prefixes, _)| prefixes.iter().any(|p| function.starts_with(p)))
    .map(|(_, origin)| origin)
}

fn is_runtime_path(path: &str) -> bool {
    RUNTIME_CRATE_PATTERNS.iter().any(|pattern| path.contains(pattern))
}
