//! Best-effort source location for slow and hot steps.

use super::frames::{parse_backtrace, Frame};
use super::source_map::SourceMapResolver;
use crate::domain::{EventSource, SourceLocation};
use log::debug;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

/// What the locator works from.
#[derive(Debug, Clone)]
pub enum Snapshot {
    /// The `#[track_caller]` location of the step call.
    CallSite(&'static Location<'static>),
    /// Rendered backtrace text.
    Backtrace(String),
}

impl Snapshot {
    /// Capture a backtrace of the current thread, regardless of
    /// `RUST_BACKTRACE`.
    #[must_use]
    pub fn capture_backtrace() -> Self {
        Snapshot::Backtrace(Backtrace::force_capture().to_string())
    }
}

/// Turns a [`Snapshot`] into an [`EventSource`], resolving through a
/// colocated `<file>.map` when a source map resolver is available.
pub struct SourceLocator {
    resolver: Option<Box<dyn SourceMapResolver>>,
}

impl fmt::Debug for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceLocator").field("source_maps", &self.has_source_maps()).finish()
    }
}

impl Default for SourceLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLocator {
    /// Locator with the built-in JSON source map resolver when the
    /// `source-maps` feature is enabled, without one otherwise.
    #[must_use]
    pub fn new() -> Self {
        #[cfg(feature = "source-maps")]
        {
            Self::with_resolver(super::source_map::JsonSourceMapResolver)
        }
        #[cfg(not(feature = "source-maps"))]
        {
            Self::without_source_maps()
        }
    }

    #[must_use]
    pub fn without_source_maps() -> Self {
        Self { resolver: None }
    }

    #[must_use]
    pub fn with_resolver(resolver: impl SourceMapResolver + 'static) -> Self {
        Self { resolver: Some(Box::new(resolver)) }
    }

    #[must_use]
    pub fn has_source_maps(&self) -> bool {
        self.resolver.is_some()
    }

    /// Locate a snapshot. Never fails; returns `None` only when there is
    /// nothing at all to report.
    #[must_use]
    pub fn locate(&self, snapshot: &Snapshot) -> Option<EventSource> {
        match snapshot {
            Snapshot::CallSite(location) => Some(EventSource::Location(self.resolve(
                SourceLocation::new(location.file(), location.line(), location.column()),
            ))),
            Snapshot::Backtrace(text) => match locate_in_backtrace(text)? {
                EventSource::Location(loc) => Some(EventSource::Location(self.resolve(loc))),
                raw @ EventSource::Raw { .. } => Some(raw),
            },
        }
    }

    /// Attach the original position from `<file>.map`, if there is one.
    ///
    /// Missing maps, unreadable maps and positions the map does not cover
    /// all leave the location unresolved.
    #[must_use]
    pub fn resolve(&self, mut location: SourceLocation) -> SourceLocation {
        let Some(ref resolver) = self.resolver else {
            return location;
        };

        let map_path = PathBuf::from(format!("{}.map", location.file));
        if !map_path.is_file() {
            return location;
        }

        match resolver.resolve(&map_path, location.line, location.column) {
            Ok(original) => location.original = original,
            Err(e) => debug!("Ignoring source map {}: {e}", map_path.display()),
        }
        location
    }
}

/// Pick the first informative frame of a backtrace.
///
/// Prefers the first caller frame; without one, the first frame that has
/// anything to show. A chosen frame without a parsable location is returned
/// as raw text.
#[must_use]
pub fn locate_in_backtrace(text: &str) -> Option<EventSource> {
    let frames = parse_backtrace(text);

    let chosen = frames
        .iter()
        .find(|f| f.origin().is_user_code())
        .or_else(|| frames.iter().find(|f| f.location.is_some()));

    match chosen {
        Some(Frame { location: Some((file, line, column)), .. }) => {
            Some(EventSource::Location(SourceLocation::new(file.clone(), *line, *column)))
        }
        Some(frame) => Some(EventSource::Raw { raw: frame.text.clone() }),
        None => text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(|l| EventSource::Raw { raw: l.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OriginalPosition, SourceMapError};
    use std::path::Path;

    struct FixedResolver;

    impl SourceMapResolver for FixedResolver {
        fn resolve(
            &self,
            _map_path: &Path,
            line: u32,
            column: u32,
        ) -> Result<Option<OriginalPosition>, SourceMapError> {
            Ok(Some(OriginalPosition {
                source: "src/mock.ts".to_string(),
                line: line + 100,
                column,
                name: Some("mockFn".to_string()),
            }))
        }
    }

    struct FailingResolver;

    impl SourceMapResolver for FailingResolver {
        fn resolve(
            &self,
            _map_path: &Path,
            _line: u32,
            _column: u32,
        ) -> Result<Option<OriginalPosition>, SourceMapError> {
            Err(SourceMapError::UnsupportedVersion(1))
        }
    }

    #[test]
    fn test_call_site_without_map_is_unresolved() {
        let locator = SourceLocator::with_resolver(FixedResolver);
        let snapshot = Snapshot::CallSite(Location::caller());

        let source = locator.locate(&snapshot).unwrap();
        let loc = source.location().unwrap();
        assert!(loc.file.ends_with("locator.rs"));
        assert!(loc.line > 0);
        assert!(loc.original.is_none());
    }

    #[test]
    fn test_resolves_through_colocated_map() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bundle.js");
        std::fs::write(&file, "// generated").unwrap();
        std::fs::write(dir.path().join("bundle.js.map"), "{}").unwrap();

        let locator = SourceLocator::with_resolver(FixedResolver);
        let loc = locator.resolve(SourceLocation::new(file.to_string_lossy(), 3, 9));

        let original = loc.original.unwrap();
        assert_eq!(original.source, "src/mock.ts");
        assert_eq!(original.line, 103);
        assert_eq!(original.name.as_deref(), Some("mockFn"));
    }

    #[test]
    fn test_resolver_failure_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bundle.js");
        std::fs::write(dir.path().join("bundle.js.map"), "not json").unwrap();

        let locator = SourceLocator::with_resolver(FailingResolver);
        let loc = locator.resolve(SourceLocation::new(file.to_string_lossy(), 3, 9));
        assert_eq!(loc.line, 3);
        assert!(loc.original.is_none());
    }

    #[test]
    fn test_without_resolver_skips_maps() {
        let locator = SourceLocator::without_source_maps();
        assert!(!locator.has_source_maps());
        let loc = locator.resolve(SourceLocation::new("whatever.js", 1, 1));
        assert!(loc.original.is_none());
    }

    #[test]
    fn test_backtrace_falls_back_to_raw() {
        let text = "   0: stepscope::profiling::guard::StepGuard::finalize\n   1: my_app::main\n";
        let source = locate_in_backtrace(text).unwrap();
        assert_eq!(source, EventSource::Raw { raw: "1: my_app::main".to_string() });
    }

    #[test]
    fn test_backtrace_picks_user_location() {
        let text = "Error\n    at finish (/srv/app/node_modules/prof/index.js:5:3)\n    at run (/srv/app/dist/job.js:9:1)";
        let source = locate_in_backtrace(text).unwrap();
        let loc = source.location().unwrap();
        assert_eq!(loc.file, "/srv/app/dist/job.js");
        assert_eq!((loc.line, loc.column), (9, 1));
    }

    #[test]
    fn test_empty_backtrace_locates_nothing() {
        assert!(locate_in_backtrace("  \n").is_none());
    }

    #[test]
    fn test_captured_backtrace_is_located() {
        let locator = SourceLocator::without_source_maps();
        assert!(locator.locate(&Snapshot::capture_backtrace()).is_some());
    }
}
