//! Source Map v3 decoding.
//!
//! Generated code (bundles, transpiled scripts, code emitted by a build
//! step) can ship a `<file>.map` next to it. This module decodes the JSON
//! map and answers "which original position produced generated line L,
//! column C?".
//!
//! ## Mappings encoding
//!
//! `mappings` is a `;`-separated list of generated lines, each a
//! `,`-separated list of segments. A segment is 1, 4 or 5 Base64 VLQ
//! numbers:
//!
//! ```text
//! [generated column, source index, original line, original column, name index]
//! ```
//!
//! The generated column is relative to the previous segment on the same
//! line. The other four are relative to their previous value anywhere in the
//! map.
//!
//! ## Lookup
//!
//! Positions are 1-based on both sides. A lookup picks the segment with the
//! greatest generated column not past the requested column on that line; a
//! segment without source information resolves to nothing.

use crate::domain::{OriginalPosition, SourceMapError};
use serde::Deserialize;
use std::path::Path;

/// Resolves a generated position through a source map file.
///
/// This is the optional capability of the [`SourceLocator`]: a locator
/// without a resolver returns parsed positions unresolved.
///
/// [`SourceLocator`]: super::SourceLocator
pub trait SourceMapResolver: Send + Sync {
    /// # Errors
    /// Returns an error if the map cannot be read or decoded.
    fn resolve(
        &self,
        map_path: &Path,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition>, SourceMapError>;
}

/// Reads and decodes the map file on every call.
///
/// Only slow or hot steps are located, so the per-call read is the price of
/// never holding stale maps.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSourceMapResolver;

impl SourceMapResolver for JsonSourceMapResolver {
    fn resolve(
        &self,
        map_path: &Path,
        line: u32,
        column: u32,
    ) -> Result<Option<OriginalPosition>, SourceMapError> {
        let map = SourceMap::from_file(map_path)?;
        Ok(map.original_position_for(line, column))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: u32,
    #[serde(default)]
    source_root: Option<String>,
    #[serde(default)]
    sources: Vec<Option<String>>,
    #[serde(default)]
    names: Vec<String>,
    mappings: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    generated_column: u32,
    original: Option<OriginalRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OriginalRef {
    source: u32,
    line: u32,
    column: u32,
    name: Option<u32>,
}

/// A decoded source map.
#[derive(Debug, Clone)]
pub struct SourceMap {
    sources: Vec<String>,
    names: Vec<String>,
    /// Segments per generated line (0-based), sorted by generated column.
    lines: Vec<Vec<Segment>>,
}

impl SourceMap {
    /// # Errors
    /// Returns an error if the file cannot be read or decoded.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceMapError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// # Errors
    /// Returns an error on invalid JSON, a version other than 3, or a
    /// malformed `mappings` string.
    pub fn parse(json: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(json)?;
        if raw.version != 3 {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }

        let root = raw.source_root.filter(|r| !r.is_empty());
        let sources = raw
            .sources
            .into_iter()
            .map(|s| {
                let s = s.unwrap_or_default();
                match root {
                    Some(ref root) if !s.starts_with('/') => {
                        format!("{}/{s}", root.trim_end_matches('/'))
                    }
                    _ => s,
                }
            })
            .collect();

        Ok(Self { sources, names: raw.names, lines: decode_mappings(&raw.mappings)? })
    }

    /// Original position for a 1-based generated `line` / `column`.
    #[must_use]
    pub fn original_position_for(&self, line: u32, column: u32) -> Option<OriginalPosition> {
        let segments = self.lines.get(line.checked_sub(1)? as usize)?;
        let column = column.saturating_sub(1);

        let idx = segments.partition_point(|s| s.generated_column <= column);
        let original = segments.get(idx.checked_sub(1)?)?.original?;

        Some(OriginalPosition {
            source: self.sources.get(original.source as usize)?.clone(),
            line: original.line + 1,
            column: original.column + 1,
            name: original.name.and_then(|n| self.names.get(n as usize).cloned()),
        })
    }

    /// Number of generated lines covered by the mappings.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decode_mappings(mappings: &str) -> Result<Vec<Vec<Segment>>, SourceMapError> {
    let mut lines = Vec::new();
    let mut source: i64 = 0;
    let mut original_line: i64 = 0;
    let mut original_column: i64 = 0;
    let mut name: i64 = 0;

    for group in mappings.split(';') {
        let mut generated_column: i64 = 0;
        let mut segments = Vec::new();

        for segment in group.split(',').filter(|s| !s.is_empty()) {
            let values = decode_vlq(segment)?;
            generated_column += values[0];

            let original = if values.len() >= 4 {
                source += values[1];
                original_line += values[2];
                original_column += values[3];
                let name_idx = if values.len() >= 5 {
                    name += values[4];
                    Some(name.max(0) as u32)
                } else {
                    None
                };
                Some(OriginalRef {
                    source: source.max(0) as u32,
                    line: original_line.max(0) as u32,
                    column: original_column.max(0) as u32,
                    name: name_idx,
                })
            } else {
                None
            };

            segments.push(Segment { generated_column: generated_column.max(0) as u32, original });
        }

        segments.sort_by_key(|s| s.generated_column);
        lines.push(segments);
    }

    Ok(lines)
}

/// Decode one segment of Base64 VLQ numbers.
fn decode_vlq(segment: &str) -> Result<Vec<i64>, SourceMapError> {
    let mut values = Vec::with_capacity(5);
    let mut value: i64 = 0;
    let mut shift = 0u32;
    let mut pending = false;

    for c in segment.chars() {
        let digit = base64_value(c).ok_or(SourceMapError::InvalidVlqChar(c))?;
        if shift > 60 {
            return Err(SourceMapError::TruncatedVlq(segment.to_string()));
        }
        value += i64::from(digit & 0x1f) << shift;

        if digit & 0x20 == 0 {
            let magnitude = value >> 1;
            values.push(if value & 1 == 1 { -magnitude } else { magnitude });
            value = 0;
            shift = 0;
            pending = false;
        } else {
            shift += 5;
            pending = true;
        }
    }

    if pending || values.is_empty() {
        return Err(SourceMapError::TruncatedVlq(segment.to_string()));
    }
    Ok(values)
}

fn base64_value(c: char) -> Option<u8> {
    let v = match c {
        'A'..='Z' => c as u8 - b'A',
        'a'..='z' => c as u8 - b'a' + 26,
        '0'..='9' => c as u8 - b'0' + 52,
        '+' => 62,
        '/' => 63,
        _ => return None,
    };
    Some(v)
}
