//! Slash-delimited remote paths
//!
//! Segments are separated by `/`. A name containing a literal slash is
//! written with a backslash escape (`reports\/2024`). The `*` character is
//! reserved for the escape substitution and is rejected in raw input.

use std::fmt;

use crate::error::{Result, SyncError};

pub const SEPARATOR: char = '/';

/// Backslash-slash, the literal-slash escape in raw paths
pub const ESCAPED_SEPARATOR: &str = "\\/";

/// Temporary stand-in for an escaped separator while splitting
const SENTINEL: char = '*';

/// A parsed remote path: ordered segment names, escapes resolved.
///
/// Empty segments (`a//b`, `a/b/`) are kept so callers can reject them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSpec {
    segments: Vec<String>,
}

impl PathSpec {
    /// Parse a raw path. A single leading `/` is ignored; `""` and `"/"`
    /// both parse to the empty path.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains(SENTINEL) {
            return Err(SyncError::InvalidPath {
                path: raw.to_string(),
                reason: format!("'{}' is reserved and cannot appear in a path", SENTINEL),
            });
        }

        let trimmed = raw.strip_prefix(SEPARATOR).unwrap_or(raw);
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let segments = trimmed
            .replace(ESCAPED_SEPARATOR, &SENTINEL.to_string())
            .split(SEPARATOR)
            .map(|segment| segment.replace(SENTINEL, "/"))
            .collect();

        Ok(Self { segments })
    }

    /// Build from already-unescaped names
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn has_empty_segment(&self) -> bool {
        self.segments.iter().any(String::is_empty)
    }

    /// Split into the parent path and the last segment
    pub fn split_last(&self) -> Option<(PathSpec, &str)> {
        let (last, parent) = self.segments.split_last()?;
        Some((PathSpec::from_segments(parent.iter().cloned()), last.as_str()))
    }
}

/// Renders the raw form, re-escaping slashes inside names
impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escaped: Vec<String> = self
            .segments
            .iter()
            .map(|s| s.replace(SEPARATOR, ESCAPED_SEPARATOR))
            .collect();
        write!(f, "{}", escaped.join("/"))
    }
}

/// Drop one trailing `/` unless it is escaped
pub fn strip_trailing_separator(raw: &str) -> &str {
    match raw.strip_suffix(SEPARATOR) {
        Some(stripped) if !stripped.ends_with('\\') => stripped,
        _ => raw,
    }
}
