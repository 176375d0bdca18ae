//! Endpoint pattern matching
//!
//! Endpoints are `/`-separated segments. A segment written `%{name}` is a
//! parameter and matches any single non-empty path segment.

use regex::Regex;
use std::sync::LazyLock;

/// Marker that opens a parameter segment
pub const PARAMETER_MARKER: &str = "%{";

/// Regex for a well-formed parameter segment: %{name}
static PARAMETER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%\{([a-zA-Z_][a-zA-Z0-9_]*)\}$").unwrap());

/// One segment of an endpoint pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Parameter(String),
}

impl Segment {
    fn accepts(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == segment,
            Segment::Parameter(_) => !segment.is_empty(),
        }
    }
}

/// Compiled endpoint pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPattern {
    source: String,
    segments: Vec<Segment>,
}

impl EndpointPattern {
    /// Compile an endpoint pattern
    pub fn parse(endpoint: &str) -> Self {
        let segments = split_path(endpoint)
            .into_iter()
            .map(|segment| match PARAMETER_REGEX.captures(segment) {
                Some(caps) => Segment::Parameter(caps[1].to_string()),
                None => Segment::Literal(segment.to_string()),
            })
            .collect();

        Self {
            source: endpoint.to_string(),
            segments,
        }
    }

    /// Source text of the pattern
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_parametric(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Parameter(_)))
    }

    /// First literal segment that starts like a parameter but is malformed
    pub fn invalid_parameter(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Literal(literal) if literal.starts_with(PARAMETER_MARKER) => {
                Some(literal.as_str())
            }
            _ => None,
        })
    }

    /// Whether a concrete path matches the whole pattern
    pub fn matches(&self, path: &str) -> bool {
        let parts = split_path(path);
        parts.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| segment.accepts(part))
    }

    /// Whether a concrete path is a (possibly empty) leading part of the pattern
    pub fn matches_prefix(&self, path: &str) -> bool {
        let parts = split_path(path);
        parts.len() <= self.segments.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| segment.accepts(part))
    }
}

/// Split a path into its non-empty segments
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join a prefix path and a key with `/`
pub fn join_path(prefix: &str, key: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), key)
}
