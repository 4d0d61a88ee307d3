use std::{borrow::Cow, collections::HashMap};

use percent_encoding::percent_decode_str;

use crate::error::RouteError;

/// Suffix that turns a named parameter into a terminal multi-segment wildcard,
/// e.g. `/:pathMatch(.*)*`.
const CATCH_ALL_SUFFIX: &str = "(.*)*";

/// Segment
///
/// One `/`-separated piece of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, compared case-sensitively.
    Static(String),
    /// `:name`, binds exactly one path segment.
    Param(String),
    /// `:name(.*)*`, binds every remaining segment (possibly none).
    CatchAll(String),
}

/// PathPattern
///
/// A parsed, absolute route pattern. Children are joined onto their parent's pattern
/// before parsing, so a pattern always describes the full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// parse
    ///
    /// Parses a pattern such as `/problems/:id/submissions`. A catch-all anywhere but
    /// the last position is rejected, since nothing after it could ever match.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let parts: Vec<&str> = split_segments(raw).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (index, part) in parts.iter().enumerate() {
            let segment = parse_segment(raw, part)?;
            if matches!(segment, Segment::CatchAll(_)) && index + 1 != parts.len() {
                return Err(RouteError::MisplacedCatchAll(raw.to_string()));
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: normalize_pattern(raw),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::CatchAll(_)))
    }

    /// Names of every parameter, in the order they appear.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// matches
    ///
    /// Returns the captured parameters when `path` matches. Query string, fragment,
    /// repeated slashes and a trailing slash are ignored. Segments are percent-decoded
    /// before they are compared or captured. A segment that does not decode to UTF-8
    /// matches neither static text nor a parameter; a catch-all takes it lossily.
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let raw: Vec<&str> = split_segments(strip_query(path)).collect();
        let decoded: Vec<Option<Cow<'_, str>>> = raw
            .iter()
            .map(|part| percent_decode_str(part).decode_utf8().ok())
            .collect();
        let mut params = HashMap::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(text) => {
                    if decoded.get(index).and_then(Option::as_deref) != Some(text.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = decoded.get(index).and_then(Option::as_deref)?;
                    params.insert(name.clone(), value.to_string());
                }
                Segment::CatchAll(name) => {
                    let rest = raw.get(index..).unwrap_or_default();
                    let value = rest
                        .iter()
                        .map(|part| percent_decode_str(part).decode_utf8_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    params.insert(name.clone(), value);
                    return Some(params);
                }
            }
        }

        (raw.len() == self.segments.len()).then_some(params)
    }

    /// reverse
    ///
    /// Builds a concrete path from `params`. A catch-all without a value expands to
    /// nothing. On failure the name of the first missing parameter is returned.
    pub fn reverse(&self, params: &HashMap<String, String>) -> Result<String, String> {
        let mut parts = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Static(text) => parts.push(text.clone()),
                Segment::Param(name) => match params.get(name) {
                    Some(value) if !value.is_empty() => parts.push(value.clone()),
                    _ => return Err(name.clone()),
                },
                Segment::CatchAll(name) => {
                    if let Some(value) = params.get(name).filter(|value| !value.is_empty()) {
                        parts.push(value.trim_matches('/').to_string());
                    }
                }
            }
        }

        Ok(format!("/{}", parts.join("/")))
    }
}

/// join_paths
///
/// Joins a child route's relative path onto its parent's. An empty child path names
/// the parent location itself.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') || parent.is_empty() {
        return normalize_pattern(child);
    }
    if child.is_empty() {
        return normalize_pattern(parent);
    }
    normalize_pattern(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

/// normalize_path
///
/// Canonical form of a requested path: leading slash, no trailing slash, no empty
/// segments, no query string or fragment.
pub fn normalize_path(path: &str) -> String {
    normalize_pattern(strip_query(path))
}

fn normalize_pattern(raw: &str) -> String {
    format!("/{}", split_segments(raw).collect::<Vec<_>>().join("/"))
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

fn parse_segment(raw: &str, part: &str) -> Result<Segment, RouteError> {
    let invalid = |reason: &str| RouteError::InvalidPattern {
        pattern: raw.to_string(),
        reason: reason.to_string(),
    };

    let Some(param) = part.strip_prefix(':') else {
        if part.contains(['(', ')', '*']) {
            return Err(invalid("regex syntax is only allowed in a catch-all parameter"));
        }
        return Ok(Segment::Static(part.to_string()));
    };

    let (name, catch_all) = match param.strip_suffix(CATCH_ALL_SUFFIX) {
        Some(name) => (name, true),
        None => (param, false),
    };

    if name.is_empty() {
        return Err(invalid("parameter name is empty"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid("parameter names may only contain letters, digits and `_`"));
    }

    Ok(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Param(name.to_string())
    })
}
