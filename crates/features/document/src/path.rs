//! Key path grammar and the canonical comparator.
//!
//! A key path is a non-empty list of segments joined by `/`. A segment starting with `...`
//! addresses an array element (`...0`, `...1`, ...); any other segment is an object field.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use strata_domain::constants::{ARRAY_PREFIX, HIERARCHY_SEPARATOR, KEYSET_SEPARATOR};

pub fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split(HIERARCHY_SEPARATOR)
}

pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for segment in segments {
        if !out.is_empty() {
            out.push(HIERARCHY_SEPARATOR);
        }
        out.push_str(segment.as_ref());
    }
    out
}

/// Appends `segment` to `path`; an empty `path` is the root.
#[must_use]
pub fn child(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_owned()
    } else {
        format!("{path}{HIERARCHY_SEPARATOR}{segment}")
    }
}

#[must_use]
pub fn is_array_marked(segment: &str) -> bool {
    segment.starts_with(ARRAY_PREFIX)
}

#[must_use]
pub fn array_segment(ordinal: usize) -> String {
    format!("{ARRAY_PREFIX}{ordinal}")
}

/// The element index of an array-marked segment: `...12` gives `Some(12)`.
#[must_use]
pub fn ordinal(segment: &str) -> Option<u64> {
    let digits = segment.strip_prefix(ARRAY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[must_use]
pub fn parent(path: &str) -> Option<&str> {
    path.rsplit_once(HIERARCHY_SEPARATOR).map(|(parent, _)| parent)
}

#[must_use]
pub fn last_segment(path: &str) -> &str {
    path.rsplit_once(HIERARCHY_SEPARATOR).map_or(path, |(_, last)| last)
}

/// Checks a key path against the grammar.
///
/// # Errors
/// Returns [`DocumentError::MalformedKeySet`] for an empty path, an empty segment, a line
/// break, or an array-marked segment without a decimal ordinal.
pub fn validate(path: &str) -> Result<(), DocumentError> {
    if path.is_empty() {
        return Err(DocumentError::malformed("empty key path"));
    }
    if path.contains(KEYSET_SEPARATOR) {
        return Err(DocumentError::malformed(format!("line break in key path {path:?}")));
    }
    for segment in split(path) {
        if segment.is_empty() {
            return Err(DocumentError::malformed(format!("empty segment in key path {path:?}")));
        }
        if is_array_marked(segment) && ordinal(segment).is_none() {
            return Err(DocumentError::malformed(format!(
                "array segment {segment:?} without ordinal in {path:?}"
            )));
        }
    }
    Ok(())
}

/// Checks that a document field name can be used as a segment.
pub(crate) fn validate_field_name(name: &str) -> Result<(), DocumentError> {
    if name.is_empty() || name.contains([HIERARCHY_SEPARATOR, KEYSET_SEPARATOR]) {
        return Err(DocumentError::malformed(format!("field name {name:?} cannot be a key segment")));
    }
    if is_array_marked(name) {
        return Err(DocumentError::malformed(format!(
            "field name {name:?} starts with the array marker"
        )));
    }
    Ok(())
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    if is_array_marked(a) && is_array_marked(b) {
        if let (Some(x), Some(y)) = (ordinal(a), ordinal(b)) {
            // `...01` and `...1` tie numerically; the string order keeps the order total.
            return x.cmp(&y).then_with(|| a.cmp(b));
        }
    }
    a.cmp(b)
}

/// Document order of two key paths.
///
/// Segments are compared left to right; array ordinals numerically, everything else as
/// strings. A strict prefix sorts before its extensions, so `a/b < a/b/c < a/bb` and
/// `x/...2 < x/...10`.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    let mut left = split(a);
    let mut right = split(b);
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match compare_segments(x, y) {
                Ordering::Equal => {},
                other => return other,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// A validated key path ordered by [`compare`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyPath(String);

impl KeyPath {
    /// # Errors
    /// See [`validate`].
    pub fn new(path: impl Into<String>) -> Result<Self, DocumentError> {
        let path = path.into();
        validate(&path)?;
        Ok(Self(path))
    }

    /// Wraps a path built from already validated segments.
    pub(crate) const fn from_trusted(path: String) -> Self {
        Self(path)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        split(&self.0)
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Ord for KeyPath {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(&self.0, &other.0)
    }
}

impl PartialOrd for KeyPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = DocumentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for KeyPath {
    type Error = DocumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyPath> for String {
    fn from(path: KeyPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let mut keys = vec!["a/bb", "a/b/c", "a/b"];
        keys.sort_by(|a, b| compare(a, b));
        assert_eq!(keys, vec!["a/b", "a/b/c", "a/bb"]);
    }

    #[test]
    fn test_ordinals_compare_numerically() {
        assert_eq!(compare("x/...2", "x/...10"), Ordering::Less);
        assert_eq!(compare("x/...10/a", "x/...9/z"), Ordering::Greater);
        assert_eq!(compare("x/...1", "x/...01"), Ordering::Greater);
        assert_eq!(compare("x/...1", "x/...1"), Ordering::Equal);
    }

    #[test]
    fn test_segment_helpers() {
        assert_eq!(join(["a", "...0", "b"]), "a/...0/b");
        assert_eq!(split("a/...0/b").collect::<Vec<_>>(), vec!["a", "...0", "b"]);
        assert_eq!(child("", "a"), "a");
        assert_eq!(child("a", "b"), "a/b");
        assert_eq!(parent("a/b/c"), Some("a/b"));
        assert_eq!(parent("a"), None);
        assert_eq!(last_segment("a/b/c"), "c");
        assert_eq!(last_segment("a"), "a");
        assert_eq!(array_segment(7), "...7");
        assert_eq!(ordinal("...7"), Some(7));
        assert_eq!(ordinal("...+7"), None);
        assert_eq!(ordinal("..."), None);
        assert_eq!(ordinal("7"), None);
        assert!(is_array_marked("...3"));
        assert!(!is_array_marked("..3"));
    }

    #[test]
    fn test_validate() {
        assert!(validate("a/...0/b").is_ok());
        assert!(validate("").is_err());
        assert!(validate("a//b").is_err());
        assert!(validate("/a").is_err());
        assert!(validate("a/").is_err());
        assert!(validate("a\nb").is_err());
        assert!(validate("a/...x").is_err());
    }

    #[test]
    fn test_key_path_deserialization_validates() {
        let key: KeyPath = serde_json::from_str("\"a/...0\"").unwrap();
        assert_eq!(key.as_str(), "a/...0");
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a/...0\"");
        assert!(serde_json::from_str::<KeyPath>("\"a//b\"").is_err());
    }

    #[test]
    fn test_field_names() {
        assert!(validate_field_name("server").is_ok());
        assert!(validate_field_name("").is_err());
        assert!(validate_field_name("a/b").is_err());
        assert!(validate_field_name("...0").is_err());
    }
}
