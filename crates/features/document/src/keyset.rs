use crate::error::DocumentError;
use crate::path::{self, KeyPath};
use fxhash::FxHashMap;
use std::collections::BTreeSet;
use std::collections::hash_map::Entry;
use std::fmt;
use std::str::FromStr;
use strata_domain::constants::KEYSET_SEPARATOR;

/// The canonically ordered set of key paths that describes the shape of a document.
///
/// A key that stops at an intermediate node stands for the whole subtree below it. Key sets
/// are immutable once built; [`KeySet::union`] produces a new one. The children of one
/// position are either all array elements or all fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    keys: BTreeSet<KeyPath>,
}

impl KeySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a key set from raw paths, validating each one.
    ///
    /// # Errors
    /// Returns [`DocumentError::MalformedKeySet`] for the first invalid path, or when one
    /// position has both array elements and fields.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::checked(keys.into_iter().map(KeyPath::new).collect::<Result<_, _>>()?)
    }

    /// Parses the newline separated form written by [`KeySet::serialize`]. Blank lines are
    /// skipped.
    ///
    /// # Errors
    /// Returns [`DocumentError::MalformedKeySet`] for the first invalid line, or when one
    /// position has both array elements and fields.
    pub fn parse(serialized: &str) -> Result<Self, DocumentError> {
        let keys = serialized
            .split(KEYSET_SEPARATOR)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.trim().is_empty())
            .map(KeyPath::new)
            .collect::<Result<_, _>>()?;
        Self::checked(keys)
    }

    /// Wraps `keys` after checking that no position is both an array and an object.
    pub(crate) fn checked(keys: BTreeSet<KeyPath>) -> Result<Self, DocumentError> {
        let mut positions: FxHashMap<&str, bool> = FxHashMap::default();
        for key in &keys {
            let at = path::parent(key.as_str()).unwrap_or("");
            let element = path::is_array_marked(path::last_segment(key.as_str()));
            match positions.entry(at) {
                Entry::Occupied(seen) if *seen.get() != element => {
                    return Err(DocumentError::malformed(format!(
                        "{at:?} has both array elements and fields (at key {key})"
                    )));
                },
                Entry::Occupied(_) => {},
                Entry::Vacant(slot) => {
                    slot.insert(element);
                },
            }
        }
        drop(positions);
        Ok(Self { keys })
    }

    /// One canonical key per line, each followed by a line break.
    #[must_use]
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Keys of both sets; `self` is left untouched.
    ///
    /// # Errors
    /// Returns [`DocumentError::MalformedKeySet`] when one set has array elements where the
    /// other has fields.
    pub fn union(&self, other: &Self) -> Result<Self, DocumentError> {
        Self::checked(self.keys.union(&other.keys).cloned().collect())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&KeyPath::from_trusted(key.to_owned()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyPath> {
        self.keys.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<'a> IntoIterator for &'a KeySet {
    type Item = &'a KeyPath;
    type IntoIter = std::collections::btree_set::Iter<'a, KeyPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

impl IntoIterator for KeySet {
    type Item = KeyPath;
    type IntoIter = std::collections::btree_set::IntoIter<KeyPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.into_iter()
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            write!(f, "{key}{KEYSET_SEPARATOR}")?;
        }
        Ok(())
    }
}

impl FromStr for KeySet {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_form_is_canonical() {
        let keys = KeySet::from_keys(["a/bb", "a/b/c", "a/b", "list/...10", "list/...2"]).unwrap();
        assert_eq!(keys.serialize(), "a/b\na/b/c\na/bb\nlist/...2\nlist/...10\n");
        assert_eq!(KeySet::parse(&keys.serialize()).unwrap(), keys);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let keys = KeySet::parse("\nserver/port\r\n\n  \nserver/host\n").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("server/port"));
        assert!(keys.contains("server/host"));
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        let err = KeySet::parse("server//port\n").unwrap_err();
        assert!(matches!(err, DocumentError::MalformedKeySet { .. }));
    }

    #[test]
    fn test_union_is_new_set() {
        let own = KeySet::from_keys(["a", "b"]).unwrap();
        let parent = KeySet::from_keys(["b", "c"]).unwrap();
        let merged = own.union(&parent).unwrap();

        assert_eq!(merged.iter().map(KeyPath::as_str).collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(own.len(), 2);
    }

    #[test]
    fn test_array_and_object_at_one_position() {
        for serialized in ["a/...0\na/b\n", "...0\nname\n", "x/y/...1\nx/y/z/w\nx/y/z\nx/y/q\n"] {
            let err = KeySet::parse(serialized).unwrap_err();
            assert!(matches!(err, DocumentError::MalformedKeySet { .. }), "{serialized:?}");
        }
        assert!(KeySet::from_keys(["list/...0", "list/...1/name", "list/...1/port"]).is_ok());

        let elements = KeySet::from_keys(["hosts/...0"]).unwrap();
        let fields = KeySet::from_keys(["hosts", "hosts/a"]).unwrap();
        assert!(matches!(elements.union(&fields), Err(DocumentError::MalformedKeySet { .. })));
    }
}
