//! Rebuilding a nested document from flat `key -> stored value` pairs.

use crate::emit::{Emitter, emitter_for};
use crate::error::{DocumentError, DocumentErrorExt};
use crate::path::{self, KeyPath};
use crate::value::ScalarValue;
use fxhash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use strata_domain::format::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object,
    Array,
    Leaf(ScalarValue),
}

impl NodeKind {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::Leaf(_) => "value",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    path: String,
    name: String,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final segment of the path; empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An ordered document tree held in an arena.
///
/// The kind of every node is fixed when the node is created: by the segment that follows it
/// in the key that reached it first, or by the leaf value at the end of that key. Children
/// keep canonical key order, so array elements appear by ordinal and gaps close up.
#[derive(Debug, Clone)]
pub struct DocumentTree {
    nodes: Vec<Node>,
    index: FxHashMap<String, NodeId>,
}

impl DocumentTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Builds the tree of `entries`, where every key is a leaf path and every value a stored
    /// scalar. When a key repeats, the last value wins. No entries give an empty object.
    ///
    /// # Errors
    /// - [`DocumentError::MalformedKeySet`] for an invalid key, a position that is an object
    ///   for one key and an array for another, or a key that is both a value and a container.
    /// - [`DocumentError::InvalidValue`] for a stored value that does not decode.
    pub fn build<I, K, V>(entries: I) -> Result<Self, DocumentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut sorted = BTreeMap::new();
        for (key, value) in entries {
            sorted.insert(KeyPath::new(key)?, value.into());
        }

        let root_kind = match sorted.keys().next().and_then(|key| key.segments().next()) {
            Some(first) if path::is_array_marked(first) => NodeKind::Array,
            _ => NodeKind::Object,
        };
        let mut tree = Self {
            nodes: vec![Node {
                path: String::new(),
                name: String::new(),
                kind: root_kind,
                parent: None,
                children: Vec::new(),
            }],
            index: FxHashMap::default(),
        };

        for (key, raw) in &sorted {
            tree.insert(key, raw)?;
        }
        Ok(tree)
    }

    fn insert(&mut self, key: &KeyPath, raw: &str) -> Result<(), DocumentError> {
        let segments: Vec<&str> = key.segments().collect();
        let mut current = Self::ROOT;
        let mut at = String::new();

        for (depth, segment) in segments.iter().enumerate() {
            self.check_child(current, segment, key)?;
            at = path::child(&at, segment);
            let next = segments.get(depth + 1);

            current = match self.index.get(&at) {
                Some(&existing) => match (next, &self.nodes[existing.0].kind) {
                    (None, kind) => {
                        return Err(DocumentError::malformed(format!(
                            "key {key} addresses an existing {}",
                            kind.describe()
                        )));
                    },
                    (Some(_), NodeKind::Leaf(_)) => {
                        return Err(DocumentError::malformed(format!(
                            "key {key} descends below the value at {at}"
                        )));
                    },
                    (Some(_), _) => existing,
                },
                None => {
                    let kind = match next {
                        None => NodeKind::Leaf(ScalarValue::decode(raw).context(format!("at key {key}"))?),
                        Some(next) if path::is_array_marked(next) => NodeKind::Array,
                        Some(_) => NodeKind::Object,
                    };
                    self.push(current, &at, segment, kind)
                },
            };
        }
        Ok(())
    }

    /// Rejects a segment that does not fit the kind of the node it would hang below.
    fn check_child(&self, parent: NodeId, segment: &str, key: &KeyPath) -> Result<(), DocumentError> {
        let node = &self.nodes[parent.0];
        let fits = match node.kind {
            NodeKind::Object => !path::is_array_marked(segment),
            NodeKind::Array => path::is_array_marked(segment),
            NodeKind::Leaf(_) => false,
        };
        if fits {
            return Ok(());
        }
        let position = if node.path.is_empty() { "the root" } else { node.path.as_str() };
        Err(DocumentError::malformed(format!(
            "key {key} puts {segment:?} below {position}, which is an {}",
            node.kind.describe()
        )))
    }

    fn push(&mut self, parent: NodeId, at: &str, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            path: at.to_owned(),
            name: name.to_owned(),
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        self.index.insert(at.to_owned(), id);
        id
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The node at `path`; the empty path is the root.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Node> {
        if path.is_empty() {
            return self.nodes.first();
        }
        self.index.get(path).and_then(|id| self.node(*id))
    }

    /// Number of nodes, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the root has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Streams the tree as `format` into `sink`.
    ///
    /// # Errors
    /// Returns [`DocumentError::Io`] when the sink fails.
    pub fn emit(&self, format: OutputFormat, sink: impl Write) -> Result<(), DocumentError> {
        let mut emitter = emitter_for(format, sink);
        self.emit_to(emitter.as_mut())
    }

    /// Drives `emitter` through a depth-first pre-order traversal, then finishes it.
    ///
    /// # Errors
    /// Returns [`DocumentError::Io`] when the emitter fails.
    pub fn emit_to(&self, emitter: &mut dyn Emitter) -> Result<(), DocumentError> {
        self.emit_node(Self::ROOT, emitter).context("Failed to emit document")?;
        emitter.finish().context("Failed to emit document")?;
        Ok(())
    }

    fn emit_node(&self, id: NodeId, emitter: &mut dyn Emitter) -> std::io::Result<()> {
        let node = &self.nodes[id.0];
        if let Some(parent) = node.parent {
            if self.nodes[parent.0].kind != NodeKind::Array {
                emitter.field(&node.name)?;
            }
        }
        match &node.kind {
            NodeKind::Leaf(value) => emitter.scalar(value),
            NodeKind::Object => {
                emitter.begin_object()?;
                for child in &node.children {
                    self.emit_node(*child, emitter)?;
                }
                emitter.end_object()
            },
            NodeKind::Array => {
                emitter.begin_array()?;
                for child in &node.children {
                    self.emit_node(*child, emitter)?;
                }
                emitter.end_array()
            },
        }
    }

    /// Renders the tree as text.
    ///
    /// # Errors
    /// See [`DocumentTree::emit`].
    pub fn render(&self, format: OutputFormat) -> Result<String, DocumentError> {
        let mut out = Vec::new();
        self.emit(format, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// The tree as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.value_of(Self::ROOT)
    }

    fn value_of(&self, id: NodeId) -> Value {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Leaf(value) => value.to_json(),
            NodeKind::Array => node.children.iter().map(|child| self.value_of(*child)).collect(),
            NodeKind::Object => Value::Object(
                node.children
                    .iter()
                    .map(|child| (self.nodes[child.0].name.clone(), self.value_of(*child)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(entries: &[(&str, &str)]) -> Result<DocumentTree, DocumentError> {
        DocumentTree::build(entries.iter().map(|(k, v)| (*k, *v)))
    }

    #[test]
    fn test_builds_typed_tree() {
        let tree = tree(&[
            ("server/port", "8080"),
            ("server/name", "\"edge\""),
            ("server/tls", "true"),
            ("server/ratio", "0.5"),
            ("server/backup", "null"),
            ("hosts/...1", "\"b\""),
            ("hosts/...0", "\"a\""),
        ])
        .unwrap();

        assert_eq!(
            tree.to_value(),
            json!({
                "hosts": ["a", "b"],
                "server": {"backup": null, "name": "edge", "port": 8080, "ratio": 0.5, "tls": true},
            })
        );
        assert_eq!(tree.find("server/port").unwrap().kind(), &NodeKind::Leaf(ScalarValue::Integer(8080)));
        assert_eq!(tree.find("hosts").unwrap().children().len(), 2);
    }

    #[test]
    fn test_array_elements_follow_numeric_order() {
        let tree = tree(&[("...10", "10"), ("...2", "2"), ("...0", "0")]).unwrap();
        assert_eq!(tree.to_value(), json!([0, 2, 10]));
    }

    #[test]
    fn test_empty_input_is_empty_object() {
        let tree = DocumentTree::build(Vec::<(String, String)>::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.render(OutputFormat::Json).unwrap(), "{}\n");
    }

    #[test]
    fn test_kind_conflicts_are_malformed() {
        let conflicts: [&[(&str, &str)]; 4] = [
            &[("a/...0", "1"), ("a/b", "2")],
            &[("a", "1"), ("a/b", "2")],
            &[("...0", "1"), ("b", "2")],
            &[("a/b/c", "1"), ("a/b/...0", "2")],
        ];
        for entries in conflicts {
            let err = tree(entries).unwrap_err();
            assert!(matches!(err, DocumentError::MalformedKeySet { .. }), "{entries:?}: {err}");
        }
    }

    #[test]
    fn test_invalid_leaf_names_key() {
        let err = tree(&[("a/b", "not a number")]).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidValue { .. }));
        assert!(err.to_string().contains("a/b"));
    }

    #[test]
    fn test_json_emission() {
        let tree = tree(&[("a/...0/x", "1"), ("a/...1", "\"two\""), ("b", "false")]).unwrap();
        let text = tree.render(OutputFormat::Json).unwrap();
        assert_eq!(
            text,
            "{\n  \"a\": [\n    {\n      \"x\": 1\n    },\n    \"two\"\n  ],\n  \"b\": false\n}\n"
        );
    }

    #[test]
    fn test_yaml_emission_parses_back() {
        let tree = tree(&[("a/...0/x", "1"), ("a/...1", "\"yes\""), ("b", "1.0"), ("c d", "null")]).unwrap();
        let text = tree.render(OutputFormat::Yaml).unwrap();
        let parsed: Value = serde_yaml::from_str(&text).unwrap();
        assert_eq!(parsed, tree.to_value());
    }
}
