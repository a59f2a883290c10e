//! Hierarchical key codec.
//!
//! Converts between nested JSON/YAML documents and canonical flat key sets:
//!
//! 1.  **[`path`]**: the key path grammar and the canonical comparator ([`KeyPath`]).
//! 2.  **[`flatten()`]**: a [`Template`] becomes a [`KeySet`]; `parentConfigurationFile`
//!     references are resolved through a [`TemplateResolver`] and unioned in.
//! 3.  **[`DocumentTree`]**: flat `key -> stored value` pairs become an ordered tree again,
//!     emitted as JSON or YAML in one streaming traversal.
//!
//! # Examples
//!
//! ```rust
//! use strata_document::{DocumentTree, FsTemplateResolver, Template, flatten, leaf_values};
//! use strata_domain::format::OutputFormat;
//!
//! let template = Template::parse("server:\n  port: 8080\n  hosts: [a, b]\n", OutputFormat::Yaml)?;
//!
//! let keys = flatten(&template, &FsTemplateResolver)?;
//! assert_eq!(keys.serialize(), "server\nserver/hosts/...0\nserver/hosts/...1\nserver/port\n");
//!
//! let values = leaf_values(template.root())?;
//! let tree = DocumentTree::build(values.into_iter().map(|(k, v)| (k.into_string(), v)))?;
//! assert_eq!(&tree.to_value(), template.root());
//! # Ok::<(), strata_document::DocumentError>(())
//! ```

mod emit;
mod error;
mod flatten;
mod keyset;
pub mod path;
mod template;
mod tree;
mod value;

pub use crate::emit::{Emitter, JsonEmitter, YamlEmitter, emitter_for};
pub use crate::error::{DocumentError, DocumentErrorExt, DocumentErrorKind};
pub use crate::flatten::{FsTemplateResolver, TemplateResolver, flatten, leaf_values};
pub use crate::keyset::KeySet;
pub use crate::path::KeyPath;
pub use crate::template::Template;
pub use crate::tree::{DocumentTree, Node, NodeId, NodeKind};
pub use crate::value::ScalarValue;
