//! Template flattening: nested document to canonical [`KeySet`].
//!
//! Every object field path and every array element path (`<field>/...<n>`) is recorded;
//! the root itself and array containers are not, since their element keys imply them. A
//! `parentConfigurationFile` field pulls in the complete key set of the named template.

use crate::error::DocumentError;
use crate::keyset::KeySet;
use crate::path::{self, KeyPath};
use crate::template::Template;
use crate::value::ScalarValue;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strata_domain::constants::PARENT_CONFIG_FIELD;
use tracing::debug;

/// Locates and loads the template named by a `parentConfigurationFile` reference.
pub trait TemplateResolver {
    /// Resolves `reference` as seen from the template stored at `base`.
    ///
    /// # Errors
    /// Returns [`DocumentError::MissingTemplateReference`] when nothing matches, or the
    /// error of loading the matched template.
    fn resolve(&self, base: &Path, reference: &str) -> Result<Template, DocumentError>;
}

/// Looks next to the referencing template first, then next to its directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTemplateResolver;

impl FsTemplateResolver {
    fn candidates(base: &Path, reference: &str) -> Vec<PathBuf> {
        let dir = base.parent();
        [dir, dir.and_then(Path::parent)]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(reference))
            .collect()
    }
}

impl TemplateResolver for FsTemplateResolver {
    fn resolve(&self, base: &Path, reference: &str) -> Result<Template, DocumentError> {
        let found = Self::candidates(base, reference).into_iter().find(|candidate| candidate.is_file());
        match found {
            Some(path) => {
                debug!(reference, path = %path.display(), "Resolved parent template");
                Template::from_path(path)
            },
            None => Err(DocumentError::MissingTemplateReference {
                message: reference.to_owned().into(),
                context: Some(format!("referenced from {}", base.display()).into()),
            }),
        }
    }
}

/// Flattens `template` into its key set, resolving inheritance through `resolver`.
///
/// # Errors
/// - [`DocumentError::MalformedKeySet`] for a scalar root, a field name that cannot be a
///   key segment, or a parent that has array elements where the child has fields.
/// - [`DocumentError::UnresolvableInheritance`] when a template without location inherits.
/// - [`DocumentError::MissingTemplateReference`] when the parent cannot be found.
/// - [`DocumentError::InheritanceCycle`] when a template inherits from itself.
pub fn flatten(template: &Template, resolver: &impl TemplateResolver) -> Result<KeySet, DocumentError> {
    Flattener { resolver, chain: Vec::new() }.flatten(template)
}

struct Flattener<'r, R> {
    resolver: &'r R,
    /// Locations of the templates currently being flattened, outermost first.
    chain: Vec<PathBuf>,
}

impl<R: TemplateResolver> Flattener<'_, R> {
    fn flatten(&mut self, template: &Template) -> Result<KeySet, DocumentError> {
        let root = template.root();
        if !root.is_object() && !root.is_array() {
            return Err(DocumentError::malformed("document root must be an object or an array"));
        }

        if let Some(location) = template.location() {
            let identity = location.canonicalize().unwrap_or_else(|_| location.to_path_buf());
            if self.chain.contains(&identity) {
                return Err(DocumentError::InheritanceCycle {
                    message: identity.display().to_string().into(),
                    context: None,
                });
            }
            self.chain.push(identity);
        }

        let mut own = Vec::new();
        let mut parents = Vec::new();
        let visited = self.visit(root, "", template.location(), &mut own, &mut parents);

        if template.location().is_some() {
            self.chain.pop();
        }
        visited?;

        let keys = KeySet::checked(own.into_iter().collect())?;
        parents.iter().try_fold(keys, |acc, parent| acc.union(parent))
    }

    fn visit(
        &mut self,
        value: &Value,
        at: &str,
        location: Option<&Path>,
        own: &mut Vec<KeyPath>,
        parents: &mut Vec<KeySet>,
    ) -> Result<(), DocumentError> {
        match value {
            Value::Object(fields) => {
                for (name, child) in fields {
                    if name == PARENT_CONFIG_FIELD {
                        if let Value::String(reference) = child {
                            parents.push(self.inherit(location, reference)?);
                            continue;
                        }
                    }
                    path::validate_field_name(name)?;
                    let child_path = path::child(at, name);
                    if !child.is_array() {
                        own.push(KeyPath::from_trusted(child_path.clone()));
                    }
                    self.visit(child, &child_path, location, own, parents)?;
                }
            },
            Value::Array(items) => {
                for (n, item) in items.iter().enumerate() {
                    let item_path = path::child(at, &path::array_segment(n));
                    own.push(KeyPath::from_trusted(item_path.clone()));
                    self.visit(item, &item_path, location, own, parents)?;
                }
            },
            _ => {},
        }
        Ok(())
    }

    fn inherit(&mut self, location: Option<&Path>, reference: &str) -> Result<KeySet, DocumentError> {
        let Some(base) = location else {
            return Err(DocumentError::UnresolvableInheritance {
                message: reference.to_owned().into(),
                context: Some("template has no location to resolve against".into()),
            });
        };
        let parent = self.resolver.resolve(base, reference)?;
        self.flatten(&parent)
    }
}

/// The type-tagged leaf values of a document, ready to seed a region.
///
/// Strings are stored quoted; the inheritance field is not a value and inherited templates
/// contribute nothing here.
///
/// # Errors
/// Returns [`DocumentError::MalformedKeySet`] when a field name cannot be a key segment.
pub fn leaf_values(value: &Value) -> Result<BTreeMap<KeyPath, String>, DocumentError> {
    let mut out = BTreeMap::new();
    collect_leaves(value, "", &mut out)?;
    Ok(out)
}

fn collect_leaves(
    value: &Value,
    at: &str,
    out: &mut BTreeMap<KeyPath, String>,
) -> Result<(), DocumentError> {
    match value {
        Value::Object(fields) => {
            for (name, child) in fields {
                if name == PARENT_CONFIG_FIELD && child.is_string() {
                    continue;
                }
                path::validate_field_name(name)?;
                collect_leaves(child, &path::child(at, name), out)?;
            }
        },
        Value::Array(items) => {
            for (n, item) in items.iter().enumerate() {
                collect_leaves(item, &path::child(at, &path::array_segment(n)), out)?;
            }
        },
        scalar => {
            if let Some(leaf) = ScalarValue::from_json(scalar) {
                if !at.is_empty() {
                    out.insert(KeyPath::from_trusted(at.to_owned()), leaf.encode());
                }
            }
        },
    }
    Ok(())
}
