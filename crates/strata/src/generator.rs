use crate::error::{StrataError, StrataErrorExt};
use std::collections::BTreeMap;
use std::io::Write;
use strata_document::{DocumentTree, KeySet};
use strata_domain::format::OutputFormat;
use strata_storage::{KvBackend, in_subtree};
use strata_store::Store;
use tracing::debug;

/// Renders the configuration of one region of a document.
#[derive(Debug, Clone)]
pub struct ConfigGenerator<B> {
    store: Store<B>,
}

impl<B: KvBackend> ConfigGenerator<B> {
    pub const fn new(store: Store<B>) -> Self {
        Self { store }
    }

    /// Collects the values of `keys` as seen from `region` of `document`.
    ///
    /// A key that stops at an intermediate node brings its whole subtree. Region values win
    /// over default ones.
    ///
    /// # Errors
    /// Returns [`StrataError::Store`] when the store cannot be read.
    pub async fn collect(
        &self,
        document: &str,
        region: &str,
        keys: &KeySet,
    ) -> Result<BTreeMap<String, String>, StrataError> {
        let view = self.store.region(document, region)?;
        let mut values = BTreeMap::new();
        let mut covered: Option<&str> = None;

        // Canonical order puts every key right after its ancestors.
        for key in keys {
            if covered.is_some_and(|root| in_subtree(root, key.as_str())) {
                continue;
            }
            values.extend(view.read_subtree(key.as_str()).await?);
            covered = Some(key.as_str());
        }
        debug!(document, region, values = values.len(), "Values collected");
        Ok(values)
    }

    /// Streams the configuration of `region` of `document`, shaped by `keys`, as `format`.
    ///
    /// # Errors
    /// - [`StrataError::Store`] when the store cannot be read.
    /// - [`StrataError::Document`] when the stored values do not form a tree or the sink fails.
    pub async fn generate(
        &self,
        document: &str,
        region: &str,
        keys: &KeySet,
        format: OutputFormat,
        sink: impl Write,
    ) -> Result<(), StrataError> {
        let values = self.collect(document, region, keys).await?;
        let tree = DocumentTree::build(values).context(format!("Failed to rebuild {document}/{region}"))?;
        tree.emit(format, sink)?;
        Ok(())
    }
}
