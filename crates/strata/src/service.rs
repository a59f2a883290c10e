use crate::error::{StrataError, StrataErrorExt};
use crate::generator::ConfigGenerator;
use crate::registry::DocumentRegistry;
use std::io::Write;
use strata_audit::AuditRecord;
use strata_document::{KeySet, Template, leaf_values};
use strata_domain::config::StrataConfig;
use strata_domain::format::OutputFormat;
use strata_domain::model::{KeyValue, WriteOutcome};
use strata_kernel::bootstrap::connect_backend;
use strata_storage::{AnyBackend, KvBackend};
use strata_store::{RegionStore, Store, StoreError};
use tracing::info;

/// One handle over a backend: documents, regions, history and generation.
#[derive(Debug, Clone)]
pub struct Strata<B> {
    backend: B,
    store: Store<B>,
    registry: DocumentRegistry<B>,
    generator: ConfigGenerator<B>,
}

impl Strata<AnyBackend> {
    /// Opens the backend named by the `storage` section of `config`.
    ///
    /// # Errors
    /// Returns [`StrataError::Storage`] when the backend cannot be opened.
    pub async fn connect(config: &StrataConfig) -> Result<Self, StrataError> {
        let backend = connect_backend(&config.storage).await.context("Failed to open backend")?;
        Ok(Self::new(backend))
    }
}

impl<B: KvBackend> Strata<B> {
    pub fn new(backend: B) -> Self {
        let store = Store::new(backend.clone());
        Self {
            registry: DocumentRegistry::new(backend.clone()),
            generator: ConfigGenerator::new(store.clone()),
            store,
            backend,
        }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn documents(&self) -> &DocumentRegistry<B> {
        &self.registry
    }

    pub const fn generator(&self) -> &ConfigGenerator<B> {
        &self.generator
    }

    /// The view of `region` of `document`.
    ///
    /// # Errors
    /// Returns [`StrataError::Store`] for an unusable name.
    pub fn region(&self, document: &str, region: &str) -> Result<RegionStore<B>, StrataError> {
        Ok(self.store.region(document, region)?)
    }

    /// Registers `template` as `name` and seeds the default region with its own values.
    ///
    /// Values already present in the default region are left as they are.
    ///
    /// # Errors
    /// See [`DocumentRegistry::create`] and [`RegionStore::write`].
    pub async fn import(
        &self,
        name: &str,
        template: &Template,
        author: &str,
    ) -> Result<(KeySet, Vec<WriteOutcome>), StrataError> {
        let keys = self.registry.create(name, template).await?;
        let default = self.store.default_region(name)?;

        let mut seeds = Vec::new();
        for (key, value) in leaf_values(template.root())? {
            match default.read(key.as_str()).await {
                Ok(_) => {},
                Err(StoreError::NotFound { .. }) => seeds.push(KeyValue::new(key.into_string(), value)),
                Err(err) => return Err(err.into()),
            }
        }
        let outcomes = default.write_all(seeds, author, false).await?;
        info!(document = name, seeded = outcomes.len(), "Document imported");
        Ok((keys, outcomes))
    }

    /// Renders the configuration of `region` of the registered document `name`.
    ///
    /// # Errors
    /// [`StrataError::DocumentNotFound`] for an unknown document, otherwise see
    /// [`ConfigGenerator::generate`].
    pub async fn generate(
        &self,
        name: &str,
        region: &str,
        format: OutputFormat,
        sink: impl Write,
    ) -> Result<(), StrataError> {
        let keys = self.registry.get(name).await?;
        self.generator.generate(name, region, &keys, format, sink).await
    }

    /// Audit records at or below `key` in `region` of `document`.
    ///
    /// # Errors
    /// Returns [`StrataError::Store`] when the history cannot be read.
    pub async fn history(
        &self,
        document: &str,
        region: &str,
        key: &str,
        author: Option<&str>,
    ) -> Result<Vec<AuditRecord>, StrataError> {
        Ok(self.region(document, region)?.history(key, author).await?)
    }
}
