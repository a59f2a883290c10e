use crate::error::{StrataError, StrataErrorExt};
use std::io::Read;
use std::path::Path;
use strata_document::{FsTemplateResolver, KeySet, Template, TemplateResolver, flatten};
use strata_domain::constants::{DOCUMENT_REGION, HIERARCHY_SEPARATOR};
use strata_domain::format::OutputFormat;
use strata_storage::KvBackend;
use strata_store::validate_name;
use tracing::info;

/// Named documents: the serialized key set of each lives at `document/<name>`.
///
/// A document is created once; later template changes are published under a new name.
#[derive(Debug, Clone)]
pub struct DocumentRegistry<B> {
    backend: B,
}

impl<B: KvBackend> DocumentRegistry<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    fn location(name: &str) -> String {
        format!("{DOCUMENT_REGION}{HIERARCHY_SEPARATOR}{name}")
    }

    /// Registers the key set of `template` as `name`, resolving inheritance with `resolver`.
    ///
    /// # Errors
    /// - [`StrataError::InvalidInput`] for an unusable name.
    /// - [`StrataError::DocumentExists`] when `name` is taken.
    /// - [`StrataError::Document`] when the template does not flatten.
    pub async fn create_with(
        &self,
        name: &str,
        template: &Template,
        resolver: &impl TemplateResolver,
    ) -> Result<KeySet, StrataError> {
        validate_name("document", name).map_err(|err| StrataError::InvalidInput {
            message: err.to_string().into(),
            context: None,
        })?;
        let location = Self::location(name);
        if self.backend.get(&location).await?.is_some() {
            return Err(StrataError::DocumentExists { message: name.to_owned().into(), context: None });
        }

        let keys = flatten(template, resolver).context(format!("Failed to flatten document {name}"))?;
        self.backend.put(&location, &keys.serialize()).await?;
        info!(document = name, keys = keys.len(), "Document created");
        Ok(keys)
    }

    /// Registers `template`, resolving inheritance on the filesystem.
    ///
    /// # Errors
    /// See [`DocumentRegistry::create_with`].
    pub async fn create(&self, name: &str, template: &Template) -> Result<KeySet, StrataError> {
        self.create_with(name, template, &FsTemplateResolver).await
    }

    /// Registers the template read from `reader`. Such a template has no location and
    /// cannot inherit.
    ///
    /// # Errors
    /// [`StrataError::InvalidInput`] for an empty stream, otherwise see
    /// [`DocumentRegistry::create_with`].
    pub async fn create_from_reader(
        &self,
        name: &str,
        mut reader: impl Read,
        format: OutputFormat,
    ) -> Result<KeySet, StrataError> {
        let mut text = String::new();
        reader
            .read_to_string(&mut text)
            .map_err(strata_document::DocumentError::from)
            .context("Failed to read template")?;
        if text.trim().is_empty() {
            return Err(StrataError::InvalidInput { message: "template is empty".into(), context: None });
        }
        let template = Template::parse(&text, format)?;
        self.create(name, &template).await
    }

    /// Registers the template file at `path`.
    ///
    /// # Errors
    /// See [`DocumentRegistry::create_with`].
    pub async fn create_from_path(&self, name: &str, path: impl AsRef<Path>) -> Result<KeySet, StrataError> {
        let template = Template::from_path(path)?;
        self.create(name, &template).await
    }

    /// The key set registered as `name`.
    ///
    /// # Errors
    /// Returns [`StrataError::DocumentNotFound`] for an unknown name.
    pub async fn get(&self, name: &str) -> Result<KeySet, StrataError> {
        let Some(serialized) = self.backend.get(&Self::location(name)).await? else {
            return Err(StrataError::DocumentNotFound { message: name.to_owned().into(), context: None });
        };
        KeySet::parse(&serialized).context(format!("Stored document {name} is malformed"))
    }

    /// Names of all registered documents.
    ///
    /// # Errors
    /// Returns [`StrataError::Storage`] when the backend cannot be listed.
    pub async fn list(&self) -> Result<Vec<String>, StrataError> {
        let prefix = format!("{DOCUMENT_REGION}{HIERARCHY_SEPARATOR}");
        let names = self
            .backend
            .list_keys(DOCUMENT_REGION)
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_owned))
            .collect();
        Ok(names)
    }
}
