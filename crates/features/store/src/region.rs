use crate::error::{StoreError, StoreErrorExt};
use crate::sequencer::WriteSequencer;
use std::collections::BTreeMap;
use strata_audit::{AuditRecord, AuditTrail, Change};
use strata_document::{ScalarValue, path};
use strata_domain::constants::{DEFAULT_REGION, HIERARCHY_SEPARATOR, NO_VALUE, RESERVED_NAMESPACES};
use strata_domain::model::{KeyValue, WriteOutcome};
use strata_storage::KvBackend;
use tracing::{debug, info, instrument};

/// Entry point of the layered store: hands out [`RegionStore`]s that share one backend,
/// one audit trail and one write sequencer.
#[derive(Debug, Clone)]
pub struct Store<B> {
    backend: B,
    trail: AuditTrail<B>,
    sequencer: WriteSequencer,
}

impl<B: KvBackend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { trail: AuditTrail::new(backend.clone()), backend, sequencer: WriteSequencer::new() }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    pub const fn trail(&self) -> &AuditTrail<B> {
        &self.trail
    }

    /// The view of `region` of `document`.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidInput`] for a name that is empty, spans several
    /// segments or claims a reserved namespace.
    pub fn region(&self, document: &str, region: &str) -> Result<RegionStore<B>, StoreError> {
        validate_name("document", document)?;
        validate_name("region", region)?;
        Ok(RegionStore {
            backend: self.backend.clone(),
            trail: self.trail.clone(),
            sequencer: self.sequencer.clone(),
            document: document.to_owned(),
            region: region.to_owned(),
        })
    }

    /// The view of the default region of `document`.
    ///
    /// # Errors
    /// See [`Store::region`].
    pub fn default_region(&self, document: &str) -> Result<RegionStore<B>, StoreError> {
        self.region(document, DEFAULT_REGION)
    }
}

/// One region of one document, falling back to the document's default region on reads.
///
/// Values live at `<document>/<region>/<key>`. Every committed write is preceded by an
/// audit record, and writes of one key are serialised so revisions stay dense.
#[derive(Debug, Clone)]
pub struct RegionStore<B> {
    backend: B,
    trail: AuditTrail<B>,
    sequencer: WriteSequencer,
    document: String,
    region: String,
}

impl<B: KvBackend> RegionStore<B> {
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.region == DEFAULT_REGION
    }

    fn region_prefix(&self, region: &str) -> String {
        format!("{}/{region}", self.document)
    }

    fn location(&self, region: &str, key: &str) -> String {
        path::child(&self.region_prefix(region), key)
    }

    /// The value of `key` in this region, else in the default region.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] when neither region holds the key.
    /// - [`StoreError::InvalidInput`] for a malformed key.
    pub async fn read(&self, key: &str) -> Result<String, StoreError> {
        validate_key(key)?;
        if let Some(value) = self.backend.get(&self.location(&self.region, key)).await? {
            return Ok(value);
        }
        if !self.is_default() {
            if let Some(value) = self.backend.get(&self.location(DEFAULT_REGION, key)).await? {
                return Ok(value);
            }
        }
        Err(StoreError::NotFound {
            message: key.to_owned().into(),
            context: Some(format!("{}/{}", self.document, self.region).into()),
        })
    }

    /// Every value at or below `key`, region values winning over default ones. Keys are
    /// relative to the region; the empty key covers the whole region.
    ///
    /// # Errors
    /// Returns [`StoreError::InvalidInput`] for a malformed key or [`StoreError::Storage`].
    pub async fn read_subtree(&self, key: &str) -> Result<BTreeMap<String, String>, StoreError> {
        if !key.is_empty() {
            validate_key(key)?;
        }
        let mut merged = BTreeMap::new();
        if !self.is_default() {
            self.collect(DEFAULT_REGION, key, &mut merged).await?;
        }
        self.collect(&self.region, key, &mut merged).await?;
        Ok(merged)
    }

    async fn collect(
        &self,
        region: &str,
        key: &str,
        into: &mut BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let root = self.region_prefix(region);
        let prefix = if key.is_empty() { root.clone() } else { path::child(&root, key) };
        for (stored, value) in self.backend.list_subtree(&prefix).await? {
            let relative = stored
                .strip_prefix(root.as_str())
                .and_then(|rest| rest.strip_prefix(HIERARCHY_SEPARATOR))
                .unwrap_or(stored.as_str());
            into.insert(relative.to_owned(), value);
        }
        Ok(())
    }

    /// Sets `key` to `value` in this region on behalf of `author`.
    ///
    /// Unless `force` is set, a non-default region only accepts keys that already have a
    /// default value, and a value equal to that default changes nothing. A value equal to
    /// the region's current one changes nothing either. Otherwise the change is audited and
    /// committed under the next revision of the key.
    ///
    /// # Errors
    /// - [`StoreError::InvalidInput`] for a blank key, value or author, a malformed key, or
    ///   a value that is no quoted string, boolean, null or number.
    /// - [`StoreError::KeyAbsentInDefault`] for an unforced write without a default value.
    /// - [`StoreError::Audit`] when the audit record cannot be stored.
    /// - [`StoreError::WriteFailed`] when the backend rejects the value.
    #[instrument(skip(self, value), fields(document = %self.document, region = %self.region))]
    pub async fn write(
        &self,
        key: &str,
        value: &str,
        author: &str,
        force: bool,
    ) -> Result<WriteOutcome, StoreError> {
        if key.trim().is_empty() || value.trim().is_empty() || author.trim().is_empty() {
            return Err(StoreError::invalid("key, value and author are required"));
        }
        validate_key(key)?;
        ScalarValue::decode(value).map_err(|err| StoreError::InvalidInput {
            message: err.to_string().into(),
            context: Some(format!("value of {key}").into()),
        })?;

        let target = self.location(&self.region, key);
        let _turn = self.sequencer.acquire(&target).await;

        if !force && !self.is_default() {
            match self.backend.get(&self.location(DEFAULT_REGION, key)).await? {
                None => {
                    return Err(StoreError::KeyAbsentInDefault {
                        message: key.to_owned().into(),
                        context: Some(format!("write to {}/{}", self.document, self.region).into()),
                    });
                },
                Some(default) if default == value => {
                    debug!("Value equals the default, nothing to write");
                    return Ok(WriteOutcome::Unchanged);
                },
                Some(_) => {},
            }
        }

        let current = self.backend.get(&target).await?;
        let old_value = current.as_deref().unwrap_or(NO_VALUE);
        if old_value == value {
            debug!("Value already in force, nothing to write");
            return Ok(WriteOutcome::Unchanged);
        }

        let record = self
            .trail
            .record(Change {
                document: &self.document,
                region: &self.region,
                key,
                author,
                old_value,
                new_value: value,
            })
            .await
            .context(format!("Failed to audit {target}"))?;

        self.backend.put(&target, value).await.map_err(|err| StoreError::WriteFailed {
            message: err.to_string().into(),
            context: Some(target.clone().into()),
        })?;

        debug!(revision = record.revision, "Value committed");
        Ok(WriteOutcome::Changed { revision: record.revision })
    }

    /// Writes `entries` one after another; stops at the first failure.
    ///
    /// # Errors
    /// See [`RegionStore::write`].
    pub async fn write_all<I>(&self, entries: I, author: &str, force: bool) -> Result<Vec<WriteOutcome>, StoreError>
    where
        I: IntoIterator<Item = KeyValue>,
    {
        let mut outcomes = Vec::new();
        for entry in entries {
            outcomes.push(self.write(&entry.key, &entry.value, author, force).await?);
        }
        Ok(outcomes)
    }

    /// Audit records of `key` and the keys below it in this region.
    ///
    /// # Errors
    /// Returns [`StoreError::Audit`] when the trail cannot be read.
    pub async fn history(&self, key: &str, author: Option<&str>) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.trail.query(&self.document, &self.region, key, author).await?)
    }

    /// Deletes every value and every audit record of this region. Other regions, the
    /// default one included, are untouched unless this is the default region.
    ///
    /// # Errors
    /// Returns [`StoreError::Storage`] or [`StoreError::Audit`] when the backend fails.
    #[instrument(skip(self), fields(document = %self.document, region = %self.region))]
    pub async fn destroy_region(&self) -> Result<(), StoreError> {
        self.backend
            .delete(&self.region_prefix(&self.region))
            .await
            .context("Failed to delete region values")?;
        self.trail.purge(&self.document, &self.region).await?;
        info!("Region destroyed");
        Ok(())
    }
}

/// Checks a document or region name.
///
/// # Errors
/// Returns [`StoreError::InvalidInput`] for an empty or multi-segment name, or a reserved
/// namespace.
pub fn validate_name(what: &str, name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::invalid(format!("{what} name is required")));
    }
    if name.contains([HIERARCHY_SEPARATOR, '\n']) || path::is_array_marked(name) {
        return Err(StoreError::invalid(format!("{what} name {name:?} must be a single segment")));
    }
    if RESERVED_NAMESPACES.contains(&name) {
        return Err(StoreError::invalid(format!("{what} name {name:?} is reserved")));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    path::validate(key).map_err(|err| StoreError::InvalidInput {
        message: err.to_string().into(),
        context: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert!(validate_name("region", "eu-west").is_ok());
        assert!(validate_name("region", "").is_err());
        assert!(validate_name("region", "  ").is_err());
        assert!(validate_name("region", "eu/west").is_err());
        assert!(validate_name("document", "audit").is_err());
        assert!(validate_name("document", "document").is_err());
        assert!(validate_name("document", "...1").is_err());
    }
}
