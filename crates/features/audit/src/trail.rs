use crate::error::{AuditError, AuditErrorExt};
use chrono::Utc;
use std::cmp::Ordering;
use strata_document::path;
use strata_domain::audit::AuditRecord;
use strata_domain::constants::{AUDIT_REGION, HIERARCHY_SEPARATOR};
use strata_storage::KvBackend;
use tracing::{debug, warn};

/// A value change about to be recorded. Revision and timestamp are assigned on recording.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    pub document: &'a str,
    pub region: &'a str,
    pub key: &'a str,
    pub author: &'a str,
    pub old_value: &'a str,
    pub new_value: &'a str,
}

/// Storage prefix of the audit records of `key`; an empty `key` covers the whole region.
#[must_use]
pub fn audit_prefix(document: &str, region: &str, key: &str) -> String {
    let region_prefix = format!("{AUDIT_REGION}/{document}/{region}");
    if key.is_empty() { region_prefix } else { path::child(&region_prefix, key) }
}

/// Append-only history of value changes, kept in the `audit` namespace of a backend.
///
/// The record of revision `n` of a key lives at `audit/<document>/<region>/<key>/<n>` as
/// camelCase JSON. Records are never rewritten; only [`AuditTrail::purge`] removes them.
#[derive(Debug, Clone)]
pub struct AuditTrail<B> {
    backend: B,
}

impl<B: KvBackend> AuditTrail<B> {
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The revision the next change of `key` gets: one more than the highest revision among
    /// the direct children of the key's audit prefix, or 1 for a key without history.
    ///
    /// # Errors
    /// Returns [`AuditError::Storage`] when the backend cannot be listed.
    pub async fn next_revision(&self, document: &str, region: &str, key: &str) -> Result<u64, AuditError> {
        let prefix = audit_prefix(document, region, key);
        let latest = self
            .backend
            .list_keys(&prefix)
            .await
            .context("Failed to list audit revisions")?
            .iter()
            .filter_map(|stored| revision_below(&prefix, stored))
            .max()
            .unwrap_or(0);
        Ok(latest + 1)
    }

    /// Stores `record` under its revision.
    ///
    /// # Errors
    /// - [`AuditError::WriteFailed`] for revision 0 or a revision that is already recorded.
    /// - [`AuditError::Serialization`] or [`AuditError::Storage`] otherwise.
    pub async fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        if record.revision == 0 {
            return Err(AuditError::WriteFailed {
                message: "revisions start at 1".into(),
                context: Some(record.key.clone().into()),
            });
        }
        let location = path::child(
            &audit_prefix(&record.document, &record.region, &record.key),
            &record.revision.to_string(),
        );
        if self.backend.get(&location).await.context("Failed to check audit slot")?.is_some() {
            return Err(AuditError::WriteFailed {
                message: format!("revision {} of {} is already recorded", record.revision, record.key).into(),
                context: Some(location.into()),
            });
        }

        let json = serde_json::to_string(record).context("Failed to encode audit record")?;
        self.backend.put(&location, &json).await.context("Failed to store audit record")?;
        debug!(%location, author = %record.author, "Audit record appended");
        Ok(())
    }

    /// Assigns the next revision and the current time to `change` and appends it.
    ///
    /// Callers serialise changes of one key; two concurrent calls for the same key would
    /// compete for the same revision and one of them fails with [`AuditError::WriteFailed`].
    ///
    /// # Errors
    /// See [`AuditTrail::next_revision`] and [`AuditTrail::append`].
    pub async fn record(&self, change: Change<'_>) -> Result<AuditRecord, AuditError> {
        let revision = self.next_revision(change.document, change.region, change.key).await?;
        let record = AuditRecord {
            document: change.document.to_owned(),
            author: change.author.to_owned(),
            region: change.region.to_owned(),
            key: change.key.to_owned(),
            old_value: change.old_value.to_owned(),
            new_value: change.new_value.to_owned(),
            revision,
            timestamp: Utc::now().timestamp_millis(),
        };
        self.append(&record).await?;
        Ok(record)
    }

    /// One recorded revision of `key`.
    ///
    /// # Errors
    /// Returns [`AuditError::CorruptRecord`] when the stored entry does not decode.
    pub async fn get(
        &self,
        document: &str,
        region: &str,
        key: &str,
        revision: u64,
    ) -> Result<Option<AuditRecord>, AuditError> {
        let location = path::child(&audit_prefix(document, region, key), &revision.to_string());
        let Some(json) = self.backend.get(&location).await.context("Failed to read audit record")? else {
            return Ok(None);
        };
        serde_json::from_str(&json).map(Some).map_err(|err| AuditError::CorruptRecord {
            message: err.to_string().into(),
            context: Some(location.into()),
        })
    }

    /// Every record stored at or beneath `key`, ordered by key and then revision.
    ///
    /// `author` keeps only the records of that author, ignoring case. Entries that do not
    /// decode are logged and skipped.
    ///
    /// # Errors
    /// Returns [`AuditError::Storage`] when the backend cannot be listed.
    pub async fn query(
        &self,
        document: &str,
        region: &str,
        key: &str,
        author: Option<&str>,
    ) -> Result<Vec<AuditRecord>, AuditError> {
        let prefix = audit_prefix(document, region, key);
        let author = author.map(str::to_lowercase);

        let mut records: Vec<AuditRecord> = self
            .backend
            .list_subtree(&prefix)
            .await
            .context("Failed to list audit records")?
            .into_iter()
            .filter_map(|(location, json)| match serde_json::from_str::<AuditRecord>(&json) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(%location, error = %err, "Skipping corrupt audit record");
                    None
                },
            })
            .filter(|record| author.as_deref().is_none_or(|wanted| record.author.to_lowercase() == wanted))
            .collect();

        records.sort_by(|a, b| match path::compare(&a.key, &b.key) {
            Ordering::Equal => a.revision.cmp(&b.revision),
            other => other,
        });
        Ok(records)
    }

    /// Removes the whole history of `(document, region)`.
    ///
    /// # Errors
    /// Returns [`AuditError::Storage`] when the backend fails.
    pub async fn purge(&self, document: &str, region: &str) -> Result<(), AuditError> {
        let prefix = audit_prefix(document, region, "");
        self.backend.delete(&prefix).await.context("Failed to purge audit records")?;
        debug!(%prefix, "Audit history purged");
        Ok(())
    }
}

/// The revision of a stored entry that is a direct child of `prefix`.
fn revision_below(prefix: &str, stored: &str) -> Option<u64> {
    let rest = stored.strip_prefix(prefix)?.strip_prefix(HIERARCHY_SEPARATOR)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}
