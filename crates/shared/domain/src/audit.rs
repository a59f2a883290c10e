use serde::{Deserialize, Serialize};
use std::fmt;

/// One immutable entry of the audit trail: a single value change of one key.
///
/// Records are keyed by `(document, region, key, revision)`; the revision of the first
/// change of a key is `1` and every further change adds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub document: String,
    pub author: String,
    pub region: String,
    pub key: String,
    pub old_value: String,
    pub new_value: String,
    pub revision: u64,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "document={}, author={}, region={}, key={}, oldValue={}, newValue={}, revision={}, timestamp={}",
            self.document,
            self.author,
            self.region,
            self.key,
            self.old_value,
            self.new_value,
            self.revision,
            self.timestamp
        )
    }
}
