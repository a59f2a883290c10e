use crate::error::StorageError;
use std::fmt::Debug;
use std::future::Future;

/// The CRUD contract every key/value backend fulfils.
///
/// Keys are `/`-separated hierarchies. Every `prefix` argument is hierarchical: it matches
/// the key equal to the prefix and every key below `prefix/`. The empty prefix matches
/// every key. See [`in_subtree`].
///
/// Implementations are cheap handles (`Clone`) that may be shared between tasks.
pub trait KvBackend: Clone + Send + Sync + Debug + 'static {
    /// Stores `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Lists every key in the subtree of `prefix`, in ascending byte order.
    fn list_keys(&self, prefix: &str)
    -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    /// Lists every `(key, value)` pair in the subtree of `prefix`, in ascending key order.
    fn list_subtree(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<Vec<(String, String)>, StorageError>> + Send;

    /// Deletes every key in the subtree of `prefix`. Deleting nothing is not an error.
    fn delete(&self, prefix: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// Returns `true` when `key` lies in the hierarchical subtree rooted at `prefix`.
///
/// ```rust
/// use strata_storage::in_subtree;
///
/// assert!(in_subtree("server", "server"));
/// assert!(in_subtree("server", "server/port"));
/// assert!(!in_subtree("server", "serverless"));
/// assert!(in_subtree("", "anything/at/all"));
/// ```
#[must_use]
pub fn in_subtree(prefix: &str, key: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    key.strip_prefix(prefix).is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}
