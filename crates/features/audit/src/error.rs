use std::borrow::Cow;
use strata_storage::StorageError;

/// Audit trail error type.
#[strata_derive::strata_error]
pub enum AuditError {
    /// The record cannot be stored as given, e.g. its revision is already taken.
    #[error("Audit write failed{}: {message}", format_context(.context))]
    WriteFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Audit storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Audit serialization error{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A stored entry does not decode as an audit record.
    #[error("Corrupt audit record{}: {message}", format_context(.context))]
    CorruptRecord { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
