use std::borrow::Cow;
use strata_audit::AuditError;
use strata_storage::StorageError;

/// Layered store error type.
#[strata_derive::strata_error]
pub enum StoreError {
    /// A non-forced write to a non-default region for a key without a default value.
    #[error("Key absent in default region{}: {message}", format_context(.context))]
    KeyAbsentInDefault { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The backend rejected the value write.
    #[error("Write failed{}: {message}", format_context(.context))]
    WriteFailed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The key has a value neither in the region nor in the default region.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage error{}: {source}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },

    #[error("Audit error{}: {source}", format_context(.context))]
    Audit { source: AuditError, context: Option<Cow<'static, str>> },
}

impl StoreError {
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput { message: message.into(), context: None }
    }
}
