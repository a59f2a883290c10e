use std::borrow::Cow;
use strata_audit::AuditError;
use strata_document::DocumentError;
use strata_storage::StorageError;
use strata_store::StoreError;

/// Errors surfaced by the strata facade.
#[strata_derive::strata_error]
pub enum StrataError {
    #[error("Document not found{}: {message}", format_context(.context))]
    DocumentNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Document already exists{}: {message}", format_context(.context))]
    DocumentExists { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid input{}: {message}", format_context(.context))]
    InvalidInput { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Document { source: DocumentError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Store { source: StoreError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Audit { source: AuditError, context: Option<Cow<'static, str>> },

    #[error("{source}{}", format_context(.context))]
    Storage { source: StorageError, context: Option<Cow<'static, str>> },
}
