use std::borrow::Cow;
use strata_derive::strata_error;

#[strata_error]
pub enum DemoError {
    /// The requested entry does not exist.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_missing() -> Result<Vec<u8>, DemoError> {
    std::fs::read("/definitely/not/here").context("Reading fixture")
}

fn main() {
    let err = read_missing().unwrap_err();
    assert_eq!(err.kind(), DemoErrorKind::Io);
    assert!(err.to_string().starts_with("IO error (Reading fixture)"));

    let err: Result<(), DemoError> =
        Err(DemoError::NotFound { message: "key".into(), context: None });
    let err = err.context("lookup").unwrap_err();
    assert_eq!(err.kind(), DemoErrorKind::NotFound);
    assert_eq!(err.to_string(), "Not found (lookup): key");

    let internal: DemoError = "boom".into();
    assert_eq!(internal.kind(), DemoErrorKind::Internal);
}
