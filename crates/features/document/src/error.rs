use std::borrow::Cow;

/// Errors of the key codec.
#[strata_derive::strata_error]
pub enum DocumentError {
    /// A key path breaks the grammar, or two keys disagree on the kind of one tree position.
    #[error("Malformed key set{}: {message}", format_context(.context))]
    MalformedKeySet { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `parentConfigurationFile` reference names no existing template.
    #[error("Missing template reference{}: {message}", format_context(.context))]
    MissingTemplateReference { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A `parentConfigurationFile` reference appears in a template that has no location.
    #[error("Unresolvable inheritance{}: {message}", format_context(.context))]
    UnresolvableInheritance { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A template inherits from itself, directly or transitively.
    #[error("Template inheritance cycle{}: {message}", format_context(.context))]
    InheritanceCycle { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A stored leaf value is neither a quoted string, a boolean, null nor a number.
    #[error("Invalid value{}: {message}", format_context(.context))]
    InvalidValue { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("JSON error{}: {source}", format_context(.context))]
    Json { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("YAML error{}: {source}", format_context(.context))]
    Yaml { source: serde_yaml::Error, context: Option<Cow<'static, str>> },

    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl DocumentError {
    pub(crate) fn malformed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedKeySet { message: message.into(), context: None }
    }
}
