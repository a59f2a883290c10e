use crate::error::{DocumentError, DocumentErrorExt};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use strata_domain::format::OutputFormat;

/// A parsed JSON or YAML template together with the file it came from, if any.
///
/// The location anchors `parentConfigurationFile` references; templates read from a stream
/// have none and cannot inherit.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    root: Value,
    location: Option<PathBuf>,
}

impl Template {
    #[must_use]
    pub const fn from_value(root: Value) -> Self {
        Self { root, location: None }
    }

    /// Reads a template file; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON.
    ///
    /// # Errors
    /// Returns [`DocumentError::Io`] if the file cannot be read and a parse error otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .context(format!("Failed to open template {}", path.display()))?;
        let mut template = Self::from_reader(std::io::BufReader::new(file), OutputFormat::from_path(path))
            .map_err(|err| with_location(err, path))?;
        template.location = Some(path.to_path_buf());
        Ok(template)
    }

    /// Parses a template from a stream.
    ///
    /// # Errors
    /// Returns [`DocumentError::Json`] or [`DocumentError::Yaml`] for malformed input.
    pub fn from_reader(reader: impl Read, format: OutputFormat) -> Result<Self, DocumentError> {
        let root = match format {
            OutputFormat::Json => serde_json::from_reader(reader)?,
            OutputFormat::Yaml => serde_yaml::from_reader(reader)?,
        };
        Ok(Self::from_value(root))
    }

    /// Parses a template held in memory.
    ///
    /// # Errors
    /// See [`Template::from_reader`].
    pub fn parse(text: &str, format: OutputFormat) -> Result<Self, DocumentError> {
        Self::from_reader(text.as_bytes(), format)
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}

fn with_location(err: DocumentError, path: &Path) -> DocumentError {
    let context = format!("Failed to parse template {}", path.display());
    match err {
        DocumentError::Json { source, .. } => DocumentError::Json { source, context: Some(context.into()) },
        DocumentError::Yaml { source, .. } => DocumentError::Yaml { source, context: Some(context.into()) },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_and_yaml_parse_to_same_tree() {
        let from_json = Template::parse(r#"{"server": {"port": 80, "hosts": ["a", "b"]}}"#, OutputFormat::Json).unwrap();
        let from_yaml = Template::parse("server:\n  port: 80\n  hosts:\n    - a\n    - b\n", OutputFormat::Yaml).unwrap();

        assert_eq!(from_json.root(), &json!({"server": {"port": 80, "hosts": ["a", "b"]}}));
        assert_eq!(from_json, from_yaml);
        assert!(from_json.location().is_none());
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(Template::parse("{", OutputFormat::Json), Err(DocumentError::Json { .. })));
        assert!(matches!(Template::parse("a: [", OutputFormat::Yaml), Err(DocumentError::Yaml { .. })));
    }

    #[test]
    fn test_from_path_records_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.yml");
        std::fs::write(&path, "a: 1\n").unwrap();

        let template = Template::from_path(&path).unwrap();
        assert_eq!(template.location(), Some(path.as_path()));
        assert_eq!(template.root(), &json!({"a": 1}));

        let err = Template::from_path(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
