use crate::format::OutputFormat;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level configuration shared by the CLI and embedding services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrataConfigInner {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct StrataConfig {
    #[serde(flatten, default)]
    inner: Arc<StrataConfigInner>,
}

impl Deref for StrataConfig {
    type Target = StrataConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for StrataConfig {
    fn deref_mut(&mut self) -> &mut StrataConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Which key/value backend serves the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local map, lost on exit.
    Memory,
    /// Directory tree under [`StorageConfig::root`].
    #[default]
    File,
}

/// Key/value backend settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub root: PathBuf,
    pub create: bool,
    pub compression: bool,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub name: String,
    pub level: String,
    pub console: bool,
    pub path: Option<PathBuf>,
    pub json: bool,
    pub filter: Option<String>,
}

/// Defaults for generated documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::File,
            root: PathBuf::from("data"),
            create: true,
            compression: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            name: "strata".to_owned(),
            level: "info".to_owned(),
            console: true,
            path: None,
            json: false,
            filter: None,
        }
    }
}
