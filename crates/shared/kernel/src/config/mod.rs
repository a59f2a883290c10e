use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use strata_domain::config::StrataConfig;
use tracing::info;

/// Base name of the configuration file looked up when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "strata";
/// Prefix of environment overrides, e.g. `STRATA__STORAGE__ROOT`.
pub const ENV_PREFIX: &str = "STRATA";
const ENV_SEPARATOR: &str = "__";

/// Custom error type for config loading.
#[strata_derive::strata_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// A layered configuration loader: an optional file, then environment overrides.
///
/// 1. **Base File**: an explicit path is required to exist. Without one, a `strata.*`
///    file in the working directory is used when present (any format the `config` crate
///    understands: TOML, YAML, JSON, ...).
/// 2. **Environment Overrides**: variables prefixed with `STRATA__`; nested keys are
///    separated by double underscores (`STRATA__STORAGE__BACKEND=memory`).
#[derive(Debug, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: Option<Map<String, String>>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replaces the process environment with a fixed set of variables.
    #[must_use]
    pub fn env_source(mut self, vars: Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Builds the layered configuration and deserializes it into `T`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Config`] if an explicit file is missing or unreadable, or if
    /// the merged values do not match `T`.
    pub fn load<T>(self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned,
    {
        let (file, required) = match &self.path {
            Some(path) => (File::from(path.as_path()), true),
            None => (File::with_name(DEFAULT_CONFIG_FILE), false),
        };

        let builder = Config::builder().add_source(file.required(required)).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .convert_case(config::Case::Snake)
                .source(self.env),
        );

        match &self.path {
            Some(path) => info!("Loading config from {}", path.display()),
            None => info!("Loading config from defaults and environment"),
        }

        let config = builder
            .build()
            .context("Failed to build config")?
            .try_deserialize::<T>()
            .context("Failed to deserialize config")?;

        Ok(config)
    }
}

/// Loads any deserializable configuration with the layered strategy of [`ConfigLoader`].
///
/// # Errors
/// See [`ConfigLoader::load`].
///
/// # Example
/// ```rust
/// use strata_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    match path {
        Some(path) => ConfigLoader::new().file(path.as_ref()).load(),
        None => ConfigLoader::new().load(),
    }
}

/// Loads the strata configuration; every missing setting keeps its default.
///
/// # Errors
/// See [`ConfigLoader::load`].
pub fn load_strata_config(path: Option<&Path>) -> Result<StrataConfig, ConfigError> {
    load_config(path)
}
