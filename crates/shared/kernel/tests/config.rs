use config::Map;
use strata_domain::config::{BackendKind, StrataConfig};
use strata_domain::format::OutputFormat;
use strata_kernel::bootstrap::connect_backend;
use strata_kernel::config::{ConfigError, ConfigLoader, load_strata_config};
use strata_storage::{AnyBackend, KvBackend};

fn env(vars: &[(&str, &str)]) -> Map<String, String> {
    vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

#[test]
fn test_defaults_without_file_or_env() {
    let config: StrataConfig = ConfigLoader::new().env_source(Map::new()).load().unwrap();

    assert_eq!(config.storage.backend, BackendKind::File);
    assert_eq!(config.storage.root, std::path::PathBuf::from("data"));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.output.format, OutputFormat::Yaml);
}

#[test]
fn test_file_then_env_override() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("strata.toml");
    std::fs::write(
        &path,
        r#"
[storage]
backend = "file"
root = "/var/lib/strata"
compression = true

[logging]
level = "debug"

[output]
format = "json"
"#,
    )
    .unwrap();

    let config: StrataConfig = ConfigLoader::new()
        .file(&path)
        .env_source(env(&[("STRATA__STORAGE__BACKEND", "memory"), ("STRATA__LOGGING__LEVEL", "warn")]))
        .load()
        .unwrap();

    assert_eq!(config.storage.backend, BackendKind::Memory);
    assert_eq!(config.storage.root, std::path::PathBuf::from("/var/lib/strata"));
    assert!(config.storage.compression);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.output.format, OutputFormat::Json);
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = load_strata_config(Some(&tmp.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Config { .. }));
}

#[test]
fn test_malformed_value_is_an_error() {
    let err = ConfigLoader::new()
        .env_source(env(&[("STRATA__STORAGE__BACKEND", "floppy")]))
        .load::<StrataConfig>()
        .unwrap_err();
    assert!(err.to_string().contains("Failed to deserialize config"));
}

#[tokio::test]
async fn test_connect_backend_variants() {
    let tmp = tempfile::tempdir().unwrap();

    let config: StrataConfig = ConfigLoader::new()
        .env_source(env(&[("STRATA__STORAGE__BACKEND", "memory")]))
        .load()
        .unwrap();
    let backend = connect_backend(&config.storage).await.unwrap();
    assert!(matches!(backend, AnyBackend::Memory(_)));

    let mut config = StrataConfig::default();
    config.storage.root = tmp.path().join("kv");
    config.storage.compression = true;
    let backend = connect_backend(&config.storage).await.unwrap();
    assert!(matches!(backend, AnyBackend::File(_)));

    backend.put("doc/default/k", "1").await.unwrap();
    assert_eq!(backend.get("doc/default/k").await.unwrap().as_deref(), Some("1"));
    assert!(tmp.path().join("kv").is_dir());
}
