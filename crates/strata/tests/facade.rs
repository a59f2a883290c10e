use serde_json::{Value, json};
use std::fs;
use strata::document::{KeySet, Template};
use strata::domain::format::OutputFormat;
use strata::domain::model::WriteOutcome;
use strata::storage::{FileBackend, MemoryBackend};
use strata::{ConfigGenerator, Strata, StrataError};
use tempfile::TempDir;

const TEMPLATE: &str = r#"{
    "server": {"host": "localhost", "port": 8080, "tls": false},
    "connectors": [{"type": "http"}, {"type": "https", "weight": 0.5}],
    "debug": null
}"#;

async fn imported() -> Strata<MemoryBackend> {
    let strata = Strata::new(MemoryBackend::new());
    let template = Template::parse(TEMPLATE, OutputFormat::Json).unwrap();
    strata.import("app", &template, "ops").await.unwrap();
    strata
}

async fn render(strata: &Strata<MemoryBackend>, region: &str, format: OutputFormat) -> String {
    let mut out = Vec::new();
    strata.generate("app", region, format, &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_default_region_reproduces_template() {
    let strata = imported().await;

    let json: Value = serde_json::from_str(&render(&strata, "default", OutputFormat::Json).await).unwrap();
    let expected: Value = serde_json::from_str(TEMPLATE).unwrap();
    assert_eq!(json, expected);

    let yaml: Value = serde_yaml::from_str(&render(&strata, "default", OutputFormat::Yaml).await).unwrap();
    assert_eq!(yaml, expected);
}

#[tokio::test]
async fn test_region_overrides_are_rendered() {
    let strata = imported().await;
    let eu = strata.region("app", "eu").unwrap();
    eu.write("server/port", "9443", "ops", false).await.unwrap();
    eu.write("server/tls", "true", "ops", false).await.unwrap();
    eu.write("connectors/...1/weight", "1.5", "ops", false).await.unwrap();

    let json: Value = serde_json::from_str(&render(&strata, "eu", OutputFormat::Json).await).unwrap();
    assert_eq!(json["server"], json!({"host": "localhost", "port": 9443, "tls": true}));
    assert_eq!(json["connectors"][1], json!({"type": "https", "weight": 1.5}));

    let us: Value = serde_json::from_str(&render(&strata, "us", OutputFormat::Json).await).unwrap();
    assert_eq!(us["server"]["port"], 8080);

    let history = strata.history("app", "eu", "", Some("OPS")).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_intermediate_keys_include_subtrees() {
    let strata = imported().await;
    let default = strata.region("app", "default").unwrap();
    default.write("server/limits/rps", "100", "ops", false).await.unwrap();

    let keys = KeySet::from_keys(["server"]).unwrap();
    let generator: &ConfigGenerator<MemoryBackend> = strata.generator();
    let values = generator.collect("app", "eu", &keys).await.unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(values.get("server/limits/rps").map(String::as_str), Some("100"));
}

#[tokio::test]
async fn test_document_registry() {
    let strata = imported().await;
    let registry = strata.documents();

    let keys = registry.get("app").await.unwrap();
    assert!(keys.contains("connectors/...1/weight"));
    assert_eq!(registry.list().await.unwrap(), vec!["app".to_owned()]);

    let template = Template::parse(TEMPLATE, OutputFormat::Json).unwrap();
    let err = registry.create("app", &template).await.unwrap_err();
    assert!(matches!(err, StrataError::DocumentExists { .. }));

    let err = registry.get("missing").await.unwrap_err();
    assert!(matches!(err, StrataError::DocumentNotFound { .. }));

    let err = registry.create_from_reader("empty", "  \n".as_bytes(), OutputFormat::Yaml).await.unwrap_err();
    assert!(matches!(err, StrataError::InvalidInput { .. }));

    let err = registry.create("audit", &template).await.unwrap_err();
    assert!(matches!(err, StrataError::InvalidInput { .. }));

    let mut out = Vec::new();
    let err = strata.generate("missing", "eu", OutputFormat::Json, &mut out).await.unwrap_err();
    assert!(matches!(err, StrataError::DocumentNotFound { .. }));
}

#[tokio::test]
async fn test_import_keeps_existing_defaults() {
    let strata = Strata::new(MemoryBackend::new());
    strata.region("svc", "default").unwrap().write("port", "1", "ops", false).await.unwrap();

    let template = Template::parse("port: 2\nname: svc\n", OutputFormat::Yaml).unwrap();
    let (keys, outcomes) = strata.import("svc", &template, "ops").await.unwrap();

    assert_eq!(keys.serialize(), "name\nport\n");
    assert_eq!(outcomes, vec![WriteOutcome::Changed { revision: 1 }]);
    assert_eq!(strata.region("svc", "default").unwrap().read("port").await.unwrap(), "1");
}

#[tokio::test]
async fn test_end_to_end_on_file_backend() {
    let tmp = TempDir::new().unwrap();
    let templates = tmp.path().join("templates");
    fs::create_dir_all(templates.join("services")).unwrap();
    fs::write(templates.join("base.yaml"), "logging:\n  level: \"info\"\n").unwrap();
    fs::write(
        templates.join("services/api.yaml"),
        "parentConfigurationFile: base.yaml\nserver:\n  port: 80\n",
    )
    .unwrap();

    let backend = FileBackend::builder().root(tmp.path().join("data")).create(true).connect().await.unwrap();
    let strata = Strata::new(backend);

    let keys = strata.documents().create_from_path("api", templates.join("services/api.yaml")).await.unwrap();
    assert_eq!(keys.serialize(), "logging\nlogging/level\nserver\nserver/port\n");

    let default = strata.region("api", "default").unwrap();
    default.write("server/port", "80", "ops", false).await.unwrap();
    default.write("logging/level", "\"info\"", "ops", false).await.unwrap();
    strata.region("api", "eu").unwrap().write("logging/level", "\"debug\"", "ops", false).await.unwrap();

    let mut out = Vec::new();
    strata.generate("api", "eu", OutputFormat::Yaml, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "logging:\n  level: \"debug\"\nserver:\n  port: 80\n");

    strata.region("api", "eu").unwrap().destroy_region().await.unwrap();
    let mut out = Vec::new();
    strata.generate("api", "eu", OutputFormat::Json, &mut out).await.unwrap();
    let json: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json, json!({"logging": {"level": "info"}, "server": {"port": 80}}));
}
