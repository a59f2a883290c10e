use strata_domain::audit::AuditRecord;
use strata_domain::constants::{
    ARRAY_PREFIX, AUDIT_REGION, DEFAULT_REGION, DOCUMENT_REGION, HIERARCHY_SEPARATOR, NO_VALUE,
    PARENT_CONFIG_FIELD,
};
use strata_domain::format::OutputFormat;
use strata_domain::model::WriteOutcome;

#[test]
fn constants_match_namespace_layout() {
    assert_eq!(HIERARCHY_SEPARATOR, '/');
    assert_eq!(ARRAY_PREFIX, "...");
    assert_eq!(DEFAULT_REGION, "default");
    assert_eq!(AUDIT_REGION, "audit");
    assert_eq!(DOCUMENT_REGION, "document");
    assert_eq!(NO_VALUE, "<None>");
    assert_eq!(PARENT_CONFIG_FIELD, "parentConfigurationFile");
}

#[test]
fn output_format_parses_names_and_extensions() {
    assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
    assert!("toml".parse::<OutputFormat>().is_err());

    assert_eq!(OutputFormat::from_path("conf/app.yaml"), OutputFormat::Yaml);
    assert_eq!(OutputFormat::from_path("conf/app.json"), OutputFormat::Json);
    assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
}

#[test]
fn audit_record_uses_camel_case_json() {
    let record = AuditRecord {
        document: "auth".into(),
        author: "alice".into(),
        region: "alpha".into(),
        key: "server/port".into(),
        old_value: NO_VALUE.into(),
        new_value: "8080".into(),
        revision: 1,
        timestamp: 1_700_000_000_000,
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["oldValue"], "<None>");
    assert_eq!(json["newValue"], "8080");
    assert_eq!(json["revision"], 1);

    let back: AuditRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn write_outcome_reports_change() {
    assert!(WriteOutcome::Changed { revision: 3 }.is_changed());
    assert!(!WriteOutcome::Unchanged.is_changed());
}
