use strata_domain::config::LoggingConfig;
use strata_logger::{Logger, LoggerError};

#[test]
fn from_config_rejects_unknown_level() {
    let config = LoggingConfig { level: "chatty".to_owned(), ..LoggingConfig::default() };

    let err = Logger::from_config(&config).expect_err("unknown level must fail");
    assert!(matches!(err, LoggerError::UnknownLevel { .. }));
}

#[test]
fn from_config_with_file_output_creates_guard() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempfile::tempdir()?;
    let config = LoggingConfig {
        name: "strata-config".to_owned(),
        level: "debug".to_owned(),
        console: false,
        path: Some(tmp_dir.path().join("logs")),
        json: true,
        filter: None,
    };

    let logger = Logger::from_config(&config)?;
    assert!(logger.guard().is_some());
    assert!(tmp_dir.path().join("logs").is_dir());
    Ok(())
}
