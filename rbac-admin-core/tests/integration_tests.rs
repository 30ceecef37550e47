//! Integration tests for rbac-admin-core infrastructure

use rbac_admin_core::{
    authentication_error, config_error, init_logging, not_found_error, ConsoleConfig,
    ConsoleError, ErrorContext, LogFormat, LoggingConfig,
};

#[tokio::test]
async fn test_error_handling() {
    let error = authentication_error!("Invalid email or password", "session_manager");

    match &error {
        ConsoleError::Authentication { message, context } => {
            assert_eq!(message, "Invalid email or password");
            assert_eq!(context.component, "session_manager");
            assert!(!context.error_id.is_empty());
        }
        _ => panic!("Expected Authentication error"),
    }

    // Logging an error must never panic
    error.log();

    let network_error = ConsoleError::Network {
        message: "Connection refused".to_string(),
        source: None,
        context: ErrorContext::new("test"),
    };
    assert!(network_error.is_recoverable());

    let config_error = config_error!("Invalid config", "test");
    assert!(!config_error.is_recoverable());

    let missing = not_found_error!("Role r-9", "directory");
    assert_eq!(missing.user_message(), "Role r-9 not found");
}

#[tokio::test]
async fn test_logging_initialization() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Compact,
        include_location: false,
        include_thread: false,
        log_to_file: false,
        log_file_path: None,
        filter_directives: vec!["rbac_admin_core=debug".to_string()],
    };

    // A global subscriber may already be installed by another test in this
    // binary, so only the first call is guaranteed to succeed.
    let _ = init_logging(&config);

    let broken = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..config
    };
    assert!(init_logging(&broken).is_err());
}

#[tokio::test]
async fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rbac-admin.toml");

    let mut config = ConsoleConfig::default();
    config.api.base_url = "https://admin.example.com/api".to_string();
    config.rights.verify_catalog_on_save = false;
    config.logging.format = LogFormat::Json;
    config.save_to_file(&path).unwrap();

    let loaded = ConsoleConfig::from_file(&path).unwrap();
    assert_eq!(loaded.api.base_url, "https://admin.example.com/api");
    assert!(!loaded.rights.verify_catalog_on_save);
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert!(loaded.validate().is_ok());
}

#[tokio::test]
async fn test_config_parse_failure_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[api\nbase_url = ").unwrap();

    match ConsoleConfig::from_file(&path) {
        Err(ConsoleError::Config { context, .. }) => {
            assert_eq!(context.operation.as_deref(), Some("parse_toml"));
        }
        other => panic!("Expected Config error, got {other:?}"),
    }
}
