use pretty_assertions::assert_eq;
use tempfile::TempDir;
use upslink_core::config::{ConfigError, LinkConfig};
use upslink_core::protocol::UpsLink;

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ups.json");

    let config = LinkConfig {
        settle_delay_ms: 750,
        retry_attempts: 4,
        ..LinkConfig::for_port("/dev/ttyUSB0")
    };
    config.save(&path).unwrap();

    let loaded = LinkConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = LinkConfig::load(temp_dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_load_rejects_invalid_values() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ups.json");
    std::fs::write(&path, r#"{ "port_name": "COM5", "baud_rate": 0 }"#).unwrap();

    match LinkConfig::load(&path) {
        Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "baud_rate"),
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_serial_link_uses_config() {
    let config = LinkConfig::for_port("/dev/ttyS3");
    let ups = UpsLink::serial(config.clone());
    assert_eq!(ups.config(), &config);
    assert_eq!(ups.transport().port_name(), "/dev/ttyS3");
    assert!(!ups.is_open());
}
