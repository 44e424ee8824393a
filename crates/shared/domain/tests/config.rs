use depot_domain::config::{DEFAULT_MAX_FILE_SIZE, DepotConfig, LoggingConfig, StorageConfig};
use serde_json::json;
use std::path::PathBuf;

#[test]
fn config_defaults_are_sane() {
    let storage = StorageConfig::default();
    assert_eq!(storage.upload_dir, PathBuf::from("uploads"));
    assert_eq!(storage.max_file_size, 2_147_483_648);
    assert_eq!(storage.max_file_size, DEFAULT_MAX_FILE_SIZE);
    assert_eq!(storage.default_user, "system");
    assert_eq!(storage.download_prefix, "/download/");

    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert!(logging.path.is_none());
    assert!(!logging.json);
}

#[test]
fn default_allow_list_covers_common_types() {
    let list = StorageConfig::default().allowed_extension_list();
    for ext in ["jpg", "pdf", "docx", "zip", "mp4", "mp3", "wav", "txt"] {
        assert!(list.iter().any(|e| e == ext), "{ext} should be allowed by default");
    }
    assert_eq!(list.len(), 16);
}

#[test]
fn allow_list_is_normalized() {
    let storage = StorageConfig {
        allowed_extensions: " PDF, .png,,zip ,".to_owned(),
        ..StorageConfig::default()
    };
    assert_eq!(storage.allowed_extension_list(), vec!["pdf", "png", "zip"]);
}

#[test]
fn depot_config_deserializes_with_partial_input() {
    let raw = json!({
        "storage": { "upload_dir": "/srv/uploads", "max_file_size": 1024 },
        "logging": { "level": "debug", "json": true }
    });

    let cfg: DepotConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.storage.upload_dir, PathBuf::from("/srv/uploads"));
    assert_eq!(cfg.storage.max_file_size, 1024);
    assert_eq!(cfg.storage.default_user, "system");
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.json);
}

#[test]
fn deref_mut_copies_on_write() {
    let original = DepotConfig::default();
    let mut changed = original.clone();
    changed.storage.max_file_size = 10;

    assert_eq!(changed.storage.max_file_size, 10);
    assert_eq!(original.storage.max_file_size, DEFAULT_MAX_FILE_SIZE);
}
