//! Integration tests for encrypted values in configuration files.
//!
//! Covers the `!encrypted` tag from key file to rendered output:
//! - decryption with a file-backed key store
//! - redaction in every output format
//! - failures for wrong or missing keys

use config_graph::config::ConfigResolver;
use config_graph::error::ErrorCode;
use config_graph::format::{OutputFormat, render};
use config_graph::secrets::{Cipher, FileKeyStore, REDACTION_MARKER};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LOGGING: &str = "logging:\n  log_dir: logs\n  log_level: INFO\n";

/// Write a fresh key file and return a cipher backed by it.
fn key_file_cipher(dir: &Path, name: &str) -> Cipher {
    let store = FileKeyStore::new(dir.join(name));
    store.write_new_key(false).expect("write key file");
    Cipher::new(store)
}

fn write_config(dir: &Path, token: &str) -> PathBuf {
    let path = dir.join("main.yaml");
    fs::write(
        &path,
        format!(
            "database:\n  user: app\n  password: !encrypted {}\napi_token: !encrypted {}\n{}",
            token, token, LOGGING
        ),
    )
    .unwrap();
    path
}

#[test]
fn encrypted_values_are_decrypted() {
    let temp = TempDir::new().unwrap();
    let cipher = key_file_cipher(temp.path(), "secret.key");
    let token = cipher.encrypt("hunter2").unwrap();
    let primary = write_config(temp.path(), &token);

    let config = ConfigResolver::new(&cipher).load_tree(&primary).unwrap();

    let password = config
        .get_path("database.password")
        .and_then(|v| v.as_secret())
        .expect("password is a secret");
    assert_eq!(password.expose(), "hunter2");
    assert_eq!(
        config.get("api_token").and_then(|v| v.as_secret()).map(|s| s.expose()),
        Some("hunter2")
    );
    assert_eq!(
        config.get_path("database.user").and_then(|v| v.as_str()),
        Some("app")
    );
}

#[test]
fn secrets_are_redacted_in_every_format() {
    let temp = TempDir::new().unwrap();
    let cipher = key_file_cipher(temp.path(), "secret.key");
    let token = cipher.encrypt("hunter2").unwrap();
    let primary = write_config(temp.path(), &token);

    let config = ConfigResolver::new(&cipher).load_tree(&primary).unwrap();

    for format in [OutputFormat::Lines, OutputFormat::Yaml, OutputFormat::Json] {
        let out = render(&config, format).unwrap();
        assert!(out.contains(REDACTION_MARKER), "{:?}", format);
        assert!(!out.contains("hunter2"), "{:?}", format);
    }
    assert!(!format!("{:?}", config).contains("hunter2"));
}

#[test]
fn wrong_key_is_decryption_error() {
    let temp = TempDir::new().unwrap();
    let writer = key_file_cipher(temp.path(), "writer.key");
    let reader = key_file_cipher(temp.path(), "reader.key");
    let primary = write_config(temp.path(), &writer.encrypt("hunter2").unwrap());

    let err = ConfigResolver::new(&reader).load_tree(&primary).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigDecryptionError);
    assert!(!err.to_string().contains("hunter2"));
}

#[test]
fn missing_key_file_fails_only_when_secrets_present() {
    let temp = TempDir::new().unwrap();
    let cipher = Cipher::new(FileKeyStore::new(temp.path().join("absent.key")));

    let plain = temp.path().join("plain.yaml");
    fs::write(&plain, format!("name: demo\n{}", LOGGING)).unwrap();
    assert!(ConfigResolver::new(&cipher).load_tree(&plain).is_ok());

    let tagged = temp.path().join("tagged.yaml");
    fs::write(&tagged, "password: !encrypted gAAAAA\n").unwrap();
    let err = ConfigResolver::new(&cipher).load_tree(&tagged).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigDecryptionError);
}

#[test]
fn secret_in_include_is_decrypted() {
    let temp = TempDir::new().unwrap();
    let cipher = key_file_cipher(temp.path(), "secret.key");
    let token = cipher.encrypt("s3cret").unwrap();
    fs::write(
        temp.path().join("secrets.yaml"),
        format!("smtp_password: !encrypted {}\n", token),
    )
    .unwrap();
    let primary = temp.path().join("main.yaml");
    fs::write(&primary, format!("includes: [secrets.yaml]\n{}", LOGGING)).unwrap();

    let config = ConfigResolver::new(&cipher).load_tree(&primary).unwrap();
    assert_eq!(
        config
            .get("smtp_password")
            .and_then(|v| v.as_secret())
            .map(|s| s.expose()),
        Some("s3cret")
    );
}

#[test]
fn generate_key_refuses_to_overwrite() {
    let temp = TempDir::new().unwrap();
    let store = FileKeyStore::new(temp.path().join("secret.key"));
    store.write_new_key(false).unwrap();
    assert!(store.write_new_key(false).is_err());
    assert!(store.write_new_key(true).is_ok());
}
