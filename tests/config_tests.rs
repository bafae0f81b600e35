use pgdump_obfuscator::config::{load_config, ConfigError, RowErrorPolicy, Target};
use pgdump_obfuscator::strategy::Strategy;
use std::io::Write;

fn config_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_yaml_rules() {
    let file = config_file(
        ".yaml",
        r#"
rules:
  - table: auth_user
    column: email
    strategy: email
  - database: app
    schema: public
    table: auth_user
    column: password
    strategy: bytes-16
  - table: sessions
    column: ip
    strategy: inet
row_errors: abort
salt: "00112233"
"#,
    );
    let cfg = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.rules.len(), 3);
    assert_eq!(cfg.rules[0].target, Target::new("auth_user", "email"));
    assert_eq!(cfg.rules[1].target.schema.as_deref(), Some("public"));
    assert_eq!(cfg.rules[1].strategy, Strategy::BoundedBytes { max_len: 16 });
    assert_eq!(cfg.rules[2].strategy, Strategy::Inet);
    assert_eq!(cfg.row_errors, RowErrorPolicy::Abort);
    assert_eq!(cfg.resolve_salt().unwrap().to_hex(), "00112233");
}

#[test]
fn load_json_rules_with_defaults() {
    let file = config_file(
        ".json",
        r#"{"rules": [{"table": "accounts_profile", "column": "phone", "strategy": "digits"}]}"#,
    );
    let cfg = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.rules.len(), 1);
    assert_eq!(cfg.rules[0].strategy, Strategy::Digits);
    assert_eq!(cfg.row_errors, RowErrorPolicy::Skip);
    assert!(cfg.salt.is_none());
}

#[test]
fn unknown_strategy_in_file_fails() {
    let file = config_file(
        ".yaml",
        "rules:\n  - table: t\n    column: c\n    strategy: rot13\n",
    );
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Source(_)));
    assert!(err.to_string().contains("rot13"));
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn unquoted_numeric_salt_is_rejected() {
    let file = config_file(".yaml", "salt: 00112233\n");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Source(_)));
    assert!(err.to_string().contains("quoted hex string"));

    let file = config_file(".yaml", "salt: \"00112233\"\n");
    let cfg = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.salt.as_deref(), Some("00112233"));
}
