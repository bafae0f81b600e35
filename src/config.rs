use crate::salt::{Salt, SaltError};
use crate::strategy::{Strategy, UnknownStrategy};
use config as config_rs;
use once_cell::sync::Lazy;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Prefix for environment overrides, e.g. `PGDUMP_OBFUSCATOR_ROW_ERRORS=abort`.
pub const ENV_PREFIX: &str = "PGDUMP_OBFUSCATOR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("config source error: {0}")]
    Source(#[from] config_rs::ConfigError),
    #[error(transparent)]
    UnknownStrategy(#[from] UnknownStrategy),
    #[error("malformed rule {0:?}: expected table:column:strategy")]
    MalformedRule(String),
    #[error("invalid salt: {0}")]
    InvalidSalt(#[from] SaltError),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Column selected for obfuscation. `database` and `schema` are informational
/// only; matching uses `table` and `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    pub column: String,
}

impl Target {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            database: None,
            schema: None,
            table: table.into(),
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObfuscationRule {
    #[serde(flatten)]
    pub target: Target,
    pub strategy: Strategy,
}

impl ObfuscationRule {
    pub fn new(table: &str, column: &str, strategy: Strategy) -> Self {
        Self {
            target: Target::new(table, column),
            strategy,
        }
    }
}

/// What to do with a data row that cannot be transformed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Log the row and copy it through unmodified.
    #[default]
    Skip,
    /// Abort the run on the first bad row.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub rules: Vec<ObfuscationRule>,
    #[serde(default)]
    pub row_errors: RowErrorPolicy,
    /// Hex-encoded fixed salt. Absent means a fresh random salt per run.
    /// Must be a string in config files; YAML reads an unquoted `00112233` as
    /// an integer, which is rejected.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_salt"
    )]
    pub salt: Option<String>,
}

fn deserialize_salt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct SaltVisitor;

    impl<'de> Visitor<'de> for SaltVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a quoted hex string")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(SaltVisitor)
}

static BUILTIN_RULES: Lazy<Vec<ObfuscationRule>> = Lazy::new(|| {
    vec![
        ObfuscationRule::new("auth_user", "email", Strategy::Email),
        ObfuscationRule::new("auth_user", "password", Strategy::BoundedBytes { max_len: 32 }),
        ObfuscationRule::new("accounts_profile", "phone", Strategy::Phone),
    ]
});

/// Rules shipped with the binary, enabled with `--builtin`.
pub fn builtin_rules() -> &'static [ObfuscationRule] {
    &BUILTIN_RULES
}

/// Parse one `table:column:strategy` token.
pub fn parse_rule(token: &str) -> Result<ObfuscationRule, ConfigError> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [table, column, strategy] if !table.is_empty() && !column.is_empty() => {
            Ok(ObfuscationRule::new(table, column, strategy.parse::<Strategy>()?))
        }
        _ => Err(ConfigError::MalformedRule(token.to_string())),
    }
}

pub fn parse_rules<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<ObfuscationRule>, ConfigError> {
    tokens.iter().map(|t| parse_rule(t.as_ref())).collect()
}

/// Load a configuration from an optional file, with environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<Configuration, ConfigError> {
    let mut builder = config_rs::Config::builder();
    if let Some(path) = path {
        std::fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        builder = builder.add_source(config_rs::File::from(path));
    }
    builder = builder.add_source(config_rs::Environment::with_prefix(ENV_PREFIX));

    let cfg = builder.build()?;
    Ok(cfg.try_deserialize::<Configuration>()?)
}

impl Configuration {
    pub fn with_rules(rules: Vec<ObfuscationRule>) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Resolve the run salt: the configured one, or a fresh random one.
    pub fn resolve_salt(&self) -> Result<Salt, ConfigError> {
        match &self.salt {
            Some(encoded) => Ok(Salt::from_hex(encoded)?),
            None => Ok(Salt::generate()),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
