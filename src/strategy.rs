use crate::salt::Salt;
use crate::scramble;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown strategy: {0}")]
pub struct UnknownStrategy(pub String);

/// Named obfuscation behaviour selectable from configuration.
///
/// Serialized as its configuration name (`bytes`, `bytes-16`, `digits`,
/// `email`, `inet`, `phone`) so a resolved configuration stays printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Strategy {
    Bytes,
    BoundedBytes { max_len: usize },
    Digits,
    Email,
    Inet,
    Phone,
}

impl Strategy {
    /// Transform one non-empty, non-NULL field value.
    pub fn apply(&self, salt: &Salt, value: &[u8]) -> Vec<u8> {
        match *self {
            Strategy::Bytes => scramble::scramble_bytes(salt, value),
            Strategy::BoundedBytes { max_len } => {
                scramble::scramble_bytes_bounded(salt, value, max_len)
            }
            Strategy::Digits => scramble::scramble_digits(salt, value),
            Strategy::Email => scramble::scramble_email(salt, value),
            Strategy::Inet => scramble::scramble_inet(salt, value),
            Strategy::Phone => scramble::scramble_phone(salt, value),
        }
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "bytes" => Ok(Strategy::Bytes),
            "digits" => Ok(Strategy::Digits),
            "email" => Ok(Strategy::Email),
            "inet" => Ok(Strategy::Inet),
            "phone" => Ok(Strategy::Phone),
            other => other
                .strip_prefix("bytes-")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|&max_len| max_len > 0)
                .map(|max_len| Strategy::BoundedBytes { max_len })
                .ok_or_else(|| UnknownStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Bytes => f.write_str("bytes"),
            Strategy::BoundedBytes { max_len } => write!(f, "bytes-{}", max_len),
            Strategy::Digits => f.write_str("digits"),
            Strategy::Email => f.write_str("email"),
            Strategy::Inet => f.write_str("inet"),
            Strategy::Phone => f.write_str("phone"),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = UnknownStrategy;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Strategy> for String {
    fn from(strategy: Strategy) -> Self {
        strategy.to_string()
    }
}
