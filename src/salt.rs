//! Per-run secret mixed into every obfuscation hash.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

pub const SALT_SIZE: usize = 16; // 128 bits

#[derive(Debug, Error)]
pub enum SaltError {
    #[error("salt must not be empty")]
    Empty,
    #[error("invalid hex salt: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Immutable salt shared by every scramble call of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// Generate a fresh random salt.
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; SALT_SIZE];
        rand::rng().fill(&mut bytes[..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, SaltError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SaltError::Empty);
        }
        Ok(Self(bytes))
    }

    pub fn from_hex(encoded: &str) -> Result<Self, SaltError> {
        Self::from_bytes(hex::decode(encoded.trim())?)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// SHA-256 over `salt || input`.
    pub fn digest(&self, input: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.update(input);
        hasher.finalize().into()
    }
}

// Never print the secret itself.
impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({} bytes)", self.0.len())
    }
}
