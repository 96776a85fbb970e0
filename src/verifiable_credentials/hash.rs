use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::{
    canonical::{canonicalize, CanonicalBytes, EncodingError},
    types::VerifiableCredential,
};
use crate::common::runtime::keccak::Keccak;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialHashParseError {
    #[error("credential hash is not valid hex: {0}")]
    InvalidHex(String),
    #[error("credential hash must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Key under which the ledger anchors and revokes a credential: Keccak-256
/// of its canonical bytes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CredentialHash([u8; 32]);

impl CredentialHash {
    pub fn of(canonical: &CanonicalBytes) -> Self {
        CredentialHash(Keccak::digest(canonical.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

pub fn hash(canonical: &CanonicalBytes) -> CredentialHash {
    CredentialHash::of(canonical)
}

pub fn credential_hash(object: &VerifiableCredential) -> Result<CredentialHash, EncodingError> {
    Ok(hash(&canonicalize(object)?))
}

impl fmt::Display for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialHash({})", self)
    }
}

impl FromStr for CredentialHash {
    type Err = CredentialHashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let decoded =
            hex::decode(body).map_err(|_| CredentialHashParseError::InvalidHex(s.to_string()))?;
        if decoded.len() != 32 {
            return Err(CredentialHashParseError::InvalidLength(decoded.len()));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Ok(CredentialHash(bytes))
    }
}

impl Serialize for CredentialHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CredentialHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
