use std::{fmt, str::FromStr};

use k256::ecdsa::VerifyingKey;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::common::runtime::{
    keccak::Keccak,
    secp256k1::{Secp256k1, Secp256k1Error, RECOVERABLE_SIGNATURE_SIZE},
};

pub const ADDRESS_SIZE: usize = 20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must start with 0x: {0}")]
    MissingPrefix(String),
    #[error("address must be {} bytes, got {0}", ADDRESS_SIZE)]
    InvalidLength(usize),
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
    #[error("address checksum mismatch: {0}")]
    ChecksumMismatch(String),
}

/// A 20 byte account address derived from a secp256k1 public key.
///
/// Displayed with the mixed-case checksum encoding. Parsing accepts all
/// lowercase or all uppercase hex, and mixed case only when the checksum holds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Address(bytes)
    }

    pub fn from_public_key(public_key: &VerifyingKey) -> Self {
        let point = public_key.to_encoded_point(false);
        let digest = Keccak::digest(&point.as_bytes()[1..]);

        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&digest[32 - ADDRESS_SIZE..]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak::digest(lower.as_bytes());

        let encoded: String = lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 { digest[i / 2] >> 4 } else { digest[i / 2] & 0x0f };
                if c.is_ascii_alphabetic() && nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();

        format!("0x{}", encoded)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        let decoded = hex::decode(body).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        if decoded.len() != ADDRESS_SIZE {
            return Err(AddressError::InvalidLength(decoded.len()));
        }

        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(&decoded);
        let address = Address(bytes);

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum()[2..] != *body {
            return Err(AddressError::ChecksumMismatch(s.to_string()));
        }

        Ok(address)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureParseError {
    #[error("signature is not valid hex")]
    InvalidHex,
    #[error("signature must be {} bytes, got {0}", RECOVERABLE_SIGNATURE_SIZE)]
    InvalidLength(usize),
}

/// `r || s || v` signature from which the signing address can be recovered.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature([u8; RECOVERABLE_SIGNATURE_SIZE]);

impl RecoverableSignature {
    pub fn new(bytes: [u8; RECOVERABLE_SIGNATURE_SIZE]) -> Self {
        RecoverableSignature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Address of the key that signed `message` (personal-message framing).
    pub fn recover_signer(&self, message: &[u8]) -> Result<Address, Secp256k1Error> {
        let public_key = Secp256k1::recover_public_key(message, &self.0)?;
        Ok(Address::from_public_key(&public_key))
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..]))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self)
    }
}

impl FromStr for RecoverableSignature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let decoded = hex::decode(body).map_err(|_| SignatureParseError::InvalidHex)?;
        if decoded.len() != RECOVERABLE_SIGNATURE_SIZE {
            return Err(SignatureParseError::InvalidLength(decoded.len()));
        }

        let mut bytes = [0u8; RECOVERABLE_SIGNATURE_SIZE];
        bytes.copy_from_slice(&decoded);
        Ok(RecoverableSignature(bytes))
    }
}
