use std::fmt;

use k256::{PublicKey, SecretKey};
use thiserror::Error;

use super::secp256k1::{Address, RecoverableSignature};
use crate::common::{
    extension::trng::{Trng, TrngError},
    runtime::secp256k1::{Secp256k1, Secp256k1Error, PRIVATE_KEY_SIZE},
};

#[derive(Error, Debug)]
pub enum KeyPairError {
    #[error("secp256k1 error")]
    KeyInitializationFailed(#[from] k256::elliptic_curve::Error),
    #[error("Trng error")]
    TrngGenerationFailed(#[from] TrngError),
    #[error("Hex Decode failed")]
    HexDecodeFailed(#[from] hex::FromHexError),
    #[error("invalid secret key size: {0}")]
    InvalidSecretKeySize(usize),
}

/// In-process secp256k1 key. Backs non-interactive issuers and tests.
#[derive(Clone)]
pub struct K256KeyPair {
    secret_key: SecretKey,
}

impl fmt::Debug for K256KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("K256KeyPair").field("address", &self.address()).finish()
    }
}

impl K256KeyPair {
    pub fn new(secret_key: SecretKey) -> Self {
        K256KeyPair { secret_key }
    }

    pub fn create<T: Trng>(trng: &T) -> Result<Self, KeyPairError> {
        let seed = trng.generate(&PRIVATE_KEY_SIZE)?;
        Self::from_slice(&seed)
    }

    pub fn from_slice(secret_key: &[u8]) -> Result<Self, KeyPairError> {
        if secret_key.len() != PRIVATE_KEY_SIZE {
            return Err(KeyPairError::InvalidSecretKeySize(secret_key.len()));
        }
        Ok(K256KeyPair { secret_key: SecretKey::from_slice(secret_key)? })
    }

    /// Parses a hex secret key, with or without the `0x` prefix.
    pub fn from_hex(secret_key: &str) -> Result<Self, KeyPairError> {
        let body = secret_key.strip_prefix("0x").unwrap_or(secret_key);
        Self::from_slice(&hex::decode(body)?)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.get_secret_key()))
    }

    pub fn get_secret_key(&self) -> Vec<u8> {
        self.secret_key.to_bytes().to_vec()
    }

    pub fn get_public_key(&self) -> PublicKey {
        self.secret_key.public_key()
    }

    pub fn address(&self) -> Address {
        let verifying_key = k256::ecdsa::VerifyingKey::from(self.get_public_key());
        Address::from_public_key(&verifying_key)
    }

    pub fn personal_sign(&self, message: &[u8]) -> Result<RecoverableSignature, Secp256k1Error> {
        let signature = Secp256k1::personal_sign(message, &self.get_secret_key())?;
        Ok(RecoverableSignature::new(signature))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::common::extension::trng::OSRandomNumberGenerator;

    const PRIVATE_KEY: [u8; 32] = [
        0xc7, 0x39, 0x80, 0x5a, 0xb0, 0x3d, 0xa6, 0x2d, 0xdb, 0xe0, 0x33, 0x90, 0xac, 0xdf, 0x76,
        0x15, 0x64, 0x0a, 0xa6, 0xed, 0x31, 0xb8, 0xf1, 0x82, 0x43, 0xf0, 0x4a, 0x57, 0x2c, 0x52,
        0x8e, 0xdb,
    ];

    const PUBLIC_KEY: [u8; 33] = [
        0x02, 0x70, 0x96, 0x45, 0x32, 0xf0, 0x83, 0xf4, 0x5f, 0xe8, 0xe8, 0xcc, 0xea, 0x96, 0xa2,
        0x2f, 0x60, 0x18, 0xd4, 0x6a, 0x40, 0x6f, 0x58, 0x3a, 0xb2, 0x26, 0xb1, 0x92, 0x83, 0xaa,
        0x60, 0x5c, 0x44,
    ];

    #[test]
    pub fn test_public_key() {
        let keypair = K256KeyPair::from_slice(&PRIVATE_KEY).unwrap();

        assert_eq!(keypair.get_public_key(), PublicKey::from_sec1_bytes(&PUBLIC_KEY).unwrap());
    }

    #[test]
    pub fn test_create() {
        let trng = OSRandomNumberGenerator::default();

        let first = K256KeyPair::create(&trng).unwrap();
        let second = K256KeyPair::create(&trng).unwrap();

        assert_eq!(first.get_secret_key().len(), 32);
        assert_ne!(first.address(), second.address());
    }

    #[test]
    pub fn test_hex_round_trip() {
        let keypair = K256KeyPair::from_slice(&PRIVATE_KEY).unwrap();

        let hex = keypair.to_hex();
        assert_eq!(hex, "0xc739805ab03da62ddbe03390acdf7615640aa6ed31b8f18243f04a572c528edb");

        let restored = K256KeyPair::from_hex(&hex).unwrap();
        assert_eq!(restored.address(), keypair.address());
    }

    #[test]
    pub fn test_invalid_secret_key() {
        assert!(matches!(K256KeyPair::from_slice(&[1u8; 31]), Err(KeyPairError::InvalidSecretKeySize(31))));
        assert!(matches!(K256KeyPair::from_slice(&[0u8; 32]), Err(KeyPairError::KeyInitializationFailed(_))));
        assert!(matches!(K256KeyPair::from_hex("0xnothex"), Err(KeyPairError::HexDecodeFailed(_))));
    }

    #[test]
    pub fn test_debug_hides_secret() {
        let keypair = K256KeyPair::from_slice(&PRIVATE_KEY).unwrap();

        let debug = format!("{:?}", keypair);

        assert!(!debug.contains("c739805a"));
        assert!(debug.contains(&keypair.address().to_string()));
    }

    #[test]
    pub fn test_personal_sign_recovers_address() {
        let keypair = K256KeyPair::from_slice(&PRIVATE_KEY).unwrap();

        let signature = keypair.personal_sign(b"0123456789abcdef").unwrap();

        assert_eq!(signature.recover_signer(b"0123456789abcdef").unwrap(), keypair.address());
    }
}
