use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use thiserror::Error;

use super::keccak::Keccak;

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const RECOVERABLE_SIGNATURE_SIZE: usize = 65;

// Offset added to the recovery id in the trailing `v` byte.
const RECOVERY_ID_OFFSET: u8 = 27;

pub struct Secp256k1 {}

#[derive(Debug, Error)]
pub enum Secp256k1Error {
    #[error("SecretKeyConvertError")]
    KeyConvertError(#[from] k256::elliptic_curve::Error),
    #[error("signature error : {0:?}")]
    SignatureError(#[from] k256::ecdsa::Error),
    #[error("invalid signature length: {0}")]
    InvalidSignatureLength(usize),
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
}

impl Secp256k1 {
    pub fn generate_public_key(private_key: &[u8]) -> Result<Vec<u8>, Secp256k1Error> {
        let signing_key = SigningKey::from_slice(private_key)?;
        Ok(signing_key.verifying_key().to_encoded_point(false).as_bytes().to_vec())
    }

    /// Signs `message` as a personal message and returns `r || s || v`.
    pub fn personal_sign(
        message: &[u8],
        private_key: &[u8],
    ) -> Result<[u8; RECOVERABLE_SIGNATURE_SIZE], Secp256k1Error> {
        let signing_key = SigningKey::from_slice(private_key)?;
        let digest = Keccak::personal_message_digest(message);

        let (signature, recovery_id) = signing_key.sign_prehash_recoverable(&digest)?;

        let mut output = [0u8; RECOVERABLE_SIGNATURE_SIZE];
        output[..64].copy_from_slice(&signature.to_bytes());
        output[64] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;

        Ok(output)
    }

    /// Recovers the key that produced `signature` over the personal-message
    /// framing of `message`. Accepts both `v in {27, 28}` and raw `{0, 1}`.
    pub fn recover_public_key(
        message: &[u8],
        signature: &[u8],
    ) -> Result<VerifyingKey, Secp256k1Error> {
        if signature.len() != RECOVERABLE_SIGNATURE_SIZE {
            return Err(Secp256k1Error::InvalidSignatureLength(signature.len()));
        }

        let v = signature[64];
        let normalized = if v >= RECOVERY_ID_OFFSET { v - RECOVERY_ID_OFFSET } else { v };
        let recovery_id =
            RecoveryId::from_byte(normalized).ok_or(Secp256k1Error::InvalidRecoveryId(v))?;

        let wrapped_signature = Signature::from_slice(&signature[..64])?;

        let digest = Keccak::personal_message_digest(message);

        Ok(VerifyingKey::recover_from_prehash(&digest, &wrapped_signature, recovery_id)?)
    }
}
