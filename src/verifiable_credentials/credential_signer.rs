use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{
    canonical::{canonicalize, EncodingError},
    types::{format_timestamp, Proof, VerifiableCredential},
};
use crate::{
    common::runtime::secp256k1::Secp256k1Error,
    keyring::{
        key_holder::{KeyHolder, SigningError},
        secp256k1::{Address, RecoverableSignature, SignatureParseError},
    },
};

pub const PROOF_TYPE: &str = "EcdsaSecp256k1Signature2019";
pub const PROOF_PURPOSE: &str = "assertionMethod";

#[derive(Debug, Error)]
pub enum CredentialSignerVerifyError {
    #[error("proof not found")]
    ProofNotFound,
    #[error("signature encoding error: {0}")]
    SignatureEncoding(#[from] SignatureParseError),
    #[error("credential encoding error")]
    Encoding(#[from] EncodingError),
    #[error("signer could not be recovered: {0}")]
    RecoveryFailed(#[from] Secp256k1Error),
}

pub struct CredentialSigner {}

impl CredentialSigner {
    /// Produces a detached proof over the canonical bytes of `object`.
    /// The key holder must sign for the credential's `issuer`.
    pub async fn sign_proof<K: KeyHolder + ?Sized>(
        object: &VerifiableCredential,
        key_holder: &K,
        created: DateTime<Utc>,
    ) -> Result<Proof, SigningError> {
        let identity = key_holder.identity().await?;
        if identity.did != object.issuer {
            return Err(SigningError::IssuerMismatch {
                signer: identity.did,
                issuer: object.issuer.clone(),
            });
        }

        let canonical = canonicalize(object)?;
        let signature = key_holder.sign_message(canonical.as_bytes()).await.map_err(|e| {
            log::error!("signing {} as {} failed: {}", object.id, identity.did, e);
            e
        })?;

        Ok(Proof {
            r#type: PROOF_TYPE.to_string(),
            created: format_timestamp(created),
            proof_purpose: PROOF_PURPOSE.to_string(),
            verification_method: identity.verification_method(),
            signature: signature.to_string(),
        })
    }

    pub async fn sign<K: KeyHolder + ?Sized>(
        object: &VerifiableCredential,
        key_holder: &K,
        created: DateTime<Utc>,
    ) -> Result<VerifiableCredential, SigningError> {
        let proof = Self::sign_proof(object, key_holder, created).await?;

        Ok(VerifiableCredential { proof: Some(proof), ..object.clone() })
    }

    /// Address whose key produced the proof, recovered from the signature over
    /// the canonical bytes of everything but the proof.
    pub fn recover(object: &VerifiableCredential) -> Result<Address, CredentialSignerVerifyError> {
        let proof = object.proof.as_ref().ok_or(CredentialSignerVerifyError::ProofNotFound)?;
        let signature = proof.signature.parse::<RecoverableSignature>()?;
        let canonical = canonicalize(object)?;

        Ok(signature.recover_signer(canonical.as_bytes())?)
    }
}
