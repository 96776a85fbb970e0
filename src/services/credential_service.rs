use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    config::VerifierConfig,
    did::did_resolver::DidResolver,
    keyring::{
        key_holder::{KeyHolder, SigningError},
        secp256k1::Address,
    },
    registry::{IdentityRegistry, Receipt, RevocationRegistry},
    storage::ContentStore,
    verifiable_credentials::{
        canonical::EncodingError,
        credential_signer::CredentialSigner,
        derivation::{self, DeriveError, FieldSelection},
        hash::{credential_hash, CredentialHash},
        issuer::DegreeCredentialRequest,
        types::{MalformedCredentialError, VerifiableCredential},
        verifier::{CredentialVerifier, VerificationResult},
    },
};

/// A transcript to upload and attach as evidence.
#[derive(Debug, Clone, Copy)]
pub struct TranscriptDocument<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

#[derive(Debug, Error)]
pub enum CredentialServiceIssueError {
    #[error("transcript upload failed")]
    TranscriptUploadFailed(#[source] anyhow::Error),
    #[error("credential request is malformed")]
    Malformed(#[from] MalformedCredentialError),
    #[error("credential signer error")]
    SignFailed(#[from] SigningError),
}

#[derive(Debug, Error)]
pub enum CredentialServiceLedgerError {
    #[error("credential {0} carries no proof")]
    NotSigned(String),
    #[error("{signer} is not the issuer of {credential}")]
    NotIssuer { signer: String, credential: String },
    #[error("credential encoding error")]
    Encoding(#[from] EncodingError),
    #[error("key holder error")]
    KeyHolder(#[from] SigningError),
    #[error(transparent)]
    Registry(#[from] anyhow::Error),
}

/// Issuer, holder and verifier workflows over injected ledger and storage
/// collaborators.
pub struct CredentialService {
    identity_registry: Arc<dyn IdentityRegistry>,
    revocation_registry: Arc<dyn RevocationRegistry>,
    content_store: Arc<dyn ContentStore>,
    verifier: CredentialVerifier,
}

impl CredentialService {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        identity_registry: Arc<dyn IdentityRegistry>,
        revocation_registry: Arc<dyn RevocationRegistry>,
        content_store: Arc<dyn ContentStore>,
        config: VerifierConfig,
    ) -> Self {
        let verifier = CredentialVerifier::new(
            resolver,
            Arc::clone(&identity_registry),
            Arc::clone(&revocation_registry),
        )
        .with_config(config);

        Self { identity_registry, revocation_registry, content_store, verifier }
    }

    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }

    pub async fn register_issuer<K: KeyHolder + ?Sized>(
        &self,
        key_holder: &K,
        metadata_cid: Option<&str>,
    ) -> Result<Receipt, CredentialServiceLedgerError> {
        let identity = key_holder.identity().await?;
        let receipt = self
            .identity_registry
            .register_did(&identity.did, &identity.address, metadata_cid)
            .await?;

        log::info!("registered {} to {} in {}", identity.did, identity.address, receipt.tx_hash);
        Ok(receipt)
    }

    pub async fn issue<K: KeyHolder + ?Sized>(
        &self,
        request: &DegreeCredentialRequest,
        transcript: Option<TranscriptDocument<'_>>,
        key_holder: &K,
        issuance_date: DateTime<Utc>,
    ) -> Result<VerifiableCredential, CredentialServiceIssueError> {
        let request = match transcript {
            Some(document) => {
                let cid = self
                    .content_store
                    .put(document.bytes)
                    .await
                    .map_err(CredentialServiceIssueError::TranscriptUploadFailed)?;
                request.clone().with_transcript(document.name, &cid)
            }
            None => request.clone(),
        };

        let unsigned = request.build(issuance_date)?;
        let signed = CredentialSigner::sign(&unsigned, key_holder, issuance_date).await?;

        log::info!("issued {} to {}", signed.id, signed.credential_subject.id());
        Ok(signed)
    }

    pub async fn anchor<K: KeyHolder + ?Sized>(
        &self,
        object: &VerifiableCredential,
        key_holder: &K,
    ) -> Result<Receipt, CredentialServiceLedgerError> {
        let (hash, authority) = self.issuer_authority(object, key_holder).await?;
        let receipt = self.revocation_registry.anchor(&hash, &authority).await?;

        log::info!("anchored {} as {} in {}", object.id, hash, receipt.tx_hash);
        Ok(receipt)
    }

    pub async fn revoke<K: KeyHolder + ?Sized>(
        &self,
        object: &VerifiableCredential,
        key_holder: &K,
    ) -> Result<Receipt, CredentialServiceLedgerError> {
        let (hash, authority) = self.issuer_authority(object, key_holder).await?;
        let receipt = self.revocation_registry.mark_revoked(&hash, &authority).await?;

        log::info!("revoked {} ({}) in {}", object.id, hash, receipt.tx_hash);
        Ok(receipt)
    }

    pub async fn derive<K: KeyHolder + ?Sized>(
        &self,
        source: &VerifiableCredential,
        selection: &FieldSelection,
        key_holder: &K,
        issuance_date: DateTime<Utc>,
    ) -> Result<VerifiableCredential, DeriveError> {
        derivation::derive(source, selection, key_holder, issuance_date).await
    }

    pub async fn verify(&self, object: &VerifiableCredential) -> VerificationResult {
        self.verifier.verify(object).await
    }

    pub async fn verify_encoded(&self, input: &str) -> VerificationResult {
        self.verifier.verify_encoded(input).await
    }

    // Ledger writes about a credential are authorized by its issuer only.
    async fn issuer_authority<K: KeyHolder + ?Sized>(
        &self,
        object: &VerifiableCredential,
        key_holder: &K,
    ) -> Result<(CredentialHash, Address), CredentialServiceLedgerError> {
        if object.proof.is_none() {
            return Err(CredentialServiceLedgerError::NotSigned(object.id.clone()));
        }

        let identity = key_holder.identity().await?;
        if identity.did != object.issuer {
            return Err(CredentialServiceLedgerError::NotIssuer {
                signer: identity.did,
                credential: object.id.clone(),
            });
        }

        Ok((credential_hash(object)?, identity.address))
    }
}
