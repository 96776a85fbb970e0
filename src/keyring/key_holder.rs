use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::{
    keypair::{K256KeyPair, KeyPairError},
    secp256k1::{Address, RecoverableSignature},
};
use crate::{
    common::runtime::secp256k1::Secp256k1Error, verifiable_credentials::canonical::EncodingError,
};

/// Fragment appended to a DID to reference its signing key.
pub const KEY_REFERENCE: &str = "keys-1";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
    #[error("invalid signing key")]
    InvalidKey(#[from] KeyPairError),
    #[error("signature request was cancelled")]
    Cancelled,
    #[error("signature request was rejected: {0}")]
    Rejected(String),
    #[error("{signer} cannot sign a credential issued by {issuer}")]
    IssuerMismatch { signer: String, issuer: String },
    #[error("key holder signed with {recovered}, expected {expected}")]
    WrongKey { expected: Address, recovered: Address },
    #[error("signing backend failed")]
    Backend(#[from] anyhow::Error),
    #[error("secp256k1 error")]
    Secp256k1(#[from] Secp256k1Error),
    #[error("credential could not be encoded for signing")]
    Encoding(#[from] EncodingError),
}

/// A DID together with the address of the key that signs for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    pub did: String,
    pub address: Address,
}

impl SignerIdentity {
    pub fn new(did: &str, address: Address) -> Self {
        SignerIdentity { did: did.to_string(), address }
    }

    /// `did:ethr` identity whose method-specific id is the address itself.
    pub fn ethr(address: Address) -> Self {
        SignerIdentity { did: format!("did:ethr:{}", address), address }
    }

    pub fn verification_method(&self) -> String {
        format!("{}#{}", self.did, KEY_REFERENCE)
    }
}

/// Capability to sign on behalf of one identity. Implementations may need the
/// user's approval, so both operations are asynchronous; dropping the future
/// abandons the request.
#[async_trait::async_trait]
pub trait KeyHolder: Send + Sync {
    async fn identity(&self) -> Result<SignerIdentity, SigningError>;
    async fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, SigningError>;
}

pub struct LocalKeyHolder {
    did: String,
    keypair: K256KeyPair,
}

impl LocalKeyHolder {
    pub fn new(did: &str, keypair: K256KeyPair) -> Self {
        LocalKeyHolder { did: did.to_string(), keypair }
    }

    pub fn ethr(keypair: K256KeyPair) -> Self {
        let did = SignerIdentity::ethr(keypair.address()).did;
        LocalKeyHolder { did, keypair }
    }

    pub fn from_hex(did: &str, secret_key: &str) -> Result<Self, SigningError> {
        Ok(Self::new(did, K256KeyPair::from_hex(secret_key)?))
    }
}

#[async_trait::async_trait]
impl KeyHolder for LocalKeyHolder {
    async fn identity(&self) -> Result<SignerIdentity, SigningError> {
        Ok(SignerIdentity::new(&self.did, self.keypair.address()))
    }

    async fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, SigningError> {
        Ok(self.keypair.personal_sign(message)?)
    }
}

/// A pending signature request handed to an external approver (a wallet
/// prompt). Dropping it without answering cancels the request.
#[derive(Debug)]
pub struct SignRequest {
    pub identity: SignerIdentity,
    pub message: Vec<u8>,
    reply: oneshot::Sender<Result<RecoverableSignature, String>>,
}

impl SignRequest {
    pub fn approve(self, signature: RecoverableSignature) {
        // the requester may already be gone
        let _ = self.reply.send(Ok(signature));
    }

    pub fn reject(self, reason: &str) {
        let _ = self.reply.send(Err(reason.to_string()));
    }
}

/// Key holder backed by an external signer reached over a channel.
#[derive(Clone)]
pub struct PromptKeyHolder {
    identity: SignerIdentity,
    requests: mpsc::Sender<SignRequest>,
}

impl PromptKeyHolder {
    pub fn channel(identity: SignerIdentity, buffer: usize) -> (Self, mpsc::Receiver<SignRequest>) {
        let (requests, receiver) = mpsc::channel(buffer);
        (PromptKeyHolder { identity, requests }, receiver)
    }
}

#[async_trait::async_trait]
impl KeyHolder for PromptKeyHolder {
    async fn identity(&self) -> Result<SignerIdentity, SigningError> {
        if self.requests.is_closed() {
            return Err(SigningError::KeyUnavailable(format!(
                "no signer connected for {}",
                self.identity.did
            )));
        }
        Ok(self.identity.clone())
    }

    async fn sign_message(&self, message: &[u8]) -> Result<RecoverableSignature, SigningError> {
        let (reply, response) = oneshot::channel();
        let request =
            SignRequest { identity: self.identity.clone(), message: message.to_vec(), reply };

        self.requests.send(request).await.map_err(|_| {
            SigningError::KeyUnavailable(format!("no signer connected for {}", self.identity.did))
        })?;

        let signature = response
            .await
            .map_err(|_| SigningError::Cancelled)?
            .map_err(SigningError::Rejected)?;

        let recovered = signature.recover_signer(message)?;
        if recovered != self.identity.address {
            log::error!(
                "external signer answered for {} with a signature by {}",
                self.identity.address,
                recovered
            );
            return Err(SigningError::WrongKey { expected: self.identity.address, recovered });
        }

        Ok(signature)
    }
}
