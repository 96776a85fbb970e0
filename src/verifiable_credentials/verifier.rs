use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    canonical::canonicalize,
    hash::CredentialHash,
    transport,
    types::{MalformedCredentialError, VerifiableCredential},
};
use crate::{
    config::{ControllerPolicy, RevocationPolicy, VerifierConfig},
    did::did_resolver::DidResolver,
    keyring::secp256k1::{Address, RecoverableSignature},
    registry::{IdentityRegistry, RevocationRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Valid,
    InvalidSignature,
    Revoked,
    /// Signature checks out but the revocation registry could not answer.
    RevocationUnknown,
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryKind {
    Identity,
    Revocation,
}

/// Problems that did not decide the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationWarning {
    ControllerNotRegistered { did: String },
    ControllerMismatch { did: String, registered: Address, recovered: Address },
    RegistryUnavailable { registry: RegistryKind, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    pub recovered_signer: Option<Address>,
    pub credential_hash: Option<CredentialHash>,
    pub warnings: Vec<VerificationWarning>,
    pub reason: String,
}

impl VerificationResult {
    fn started() -> Self {
        VerificationResult {
            status: VerificationStatus::Valid,
            recovered_signer: None,
            credential_hash: None,
            warnings: vec![],
            reason: String::new(),
        }
    }

    fn malformed(reason: String) -> Self {
        Self::started().conclude(VerificationStatus::Malformed, reason)
    }

    fn conclude(mut self, status: VerificationStatus, reason: String) -> Self {
        self.status = status;
        self.reason = reason;
        self
    }

    pub fn is_valid(&self) -> bool {
        self.status == VerificationStatus::Valid
    }

    pub fn is_revoked(&self) -> bool {
        self.status == VerificationStatus::Revoked
    }
}

/// Checks a credential's proof against its issuer, then consults the
/// registries. Holds no mutable state, so one verifier can serve concurrent
/// calls.
#[derive(Clone)]
pub struct CredentialVerifier {
    resolver: Arc<dyn DidResolver>,
    identity_registry: Arc<dyn IdentityRegistry>,
    revocation_registry: Arc<dyn RevocationRegistry>,
    config: VerifierConfig,
}

impl CredentialVerifier {
    pub fn new(
        resolver: Arc<dyn DidResolver>,
        identity_registry: Arc<dyn IdentityRegistry>,
        revocation_registry: Arc<dyn RevocationRegistry>,
    ) -> Self {
        CredentialVerifier {
            resolver,
            identity_registry,
            revocation_registry,
            config: VerifierConfig::default(),
        }
    }

    pub fn with_config(mut self, config: VerifierConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub async fn verify_json(&self, json: &str) -> VerificationResult {
        match serde_json::from_str::<VerifiableCredential>(json) {
            Ok(object) => self.verify(&object).await,
            Err(e) => {
                VerificationResult::malformed(MalformedCredentialError::Unparsable(e.to_string()).to_string())
            }
        }
    }

    /// Accepts the transport form (base64) as well as raw JSON.
    pub async fn verify_encoded(&self, input: &str) -> VerificationResult {
        match transport::decode(input) {
            Ok(object) => self.verify(&object).await,
            Err(e) => VerificationResult::malformed(e.to_string()),
        }
    }

    pub async fn verify(&self, object: &VerifiableCredential) -> VerificationResult {
        log::debug!("verifying {}", object.id);

        let proof = match &object.proof {
            Some(proof) if !proof.signature.trim().is_empty() => proof,
            _ => return VerificationResult::malformed("missing proof".to_string()),
        };
        if let Err(e) = object.validate() {
            return VerificationResult::malformed(e.to_string());
        }

        let mut result = VerificationResult::started();

        let signature = match proof.signature.parse::<RecoverableSignature>() {
            Ok(signature) => signature,
            Err(e) => {
                return result.conclude(
                    VerificationStatus::InvalidSignature,
                    format!("unreadable signature: {}", e),
                )
            }
        };
        let canonical = match canonicalize(object) {
            Ok(canonical) => canonical,
            Err(e) => return result.conclude(VerificationStatus::Malformed, e.to_string()),
        };
        let recovered = match signature.recover_signer(canonical.as_bytes()) {
            Ok(recovered) => recovered,
            Err(e) => {
                return result.conclude(
                    VerificationStatus::InvalidSignature,
                    format!("signer could not be recovered: {}", e),
                )
            }
        };
        result.recovered_signer = Some(recovered);

        let expected = match self.resolver.resolve_address(&object.issuer) {
            Ok(expected) => expected,
            Err(e) => {
                return result.conclude(
                    VerificationStatus::Malformed,
                    format!("invalid field `issuer`: {}", e),
                )
            }
        };
        if expected != recovered {
            log::debug!("{} was signed by {}, not by {}", object.id, recovered, expected);
            return result.conclude(
                VerificationStatus::InvalidSignature,
                format!(
                    "signature was produced by {} but issuer {} is controlled by {}",
                    recovered, object.issuer, expected
                ),
            );
        }
        let method_prefix = format!("{}#", object.issuer);
        if !proof.verification_method.starts_with(&method_prefix) {
            return result.conclude(
                VerificationStatus::InvalidSignature,
                format!(
                    "verification method {} does not belong to issuer {}",
                    proof.verification_method, object.issuer
                ),
            );
        }

        let controller = self
            .lookup(RegistryKind::Identity, self.identity_registry.get_controller(&object.issuer))
            .await;
        match controller {
            Ok(Some(registered)) if registered == recovered => {}
            Ok(Some(registered)) => {
                if self.config.controller_policy == ControllerPolicy::Strict {
                    return result.conclude(
                        VerificationStatus::InvalidSignature,
                        format!(
                            "issuer {} is registered to {} but was signed by {}",
                            object.issuer, registered, recovered
                        ),
                    );
                }
                log::warn!(
                    "issuer {} is registered to {}, signature is by {}",
                    object.issuer,
                    registered,
                    recovered
                );
                result.warnings.push(VerificationWarning::ControllerMismatch {
                    did: object.issuer.clone(),
                    registered,
                    recovered,
                });
            }
            Ok(None) => {
                log::debug!("issuer {} is not registered", object.issuer);
                result
                    .warnings
                    .push(VerificationWarning::ControllerNotRegistered { did: object.issuer.clone() });
            }
            Err(warning) => result.warnings.push(warning),
        }

        let hash = CredentialHash::of(&canonical);
        result.credential_hash = Some(hash);

        match self.lookup(RegistryKind::Revocation, self.revocation_registry.is_revoked(&hash)).await {
            Ok(true) => {
                log::debug!("{} ({}) is revoked", object.id, hash);
                return result.conclude(
                    VerificationStatus::Revoked,
                    format!("credential {} has been revoked", hash),
                );
            }
            Ok(false) => {}
            Err(warning) => {
                result.warnings.push(warning);
                if self.config.revocation_policy == RevocationPolicy::Required {
                    return result.conclude(
                        VerificationStatus::RevocationUnknown,
                        format!("revocation status of {} could not be determined", hash),
                    );
                }
            }
        }

        log::debug!("{} is valid, signed by {}", object.id, recovered);
        result.conclude(
            VerificationStatus::Valid,
            format!("signature is valid and matches issuer {}", object.issuer),
        )
    }

    /// Bounds a registry call by the configured timeout. Failures come back as
    /// the warning to record.
    async fn lookup<T, F>(&self, registry: RegistryKind, call: F) -> Result<T, VerificationWarning>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let detail = match tokio::time::timeout(self.config.registry_timeout, call).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("no answer within {} ms", self.config.registry_timeout.as_millis()),
        };

        log::warn!("{:?} registry unavailable: {}", registry, detail);
        Err(VerificationWarning::RegistryUnavailable { registry, detail })
    }
}
