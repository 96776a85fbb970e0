pub mod memory;

use serde::{Deserialize, Serialize};

use crate::{keyring::secp256k1::Address, verifiable_credentials::hash::CredentialHash};

/// Acknowledgement of an accepted ledger write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "txHash")]
    pub tx_hash: String,
}

#[async_trait::async_trait]
pub trait IdentityRegistry: Send + Sync {
    async fn get_controller(&self, did: &str) -> anyhow::Result<Option<Address>>;
    async fn register_did(
        &self,
        did: &str,
        controller: &Address,
        metadata_cid: Option<&str>,
    ) -> anyhow::Result<Receipt>;
}

#[async_trait::async_trait]
pub trait RevocationRegistry: Send + Sync {
    async fn anchor(&self, hash: &CredentialHash, authority: &Address) -> anyhow::Result<Receipt>;
    async fn is_revoked(&self, hash: &CredentialHash) -> anyhow::Result<bool>;
    async fn mark_revoked(
        &self,
        hash: &CredentialHash,
        authority: &Address,
    ) -> anyhow::Result<Receipt>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;

    /// Every call fails as if the ledger node were down.
    #[derive(Clone, Copy)]
    pub struct UnreachableRegistry;

    #[async_trait::async_trait]
    impl IdentityRegistry for UnreachableRegistry {
        async fn get_controller(&self, _did: &str) -> anyhow::Result<Option<Address>> {
            Err(anyhow::anyhow!("connection refused"))
        }
        async fn register_did(
            &self,
            _did: &str,
            _controller: &Address,
            _metadata_cid: Option<&str>,
        ) -> anyhow::Result<Receipt> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    #[async_trait::async_trait]
    impl RevocationRegistry for UnreachableRegistry {
        async fn anchor(&self, _hash: &CredentialHash, _authority: &Address) -> anyhow::Result<Receipt> {
            Err(anyhow::anyhow!("connection refused"))
        }
        async fn is_revoked(&self, _hash: &CredentialHash) -> anyhow::Result<bool> {
            Err(anyhow::anyhow!("connection refused"))
        }
        async fn mark_revoked(
            &self,
            _hash: &CredentialHash,
            _authority: &Address,
        ) -> anyhow::Result<Receipt> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    /// Never answers.
    #[derive(Clone, Copy)]
    pub struct StalledRegistry;

    #[async_trait::async_trait]
    impl IdentityRegistry for StalledRegistry {
        async fn get_controller(&self, _did: &str) -> anyhow::Result<Option<Address>> {
            std::future::pending().await
        }
        async fn register_did(
            &self,
            _did: &str,
            _controller: &Address,
            _metadata_cid: Option<&str>,
        ) -> anyhow::Result<Receipt> {
            std::future::pending().await
        }
    }

    #[async_trait::async_trait]
    impl RevocationRegistry for StalledRegistry {
        async fn anchor(&self, _hash: &CredentialHash, _authority: &Address) -> anyhow::Result<Receipt> {
            std::future::pending().await
        }
        async fn is_revoked(&self, _hash: &CredentialHash) -> anyhow::Result<bool> {
            std::future::pending().await
        }
        async fn mark_revoked(
            &self,
            _hash: &CredentialHash,
            _authority: &Address,
        ) -> anyhow::Result<Receipt> {
            std::future::pending().await
        }
    }
}
