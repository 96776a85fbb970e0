use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use super::{IdentityRegistry, Receipt, RevocationRegistry};
use crate::{
    common::runtime::keccak::Keccak, keyring::secp256k1::Address,
    verifiable_credentials::hash::CredentialHash,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidRecord {
    pub controller: Address,
    pub metadata_cid: Option<String>,
}

#[derive(Default)]
struct LedgerState {
    dids: BTreeMap<String, DidRecord>,
    anchors: BTreeMap<CredentialHash, Address>,
    revoked: BTreeSet<CredentialHash>,
    height: u64,
}

impl LedgerState {
    fn commit(&mut self, payload: &[u8]) -> Receipt {
        self.height += 1;
        let mut preimage = self.height.to_be_bytes().to_vec();
        preimage.extend_from_slice(payload);
        Receipt { tx_hash: format!("0x{}", hex::encode(Keccak::digest(&preimage))) }
    }
}

/// Ledger double implementing both registries in memory. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|_| anyhow::anyhow!("ledger state poisoned"))
    }

    pub fn did_record(&self, did: &str) -> anyhow::Result<Option<DidRecord>> {
        Ok(self.lock()?.dids.get(did).cloned())
    }

    pub fn anchored_by(&self, hash: &CredentialHash) -> anyhow::Result<Option<Address>> {
        Ok(self.lock()?.anchors.get(hash).copied())
    }
}

#[async_trait::async_trait]
impl IdentityRegistry for InMemoryLedger {
    async fn get_controller(&self, did: &str) -> anyhow::Result<Option<Address>> {
        Ok(self.lock()?.dids.get(did).map(|record| record.controller))
    }

    async fn register_did(
        &self,
        did: &str,
        controller: &Address,
        metadata_cid: Option<&str>,
    ) -> anyhow::Result<Receipt> {
        let mut state = self.lock()?;
        if let Some(existing) = state.dids.get(did) {
            if existing.controller != *controller {
                anyhow::bail!("{} is already controlled by {}", did, existing.controller);
            }
        }

        state.dids.insert(
            did.to_string(),
            DidRecord { controller: *controller, metadata_cid: metadata_cid.map(String::from) },
        );
        Ok(state.commit(did.as_bytes()))
    }
}

#[async_trait::async_trait]
impl RevocationRegistry for InMemoryLedger {
    async fn anchor(&self, hash: &CredentialHash, authority: &Address) -> anyhow::Result<Receipt> {
        let mut state = self.lock()?;
        if let Some(owner) = state.anchors.get(hash) {
            if owner != authority {
                anyhow::bail!("{} is already anchored by {}", hash, owner);
            }
        }

        state.anchors.insert(*hash, *authority);
        Ok(state.commit(hash.as_bytes()))
    }

    async fn is_revoked(&self, hash: &CredentialHash) -> anyhow::Result<bool> {
        Ok(self.lock()?.revoked.contains(hash))
    }

    async fn mark_revoked(
        &self,
        hash: &CredentialHash,
        authority: &Address,
    ) -> anyhow::Result<Receipt> {
        let mut state = self.lock()?;
        // only the anchoring address may revoke an anchored hash
        if let Some(owner) = state.anchors.get(hash) {
            if owner != authority {
                anyhow::bail!("{} cannot revoke {} anchored by {}", authority, hash, owner);
            }
        }

        state.revoked.insert(*hash);
        Ok(state.commit(hash.as_bytes()))
    }
}
