use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::common::runtime::keccak::Keccak;

/// Content-addressed blob storage for evidence documents.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    async fn put(&self, bytes: &[u8]) -> anyhow::Result<String>;
    async fn get(&self, cid: &str) -> anyhow::Result<Option<Vec<u8>>>;
}

/// Keeps blobs in memory under a pseudo-CID derived from their content.
#[derive(Clone, Default)]
pub struct InMemoryContentStore {
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_id(bytes: &[u8]) -> String {
        format!("bafy{}", hex::encode(Keccak::digest(bytes)))
    }
}

#[async_trait::async_trait]
impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let cid = Self::content_id(bytes);
        self.blobs
            .lock()
            .map_err(|_| anyhow::anyhow!("content store poisoned"))?
            .insert(cid.clone(), bytes.to_vec());

        log::debug!("stored {} bytes as {}", bytes.len(), cid);
        Ok(cid)
    }

    async fn get(&self, cid: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let blobs = self.blobs.lock().map_err(|_| anyhow::anyhow!("content store poisoned"))?;
        Ok(blobs.get(cid).cloned())
    }
}
