use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use crate::record::VerificationRecord;

/// Storage seam for verification records, keyed by identity.
///
/// The store is a plain map: atomicity of the check-then-act sequences lives
/// in the service's lock, so implementations only need each individual
/// operation to be consistent. Swapping in a durable store does not touch the
/// state machine.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, identity: &str) -> Option<VerificationRecord>;
    async fn put(&self, record: VerificationRecord);
    async fn delete(&self, identity: &str);

    /// Drop records issued more than `window` ago, returning how many were
    /// removed. Memory reclamation only; expiry itself is checked on access.
    async fn sweep_older_than(&self, window: Duration) -> usize;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn get(&self, identity: &str) -> Option<VerificationRecord> {
        (**self).get(identity).await
    }

    async fn put(&self, record: VerificationRecord) {
        (**self).put(record).await
    }

    async fn delete(&self, identity: &str) {
        (**self).delete(identity).await
    }

    async fn sweep_older_than(&self, window: Duration) -> usize {
        (**self).sweep_older_than(window).await
    }
}

/// In-memory record store.
///
/// Sufficient for production: records live at most a few minutes and nothing
/// needs to survive a restart.
pub struct MemoryStore {
    records: RwLock<HashMap<String, VerificationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, identity: &str) -> Option<VerificationRecord> {
        let records = self.records.read().await;
        records.get(identity).cloned()
    }

    async fn put(&self, record: VerificationRecord) {
        let mut records = self.records.write().await;
        records.insert(record.identity.clone(), record);
    }

    async fn delete(&self, identity: &str) {
        let mut records = self.records.write().await;
        records.remove(identity);
    }

    async fn sweep_older_than(&self, window: Duration) -> usize {
        let mut records = self.records.write().await;
        let now = Utc::now();
        let before = records.len();
        records.retain(|_, record| now.signed_duration_since(record.issued_at) <= window);
        before - records.len()
    }
}
