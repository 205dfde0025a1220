//! Lead persistence.
//!
//! [`LeadStore`] is the durable-write seam of the submission pipeline and the
//! read seam of the admin surface. [`KvLeadStore`] implements it on any
//! [`StorageBackend`]: each lead is one JSON document under a key that sorts
//! by creation time, plus a small id index for direct lookups.

use std::sync::Arc;

use lanas_storage::StorageBackend;
use uuid::Uuid;

use crate::error::LeadStoreError;
use crate::lead::{Lead, NewLead};

const LEAD_PREFIX: &str = "leads/";
const ID_INDEX_PREFIX: &str = "lead-ids/";

/// Durable storage for leads.
#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    /// Persist a new lead, assigning its id and creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`LeadStoreError`] when the write fails; nothing is stored.
    async fn insert(&self, record: NewLead) -> Result<Lead, LeadStoreError>;

    /// Every lead, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`LeadStoreError`] when reading or decoding fails.
    async fn list_all(&self) -> Result<Vec<Lead>, LeadStoreError>;

    /// One lead by id.
    ///
    /// # Errors
    ///
    /// Returns [`LeadStoreError`] when reading or decoding fails.
    async fn get(&self, id: Uuid) -> Result<Option<Lead>, LeadStoreError>;

    /// Name of the underlying backend, for health reporting.
    fn backend_name(&self) -> &'static str;
}

/// A [`LeadStore`] on top of a key-value [`StorageBackend`].
#[derive(Clone)]
pub struct KvLeadStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for KvLeadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvLeadStore")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl KvLeadStore {
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    fn lead_key(lead: &Lead) -> String {
        format!(
            "{LEAD_PREFIX}{:020}-{}",
            lead.created_at.timestamp_micros(),
            lead.id
        )
    }

    async fn read(&self, key: &str) -> Result<Option<Lead>, LeadStoreError> {
        let Some(bytes) = self.backend.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| LeadStoreError::Decode {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl LeadStore for KvLeadStore {
    async fn insert(&self, record: NewLead) -> Result<Lead, LeadStoreError> {
        let lead = Lead::new(record);
        let key = Self::lead_key(&lead);
        let bytes = serde_json::to_vec(&lead).map_err(|e| LeadStoreError::Encode {
            reason: e.to_string(),
        })?;

        self.backend.put(&key, &bytes).await?;
        // The lead is durable once its document is written. A missing index
        // entry only slows `get` down to the fallback scan, so a failed index
        // write must not turn a stored lead into an error.
        if let Err(e) = self
            .backend
            .put(&format!("{ID_INDEX_PREFIX}{}", lead.id), key.as_bytes())
            .await
        {
            tracing::warn!(lead_id = %lead.id, error = %e, "lead id index not written");
        }

        tracing::debug!(lead_id = %lead.id, backend = self.backend.name(), "lead stored");
        Ok(lead)
    }

    async fn list_all(&self) -> Result<Vec<Lead>, LeadStoreError> {
        let keys = self.backend.list(LEAD_PREFIX).await?;
        let mut leads = Vec::with_capacity(keys.len());
        for key in keys.iter().rev() {
            if let Some(lead) = self.read(key).await? {
                leads.push(lead);
            }
        }
        Ok(leads)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Lead>, LeadStoreError> {
        let index_key = format!("{ID_INDEX_PREFIX}{id}");
        if let Some(key) = self.backend.get(&index_key).await? {
            let key = String::from_utf8(key).map_err(|e| LeadStoreError::Decode {
                key: index_key,
                reason: e.to_string(),
            })?;
            return self.read(&key).await;
        }

        let suffix = format!("-{id}");
        let keys = self.backend.list(LEAD_PREFIX).await?;
        match keys.iter().find(|k| k.ends_with(&suffix)) {
            Some(key) => self.read(key).await,
            None => Ok(None),
        }
    }

    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lanas_storage::MemoryBackend;

    use super::*;
    use crate::lead::tests::sample_record;

    fn store() -> (MemoryBackend, KvLeadStore) {
        let backend = MemoryBackend::new();
        let store = KvLeadStore::new(Arc::new(backend.clone()));
        (backend, store)
    }

    #[tokio::test]
    async fn insert_assigns_identity_and_persists() {
        let (_backend, store) = store();
        let lead = store.insert(sample_record()).await.unwrap();
        assert_eq!(lead.record, sample_record());

        let found = store.get(lead.id).await.unwrap().unwrap();
        assert_eq!(found, lead);
    }

    #[tokio::test]
    async fn list_all_is_newest_first() {
        let (_backend, store) = store();
        let mut ids = Vec::new();
        for name in ["first", "second", "third"] {
            let mut record = sample_record();
            record.name = name.into();
            ids.push(store.insert(record).await.unwrap().id);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let listed: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.record.name)
            .collect();
        assert_eq!(listed, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn get_unknown_id_is_none() {
        let (_backend, store) = store();
        store.insert(sample_record()).await.unwrap();
        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_falls_back_to_scan_without_index() {
        let (backend, store) = store();
        let lead = Lead::new(sample_record());
        let key = KvLeadStore::lead_key(&lead);
        backend
            .put(&key, &serde_json::to_vec(&lead).unwrap())
            .await
            .unwrap();

        assert_eq!(store.get(lead.id).await.unwrap(), Some(lead));
    }

    /// Memory backend that refuses writes to the id index.
    struct NoIndexBackend(MemoryBackend);

    #[async_trait::async_trait]
    impl StorageBackend for NoIndexBackend {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, lanas_storage::StorageError> {
            self.0.get(key).await
        }

        async fn put(&self, key: &str, value: &[u8]) -> Result<(), lanas_storage::StorageError> {
            if key.starts_with(ID_INDEX_PREFIX) {
                return Err(lanas_storage::StorageError::Write {
                    key: key.to_owned(),
                    reason: "disk full".into(),
                });
            }
            self.0.put(key, value).await
        }

        async fn list(&self, prefix: &str) -> Result<Vec<String>, lanas_storage::StorageError> {
            self.0.list(prefix).await
        }

        fn name(&self) -> &'static str {
            "no-index"
        }
    }

    #[tokio::test]
    async fn failed_index_write_still_reports_the_stored_lead() {
        let backend = MemoryBackend::new();
        let store = KvLeadStore::new(Arc::new(NoIndexBackend(backend.clone())));

        let lead = store.insert(sample_record()).await.unwrap();

        assert!(backend.list(ID_INDEX_PREFIX).await.unwrap().is_empty());
        assert_eq!(store.list_all().await.unwrap(), vec![lead.clone()]);
        assert_eq!(store.get(lead.id).await.unwrap(), Some(lead));
    }

    #[tokio::test]
    async fn corrupt_document_is_a_decode_error() {
        let (backend, store) = store();
        backend.put("leads/0-broken", b"{not json").await.unwrap();
        let err = store.list_all().await.unwrap_err();
        assert!(matches!(err, LeadStoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn reports_backend_name() {
        let (_backend, store) = store();
        assert_eq!(store.backend_name(), "memory");
    }
}
