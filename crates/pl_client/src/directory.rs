//! In-memory cache of the server's public-key directory.
//!
//! Refreshes are wholesale: the server dump replaces the entire cache,
//! so a key rotated on the server wins over whatever we held
//! (last-writer-wins, no per-user merging). Entries that fail to parse
//! are skipped with a warning rather than poisoning the refresh.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use pl_crypto::PeerPublicKey;

use crate::error::ClientError;
use crate::services::DirectoryService;

#[derive(Clone, Default)]
pub struct KeyDirectory {
    inner: Arc<RwLock<HashMap<String, PeerPublicKey>>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the full directory dump and replace the cache with it.
    pub async fn refresh(&self, service: &dyn DirectoryService) -> Result<(), ClientError> {
        let dump = service.fetch_public_keys().await?;
        let mut fresh = HashMap::with_capacity(dump.len());
        for (username, pubkey) in dump {
            match PeerPublicKey::from_spki_b64(&pubkey) {
                Ok(key) => {
                    fresh.insert(username, key);
                }
                Err(err) => {
                    tracing::warn!(
                        event = "directory_entry_unparsable",
                        username = %username,
                        error = %err,
                    );
                }
            }
        }
        let count = fresh.len();
        *self.inner.write() = fresh;
        tracing::debug!(event = "directory_refreshed", entries = count);
        Ok(())
    }

    pub fn lookup(&self, username: &str) -> Option<PeerPublicKey> {
        self.inner.read().get(username).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Test-only seeding without a directory service.
    #[cfg(test)]
    pub(crate) fn insert(&self, username: &str, key: PeerPublicKey) {
        self.inner.write().insert(username.to_string(), key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use pl_crypto::RsaKeyPair;
    use pl_proto::api::DirectoryDump;

    struct FixedDump(DirectoryDump);

    #[async_trait]
    impl DirectoryService for FixedDump {
        async fn fetch_public_keys(&self) -> Result<DirectoryDump, ClientError> {
            Ok(self.0.clone())
        }
    }

    fn dump(entries: &[(&str, &RsaKeyPair)]) -> FixedDump {
        FixedDump(
            entries
                .iter()
                .map(|(name, pair)| (name.to_string(), pair.public_spki_b64().unwrap()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn refresh_replaces_the_whole_cache() {
        let alice = RsaKeyPair::generate().unwrap();
        let bob = RsaKeyPair::generate().unwrap();
        let dir = KeyDirectory::new();

        dir.refresh(&dump(&[("alice", &alice)])).await.unwrap();
        assert!(dir.lookup("alice").is_some());

        // A later dump without alice evicts her key.
        dir.refresh(&dump(&[("bob", &bob)])).await.unwrap();
        assert!(dir.lookup("alice").is_none());
        assert_eq!(dir.lookup("bob").unwrap(), bob.public_key());
    }

    #[tokio::test]
    async fn unparsable_entries_are_skipped_not_fatal() {
        let alice = RsaKeyPair::generate().unwrap();
        let mut broken = dump(&[("alice", &alice)]);
        broken.0.insert("mallory".to_string(), "not a key".to_string());

        let dir = KeyDirectory::new();
        dir.refresh(&broken).await.unwrap();
        assert_eq!(dir.len(), 1);
        assert!(dir.lookup("alice").is_some());
        assert!(dir.lookup("mallory").is_none());
    }

    #[tokio::test]
    async fn rotated_key_wins_over_the_cached_one() {
        let old = RsaKeyPair::generate().unwrap();
        let new = RsaKeyPair::generate().unwrap();
        let dir = KeyDirectory::new();

        dir.refresh(&dump(&[("alice", &old)])).await.unwrap();
        dir.refresh(&dump(&[("alice", &new)])).await.unwrap();
        assert_eq!(dir.lookup("alice").unwrap(), new.public_key());
    }
}
