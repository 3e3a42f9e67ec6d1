//! Session bootstrap: key material, login, key publication, and the
//! shared state every other component hangs off.

use std::sync::Arc;

use pl_crypto::{KeyStore, RsaKeyPair};
use pl_proto::api::RegisterRequest;

use crate::api::ApiClient;
use crate::channel::DeliveryChannel;
use crate::composer::MessageComposer;
use crate::directory::KeyDirectory;
use crate::error::ClientError;
use crate::history::HistoryLoader;
use crate::pipeline::InboundPipeline;
use crate::store::ConversationStore;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// e.g. `http://localhost:8000`
    pub api_base_url: String,
    /// e.g. `ws://localhost:8000`
    pub ws_base_url: String,
}

/// One logged-in account: key material plus the shared caches.
pub struct Session {
    pub username: String,
    pub keys: Arc<RsaKeyPair>,
    pub directory: KeyDirectory,
    pub store: ConversationStore,
    config: SessionConfig,
}

/// Load the stored key pair, or generate and persist one on first run.
///
/// Generation happens only when no key file exists at all; a present
/// but unreadable file is an error, since peers may already hold
/// ciphertext wrapped under that key.
pub fn load_or_generate_keys(key_store: &KeyStore) -> Result<RsaKeyPair, ClientError> {
    if key_store.exists() {
        return Ok(key_store.load()?);
    }
    let pair = RsaKeyPair::generate()?;
    key_store.save(&pair)?;
    tracing::info!(event = "keypair_generated");
    Ok(pair)
}

impl Session {
    /// Log in, ensure our public key is published, and prime the key
    /// directory.
    pub async fn establish(
        config: SessionConfig,
        api: &ApiClient,
        key_store: &KeyStore,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let keys = Arc::new(load_or_generate_keys(key_store)?);
        api.login(username, password).await?;
        // Publishing is idempotent: the directory keeps the last write.
        api.publish_public_key(username, &keys.public_spki_b64()?).await?;

        let directory = KeyDirectory::new();
        directory.refresh(api).await?;

        Ok(Self {
            username: username.to_string(),
            keys,
            directory,
            store: ConversationStore::new(),
            config,
        })
    }

    /// Create the account first, then establish as usual.
    pub async fn register_and_establish(
        config: SessionConfig,
        api: &ApiClient,
        key_store: &KeyStore,
        username: &str,
        name: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        api.register(&RegisterRequest {
            username: username.to_string(),
            name: name.to_string(),
            password: password.to_string(),
        })
        .await?;
        Self::establish(config, api, key_store, username, password).await
    }

    pub fn composer(&self) -> MessageComposer {
        MessageComposer::new(
            self.username.as_str(),
            Arc::clone(&self.keys),
            self.directory.clone(),
            self.store.clone(),
        )
    }

    pub fn history_loader(&self) -> HistoryLoader {
        HistoryLoader::new(
            self.username.as_str(),
            Arc::clone(&self.keys),
            self.directory.clone(),
            self.store.clone(),
        )
    }

    /// Open the realtime channel; inbound frames feed the shared store.
    pub fn open_channel(&self) -> DeliveryChannel {
        let pipeline = Arc::new(InboundPipeline::new(
            self.username.as_str(),
            Arc::clone(&self.keys),
            self.directory.clone(),
            self.store.clone(),
        ));
        let url = DeliveryChannel::ws_url(&self.config.ws_base_url, &self.username);
        DeliveryChannel::connect(url, pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_generated_once_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let key_store = KeyStore::new(dir.path().join("keys").join("privkey"));

        let first = load_or_generate_keys(&key_store).unwrap();
        let second = load_or_generate_keys(&key_store).unwrap();
        assert_eq!(first.public_key(), second.public_key());
    }
}
