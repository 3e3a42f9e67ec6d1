//! HTTP client for the account, directory, and message-store endpoints.

use async_trait::async_trait;
use parking_lot::RwLock;

use pl_proto::api::{
    DirectoryDump, DirectoryUser, HistoryRecord, HistoryResponse, PublicKeyUpload,
    RegisterRequest, StoreMessageRequest, TokenResponse,
};

use crate::error::ClientError;
use crate::services::{DirectoryService, PersistenceService};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    fn token(&self) -> Result<String, ClientError> {
        self.token
            .read()
            .clone()
            .ok_or_else(|| ClientError::Auth("not logged in".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<(), ClientError> {
        self.http
            .post(self.url("/api/register"))
            .json(req)
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(event = "account_registered", username = %req.username);
        Ok(())
    }

    /// Exchange credentials for a bearer token. The token endpoint takes
    /// form fields, not JSON.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Auth("invalid credentials".into()));
        }
        let body: TokenResponse = resp.error_for_status()?.json().await?;
        self.set_token(Some(body.access_token.clone()));
        tracing::info!(event = "logged_in", username = %username);
        Ok(body.access_token)
    }

    /// Publish (or overwrite) our public key in the directory.
    pub async fn publish_public_key(
        &self,
        username: &str,
        spki_b64: &str,
    ) -> Result<(), ClientError> {
        let upload = PublicKeyUpload {
            username: username.to_string(),
            pubkey: spki_b64.to_string(),
        };
        self.http
            .post(self.url("/api/pubkey"))
            .bearer_auth(self.token()?)
            .json(&upload)
            .send()
            .await?
            .error_for_status()?;
        tracing::info!(event = "public_key_published", username = %username);
        Ok(())
    }

    pub async fn fetch_users(&self) -> Result<Vec<DirectoryUser>, ClientError> {
        let users = self
            .http
            .get(self.url("/api/users"))
            .bearer_auth(self.token()?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(users)
    }
}

#[async_trait]
impl DirectoryService for ApiClient {
    async fn fetch_public_keys(&self) -> Result<DirectoryDump, ClientError> {
        let dump = self
            .http
            .get(self.url("/api/public_keys"))
            .bearer_auth(self.token()?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(dump)
    }
}

#[async_trait]
impl PersistenceService for ApiClient {
    async fn store_message(&self, req: &StoreMessageRequest) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/api/messages"))
            .bearer_auth(self.token()?)
            .json(req)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(ClientError::Persistence(format!("{status}: {detail}")));
        }
        Ok(())
    }

    async fn fetch_history(&self, peer: &str) -> Result<Vec<HistoryRecord>, ClientError> {
        let body: HistoryResponse = self
            .http
            .get(self.url(&format!("/api/messages/{peer}")))
            .bearer_auth(self.token()?)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalised() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.url("/api/users"), "http://localhost:8000/api/users");
    }

    #[test]
    fn requests_require_a_token() {
        let client = ApiClient::new("http://localhost:8000");
        assert!(matches!(client.token(), Err(ClientError::Auth(_))));
        client.set_token(Some("t".into()));
        assert_eq!(client.token().unwrap(), "t");
    }
}
