//! Google OAuth access tokens for the Vertex AI REST APIs.

use crate::services::providers::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// GCE / Cloud Run metadata server token endpoint.
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the server-reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, ProviderError>;
}

/// Fixed token taken from configuration.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        if self.token.is_empty() {
            return Err(ProviderError::Auth("access token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

/// Default service account credentials from the metadata server.
pub struct MetadataServerTokenProvider {
    client: Client,
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerTokenProvider {
    pub fn new(client: Client) -> Self {
        Self::with_url(client, METADATA_TOKEN_URL)
    }

    pub fn with_url(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| ProviderError::Auth(format!("metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "metadata server returned {}",
                response.status()
            )));
        }

        let token: MetadataToken = response
            .json()
            .await
            .map_err(|e| ProviderError::Auth(format!("malformed token response: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_MARGIN);
        tracing::debug!(expires_in = token.expires_in, "Fetched access token");

        Ok(CachedToken {
            token: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataServerTokenProvider {
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    expires_in: u64,
}
