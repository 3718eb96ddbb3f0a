//! Managed AI service abstractions and implementations.
//!
//! The pipeline only sees the `Retriever` and `TextGenerator` traits, so the
//! Vertex AI backends can be swapped for the mocks in tests.

pub mod gemini;
pub mod mock;
pub mod vertex_search;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success reply from a backend; carries its status and body text.
    #[error("{0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// One retrieved snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// Snippet text handed to the model.
    pub content: String,

    /// Link or id of the document the snippet came from.
    pub source: Option<String>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source: None,
        }
    }
}

/// Trait for search backends (e.g., Vertex AI Search).
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return candidate passages for the query, in the backend's order.
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ProviderError>;
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Map a non-success HTTP response to a provider error.
pub(crate) async fn error_from_response(service: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();

    ProviderError::ApiError(format!("{} API error {}: {}", service, status, error_text))
}
