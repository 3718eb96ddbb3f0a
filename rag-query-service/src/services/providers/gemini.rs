//! Gemini text generation through the Vertex AI `generateContent` API.

use super::{error_from_response, ProviderError, TextGenerator};
use crate::services::auth::TokenProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    /// Base URL override; defaults to the regional aiplatform host.
    pub endpoint: Option<String>,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig, client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn api_url(&self) -> String {
        let base = match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.config.location),
        };
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base, self.config.project_id, self.config.location, self.config.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiTextProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let token = self.tokens.access_token().await?;

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Vertex AI Gemini"
        );

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini", response).await);
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        extract_answer(api_response)
    }
}

fn extract_answer(response: GenerateContentResponse) -> Result<String, ProviderError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("Gemini returned no candidates".to_string()))?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ProviderError::ContentFiltered);
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<String>())
        .unwrap_or_default();

    Ok(text)
}

// ============================================================================
// Vertex AI Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}
