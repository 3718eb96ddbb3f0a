//! Vertex AI Search (Discovery Engine) retriever.
//!
//! Queries the data store's default serving config with extractive answers
//! enabled and turns every extractive answer into one passage, in result
//! order.

use super::{error_from_response, Passage, ProviderError, Retriever};
use crate::services::auth::TokenProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum documents requested per search.
pub const MAX_DOCUMENTS: u32 = 10;
/// Extractive segments per document.
pub const MAX_EXTRACTIVE_SEGMENT_COUNT: u32 = 1;
/// Extractive answers per document.
pub const MAX_EXTRACTIVE_ANSWER_COUNT: u32 = 5;

const SERVING_CONFIG: &str = "default_config";

#[derive(Debug, Clone)]
pub struct VertexSearchConfig {
    pub project_id: String,
    pub data_store_id: String,
    pub data_store_location: String,
    /// Base URL override; defaults to the global or regional discoveryengine host.
    pub endpoint: Option<String>,
}

pub struct VertexSearchRetriever {
    config: VertexSearchConfig,
    client: Client,
    tokens: Arc<dyn TokenProvider>,
}

impl VertexSearchRetriever {
    pub fn new(config: VertexSearchConfig, client: Client, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            config,
            client,
            tokens,
        }
    }

    fn api_url(&self) -> String {
        let location = &self.config.data_store_location;
        let base = match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if location == "global" => "https://discoveryengine.googleapis.com".to_string(),
            None => format!("https://{}-discoveryengine.googleapis.com", location),
        };
        format!(
            "{}/v1/projects/{}/locations/{}/collections/default_collection/dataStores/{}/servingConfigs/{}:search",
            base, self.config.project_id, location, self.config.data_store_id, SERVING_CONFIG
        )
    }
}

fn build_request(query: &str) -> SearchRequest<'_> {
    SearchRequest {
        query,
        page_size: MAX_DOCUMENTS,
        query_expansion_spec: QueryExpansionSpec {
            condition: "DISABLED",
        },
        spell_correction_spec: SpellCorrectionSpec { mode: "AUTO" },
        content_search_spec: ContentSearchSpec {
            extractive_content_spec: ExtractiveContentSpec {
                max_extractive_answer_count: MAX_EXTRACTIVE_ANSWER_COUNT,
                max_extractive_segment_count: MAX_EXTRACTIVE_SEGMENT_COUNT,
            },
        },
    }
}

fn passages_from(response: SearchResponse) -> Vec<Passage> {
    response
        .results
        .into_iter()
        .filter_map(|result| result.document)
        .flat_map(|document| {
            let source = document.id.or(document.name);
            document
                .derived_struct_data
                .map(|data| {
                    let source = data.link.or(source);
                    data.extractive_answers
                        .into_iter()
                        .map(|answer| Passage {
                            content: answer.content,
                            source: source.clone(),
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
        .collect()
}

#[async_trait]
impl Retriever for VertexSearchRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, ProviderError> {
        let token = self.tokens.access_token().await?;

        tracing::debug!(
            data_store = %self.config.data_store_id,
            query_len = query.len(),
            "Sending search request to Vertex AI Search"
        );

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(token)
            .json(&build_request(query))
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response("Vertex AI Search", response).await);
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let passages = passages_from(search);
        tracing::debug!(passages = passages.len(), "Retrieved passages");
        for passage in &passages {
            tracing::trace!(source = ?passage.source, "Passage");
        }

        Ok(passages)
    }
}

// ============================================================================
// Discovery Engine Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    page_size: u32,
    query_expansion_spec: QueryExpansionSpec,
    spell_correction_spec: SpellCorrectionSpec,
    content_search_spec: ContentSearchSpec,
}

#[derive(Debug, Serialize)]
struct QueryExpansionSpec {
    condition: &'static str,
}

#[derive(Debug, Serialize)]
struct SpellCorrectionSpec {
    mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentSearchSpec {
    extractive_content_spec: ExtractiveContentSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractiveContentSpec {
    max_extractive_answer_count: u32,
    max_extractive_segment_count: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    derived_struct_data: Option<DerivedStructData>,
}

/// Struct data keys are snake_case on the wire.
#[derive(Debug, Deserialize)]
struct DerivedStructData {
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    extractive_answers: Vec<ExtractiveAnswer>,
}

#[derive(Debug, Deserialize)]
struct ExtractiveAnswer {
    #[serde(default)]
    content: String,
}
