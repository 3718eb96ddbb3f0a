//! Retrieval-augmented question answering.
//!
//! `QaPipeline` runs one retrieval followed by one generation over the
//! "stuffed" context. `LazyPipeline` constructs it on first use and keeps it
//! for the life of the process.

use crate::config::RagConfig;
use crate::services::auth::{MetadataServerTokenProvider, StaticTokenProvider, TokenProvider};
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::vertex_search::{VertexSearchConfig, VertexSearchRetriever};
use crate::services::providers::{Passage, ProviderError, Retriever, TextGenerator};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Generated answer plus the passages it was conditioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
}

pub struct QaPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn TextGenerator>,
}

impl QaPipeline {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Answer `question` from retrieved context. Errors from either client are
    /// returned as-is.
    pub async fn invoke(&self, question: &str) -> Result<QueryResult, ProviderError> {
        let passages = self.retriever.retrieve(question).await?;
        let prompt = stuff_prompt(question, &passages);
        let answer = self.generator.generate(&prompt).await?;

        Ok(QueryResult {
            answer,
            sources: passages.into_iter().map(|p| p.content).collect(),
        })
    }
}

/// Place every passage into a single question-answering prompt.
pub fn stuff_prompt(question: &str, passages: &[Passage]) -> String {
    let context = passages
        .iter()
        .map(|p| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
         {context}\n\n\
         Question: {question}\n\
         Helpful Answer:"
    )
}

/// Constructs a ready pipeline; may fail on credentials or client setup.
#[async_trait]
pub trait PipelineBuilder: Send + Sync {
    async fn build(&self) -> Result<QaPipeline, ProviderError>;
}

/// Builds the Vertex AI Search + Gemini pipeline from configuration.
pub struct VertexPipelineBuilder {
    config: RagConfig,
}

impl VertexPipelineBuilder {
    pub fn new(config: RagConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PipelineBuilder for VertexPipelineBuilder {
    async fn build(&self) -> Result<QaPipeline, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        let tokens: Arc<dyn TokenProvider> = match &self.config.google.access_token {
            Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
            None => Arc::new(MetadataServerTokenProvider::new(client.clone())),
        };

        // Fail construction, not the first query, when credentials are unusable.
        tokens.access_token().await?;

        let retriever = VertexSearchRetriever::new(
            VertexSearchConfig {
                project_id: self.config.google.project_id.clone(),
                data_store_id: self.config.search.data_store_id.clone(),
                data_store_location: self.config.search.data_store_location.clone(),
                endpoint: self.config.search.endpoint.clone(),
            },
            client.clone(),
            tokens.clone(),
        );

        let generator = GeminiTextProvider::new(
            GeminiConfig {
                project_id: self.config.google.project_id.clone(),
                location: self.config.google.location.clone(),
                model: self.config.models.model.clone(),
                endpoint: self.config.models.endpoint.clone(),
            },
            client,
            tokens,
        );

        tracing::info!(
            model = %generator.model(),
            data_store = %self.config.search.data_store_id,
            "Initialized Vertex AI clients"
        );

        Ok(QaPipeline::new(Arc::new(retriever), Arc::new(generator)))
    }
}

/// Process-wide pipeline, built at most once.
///
/// Concurrent first callers wait on a single construction. A failed
/// construction leaves the cell empty so the next caller tries again.
pub struct LazyPipeline {
    cell: OnceCell<Arc<QaPipeline>>,
    builder: Arc<dyn PipelineBuilder>,
}

impl LazyPipeline {
    pub fn new(builder: Arc<dyn PipelineBuilder>) -> Self {
        Self {
            cell: OnceCell::new(),
            builder,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn get_or_init(&self) -> Result<Arc<QaPipeline>, ProviderError> {
        self.cell
            .get_or_try_init(|| async {
                tracing::info!("Initializing QA pipeline");
                self.builder.build().await.map(Arc::new)
            })
            .await
            .map(Arc::clone)
    }
}
