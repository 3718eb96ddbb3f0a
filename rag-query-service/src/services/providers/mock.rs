//! Mock provider implementations for testing.

use super::{Passage, ProviderError, Retriever, TextGenerator};
use crate::services::pipeline::{PipelineBuilder, QaPipeline};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Mock retriever returning fixed passages, or a fixed failure.
pub struct MockRetriever {
    passages: Vec<String>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockRetriever {
    pub fn new<S: Into<String>>(passages: impl IntoIterator<Item = S>) -> Self {
        Self {
            passages: passages.into_iter().map(Into::into).collect(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with `ProviderError::ApiError(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            passages: Vec::new(),
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<Passage>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(ProviderError::ApiError(message.clone()));
        }

        Ok(self.passages.iter().map(Passage::new).collect())
    }
}

/// Mock generator returning a fixed answer, or a fixed failure.
pub struct MockGenerator {
    answer: String,
    failure: Option<String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            failure: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Every call fails with `ProviderError::ApiError(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: String::new(),
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .map(|prompt| prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }

        if let Some(message) = &self.failure {
            return Err(ProviderError::ApiError(message.clone()));
        }

        Ok(self.answer.clone())
    }
}

/// Builds pipelines over shared mock clients and counts constructions.
pub struct MockPipelineBuilder {
    retriever: Arc<MockRetriever>,
    generator: Arc<MockGenerator>,
    failures_left: AtomicUsize,
    builds: AtomicUsize,
}

impl MockPipelineBuilder {
    pub fn new(retriever: Arc<MockRetriever>, generator: Arc<MockGenerator>) -> Self {
        Self {
            retriever,
            generator,
            failures_left: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
        }
    }

    /// The first `count` builds fail with `ProviderError::NotConfigured`.
    pub fn failing_first(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Construction attempts, failed ones included.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineBuilder for MockPipelineBuilder {
    async fn build(&self) -> Result<QaPipeline, ProviderError> {
        self.builds.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProviderError::NotConfigured(
                "mock credentials unavailable".to_string(),
            ));
        }

        Ok(QaPipeline::new(self.retriever.clone(), self.generator.clone()))
    }
}
