//! HTTP handlers for the RAG query service.

pub mod query;
