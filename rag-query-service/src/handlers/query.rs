use crate::models::{QueryRequest, QueryResponse, NOT_JSON, NO_QUESTION};
use crate::services::QaPipeline;
use axum::{
    body::Bytes,
    http::{header, HeaderMap},
    Extension, Json,
};
use service_core::error::AppError;
use std::sync::Arc;
use validator::Validate;

/// Handler: POST /query
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/query \
///   -H 'content-type: application/json' \
///   -d '{"question":"What is the capital of France?"}'
/// ```
pub async fn query(
    Extension(pipeline): Extension<Arc<QaPipeline>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<QueryResponse>, AppError> {
    if !is_json(&headers) {
        tracing::warn!("Request received without JSON content");
        return Err(AppError::BadRequest(NOT_JSON.to_string()));
    }

    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Request body is not valid JSON");
        AppError::BadRequest(NOT_JSON.to_string())
    })?;

    let request = QueryRequest::from_json(&value);
    if let Err(errors) = request.validate() {
        tracing::warn!(%errors, "Request received without question");
        return Err(AppError::BadRequest(NO_QUESTION.to_string()));
    }
    let question = request.question.unwrap_or_default();

    tracing::info!(question = %question, "Processing question");

    match pipeline.invoke(&question).await {
        Ok(result) => {
            tracing::info!(sources = result.sources.len(), "Successfully processed question");
            Ok(Json(result.into()))
        }
        Err(e) => {
            tracing::error!(question = %question, error = %e, "Error processing question");
            Err(AppError::InternalError(e.to_string()))
        }
    }
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}
