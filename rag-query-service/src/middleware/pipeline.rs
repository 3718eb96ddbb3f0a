use crate::startup::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

/// Runs before every routed request: makes sure the QA pipeline exists and
/// hands it to the handler as an `Extension<Arc<QaPipeline>>`.
///
/// Once the pipeline is ready this is a cheap lookup.
pub async fn ensure_pipeline(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let pipeline = state.pipeline.get_or_init().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize QA pipeline");
        AppError::InternalError(e.to_string())
    })?;

    req.extensions_mut().insert(pipeline);
    Ok(next.run(req).await)
}
