use rag_query_service::config::RagConfig;
use rag_query_service::startup::Application;
use service_core::config::load_env_file;
use service_core::observability::{init_tracing, otlp_endpoint};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // `.env` must be applied before the log filter and OTLP endpoint are read.
    load_env_file();
    let otlp_endpoint = otlp_endpoint();
    init_tracing("rag-query-service", "info", otlp_endpoint.as_deref());

    let config = RagConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    tracing::info!(
        project = %config.google.project_id,
        location = %config.google.location,
        data_store = %config.search.data_store_id,
        data_store_location = %config.search.data_store_location,
        model = %config.models.model,
        "Configuration loaded"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start application: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    app.run_until_stopped().await
}
