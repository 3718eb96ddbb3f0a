use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_LOCATION: &str = "us-east1";
pub const DEFAULT_DATA_STORE_LOCATION: &str = "global";
pub const DEFAULT_MODEL: &str = "gemini-1.0-pro";

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub search: SearchConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub project_id: String,
    /// Region of the Vertex AI generation endpoint.
    pub location: String,
    /// Static bearer token; the metadata server is used when absent.
    pub access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub data_store_id: String,
    pub data_store_location: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub endpoint: Option<String>,
}

impl RagConfig {
    /// Load from `.env` and the process environment.
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Unset and empty values count as missing. Every missing required
    /// variable is reported in one error.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let project_id = get("PROJECT_ID");
        let data_store_id = get("DATA_STORE_ID");

        let (project_id, data_store_id) = match (project_id, data_store_id) {
            (Some(project_id), Some(data_store_id)) => (project_id, data_store_id),
            (project_id, data_store_id) => {
                let missing: Vec<&str> = [
                    ("PROJECT_ID", project_id.is_none()),
                    ("DATA_STORE_ID", data_store_id.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();

                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )));
            }
        };

        Ok(RagConfig {
            common,
            google: GoogleConfig {
                project_id,
                location: get_or("LOCATION", DEFAULT_LOCATION),
                access_token: get("GOOGLE_ACCESS_TOKEN"),
            },
            search: SearchConfig {
                data_store_id,
                data_store_location: get_or("DATA_STORE_LOCATION", DEFAULT_DATA_STORE_LOCATION),
                endpoint: get("DISCOVERY_ENGINE_ENDPOINT"),
            },
            models: ModelConfig {
                model: get_or("MODEL", DEFAULT_MODEL),
                endpoint: get("VERTEX_AI_ENDPOINT"),
            },
        })
    }
}
