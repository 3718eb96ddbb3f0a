use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::path::Path;

/// Load `.env` from the working directory, overriding the process
/// environment. Call before anything reads the environment, logging included.
pub fn load_env_file() -> bool {
    dotenvy::dotenv_override().is_ok()
}

/// Load a specific env file with override. Returns whether it was read.
pub fn load_env_file_from(path: impl AsRef<Path>) -> bool {
    dotenvy::from_path_override(path).is_ok()
}

/// Server settings shared by every binary in the workspace.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load from an optional `configuration` file and `APP__*` variables.
    ///
    /// A `.env` file, when present, overrides values already in the process
    /// environment.
    pub fn load() -> Result<Self, AppError> {
        load_env_file();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
