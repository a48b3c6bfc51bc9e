use crate::constants::*;
use std::env;

/// Connection settings for the hosted data service.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: String,
    /// `None` means local-only mode: no sync, no gateway.
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingApiKey,
    InvalidRemoteUrl(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingApiKey => {
                write!(
                    f,
                    "REMOTE_API_KEY environment variable is required when REMOTE_URL is set"
                )
            }
            ConfigError::InvalidRemoteUrl(url) => {
                write!(f, "Invalid remote URL: {}", url)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let data_path =
            env::var("HORMIGA_DATA_PATH").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());

        let remote = match env::var("REMOTE_URL") {
            Ok(url) => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ConfigError::InvalidRemoteUrl(url));
                }
                let api_key = env::var("REMOTE_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;
                Some(RemoteConfig { url, api_key })
            }
            Err(_) => None,
        };

        Ok(Config { data_path, remote })
    }
}
