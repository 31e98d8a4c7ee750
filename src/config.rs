// src/config.rs

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use url::Url;

use crate::error::AppError;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_env_with(None)
    }

    /// Like `from_env`, but an explicit base URL (e.g. from the command line)
    /// takes the place of `FORUM_API_BASE_URL` before anything is validated.
    pub fn from_env_with(api_base_url: Option<&str>) -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok(), api_base_url)
    }

    fn from_lookup<F>(lookup: F, api_override: Option<&str>) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = match api_override {
            Some(api) => api.to_string(),
            None => lookup("FORUM_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        };

        let session_dir = lookup("FORUM_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".forum"));

        let log_dir = lookup("FORUM_LOG_DIR").map(PathBuf::from);

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Self::new(&api_base_url, session_dir, log_dir, rust_log)
    }

    /// Builds a config with an explicit base URL, trimming any trailing slash.
    pub fn new(
        api_base_url: &str,
        session_dir: PathBuf,
        log_dir: Option<PathBuf>,
        rust_log: String,
    ) -> Result<Self, AppError> {
        Url::parse(api_base_url).map_err(|e| {
            AppError::Config(format!("Invalid API base URL '{}': {}", api_base_url, e))
        })?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            session_dir,
            log_dir,
            rust_log,
        })
    }
}
