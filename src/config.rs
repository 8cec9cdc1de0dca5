use std::path::Path;

use tracing::{debug, info};

pub const URL_VAR: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const KEY_VAR: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing store credential: {0} is not set or empty")]
    MissingVar(&'static str),
}

/// Connection settings for the hosted table store.
#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values
    /// count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let base_url = read(URL_VAR)?;
        let api_key = read(KEY_VAR)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Loads `KEY=value` pairs from `path` into the process environment when the
/// file exists. Variables already set are left alone.
pub fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => info!(path = %path.display(), "loaded env file"),
        Err(err) => debug!(path = %path.display(), error = %err, "env file not loaded"),
    }
}
