use std::path::PathBuf;

use workshop_client::{ClientConfig, ConfigError};

/// Default location of the persisted session, relative to the working
/// directory.
pub const DEFAULT_SESSION_FILE: &str = ".workshop-session.json";

/// Everything the binary needs to build a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub session_file: PathBuf,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                     |
    /// |------------------------|-----------------------------|
    /// | `API_BASE_URL`         | `http://localhost:8000/api` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                        |
    /// | `SESSION_FILE`         | `.workshop-session.json`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let client = ClientConfig::from_lookup(&lookup)?;
        let session_file = lookup("SESSION_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE));
        Ok(Self {
            client,
            session_file,
        })
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, base_url: Option<String>, session_file: Option<PathBuf>) -> Self {
        if let Some(url) = base_url {
            self.client.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = session_file {
            self.session_file = path;
        }
        self
    }
}
