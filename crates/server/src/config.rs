use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    /// Expected `email` on inbound requests; also echoed to the evaluator.
    pub email: String,
    /// Shared secret every inbound request must carry.
    pub secret: String,
    pub github_token: String,
    pub github_username: String,
    pub pages_host: String,
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Reads the process environment after loading `.env` when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let llm_api_key = get("LLM_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or(ConfigError::Missing("LLM_API_KEY"))?;

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        Ok(Self {
            email: required("MY_EMAIL")?,
            secret: required("MY_SECRET")?,
            github_token: required("GITHUB_TOKEN")?,
            github_username: required("GITHUB_USERNAME")?,
            pages_host: get("PAGES_HOST").unwrap_or_else(|| "github.io".to_string()),
            llm_api_key,
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| llm::DEFAULT_BASE_URL.to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| llm::DEFAULT_MODEL.to_string()),
            bind_addr,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.bind_addr.set_port(port);
        self
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("github_token", &"<redacted>")
            .field("github_username", &self.github_username)
            .field("pages_host", &self.pages_host)
            .field("llm_api_key", &"<redacted>")
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
