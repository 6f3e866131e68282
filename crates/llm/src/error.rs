use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Model rate limited")]
    RateLimited,

    #[error("Model returned an empty completion")]
    EmptyCompletion,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type LlmResult<T> = Result<T, LlmError>;
