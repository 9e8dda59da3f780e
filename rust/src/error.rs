use reqwest::StatusCode;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Network or connection error: {0}")]
    ConnectionError(#[from] reqwest::Error),

    /// A required precursor (profile or dates) answered with something other than 200.
    #[error("Unexpected response from {endpoint}: HTTP {status}: {body}")]
    UnexpectedResponse {
        endpoint: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to parse response from {endpoint}: {source}")]
    ParseError {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid header {name}: {msg}")]
    HeaderError { name: String, msg: String },

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl ServiceError {
    pub fn is_unexpected_response(&self) -> bool {
        matches!(self, ServiceError::UnexpectedResponse { .. })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config value: {msg}")]
    InvalidValue { msg: String },
}
