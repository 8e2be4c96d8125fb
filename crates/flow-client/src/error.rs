use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}
