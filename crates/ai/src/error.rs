use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

/// Assistant call failure.
///
/// Only visible inside the client: [`crate::AssistantClient::ask`] converts
/// every variant into the fallback reply.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid assistant input: {0}")]
    InvalidInput(String),

    #[error("assistant transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("assistant reply could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}
