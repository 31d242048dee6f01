//! Assistant reply envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Shown to the user whenever the assistant cannot be reached.
pub const FALLBACK_MESSAGE: &str = "Sorry, I was unable to connect to the AI service. \
Please check your network connection or try again later.";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

/// What the assistant service answers: a chat message plus optional
/// structured data (`{target, payload}`, `{}` or null).
///
/// `data` stays raw JSON here; [`crate::decode`] turns it into an instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiReply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<JsonValue>,
}

impl AiReply {
    pub fn success(message: impl Into<String>, data: Option<JsonValue>) -> Self {
        Self {
            status: ReplyStatus::Success,
            message: Some(message.into()),
            data,
        }
    }

    /// The reply used in place of any transport or decoding failure.
    pub fn fallback() -> Self {
        Self {
            status: ReplyStatus::Error,
            message: Some(FALLBACK_MESSAGE.to_string()),
            data: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ReplyStatus::Error
    }

    /// Chat text, if the reply carries a non-blank one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}
