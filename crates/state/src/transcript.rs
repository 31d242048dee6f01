//! Chat transcript entries, as stored in the session document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a transcript line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Human,
    Bot,
    Ai,
}

/// How a transcript line is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Bubble {
    ChatBubble,
    WhatsappLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessage {
    pub user_type: Author,
    pub bubble_type: Bubble,
    pub text: String,
    #[serde(default)]
    pub link: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptMessage {
    /// A plain chat bubble stamped now.
    pub fn chat(author: Author, text: impl Into<String>) -> Self {
        Self {
            user_type: author,
            bubble_type: Bubble::ChatBubble,
            text: text.into(),
            link: None,
            timestamp: Utc::now(),
        }
    }

    /// A WhatsApp link bubble stamped now.
    pub fn whatsapp_link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            user_type: Author::Ai,
            bubble_type: Bubble::WhatsappLink,
            text: text.into(),
            link: Some(url.into()),
            timestamp: Utc::now(),
        }
    }
}
