//! Presentation collaborator.

use fenestra_engine::ConfiguratorView;
use fenestra_state::{Author, Bubble, TranscriptMessage};

/// Greeting posted when a session starts.
pub const GREETING: &str = "Olá, como eu posso ajudar?";

/// A line in the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatMessage {
    /// Text typed by the user.
    User(String),
    /// Configurator prompts and hand-off questions.
    Bot(String),
    /// Assistant replies.
    Assistant(String),
    /// Link to a specialist conversation.
    Link { text: String, url: String },
}

impl ChatMessage {
    pub fn text(&self) -> &str {
        match self {
            ChatMessage::User(text) | ChatMessage::Bot(text) | ChatMessage::Assistant(text) => text,
            ChatMessage::Link { text, .. } => text,
        }
    }
}

impl From<&ChatMessage> for TranscriptMessage {
    fn from(message: &ChatMessage) -> Self {
        match message {
            ChatMessage::User(text) => TranscriptMessage::chat(Author::Human, text.clone()),
            ChatMessage::Bot(text) => TranscriptMessage::chat(Author::Bot, text.clone()),
            ChatMessage::Assistant(text) => TranscriptMessage::chat(Author::Ai, text.clone()),
            ChatMessage::Link { text, url } => TranscriptMessage::whatsapp_link(text.clone(), url.clone()),
        }
    }
}

impl From<&TranscriptMessage> for ChatMessage {
    fn from(message: &TranscriptMessage) -> Self {
        match (message.bubble_type, message.user_type) {
            (Bubble::WhatsappLink, _) => ChatMessage::Link {
                text: message.text.clone(),
                url: message.link.clone().unwrap_or_default(),
            },
            (Bubble::ChatBubble, Author::Human) => ChatMessage::User(message.text.clone()),
            (Bubble::ChatBubble, Author::Bot) => ChatMessage::Bot(message.text.clone()),
            (Bubble::ChatBubble, Author::Ai) => ChatMessage::Assistant(message.text.clone()),
        }
    }
}

/// Draws the configurator and the chat.
///
/// Called synchronously from store notifications; implementations should not
/// block for long.
pub trait Presenter: Send + Sync {
    fn show(&self, view: &ConfiguratorView);

    fn say(&self, message: &ChatMessage);
}
