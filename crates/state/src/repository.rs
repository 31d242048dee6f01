//! Remote session persistence.
//!
//! The repository mirrors the store into a per-session document and pushes
//! back remote changes. It is a collaborator, never the source of truth: the
//! store notifies its own subscribers before any write is attempted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fenestra_core::SessionId;
use fenestra_engine::Selections;

use crate::snapshot::{AppState, UserData};
use crate::subscription::Subscription;
use crate::transcript::TranscriptMessage;

/// Persisted form of one configurator session.
///
/// Key names match the document layout shared with the assistant backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDocument {
    pub id: SessionId,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "userData", default)]
    pub user_data: UserData,
    #[serde(rename = "product-choice", default)]
    pub product_choice: Selections,
    /// Chat transcript, oldest first. Only ever appended to.
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
}

impl SessionDocument {
    /// Fresh document with empty user data, no selections and no messages.
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            user_data: UserData::default(),
            product_choice: Selections::empty(),
            messages: Vec::new(),
        }
    }
}

/// The mutable part of a session document, written on every store change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(rename = "userData")]
    pub user_data: UserData,
    #[serde(rename = "product-choice")]
    pub product_choice: Selections,
}

impl From<&AppState> for SessionUpdate {
    fn from(state: &AppState) -> Self {
        Self {
            user_data: state.user_data.clone(),
            product_choice: state.product_choice,
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("session {0} already exists")]
    AlreadyExists(SessionId),

    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),
}

/// Session document storage.
///
/// Implementations must be safe to share across tasks.
#[async_trait::async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session document and return it.
    async fn create_session(&self) -> Result<SessionDocument, PersistenceError>;

    /// Overwrite user data and product choice; the transcript is untouched.
    async fn write(&self, id: SessionId, update: SessionUpdate) -> Result<(), PersistenceError>;

    /// Append one line to the session transcript.
    async fn append_message(
        &self,
        id: SessionId,
        message: TranscriptMessage,
    ) -> Result<(), PersistenceError>;

    /// Fetch the current document, if any.
    async fn load(&self, id: SessionId) -> Result<Option<SessionDocument>, PersistenceError>;

    /// Observe a session document.
    ///
    /// If the document exists, its current state is the first snapshot
    /// delivered; every later write follows in order.
    fn watch(&self, id: SessionId) -> Subscription<SessionDocument>;
}

#[async_trait::async_trait]
impl<T> SessionRepository for Arc<T>
where
    T: SessionRepository + ?Sized,
{
    async fn create_session(&self) -> Result<SessionDocument, PersistenceError> {
        (**self).create_session().await
    }

    async fn write(&self, id: SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
        (**self).write(id, update).await
    }

    async fn append_message(
        &self,
        id: SessionId,
        message: TranscriptMessage,
    ) -> Result<(), PersistenceError> {
        (**self).append_message(id, message).await
    }

    async fn load(&self, id: SessionId) -> Result<Option<SessionDocument>, PersistenceError> {
        (**self).load(id).await
    }

    fn watch(&self, id: SessionId) -> Subscription<SessionDocument> {
        (**self).watch(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenestra_engine::{Facet, FacetValue, apply_selection};

    #[test]
    fn document_uses_shared_key_names() {
        let id = SessionId::new();
        let mut doc = SessionDocument::new(id, Utc::now());
        doc.product_choice = apply_selection(
            &doc.product_choice,
            FacetValue::parse(Facet::Category, "porta").unwrap(),
        );

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], id.to_string());
        assert!(json["timestamp"].is_string());
        assert_eq!(json["product-choice"]["categoria"], "porta");
        assert!(json["product-choice"]["sistema"].is_null());
        assert_eq!(json["userData"]["talkToHuman"], false);
        assert_eq!(json["messages"], serde_json::json!([]));

        let back: SessionDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let id = SessionId::new();
        let json = serde_json::json!({
            "id": id.to_string(),
            "timestamp": "2024-05-01T12:00:00Z",
        });
        let doc: SessionDocument = serde_json::from_value(json).unwrap();
        assert_eq!(doc.user_data, UserData::default());
        assert!(doc.product_choice.is_empty());
        assert!(doc.messages.is_empty());
    }
}
