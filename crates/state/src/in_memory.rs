//! In-memory session repository for tests/dev.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, mpsc};

use chrono::Utc;

use fenestra_core::SessionId;

use crate::repository::{PersistenceError, SessionDocument, SessionRepository, SessionUpdate};
use crate::subscription::Subscription;
use crate::transcript::TranscriptMessage;

#[derive(Debug, Default)]
struct Inner {
    documents: HashMap<SessionId, SessionDocument>,
    watchers: HashMap<SessionId, Vec<mpsc::Sender<SessionDocument>>>,
}

impl Inner {
    /// Fan a document out to its watchers, dropping closed channels.
    fn publish(&mut self, doc: &SessionDocument) {
        if let Some(watchers) = self.watchers.get_mut(&doc.id) {
            watchers.retain(|tx| tx.send(doc.clone()).is_ok());
        }
    }
}

/// Session repository backed by a map.
///
/// - No IO
/// - Watchers receive the current document on subscribe, then every write
///   and every appended message
/// - Writes can be made to fail, to exercise the degraded path
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    inner: Mutex<Inner>,
    fail_writes: AtomicBool,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent create, write or append fail with `Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Store a document as if it had been written remotely, notifying watchers.
    pub fn put_remote(&self, doc: SessionDocument) {
        let mut inner = self.lock();
        inner.documents.insert(doc.id, doc.clone());
        inner.publish(&doc);
    }

    /// Current document, synchronously. Test convenience.
    pub fn snapshot(&self, id: SessionId) -> Option<SessionDocument> {
        self.lock().documents.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "writes disabled on in-memory repository".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_session(&self) -> Result<SessionDocument, PersistenceError> {
        self.check_writable()?;

        let doc = SessionDocument::new(SessionId::new(), Utc::now());
        let mut inner = self.lock();
        if inner.documents.contains_key(&doc.id) {
            return Err(PersistenceError::AlreadyExists(doc.id));
        }
        inner.documents.insert(doc.id, doc.clone());
        inner.publish(&doc);
        Ok(doc)
    }

    async fn write(&self, id: SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
        self.check_writable()?;

        let mut inner = self.lock();
        let doc = inner
            .documents
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound(id))?;
        doc.user_data = update.user_data;
        doc.product_choice = update.product_choice;
        let doc = doc.clone();
        inner.publish(&doc);
        Ok(())
    }

    async fn append_message(
        &self,
        id: SessionId,
        message: TranscriptMessage,
    ) -> Result<(), PersistenceError> {
        self.check_writable()?;

        let mut inner = self.lock();
        let doc = inner
            .documents
            .get_mut(&id)
            .ok_or(PersistenceError::NotFound(id))?;
        doc.messages.push(message);
        let doc = doc.clone();
        inner.publish(&doc);
        Ok(())
    }

    async fn load(&self, id: SessionId) -> Result<Option<SessionDocument>, PersistenceError> {
        Ok(self.lock().documents.get(&id).cloned())
    }

    fn watch(&self, id: SessionId) -> Subscription<SessionDocument> {
        let (tx, rx) = mpsc::channel();
        let mut inner = self.lock();
        if let Some(doc) = inner.documents.get(&id) {
            // Receiver is alive in this scope; send cannot fail.
            let _ = tx.send(doc.clone());
        }
        inner.watchers.entry(id).or_default().push(tx);
        Subscription::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::UserData;
    use crate::transcript::Author;
    use fenestra_engine::Selections;

    fn update_with_name(name: &str) -> SessionUpdate {
        SessionUpdate {
            user_data: UserData {
                user_name: Some(name.to_string()),
                ..UserData::default()
            },
            product_choice: Selections::empty(),
        }
    }

    #[tokio::test]
    async fn watch_delivers_current_document_first() {
        let repo = InMemorySessionRepository::new();
        let doc = repo.create_session().await.unwrap();

        let sub = repo.watch(doc.id);
        assert_eq!(sub.try_recv().unwrap(), doc);
        assert!(sub.try_recv().is_err());
    }

    #[tokio::test]
    async fn writes_are_pushed_to_watchers_in_order() {
        let repo = InMemorySessionRepository::new();
        let doc = repo.create_session().await.unwrap();
        let sub = repo.watch(doc.id);
        let _initial = sub.try_recv().unwrap();

        repo.write(doc.id, update_with_name("Ana")).await.unwrap();
        repo.write(doc.id, update_with_name("Bia")).await.unwrap();

        let names: Vec<_> = sub
            .drain()
            .into_iter()
            .map(|d| d.user_data.user_name.unwrap())
            .collect();
        assert_eq!(names, vec!["Ana", "Bia"]);
    }

    #[tokio::test]
    async fn write_to_unknown_session_fails() {
        let repo = InMemorySessionRepository::new();
        let id = SessionId::new();
        let err = repo.write(id, update_with_name("Ana")).await.unwrap_err();
        assert!(matches!(err, PersistenceError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn failing_writes_leave_document_untouched() {
        let repo = InMemorySessionRepository::new();
        let doc = repo.create_session().await.unwrap();

        repo.set_fail_writes(true);
        assert!(matches!(
            repo.write(doc.id, update_with_name("Ana")).await,
            Err(PersistenceError::Unavailable(_))
        ));
        assert!(repo.create_session().await.is_err());
        assert_eq!(repo.load(doc.id).await.unwrap(), Some(doc));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn messages_append_in_order_and_survive_writes() {
        let repo = InMemorySessionRepository::new();
        let doc = repo.create_session().await.unwrap();
        let sub = repo.watch(doc.id);
        let _initial = sub.try_recv().unwrap();

        repo.append_message(doc.id, TranscriptMessage::chat(Author::Bot, "Olá"))
            .await
            .unwrap();
        repo.write(doc.id, update_with_name("Ana")).await.unwrap();
        repo.append_message(doc.id, TranscriptMessage::chat(Author::Human, "janela"))
            .await
            .unwrap();

        let texts: Vec<_> = repo
            .snapshot(doc.id)
            .unwrap()
            .messages
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["Olá", "janela"]);
        assert_eq!(sub.drain().len(), 3);

        let missing = SessionId::new();
        assert!(matches!(
            repo.append_message(missing, TranscriptMessage::chat(Author::Ai, "x")).await,
            Err(PersistenceError::NotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn dropped_watchers_are_pruned() {
        let repo = InMemorySessionRepository::new();
        let doc = repo.create_session().await.unwrap();
        drop(repo.watch(doc.id));

        repo.write(doc.id, update_with_name("Ana")).await.unwrap();
        assert_eq!(repo.lock().watchers[&doc.id].len(), 0);
    }
}
