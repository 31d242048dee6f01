//! Observable application state.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fenestra_engine::{SelectionPatch, restart};

use crate::repository::{SessionDocument, SessionRepository, SessionUpdate};
use crate::snapshot::{AppState, UserDataPatch};

type Listener = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Handle returned by [`StateStore::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Whether an update changed the state (and therefore notified and persisted).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Changed,
    Unchanged,
}

impl UpdateOutcome {
    pub fn is_changed(self) -> bool {
        self == UpdateOutcome::Changed
    }
}

/// Single source of truth for the session.
///
/// Updates are serialised: each one computes, notifies and attempts
/// persistence before the next one starts, so the persisted mirror always
/// ends on the latest state. Listeners run synchronously, in registration
/// order, after the state lock is released. A panicking listener is logged
/// and does not stop the others.
/// Persistence runs after notification and only once a session id is known;
/// its failures are logged and never undo the in-memory change.
pub struct StateStore {
    state: Mutex<AppState>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    update_gate: tokio::sync::Mutex<()>,
    repository: Option<Arc<dyn SessionRepository>>,
}

impl StateStore {
    /// Store without a remote mirror.
    pub fn new(initial: AppState) -> Self {
        Self {
            state: Mutex::new(initial),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            update_gate: tokio::sync::Mutex::new(()),
            repository: None,
        }
    }

    /// Store mirrored into `repository` once a session id is set.
    pub fn with_repository(initial: AppState, repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository: Some(repository),
            ..Self::new(initial)
        }
    }

    /// Independent copy of the current state.
    pub fn get_state(&self) -> AppState {
        lock(&self.state).clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Returns `false` if the listener was already gone.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Merge a selection patch into the product choice.
    ///
    /// The patch is folded through the cascade in facet order, so later facets
    /// are reset exactly as if each value had been clicked. A patch that leaves
    /// the choice as it was is a no-op.
    pub async fn update_product_choice(&self, patch: &SelectionPatch) -> UpdateOutcome {
        let _gate = self.update_gate.lock().await;
        let snapshot = {
            let mut state = lock(&self.state);
            let next = patch.apply_to(&state.product_choice);
            if next == state.product_choice {
                None
            } else {
                state.product_choice = next;
                Some(state.clone())
            }
        };
        self.publish(snapshot, "product_choice").await
    }

    /// Merge a user-data patch. No-op when nothing changes.
    pub async fn update_user_data(&self, patch: &UserDataPatch) -> UpdateOutcome {
        let _gate = self.update_gate.lock().await;
        let snapshot = {
            let mut state = lock(&self.state);
            let next = patch.merge_into(&state.user_data);
            if next == state.user_data {
                None
            } else {
                state.user_data = next;
                Some(state.clone())
            }
        };
        self.publish(snapshot, "user_data").await
    }

    /// Clear every selection. Always notifies and persists.
    pub async fn reset_product_choice(&self) {
        let _gate = self.update_gate.lock().await;
        let snapshot = {
            let mut state = lock(&self.state);
            state.product_choice = restart();
            state.clone()
        };
        self.publish(Some(snapshot), "reset").await;
    }

    /// Adopt a remote document as the authoritative state.
    ///
    /// The product choice is normalized on the way in, so a stored document
    /// can never put a conditional facet in place without its requirement.
    /// Notifies listeners but does not write back: the document already is
    /// the persisted state.
    pub fn hydrate(&self, document: SessionDocument) {
        let snapshot = {
            let mut state = lock(&self.state);
            *state = AppState {
                session_id: Some(document.id),
                user_data: document.user_data,
                product_choice: document.product_choice.normalized(),
            };
            state.clone()
        };
        tracing::info!(session_id = %document.id, "state hydrated from session document");
        self.notify(&snapshot);
    }

    async fn publish(&self, snapshot: Option<AppState>, change: &'static str) -> UpdateOutcome {
        let Some(snapshot) = snapshot else {
            tracing::debug!(change, "update left state unchanged");
            return UpdateOutcome::Unchanged;
        };
        self.notify(&snapshot);
        self.persist(&snapshot).await;
        UpdateOutcome::Changed
    }

    fn notify(&self, snapshot: &AppState) {
        // Copy out so listeners can (un)subscribe without deadlocking.
        let listeners: Vec<(ListenerId, Listener)> = lock(&self.listeners).clone();
        for (id, listener) in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(snapshot))).is_err() {
                tracing::error!(listener = id.0, "state listener panicked");
            }
        }
    }

    async fn persist(&self, snapshot: &AppState) {
        let Some(repository) = &self.repository else {
            return;
        };
        let Some(session_id) = snapshot.session_id else {
            tracing::debug!("no session yet; skipping persistence");
            return;
        };
        if let Err(err) = repository.write(session_id, SessionUpdate::from(snapshot)).await {
            tracing::warn!(%session_id, error = %err, "failed to persist session state");
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &*lock(&self.state))
            .field("listeners", &self.listener_count())
            .field("persistent", &self.repository.is_some())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use crate::in_memory::InMemorySessionRepository;
    use crate::repository::PersistenceError;
    use crate::subscription::Subscription;
    use crate::transcript::TranscriptMessage;
    use fenestra_core::SessionId;
    use fenestra_engine::{Facet, FacetValue, Selections};

    /// Delegates to the in-memory repository; the first write stalls.
    #[derive(Default)]
    struct SlowFirstWrite {
        inner: InMemorySessionRepository,
        stalled: AtomicBool,
    }

    #[async_trait::async_trait]
    impl SessionRepository for SlowFirstWrite {
        async fn create_session(&self) -> Result<SessionDocument, PersistenceError> {
            self.inner.create_session().await
        }

        async fn write(&self, id: SessionId, update: SessionUpdate) -> Result<(), PersistenceError> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.inner.write(id, update).await
        }

        async fn append_message(
            &self,
            id: SessionId,
            message: TranscriptMessage,
        ) -> Result<(), PersistenceError> {
            self.inner.append_message(id, message).await
        }

        async fn load(&self, id: SessionId) -> Result<Option<SessionDocument>, PersistenceError> {
            self.inner.load(id).await
        }

        fn watch(&self, id: SessionId) -> Subscription<SessionDocument> {
            self.inner.watch(id)
        }
    }

    fn value(facet: Facet, code: &str) -> FacetValue {
        FacetValue::parse(facet, code).unwrap()
    }

    fn recorder(store: &StateStore) -> Arc<Mutex<Vec<AppState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |s| sink.lock().unwrap().push(s.clone()));
        seen
    }

    async fn persistent_store() -> (StateStore, Arc<InMemorySessionRepository>, SessionDocument) {
        let repo = Arc::new(InMemorySessionRepository::new());
        let doc = repo.create_session().await.unwrap();
        let store = StateStore::with_repository(AppState::default(), repo.clone());
        store.hydrate(doc.clone());
        (store, repo, doc)
    }

    #[tokio::test]
    async fn identical_update_does_not_notify() {
        let store = StateStore::default();
        let seen = recorder(&store);
        let patch = SelectionPatch::new().set(value(Facet::Category, "porta"));

        assert_eq!(store.update_product_choice(&patch).await, UpdateOutcome::Changed);
        assert_eq!(store.update_product_choice(&patch).await, UpdateOutcome::Unchanged);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn product_patch_cascades_in_facet_order() {
        let store = StateStore::default();
        store
            .update_product_choice(
                &SelectionPatch::new()
                    .set(value(Facet::Category, "porta"))
                    .set(value(Facet::OpeningSystem, "giro"))
                    .set(value(Facet::FillMaterial, "lambri")),
            )
            .await;

        store
            .update_product_choice(&SelectionPatch::new().set(value(Facet::OpeningSystem, "porta-correr")))
            .await;

        let choice = store.get_state().product_choice;
        assert_eq!(choice.get(Facet::Category), Some(value(Facet::Category, "porta")));
        assert_eq!(choice.get(Facet::OpeningSystem), Some(value(Facet::OpeningSystem, "porta-correr")));
        assert_eq!(choice.get(Facet::FillMaterial), None);
    }

    #[tokio::test]
    async fn get_state_returns_an_independent_copy() {
        let store = StateStore::default();
        let mut copy = store.get_state();
        copy.user_data.user_name = Some("Mallory".into());
        copy.product_choice = apply(copy.product_choice, value(Facet::Category, "janela"));

        assert_eq!(store.get_state(), AppState::default());
    }

    fn apply(s: Selections, v: FacetValue) -> Selections {
        fenestra_engine::apply_selection(&s, v)
    }

    #[tokio::test]
    async fn listeners_run_in_registration_order_and_survive_a_panic() {
        let store = StateStore::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        store.subscribe(move |_| first.lock().unwrap().push("first"));
        store.subscribe(|_| panic!("listener failure"));
        let third = Arc::clone(&order);
        store.subscribe(move |_| third.lock().unwrap().push("third"));

        store.update_user_data(&UserDataPatch::talk_to_human(true)).await;
        assert_eq!(*order.lock().unwrap(), vec!["first", "third"]);
        assert!(store.get_state().user_data.talk_to_human);
    }

    #[tokio::test]
    async fn unsubscribed_listener_is_not_called() {
        let store = StateStore::default();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.reset_product_choice().await;
        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_notifies_even_when_already_empty() {
        let store = StateStore::default();
        let seen = recorder(&store);
        store.reset_product_choice().await;
        store.reset_product_choice().await;
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn persistence_is_skipped_without_a_session() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let store = StateStore::with_repository(AppState::default(), repo.clone());
        let seen = recorder(&store);

        store
            .update_user_data(&UserDataPatch {
                user_name: Some("Ana".into()),
                ..UserDataPatch::default()
            })
            .await;

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn changes_are_mirrored_into_the_session_document() {
        let (store, repo, doc) = persistent_store().await;
        store
            .update_product_choice(&SelectionPatch::new().set(value(Facet::Category, "janela")))
            .await;

        let persisted = repo.snapshot(doc.id).unwrap();
        assert_eq!(persisted.product_choice, store.get_state().product_choice);
        assert_eq!(persisted.created_at, doc.created_at);
    }

    #[tokio::test]
    async fn failed_write_keeps_in_memory_change() {
        let (store, repo, doc) = persistent_store().await;
        let seen = recorder(&store);
        repo.set_fail_writes(true);

        let outcome = store
            .update_product_choice(&SelectionPatch::new().set(value(Facet::Category, "porta")))
            .await;

        assert!(outcome.is_changed());
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(
            store.get_state().product_choice.get(Facet::Category),
            Some(value(Facet::Category, "porta"))
        );
        assert!(repo.snapshot(doc.id).unwrap().product_choice.is_empty());
    }

    #[tokio::test]
    async fn hydrate_overrides_defaults_and_notifies() {
        let store = StateStore::new(AppState {
            product_choice: apply(Selections::empty(), value(Facet::Category, "janela")),
            ..AppState::default()
        });
        let seen = recorder(&store);

        let mut doc = SessionDocument::new(fenestra_core::SessionId::new(), chrono::Utc::now());
        doc.user_data.user_email = Some("ana@example.com".into());
        store.hydrate(doc.clone());

        let state = store.get_state();
        assert_eq!(state.session_id, Some(doc.id));
        assert!(state.product_choice.is_empty());
        assert_eq!(state.user_data.user_email.as_deref(), Some("ana@example.com"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_updates_persist_the_latest_state() {
        let repo = Arc::new(SlowFirstWrite::default());
        let doc = repo.create_session().await.unwrap();
        let store = StateStore::with_repository(AppState::default(), repo.clone());
        store.hydrate(doc.clone());

        let window = SelectionPatch::new().set(value(Facet::Category, "janela"));
        let door = SelectionPatch::new().set(value(Facet::Category, "porta"));
        tokio::join!(
            store.update_product_choice(&window),
            store.update_product_choice(&door)
        );

        let porta = Some(value(Facet::Category, "porta"));
        assert_eq!(store.get_state().product_choice.get(Facet::Category), porta);
        let persisted = repo.inner.snapshot(doc.id).unwrap();
        assert_eq!(persisted.product_choice.get(Facet::Category), porta);
    }

    #[tokio::test]
    async fn hydrate_drops_a_drive_the_shutter_answer_does_not_allow() {
        let store = StateStore::default();
        let mut doc = SessionDocument::new(SessionId::new(), chrono::Utc::now());
        doc.product_choice = Selections::empty()
            .with(value(Facet::Category, "janela"))
            .with(value(Facet::Shutter, "nao"))
            .with(value(Facet::ShutterDrive, "motorizada"));
        store.hydrate(doc);

        let choice = store.get_state().product_choice;
        assert!(!choice.is_set(Facet::ShutterDrive));
        assert_eq!(choice.get(Facet::Shutter), Some(value(Facet::Shutter, "nao")));
    }
}
