//! A configurator session: store, engine, assistant and presenter wired
//! together.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use fenestra_ai::AssistantClient;
use fenestra_catalog::Catalog;
use fenestra_core::{DomainResult, SessionId};
use fenestra_engine::{ConfiguratorView, Facet, FacetValue, SelectionPatch, render, resolve};
use fenestra_state::{
    AppState, ListenerId, SessionDocument, SessionRepository, StateStore, Subscription,
    TranscriptMessage, UpdateOutcome, UserDataPatch,
};

use crate::config::AppConfig;
use crate::handoff::{HandoffFlow, HandoffStep, LINK_TEXT};
use crate::orchestrator::{Applied, Orchestrator};
use crate::presenter::{ChatMessage, GREETING, Presenter};

/// Load the configured catalog, or `None` if it cannot be loaded.
///
/// A missing catalog is not fatal to the session: it renders as unavailable.
pub fn load_catalog(config: &AppConfig) -> Option<Catalog> {
    let loaded = match &config.catalog_path {
        Some(path) => Catalog::from_path(path),
        None => Catalog::embedded(),
    };
    match loaded {
        Ok(catalog) => {
            tracing::info!(products = catalog.len(), "catalog loaded");
            Some(catalog)
        }
        Err(err) => {
            tracing::error!(error = %err, "catalog unavailable");
            None
        }
    }
}

/// External collaborators a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn SessionRepository>,
    pub assistant: Arc<dyn AssistantClient>,
    pub presenter: Arc<dyn Presenter>,
}

/// Chat lines said by this session, queued until they are appended to the
/// session document.
struct Transcript {
    presenter: Arc<dyn Presenter>,
    unsaved: Mutex<Vec<TranscriptMessage>>,
}

impl Transcript {
    fn say(&self, message: ChatMessage) {
        self.presenter.say(&message);
        lock(&self.unsaved).push(TranscriptMessage::from(&message));
    }

    fn take_unsaved(&self) -> Vec<TranscriptMessage> {
        std::mem::take(&mut *lock(&self.unsaved))
    }
}

/// Transcript lines pushed by the session document.
#[derive(Default)]
struct RemoteTranscript {
    subscription: Option<Subscription<SessionDocument>>,
    /// Document lines already accounted for.
    seen: usize,
    /// Lines this session appended that no snapshot has shown yet.
    own: VecDeque<TranscriptMessage>,
}

/// Re-resolves and re-renders on every store change.
struct Renderer {
    catalog: Option<Catalog>,
    product_base_url: String,
    transcript: Arc<Transcript>,
    last_prompt: Mutex<Option<String>>,
}

impl Renderer {
    fn view(&self, state: &AppState) -> ConfiguratorView {
        match &self.catalog {
            Some(catalog) => render(&resolve(&state.product_choice, catalog), &self.product_base_url),
            None => ConfiguratorView::unavailable(),
        }
    }

    fn on_state(&self, state: &AppState) {
        let view = self.view(state);
        self.transcript.presenter.show(&view);

        let prompt = view.prompt().map(str::to_string);
        let announce = {
            let mut last = lock(&self.last_prompt);
            let changed = *last != prompt;
            *last = prompt.clone();
            changed
        };
        if let (true, Some(prompt)) = (announce, prompt) {
            self.transcript.say(ChatMessage::Bot(prompt));
        }
    }
}

pub struct ConfiguratorSession {
    store: Arc<StateStore>,
    orchestrator: Orchestrator,
    assistant: Arc<dyn AssistantClient>,
    repository: Arc<dyn SessionRepository>,
    transcript: Arc<Transcript>,
    remote: Mutex<RemoteTranscript>,
    renderer: Arc<Renderer>,
    handoff: Mutex<HandoffFlow>,
    listener: ListenerId,
}

impl ConfiguratorSession {
    /// Create the session document, hydrate from its first snapshot and
    /// render the first question. The greeting and the first question are
    /// the first two lines of the stored transcript.
    ///
    /// If the session document cannot be created the session still runs,
    /// without persistence.
    pub async fn start(config: &AppConfig, catalog: Option<Catalog>, collaborators: Collaborators) -> Self {
        let Collaborators {
            repository,
            assistant,
            presenter,
        } = collaborators;

        let store = Arc::new(StateStore::with_repository(
            AppState::default(),
            Arc::clone(&repository),
        ));
        let transcript = Arc::new(Transcript {
            presenter,
            unsaved: Mutex::new(Vec::new()),
        });
        let renderer = Arc::new(Renderer {
            catalog,
            product_base_url: config.product_base_url.clone(),
            transcript: Arc::clone(&transcript),
            last_prompt: Mutex::new(None),
        });
        let engine = Arc::clone(&renderer);
        let listener = store.subscribe(move |state| engine.on_state(state));

        transcript.say(ChatMessage::Bot(GREETING.to_string()));

        let mut remote = RemoteTranscript::default();
        match repository.create_session().await {
            Ok(created) => {
                tracing::info!(session_id = %created.id, "session created");
                let (document, subscription) =
                    first_snapshot(repository.as_ref(), created, config.hydration_timeout).await;
                remote.seen = document.messages.len();
                remote.subscription = subscription;
                store.hydrate(document);
            }
            Err(err) => {
                tracing::error!(error = %err, "could not create session; continuing without persistence");
                renderer.on_state(&store.get_state());
            }
        }

        let session = Self {
            orchestrator: Orchestrator::new(Arc::clone(&store)),
            store,
            assistant,
            repository,
            transcript,
            remote: Mutex::new(remote),
            renderer,
            handoff: Mutex::new(HandoffFlow::new(config.handoff_phone.clone())),
            listener,
        };
        session.save_transcript().await;
        session
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.store.get_state().session_id
    }

    pub fn state(&self) -> AppState {
        self.store.get_state()
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// What the configurator currently shows.
    pub fn view(&self) -> ConfiguratorView {
        self.renderer.view(&self.store.get_state())
    }

    /// An option card was clicked.
    pub async fn click(&self, facet: Facet, code: &str) -> DomainResult<UpdateOutcome> {
        let value = FacetValue::parse(facet, code)?;
        tracing::debug!(%facet, value = %value, "option selected");
        let outcome = self
            .store
            .update_product_choice(&SelectionPatch::new().set(value))
            .await;
        self.after_change().await;
        Ok(outcome)
    }

    /// Clear all selections and start over.
    pub async fn restart(&self) {
        self.store.reset_product_choice().await;
        self.after_change().await;
    }

    /// The user asked for a specialist from a product card.
    pub async fn request_specialist(&self) {
        self.store
            .update_user_data(&UserDataPatch::talk_to_human(true))
            .await;
        self.after_change().await;
    }

    /// Handle a chat message. Blank input is ignored (`None`).
    pub async fn chat(&self, text: &str) -> Option<Applied> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.transcript.say(ChatMessage::User(text.to_string()));

        let selections = self.store.get_state().product_choice;
        let reply = self.assistant.ask(text, &selections).await;
        let applied = self.orchestrator.handle_reply(&reply).await;
        self.after_change().await;

        // While handing off, the hand-off questions speak instead of the assistant.
        if !self.store.get_state().user_data.talk_to_human {
            match reply.message() {
                Some(message) => self.transcript.say(ChatMessage::Assistant(message.to_string())),
                None => tracing::warn!("assistant reply has no message to show"),
            }
        }
        self.save_transcript().await;
        Some(applied)
    }

    /// Show transcript lines that other writers appended to the session
    /// document since the last call. Returns how many were shown.
    ///
    /// Lines this session wrote itself are already on screen and skipped.
    pub fn sync_transcript(&self) -> usize {
        let mut remote = lock(&self.remote);
        let Some(latest) = remote.subscription.as_ref().and_then(|s| s.drain().pop()) else {
            return 0;
        };
        let RemoteTranscript { seen, own, .. } = &mut *remote;
        let mut shown = 0;
        for message in latest.messages.iter().skip(*seen) {
            if let Some(pos) = own.iter().position(|m| m == message) {
                own.remove(pos);
                continue;
            }
            self.transcript.presenter.say(&ChatMessage::from(message));
            shown += 1;
        }
        *seen = (*seen).max(latest.messages.len());
        shown
    }

    /// Append queued chat lines to the session document, in order.
    ///
    /// Without a session the lines stay local. A failed append is logged
    /// and the line is not retried.
    async fn save_transcript(&self) {
        let unsaved = self.transcript.take_unsaved();
        if unsaved.is_empty() {
            return;
        }
        let Some(session_id) = self.session_id() else {
            tracing::debug!(lines = unsaved.len(), "no session yet; transcript kept local");
            return;
        };
        for message in unsaved {
            lock(&self.remote).own.push_back(message.clone());
            if let Err(err) = self.repository.append_message(session_id, message.clone()).await {
                tracing::warn!(%session_id, error = %err, "failed to persist chat line");
                let mut remote = lock(&self.remote);
                if let Some(pos) = remote.own.iter().position(|m| *m == message) {
                    remote.own.remove(pos);
                }
            }
        }
    }

    async fn after_change(&self) {
        let step = lock(&self.handoff).evaluate(&self.store.get_state());
        match step {
            None => {}
            Some(HandoffStep::Ask(question)) => {
                self.transcript.say(ChatMessage::Bot(question.to_string()));
            }
            Some(HandoffStep::Connect { url }) => {
                tracing::info!("handing off to a specialist");
                self.transcript.say(ChatMessage::Link {
                    text: LINK_TEXT.to_string(),
                    url,
                });
                self.store
                    .update_user_data(&UserDataPatch::talk_to_human(false))
                    .await;
                lock(&self.handoff).evaluate(&self.store.get_state());
            }
        }
        self.save_transcript().await;
    }
}

impl Drop for ConfiguratorSession {
    fn drop(&mut self) {
        self.store.unsubscribe(self.listener);
    }
}

/// Wait for the first pushed snapshot of a new session document, handing
/// the subscription back for later snapshots.
///
/// Falls back to the document as created if none arrives in time.
async fn first_snapshot(
    repository: &dyn SessionRepository,
    created: SessionDocument,
    timeout: Duration,
) -> (SessionDocument, Option<Subscription<SessionDocument>>) {
    let subscription = repository.watch(created.id);
    let waited = tokio::task::spawn_blocking(move || {
        let first = subscription.recv_timeout(timeout);
        (first, subscription)
    })
    .await;
    match waited {
        Ok((Ok(snapshot), subscription)) => (snapshot, Some(subscription)),
        Ok((Err(err), subscription)) => {
            tracing::warn!(session_id = %created.id, error = %err, "no session snapshot received; using created document");
            (created, Some(subscription))
        }
        Err(err) => {
            tracing::error!(session_id = %created.id, error = %err, "snapshot wait failed");
            (created, None)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
