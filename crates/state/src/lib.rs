//! Session state: the observable store and its persistence collaborator.
//!
//! The in-memory [`StateStore`] is the source of truth. The
//! [`SessionRepository`] behind it is a lagging mirror: writes are attempted
//! after subscribers have been notified, and failures are logged, never
//! surfaced into the render path.

pub mod in_memory;
pub mod repository;
pub mod snapshot;
pub mod store;
pub mod subscription;
pub mod transcript;

pub use in_memory::InMemorySessionRepository;
pub use repository::{PersistenceError, SessionDocument, SessionRepository, SessionUpdate};
pub use snapshot::{AppState, UserData, UserDataPatch};
pub use store::{ListenerId, StateStore, UpdateOutcome};
pub use subscription::Subscription;
pub use transcript::{Author, Bubble, TranscriptMessage};
