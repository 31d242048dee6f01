//! Application layer: configuration, assistant orchestration, specialist
//! hand-off and session wiring.

pub mod config;
pub mod handoff;
pub mod orchestrator;
pub mod presenter;
pub mod session;

pub use config::{AppConfig, ConfigError};
pub use handoff::{HandoffFlow, HandoffStep, whatsapp_link};
pub use orchestrator::{Applied, Orchestrator};
pub use presenter::{ChatMessage, GREETING, Presenter};
pub use session::{Collaborators, ConfiguratorSession, load_catalog};
