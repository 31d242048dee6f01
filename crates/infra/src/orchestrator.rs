//! Applies assistant replies to the store.

use std::sync::Arc;

use fenestra_ai::{AiReply, Instruction, decode};
use fenestra_state::{StateStore, UpdateOutcome};

/// What a reply ended up changing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Applied {
    ProductChoice(UpdateOutcome),
    UserData(UpdateOutcome),
    Nothing,
}

/// Routes decoded instructions to the store.
///
/// Product choices go through the same update path as clicks, so the
/// cascade rules apply identically.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<StateStore>,
}

impl Orchestrator {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    pub async fn handle_reply(&self, reply: &AiReply) -> Applied {
        match decode(reply.data.as_ref()) {
            Instruction::ProductChoice(patch) => {
                tracing::info!(fields = patch.len(), "applying assistant product choice");
                Applied::ProductChoice(self.store.update_product_choice(&patch).await)
            }
            Instruction::UserData(patch) => {
                tracing::info!(
                    talk_to_human = ?patch.talk_to_human,
                    "applying assistant user data"
                );
                Applied::UserData(self.store.update_user_data(&patch).await)
            }
            Instruction::None => {
                tracing::debug!(status = ?reply.status, "assistant reply carries no instruction");
                Applied::Nothing
            }
            Instruction::Unrecognized { reason } => {
                tracing::warn!(%reason, "ignoring unrecognized assistant instruction");
                Applied::Nothing
            }
        }
    }
}
