//! `fenestra-ai`
//!
//! **Responsibility:** boundary to the natural-language assistant.
//!
//! - Sends the user's text and current selections to the assistant service.
//! - Decodes its loosely-shaped replies into a closed [`Instruction`] set.
//! - Never mutates state itself; the orchestrator applies instructions.

pub mod client;
pub mod error;
pub mod instruction;
pub mod reply;

pub use client::{AssistantClient, HttpAssistantClient, ScriptedAssistantClient};
pub use error::{AiError, AiResult};
pub use instruction::{Instruction, decode};
pub use reply::{AiReply, FALLBACK_MESSAGE, ReplyStatus};
