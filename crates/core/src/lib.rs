//! `fenestra-core`: shared building blocks for the configurator crates.
//!
//! This crate contains **pure** primitives (no IO, no async, no logging setup).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::SessionId;
