//! Aarya core: turn classification, reply policy and mood journaling for a
//! conversational mood companion.

pub mod companion;
pub mod error;
pub mod fs_manager;
pub mod models;
pub mod preflight;

#[cfg(test)]
mod tests;

pub use companion::{Companion, ConversationSession, SessionRegistry, TurnOutcome};
pub use error::AppError;
pub use models::AssistantConfig;
