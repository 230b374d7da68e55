//! Quest System Module
//!
//! Quest definitions, per-player quest progress, and the engine that enforces
//! level gating, single acceptance, and capped objective progress.

pub mod catalog;
pub mod definition;
pub mod engine;
pub mod error;
pub mod state;

pub use catalog::QuestCatalog;
pub use definition::{Objective, Quest, Reward};
pub use engine::QuestEngine;
pub use error::{QuestError, QuestErrorKind};
pub use state::PlayerQuest;
