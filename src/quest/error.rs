//! Quest engine failures.

use thiserror::Error;

/// Broad failure category, used by the transport layer to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestErrorKind {
    NotFound,
    Forbidden,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestError {
    #[error("Quest '{0}' not found")]
    QuestNotFound(String),

    #[error("Player '{player_id}' has not accepted quest '{quest_id}'")]
    NotAccepted { player_id: String, quest_id: String },

    #[error("Objective '{objective_id}' not found for quest '{quest_id}'")]
    ObjectiveNotFound { quest_id: String, objective_id: String },

    #[error("Player level {player_level} does not meet level requirement {required}")]
    LevelTooLow { required: i32, player_level: i32 },

    #[error("Player '{player_id}' has already accepted quest '{quest_id}'")]
    AlreadyAccepted { player_id: String, quest_id: String },
}

impl QuestError {
    pub fn kind(&self) -> QuestErrorKind {
        match self {
            QuestError::QuestNotFound(_)
            | QuestError::NotAccepted { .. }
            | QuestError::ObjectiveNotFound { .. } => QuestErrorKind::NotFound,
            QuestError::LevelTooLow { .. } => QuestErrorKind::Forbidden,
            QuestError::AlreadyAccepted { .. } => QuestErrorKind::Conflict,
        }
    }
}
