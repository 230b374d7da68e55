//! Quest State Tracking
//!
//! Tracks a player's progress through an accepted quest.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::definition::{Objective, Quest};

/// Status of an accepted quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestStatus {
    /// Quest is accepted and at least one objective is open
    InProgress,
    /// Every objective reached its target
    Completed,
}

/// Progress on a single objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveProgress {
    pub objective_id: String,
    pub description: String,
    pub target_count: u32,
    pub current_count: u32,
    pub is_complete: bool,
}

impl ObjectiveProgress {
    pub fn new(objective: &Objective) -> Self {
        Self {
            objective_id: objective.objective_id.clone(),
            description: objective.description.clone(),
            target_count: objective.target_count,
            current_count: 0,
            is_complete: false,
        }
    }

    /// Add progress, clamped to the target. Returns true if newly completed.
    pub fn add_progress(&mut self, amount: u32) -> bool {
        let was_complete = self.is_complete;
        self.current_count = self.current_count.saturating_add(amount).min(self.target_count);
        self.is_complete = self.current_count >= self.target_count;
        self.is_complete && !was_complete
    }
}

/// Outcome of a single progress report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current: u32,
    pub target: u32,
    pub objective_completed: bool,
    pub quest_completed: bool,
}

/// A quest accepted by one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerQuest {
    pub player_id: String,
    pub quest_id: String,
    pub status: QuestStatus,
    pub started_at: DateTime<Utc>,
    /// Set once, when the quest transitions to Completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// One entry per quest objective, in quest order
    pub progress: Vec<ObjectiveProgress>,
}

impl PlayerQuest {
    pub fn start(player_id: &str, quest: &Quest, now: DateTime<Utc>) -> Self {
        Self {
            player_id: player_id.to_string(),
            quest_id: quest.quest_id.clone(),
            status: QuestStatus::InProgress,
            started_at: now,
            completed_at: None,
            progress: quest.objectives.iter().map(ObjectiveProgress::new).collect(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == QuestStatus::Completed
    }

    /// Apply progress to one objective and re-evaluate quest completion.
    ///
    /// Returns `None` if the objective is not part of this quest. Completed
    /// quests are left untouched.
    pub fn record_progress(
        &mut self,
        objective_id: &str,
        amount: u32,
        now: DateTime<Utc>,
    ) -> Option<ProgressUpdate> {
        let was_completed = self.is_completed();

        let (current, target, objective_completed) = {
            let obj = self.progress.iter_mut().find(|o| o.objective_id == objective_id)?;
            if was_completed {
                (obj.current_count, obj.target_count, false)
            } else {
                let newly_completed = obj.add_progress(amount);
                (obj.current_count, obj.target_count, newly_completed)
            }
        };

        let quest_completed = !was_completed && self.progress.iter().all(|o| o.is_complete);
        if quest_completed {
            self.status = QuestStatus::Completed;
            self.completed_at = Some(now);
        }

        Some(ProgressUpdate {
            current,
            target,
            objective_completed,
            quest_completed,
        })
    }
}
