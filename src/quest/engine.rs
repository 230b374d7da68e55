//! Quest Progress Engine
//!
//! Owns the quest catalog and every player's accepted quests, and enforces
//! the acceptance and progress rules.
//!
//! Player books live in a `DashMap`; accept and progress hold the player's
//! entry for the whole check-then-mutate step, so a (player, quest) pair can
//! never be accepted twice even with concurrent requests.

use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::catalog::QuestCatalog;
use super::definition::Quest;
use super::error::QuestError;
use super::state::PlayerQuest;

pub struct QuestEngine {
    catalog: RwLock<QuestCatalog>,
    /// player_id -> accepted quests, in acceptance order
    players: DashMap<String, Vec<PlayerQuest>>,
}

impl QuestEngine {
    pub fn new(catalog: QuestCatalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            players: DashMap::new(),
        }
    }

    /// Store a quest definition, replacing any quest with the same ID
    pub async fn define_quest(&self, quest: Quest) -> Arc<Quest> {
        let mut catalog = self.catalog.write().await;
        let replaced = catalog.contains(&quest.quest_id);
        let quest = catalog.upsert(quest);
        info!(
            quest_id = %quest.quest_id,
            replaced,
            "Defined quest: {}", quest.title
        );
        quest
    }

    /// Every defined quest in authoring order
    pub async fn list_quests(&self) -> Vec<Arc<Quest>> {
        self.catalog.read().await.all().cloned().collect()
    }

    /// Quests the player could accept right now.
    ///
    /// Any quest the player has already accepted is excluded, completed or
    /// not; quests are not repeatable.
    pub async fn list_available_quests(&self, player_id: &str, player_level: i32) -> Vec<Arc<Quest>> {
        let accepted: HashSet<String> = self
            .players
            .get(player_id)
            .map(|book| book.iter().map(|pq| pq.quest_id.clone()).collect())
            .unwrap_or_default();

        let catalog = self.catalog.read().await;
        catalog
            .all()
            .filter(|q| q.is_unlocked_at(player_level) && !accepted.contains(&q.quest_id))
            .cloned()
            .collect()
    }

    /// Start a quest for a player
    pub async fn accept_quest(
        &self,
        player_id: &str,
        quest_id: &str,
        player_level: i32,
    ) -> Result<PlayerQuest, QuestError> {
        let quest = self
            .get_quest(quest_id)
            .await
            .ok_or_else(|| QuestError::QuestNotFound(quest_id.to_string()))?;

        if !quest.is_unlocked_at(player_level) {
            return Err(QuestError::LevelTooLow {
                required: quest.level_requirement,
                player_level,
            });
        }

        let mut book = self.players.entry(player_id.to_string()).or_default();
        if book.iter().any(|pq| pq.quest_id == quest_id) {
            return Err(QuestError::AlreadyAccepted {
                player_id: player_id.to_string(),
                quest_id: quest_id.to_string(),
            });
        }

        let player_quest = PlayerQuest::start(player_id, &quest, Utc::now());
        book.push(player_quest.clone());

        info!(player_id, quest_id, "Player accepted quest: {}", quest.title);
        Ok(player_quest)
    }

    /// All quests a player has accepted, in acceptance order
    pub fn list_player_quests(&self, player_id: &str) -> Vec<PlayerQuest> {
        self.players
            .get(player_id)
            .map(|book| book.value().clone())
            .unwrap_or_default()
    }

    /// Report progress on one objective of an accepted quest.
    ///
    /// A quest that is already completed is returned unchanged.
    pub async fn apply_progress(
        &self,
        player_id: &str,
        quest_id: &str,
        objective_id: &str,
        amount: u32,
    ) -> Result<PlayerQuest, QuestError> {
        // Resolve the definition up front so no await happens under the player lock
        let quest = self.get_quest(quest_id).await;

        let not_accepted = || QuestError::NotAccepted {
            player_id: player_id.to_string(),
            quest_id: quest_id.to_string(),
        };

        let mut book = self.players.get_mut(player_id).ok_or_else(not_accepted)?;
        let player_quest = book
            .iter_mut()
            .find(|pq| pq.quest_id == quest_id)
            .ok_or_else(not_accepted)?;

        if player_quest.is_completed() {
            return Ok(player_quest.clone());
        }

        if quest.is_none() {
            return Err(QuestError::QuestNotFound(quest_id.to_string()));
        }

        let update = player_quest
            .record_progress(objective_id, amount, Utc::now())
            .ok_or_else(|| QuestError::ObjectiveNotFound {
                quest_id: quest_id.to_string(),
                objective_id: objective_id.to_string(),
            })?;

        debug!(
            player_id,
            quest_id,
            objective_id,
            current = update.current,
            target = update.target,
            completed = update.objective_completed,
            "Objective progress"
        );
        if update.quest_completed {
            info!(player_id, quest_id, "Player completed quest");
        }

        Ok(player_quest.clone())
    }

    async fn get_quest(&self, quest_id: &str) -> Option<Arc<Quest>> {
        self.catalog.read().await.get(quest_id)
    }
}
