//! Quest Definition Structures
//!
//! Resolved quests are what the engine stores and what the HTTP layer
//! serializes. The `Raw*` structures mirror the TOML quest files that can
//! seed the catalog at startup.

use serde::{Deserialize, Serialize};

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub level_required: i32,
    #[serde(default)]
    pub rewards: Option<RawReward>,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
}

/// Raw objective as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    pub id: String,
    pub description: String,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

/// Raw reward as it appears in TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReward {
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub items: Vec<String>,
}

// ============================================================================
// Resolved Quest Structures
// ============================================================================

/// A single step of a quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    /// Unique within its quest
    pub objective_id: String,
    pub description: String,
    /// Number of progress units needed (always > 0)
    pub target_count: u32,
}

impl Objective {
    pub fn new(objective_id: &str, description: &str, target_count: u32) -> Self {
        Self {
            objective_id: objective_id.to_string(),
            description: description.to_string(),
            target_count,
        }
    }

    fn from_raw(raw: &RawObjective) -> Self {
        Self::new(&raw.id, &raw.description, raw.count)
    }
}

/// Quest rewards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub xp: u32,
    /// Item identifiers granted on completion
    pub items: Vec<String>,
}

impl Reward {
    fn from_raw(raw: &RawReward) -> Self {
        Self {
            xp: raw.xp,
            items: raw.items.clone(),
        }
    }
}

/// A fully resolved quest definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub quest_id: String,
    pub title: String,
    pub description: String,
    /// Minimum player level required to accept
    pub level_requirement: i32,
    pub rewards: Reward,
    /// Objectives in display order
    pub objectives: Vec<Objective>,
}

impl Quest {
    /// Create a Quest from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        if raw.objectives.is_empty() {
            return Err(format!("Quest '{}' has no objectives", raw.id));
        }

        if let Some((i, o)) = raw.objectives.iter().enumerate().find(|(_, o)| o.count == 0) {
            return Err(format!(
                "Objective '{}' at index {} of quest '{}' has a zero count",
                o.id, i, raw.id
            ));
        }

        Ok(Self {
            quest_id: raw.id.clone(),
            title: raw.title.clone(),
            description: raw.description.clone(),
            level_requirement: raw.level_required,
            rewards: raw.rewards.as_ref().map(Reward::from_raw).unwrap_or_default(),
            objectives: raw.objectives.iter().map(Objective::from_raw).collect(),
        })
    }

    /// Whether a player of the given level may accept this quest
    pub fn is_unlocked_at(&self, player_level: i32) -> bool {
        player_level >= self.level_requirement
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRAGON_TOML: &str = r#"
[quest]
id = "quest-1"
title = "Defeat the Dragon"
description = "Defeat the mighty dragon that threatens the kingdom"
level_required = 5

[[quest.objectives]]
id = "obj-1"
description = "Damage the dragon"
count = 100

[[quest.objectives]]
id = "obj-2"
description = "Destroy dragon scales"
count = 5

[quest.rewards]
xp = 1000
items = ["Dragon Scale", "Dragon Tooth"]
"#;

    #[test]
    fn test_quest_from_toml() {
        let raw: RawQuestFile = toml::from_str(DRAGON_TOML).unwrap();
        let quest = Quest::from_raw(&raw.quest).unwrap();

        assert_eq!(quest.quest_id, "quest-1");
        assert_eq!(quest.level_requirement, 5);
        assert_eq!(quest.rewards.xp, 1000);
        assert_eq!(quest.rewards.items, vec!["Dragon Scale", "Dragon Tooth"]);
        assert_eq!(quest.objectives.len(), 2);
        assert_eq!(quest.objectives[0].objective_id, "obj-1");
        assert_eq!(quest.objectives[1].target_count, 5);
    }

    #[test]
    fn test_quest_without_objectives_is_rejected() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = "empty"
title = "Empty"
description = "Nothing to do"
"#,
        )
        .unwrap();

        assert!(Quest::from_raw(&raw.quest).is_err());
    }

    #[test]
    fn test_zero_count_objective_is_rejected() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = "broken"
title = "Broken"
description = "Impossible"

[[quest.objectives]]
id = "obj"
description = "Do nothing"
count = 0
"#,
        )
        .unwrap();

        let err = Quest::from_raw(&raw.quest).unwrap_err();
        assert!(err.contains("zero count"));
    }

    #[test]
    fn test_objective_count_defaults_to_one() {
        let raw: RawQuestFile = toml::from_str(
            r#"
[quest]
id = "talk"
title = "Say Hello"
description = "Greet the elder"

[[quest.objectives]]
id = "greet"
description = "Talk to the elder"
"#,
        )
        .unwrap();

        let quest = Quest::from_raw(&raw.quest).unwrap();
        assert_eq!(quest.objectives[0].target_count, 1);
        assert_eq!(quest.level_requirement, 0);
        assert_eq!(quest.rewards, Reward::default());
    }

    #[test]
    fn test_quest_json_uses_camel_case() {
        let quest = Quest {
            quest_id: "q".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            level_requirement: 2,
            rewards: Reward { xp: 10, items: vec!["potion".to_string()] },
            objectives: vec![Objective::new("o", "Do it", 3)],
        };

        let json = serde_json::to_value(&quest).unwrap();
        assert_eq!(json["questId"], "q");
        assert_eq!(json["levelRequirement"], 2);
        assert_eq!(json["rewards"]["xp"], 10);
        assert_eq!(json["objectives"][0]["objectiveId"], "o");
        assert_eq!(json["objectives"][0]["targetCount"], 3);
    }

    #[test]
    fn test_level_gate() {
        let quest = Quest {
            quest_id: "q".to_string(),
            title: "T".to_string(),
            description: "D".to_string(),
            level_requirement: 5,
            rewards: Reward::default(),
            objectives: vec![Objective::new("o", "Do it", 1)],
        };

        assert!(!quest.is_unlocked_at(4));
        assert!(quest.is_unlocked_at(5));
        assert!(quest.is_unlocked_at(10));
    }
}
