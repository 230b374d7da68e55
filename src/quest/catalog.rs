//! Quest Catalog
//!
//! Ordered store of quest definitions. Quests keep the slot they were first
//! inserted at, so listings follow authoring order even after an overwrite.
//! The catalog can be seeded from TOML files at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::definition::{Quest, RawQuestFile};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid quest in {path:?}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Registry for all quest definitions
#[derive(Debug, Default)]
pub struct QuestCatalog {
    quests: Vec<Arc<Quest>>,
    /// quest_id -> position in `quests`
    index: HashMap<String, usize>,
}

impl QuestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all quest definitions under `<data_dir>/quests`.
    ///
    /// Files that fail to parse are skipped. Returns the number of quests loaded.
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<usize, CatalogError> {
        let quests_dir = data_dir.join("quests");
        info!("Loading quests from {:?}", quests_dir);

        if !quests_dir.exists() {
            warn!("Quest directory does not exist: {:?}", quests_dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_toml_files(&quests_dir, &mut paths)?;
        paths.sort();

        let mut count = 0;
        for path in paths {
            match load_quest_file(&path) {
                Ok(quest) => {
                    if self.contains(&quest.quest_id) {
                        warn!("Duplicate quest ID '{}' in {:?}, overwriting", quest.quest_id, path);
                    }
                    info!("Loaded quest: {} ({})", quest.title, quest.quest_id);
                    self.upsert(quest);
                    count += 1;
                }
                Err(e) => warn!("Failed to load quest: {}", e),
            }
        }

        info!("Loaded {} quest definitions", count);
        Ok(count)
    }

    /// Insert a quest, replacing any previous quest with the same ID in place
    pub fn upsert(&mut self, quest: Quest) -> Arc<Quest> {
        let quest = Arc::new(quest);
        match self.index.get(&quest.quest_id) {
            Some(&slot) => self.quests[slot] = Arc::clone(&quest),
            None => {
                self.index.insert(quest.quest_id.clone(), self.quests.len());
                self.quests.push(Arc::clone(&quest));
            }
        }
        quest
    }

    /// Get a quest by ID
    pub fn get(&self, quest_id: &str) -> Option<Arc<Quest>> {
        self.index.get(quest_id).map(|&slot| Arc::clone(&self.quests[slot]))
    }

    pub fn contains(&self, quest_id: &str) -> bool {
        self.index.contains_key(quest_id)
    }

    /// All quests in insertion order
    pub fn all(&self) -> impl Iterator<Item = &Arc<Quest>> {
        self.quests.iter()
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}

/// Recursively collect quest files
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

fn load_quest_file(path: &Path) -> Result<Quest, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: RawQuestFile = toml::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Quest::from_raw(&raw.quest).map_err(|reason| CatalogError::Invalid {
        path: path.to_path_buf(),
        reason,
    })
}
