use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::BotConfig;
use crate::constants::{CONFIG_FILE, DATABASE_FILE};

/// Error types for the JSON document store
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Malformed(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "Store I/O error: {}", err),
            StoreError::Malformed(err) => write!(f, "Malformed store document: {}", err),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Malformed(err)
    }
}

/// A registered webinar participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub chat_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub registration_date: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbSettings {
    #[serde(default)]
    pub last_modified: Option<String>,
}

/// The participant database document, as stored in database.json
///
/// Keys of `participants` are chat ids as strings (JSON object keys).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantDb {
    #[serde(default)]
    pub participants: BTreeMap<String, Participant>,
    #[serde(default)]
    pub settings: DbSettings,
}

impl ParticipantDb {
    pub fn get(&self, chat_id: i64) -> Option<&Participant> {
        self.participants.get(&chat_id.to_string())
    }

    pub fn upsert(&mut self, participant: Participant) {
        self.participants
            .insert(participant.chat_id.to_string(), participant);
    }

    /// Chat ids of all participants currently marked active
    pub fn active_chat_ids(&self) -> Vec<i64> {
        self.participants
            .values()
            .filter(|p| p.active)
            .map(|p| p.chat_id)
            .collect()
    }

    /// Stamp the last-modified marker; callers do this before saving
    pub fn touch(&mut self) {
        self.settings.last_modified = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// File-backed JSON document store for configuration and participants
///
/// Plain key-value documents with no concurrency control of their own; every
/// reader loads fresh and accepts human-timescale staleness.
#[derive(Debug, Clone)]
pub struct JsonStore {
    config_path: PathBuf,
    database_path: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            config_path: data_dir.join(CONFIG_FILE),
            database_path: data_dir.join(DATABASE_FILE),
        }
    }

    pub async fn load_config(&self) -> Result<BotConfig, StoreError> {
        let raw = tokio::fs::read_to_string(&self.config_path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn save_config(&self, config: &BotConfig) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.config_path, raw).await?;
        Ok(())
    }

    /// Load the participant database, falling back to an empty document when
    /// the file is missing or unreadable
    pub async fn load_database(&self) -> ParticipantDb {
        match tokio::fs::read_to_string(&self.database_path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(db) => db,
                Err(e) => {
                    warn!("Malformed {}: {}", DATABASE_FILE, e);
                    ParticipantDb::default()
                }
            },
            Err(e) => {
                warn!("Could not read {}: {}", DATABASE_FILE, e);
                ParticipantDb::default()
            }
        }
    }

    pub async fn save_database(&self, db: &ParticipantDb) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(db)?;
        tokio::fs::write(&self.database_path, raw).await?;
        Ok(())
    }

    /// Create config.json and database.json on first run
    pub async fn bootstrap(&self, default_config: &BotConfig) -> Result<(), StoreError> {
        if tokio::fs::try_exists(&self.config_path).await? {
            info!("Using existing {}", CONFIG_FILE);
        } else {
            self.save_config(default_config).await?;
            info!("Created {}", CONFIG_FILE);
        }
        if !tokio::fs::try_exists(&self.database_path).await? {
            self.save_database(&ParticipantDb::default()).await?;
            info!("Created {}", DATABASE_FILE);
        }
        Ok(())
    }
}
