//! Actor persistence.
//!
//! Actors are saved as pretty-printed JSON with a format version.
//! [`JsonFileStore`] implements [`ActorStore`] against one such file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::actor::{Actor, ActorDetails};
use crate::store::{apply_batch, ActorStore, StoreError, UpdateBatch};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

impl From<PersistError> for StoreError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::Io(err) => StoreError::Io(err),
            PersistError::Json(err) => StoreError::Json(err),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Current actor save file version.
const SAVE_VERSION: u32 = 1;

/// Quick-access information about a saved actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMetadata {
    pub name: String,
    /// `character`, `npc` or `vehicle`.
    pub kind: String,
    pub level: i32,
}

impl ActorMetadata {
    fn from_actor(actor: &Actor) -> Self {
        let kind = match actor.details {
            ActorDetails::Character(_) => "character",
            ActorDetails::Npc(_) => "npc",
            ActorDetails::Vehicle => "vehicle",
        };
        Self {
            name: actor.name.clone(),
            kind: kind.to_string(),
            level: actor.level(),
        }
    }
}

/// A saved actor document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedActor {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the actor was saved (seconds since the Unix epoch).
    pub saved_at: String,

    pub metadata: ActorMetadata,

    pub actor: Actor,
}

impl SavedActor {
    pub fn new(actor: Actor) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: timestamp_now(),
            metadata: ActorMetadata::from_actor(&actor),
            actor,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }

    /// Read only the metadata of a save file.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<ActorMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: ActorMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub metadata: ActorMetadata,
}

/// List all actor save files in a directory, sorted by path.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<SaveInfo>, PersistError> {
    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = SavedActor::peek_metadata(&path).await {
                saves.push(SaveInfo { path, metadata });
            }
        }
    }

    saves.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(saves)
}

/// File name for an actor save.
pub fn actor_save_path(base_dir: impl AsRef<Path>, actor_name: &str) -> PathBuf {
    let sanitized = actor_name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>();
    base_dir.as_ref().join(format!("{sanitized}.json"))
}

fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", now.as_secs())
}

// ============================================================================
// File-backed store
// ============================================================================

/// An [`ActorStore`] that rewrites a single save file on every commit.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an actor, replacing whatever the file held.
    pub async fn save(&self, actor: &Actor) -> Result<(), PersistError> {
        let _guard = self.lock.lock().await;
        SavedActor::new(actor.clone()).save_json(&self.path).await
    }

    pub async fn load(&self) -> Result<Actor, PersistError> {
        let _guard = self.lock.lock().await;
        Ok(SavedActor::load_json(&self.path).await?.actor)
    }
}

#[async_trait]
impl ActorStore for JsonFileStore {
    async fn commit(&self, actor: &Actor, batch: &UpdateBatch) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut saved = SavedActor::load_json(&self.path).await?;
        if saved.actor.id != actor.id {
            return Err(StoreError::ActorNotFound(actor.id));
        }

        apply_batch(&mut saved.actor, batch)?;
        saved.saved_at = timestamp_now();
        saved.metadata = ActorMetadata::from_actor(&saved.actor);
        saved.save_json(&self.path).await?;

        debug!(
            path = %self.path.display(),
            fields = batch.data.len(),
            items = batch.items.len(),
            "committed actor update"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ItemUpdate, UpdateData};
    use crate::testing::create_sample_fighter;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fighter.json");
        let actor = create_sample_fighter("Roland");

        SavedActor::new(actor.clone()).save_json(&path).await.unwrap();
        let loaded = SavedActor::load_json(&path).await.unwrap();
        assert_eq!(loaded.actor, actor);
        assert_eq!(loaded.metadata.kind, "character");
        assert_eq!(loaded.metadata.level, 5);
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");
        let mut saved = SavedActor::new(create_sample_fighter("Roland"));
        saved.version = 99;
        saved.save_json(&path).await.unwrap();

        assert!(matches!(
            SavedActor::load_json(&path).await,
            Err(PersistError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[tokio::test]
    async fn test_list_saves() {
        let dir = tempdir().unwrap();
        let fighter = create_sample_fighter("Roland");
        SavedActor::new(fighter)
            .save_json(actor_save_path(dir.path(), "Roland"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("notes.json"), "{}").await.unwrap();
        tokio::fs::write(dir.path().join("readme.txt"), "hi").await.unwrap();

        let saves = list_saves(dir.path()).await.unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].metadata.name, "Roland");
    }

    #[tokio::test]
    async fn test_file_store_commit() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("actor.json"));
        let actor = create_sample_fighter("Roland");
        store.save(&actor).await.unwrap();

        let class_id = actor.items.iter().find(|i| i.as_class().is_some()).unwrap().id;
        let mut data = UpdateData::new();
        data.set("attributes.hp.value", 3);
        store.update(&actor, &data).await.unwrap();
        store
            .update_items(&actor, &[ItemUpdate::new(class_id).with("data.hit_dice_used", 2)])
            .await
            .unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.attributes.hp.value, 3);
        assert_eq!(loaded.item(class_id).unwrap().as_class().unwrap().hit_dice_used, 2);
    }

    #[tokio::test]
    async fn test_file_store_rejects_other_actor() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("actor.json"));
        store.save(&create_sample_fighter("Roland")).await.unwrap();

        let stranger = create_sample_fighter("Stranger");
        let result = store.commit(&stranger, &UpdateBatch::default()).await;
        assert!(matches!(result, Err(StoreError::ActorNotFound(_))));
    }
}
