//! Field-path updates and the persistence collaborator.
//!
//! Workflows never write documents directly. They describe their changes as
//! an [`UpdateBatch`] (dotted field paths such as `attributes.hp.value`) and
//! hand it to an [`ActorStore`], which applies it atomically.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::actor::{Actor, ActorId};
use crate::items::ItemId;

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid field path: {0}")]
    InvalidPath(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A map of dotted field paths to new values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateData(BTreeMap<String, Value>);

impl UpdateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(path.into(), value.into());
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.0.get(path)
    }

    pub fn extend(&mut self, other: UpdateData) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Changes to one owned item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: ItemId,
    pub changes: UpdateData,
}

impl ItemUpdate {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            changes: UpdateData::new(),
        }
    }

    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.changes.set(path, value);
        self
    }
}

/// Everything one workflow step writes, applied in a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub data: UpdateData,
    pub items: Vec<ItemUpdate>,
}

impl UpdateBatch {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.items.is_empty()
    }
}

/// The document layer that owns actors.
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// Apply a batch of actor and item changes atomically.
    async fn commit(&self, actor: &Actor, batch: &UpdateBatch) -> Result<(), StoreError>;

    async fn update(&self, actor: &Actor, data: &UpdateData) -> Result<(), StoreError> {
        let batch = UpdateBatch {
            data: data.clone(),
            items: Vec::new(),
        };
        self.commit(actor, &batch).await
    }

    async fn update_items(&self, actor: &Actor, items: &[ItemUpdate]) -> Result<(), StoreError> {
        let batch = UpdateBatch {
            data: UpdateData::new(),
            items: items.to_vec(),
        };
        self.commit(actor, &batch).await
    }
}

/// Set a dotted path inside a JSON value, creating objects along the way.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        if !current.is_object() {
            *current = Value::Object(Default::default());
        }
        let Value::Object(map) = current else {
            return;
        };
        current = map.entry(segment).or_insert(Value::Null);
    }
    *current = value;
}

/// Apply a batch to an in-memory actor.
pub fn apply_batch(actor: &mut Actor, batch: &UpdateBatch) -> Result<(), StoreError> {
    if batch.is_empty() {
        return Ok(());
    }
    let mut doc = serde_json::to_value(&*actor)?;

    for (path, value) in batch.data.iter() {
        if path.starts_with("items") {
            return Err(StoreError::InvalidPath(path.clone()));
        }
        set_path(&mut doc, path, value.clone());
    }

    for update in &batch.items {
        let id = serde_json::to_value(update.id)?;
        let item = doc
            .get_mut("items")
            .and_then(Value::as_array_mut)
            .and_then(|items| items.iter_mut().find(|item| item.get("id") == Some(&id)))
            .ok_or(StoreError::ItemNotFound(update.id))?;
        for (path, value) in update.changes.iter() {
            set_path(item, path, value.clone());
        }
    }

    *actor = serde_json::from_value(doc)?;
    Ok(())
}
