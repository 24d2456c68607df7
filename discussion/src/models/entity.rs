use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the entity a discussion hangs off, e.g. a feedback post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifies one loaded listing of entities, e.g. a board filtered by status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingKey(pub String);

impl From<&str> for ListingKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub comment_count: u64,
    /// Set once the entity's discussion has been merged into another one.
    #[serde(default)]
    pub merged_to_id: Option<EntityId>,
}

impl Entity {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Entity {
            id: EntityId::new(id),
            title: title.into(),
            comment_count: 0,
            merged_to_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDirection {
    /// The source is merged into the target and disappears.
    Forward,
    /// "Bring post here": the target is merged into the source.
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    /// The entity whose discussion moved away and is now hidden.
    pub merged_id: EntityId,
    /// The entity that owns the combined discussion.
    pub surviving_id: EntityId,
    pub merged_at: chrono::NaiveDateTime,
}

impl MergeRecord {
    /// Resolves which side disappears for a merge request.
    pub fn roles(
        source: &EntityId,
        target: &EntityId,
        direction: MergeDirection,
    ) -> (EntityId, EntityId) {
        match direction {
            MergeDirection::Forward => (source.clone(), target.clone()),
            MergeDirection::Reverse => (target.clone(), source.clone()),
        }
    }
}
