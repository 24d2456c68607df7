use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{CommentId, EntityId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortMode {
    #[default]
    Best,
    New,
    Old,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Best => "best",
            SortMode::New => "new",
            SortMode::Old => "old",
        }
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(SortMode::Best),
            "new" => Ok(SortMode::New),
            "old" => Ok(SortMode::Old),
            other => Err(format!("invalid sort mode `{other}`")),
        }
    }
}

impl Serialize for SortMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivacyFilter {
    #[default]
    All,
    Public,
    Private,
}

/// Identifies one paginated comment collection as the UI is viewing it.
///
/// Changing any component addresses a different collection, so pagination
/// starts over.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadKey {
    pub entity_id: EntityId,
    pub sort: SortMode,
    pub privacy: PrivacyFilter,
    /// Set when only the subtree under one comment is displayed.
    pub thread_root: Option<CommentId>,
}

impl ThreadKey {
    pub fn new(entity_id: EntityId) -> Self {
        ThreadKey {
            entity_id,
            sort: SortMode::default(),
            privacy: PrivacyFilter::default(),
            thread_root: None,
        }
    }

    pub fn with_sort(self, sort: SortMode) -> Self {
        ThreadKey { sort, ..self }
    }

    pub fn with_privacy(self, privacy: PrivacyFilter) -> Self {
        ThreadKey { privacy, ..self }
    }

    pub fn with_thread_root(self, thread_root: CommentId) -> Self {
        ThreadKey {
            thread_root: Some(thread_root),
            ..self
        }
    }

    /// The same view of another entity, used to follow merge redirects.
    pub fn for_entity(&self, entity_id: EntityId) -> Self {
        ThreadKey {
            entity_id,
            ..self.clone()
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{:?}", self.entity_id, self.sort.as_str(), self.privacy)?;
        if let Some(root) = &self.thread_root {
            write!(f, ":{root}")?;
        }
        Ok(())
    }
}

/// Where a new comment is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parent {
    /// The thread root sentinel: the comment becomes a top-level comment.
    Root,
    Comment(CommentId),
}

impl Parent {
    pub fn comment_id(&self) -> Option<&CommentId> {
        match self {
            Parent::Root => None,
            Parent::Comment(id) => Some(id),
        }
    }
}
