use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

const PROVISIONAL_PREFIX: &str = "provisional-";

/// Opaque comment identifier as handed out by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A locally generated id for an optimistic insert that the server has
    /// not acknowledged yet.
    pub fn provisional() -> Self {
        Self(format!("{PROVISIONAL_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The caller's own vote on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteState {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[default]
    #[serde(rename = "none")]
    Neutral,
}

// A node of a thread tree. Children are reference counted so that a mutation
// only rebuilds the path from the root to the changed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub author_name: String,
    pub content: String,
    pub created_at: chrono::NaiveDateTime,
    #[serde(default)]
    pub replies: Vec<Arc<Comment>>,
    #[serde(default)]
    pub vote_state: VoteState,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub in_review: bool,
}

impl Comment {
    /// A fresh, locally authored comment waiting for server confirmation.
    pub fn provisional(
        parent_id: Option<CommentId>,
        author_name: impl Into<String>,
        content: impl Into<String>,
        is_private: bool,
    ) -> Self {
        Comment {
            id: CommentId::provisional(),
            parent_id,
            author_name: author_name.into(),
            content: content.into(),
            created_at: chrono::Utc::now().naive_utc(),
            replies: Vec::new(),
            vote_state: VoteState::Neutral,
            score: 0,
            is_private,
            pinned: false,
            in_review: false,
        }
    }

    /// Number of nodes in this subtree, the comment itself included.
    pub fn subtree_len(&self) -> usize {
        1 + self.replies.iter().map(|r| r.subtree_len()).sum::<usize>()
    }

    /// Takes every server-owned field from `server` while keeping the local
    /// reply list, which the server response does not carry.
    pub fn with_server_fields(&self, server: &Comment) -> Comment {
        Comment {
            replies: self.replies.clone(),
            ..server.clone()
        }
    }
}
