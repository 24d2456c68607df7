use std::{future::Future, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    comment::{VoteDirection, VoteReceipt},
    error::TransportError,
    models::{Comment, CommentId, EntityId, Page, ThreadKey},
};

/// A new comment as sent to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSubmission {
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub is_private: bool,
}

/// The request/response side of the engine. Implementations own the wire
/// format, authentication and any retry policy.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch_page(&self, key: &ThreadKey, index: usize) -> Result<Page, TransportError>;

    async fn post_comment(
        &self,
        key: &ThreadKey,
        submission: &CommentSubmission,
    ) -> Result<Comment, TransportError>;

    async fn post_vote(
        &self,
        id: &CommentId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, TransportError>;

    /// Returns the comment as stored, which may have been put on moderation
    /// hold by the server.
    async fn post_edit(&self, id: &CommentId, content: &str) -> Result<Comment, TransportError>;

    async fn post_delete(&self, id: &CommentId) -> Result<(), TransportError>;

    async fn post_pin(&self, id: &CommentId, pinned: bool) -> Result<(), TransportError>;

    async fn post_privacy(&self, id: &CommentId, is_private: bool) -> Result<(), TransportError>;

    async fn post_approve(&self, id: &CommentId) -> Result<(), TransportError>;

    /// Moves every comment and voter of `merged_id` to `surviving_id`.
    async fn post_merge(
        &self,
        merged_id: &EntityId,
        surviving_id: &EntityId,
    ) -> Result<(), TransportError>;
}

pub(crate) async fn with_timeout<T, F>(duration: Duration, request: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    tokio::time::timeout(duration, request)
        .await
        .unwrap_or(Err(TransportError::Timeout))
}
