use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    comment::{VoteDirection, VoteReceipt},
    error::TransportError,
    models::{Comment, CommentId, EntityId, Page, ThreadKey, VoteState},
    transport::{CommentSubmission, Transport},
};

pub fn comment(id: &str) -> Comment {
    Comment {
        id: CommentId::from(id),
        parent_id: None,
        author_name: format!("Author {id}"),
        content: format!("content of {id}"),
        created_at: chrono::NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        replies: Vec::new(),
        vote_state: VoteState::Neutral,
        score: 0,
        is_private: false,
        pinned: false,
        in_review: false,
    }
}

#[derive(Debug)]
pub enum Scripted {
    Page(Page),
    Comment(Comment),
    Vote(VoteReceipt),
    Done,
    Fail(TransportError),
    /// Holds the inner reply back until the gate is notified.
    Gated(Arc<Notify>, Box<Scripted>),
}

/// Answers calls from a queue of scripted replies, in call order, and records
/// every call it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn push(&self, reply: Scripted) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn next(&self, call: String) -> Scripted {
        self.calls.lock().unwrap().push(call);
        let next = self.replies.lock().unwrap().pop_front();
        let mut reply =
            next.unwrap_or_else(|| Scripted::Fail(TransportError::Connection("no scripted reply".into())));
        while let Scripted::Gated(gate, inner) = reply {
            gate.notified().await;
            reply = *inner;
        }
        reply
    }

    async fn done(&self, call: String) -> Result<(), TransportError> {
        match self.next(call).await {
            Scripted::Done => Ok(()),
            Scripted::Fail(e) => Err(e),
            other => panic!("expected Done, got {other:?}"),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch_page(&self, key: &ThreadKey, index: usize) -> Result<Page, TransportError> {
        match self.next(format!("fetch_page {} {index}", key.entity_id)).await {
            Scripted::Page(page) => Ok(page),
            Scripted::Fail(e) => Err(e),
            other => panic!("expected Page, got {other:?}"),
        }
    }

    async fn post_comment(
        &self,
        key: &ThreadKey,
        submission: &CommentSubmission,
    ) -> Result<Comment, TransportError> {
        let parent = submission
            .parent_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "root".into());
        match self.next(format!("post_comment {} {parent}", key.entity_id)).await {
            Scripted::Comment(comment) => Ok(comment),
            Scripted::Fail(e) => Err(e),
            other => panic!("expected Comment, got {other:?}"),
        }
    }

    async fn post_vote(
        &self,
        id: &CommentId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, TransportError> {
        match self.next(format!("post_vote {id} {direction:?}")).await {
            Scripted::Vote(receipt) => Ok(receipt),
            Scripted::Fail(e) => Err(e),
            other => panic!("expected Vote, got {other:?}"),
        }
    }

    async fn post_edit(&self, id: &CommentId, _content: &str) -> Result<Comment, TransportError> {
        match self.next(format!("post_edit {id}")).await {
            Scripted::Comment(comment) => Ok(comment),
            Scripted::Fail(e) => Err(e),
            other => panic!("expected Comment, got {other:?}"),
        }
    }

    async fn post_delete(&self, id: &CommentId) -> Result<(), TransportError> {
        self.done(format!("post_delete {id}")).await
    }

    async fn post_pin(&self, id: &CommentId, pinned: bool) -> Result<(), TransportError> {
        self.done(format!("post_pin {id} {pinned}")).await
    }

    async fn post_privacy(&self, id: &CommentId, is_private: bool) -> Result<(), TransportError> {
        self.done(format!("post_privacy {id} {is_private}")).await
    }

    async fn post_approve(&self, id: &CommentId) -> Result<(), TransportError> {
        self.done(format!("post_approve {id}")).await
    }

    async fn post_merge(
        &self,
        merged_id: &EntityId,
        surviving_id: &EntityId,
    ) -> Result<(), TransportError> {
        self.done(format!("post_merge {merged_id} -> {surviving_id}")).await
    }
}
