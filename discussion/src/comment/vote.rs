use serde::{Deserialize, Serialize};

use crate::models::{Comment, CommentId, Page, VoteState};

use super::tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

/// What the server reports after recording a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub score: i64,
    pub vote_state: VoteState,
}

/// Next vote state and score delta for casting `direction` on a comment
/// currently in `current`. Casting the same direction twice toggles it off.
pub fn transition(current: VoteState, direction: VoteDirection) -> (VoteState, i64) {
    match (current, direction) {
        (VoteState::Neutral, VoteDirection::Up) => (VoteState::Up, 1),
        (VoteState::Neutral, VoteDirection::Down) => (VoteState::Down, -1),
        (VoteState::Up, VoteDirection::Up) => (VoteState::Neutral, -1),
        (VoteState::Up, VoteDirection::Down) => (VoteState::Down, -2),
        (VoteState::Down, VoteDirection::Down) => (VoteState::Neutral, 1),
        (VoteState::Down, VoteDirection::Up) => (VoteState::Up, 2),
    }
}

pub fn cast_vote(comment: &Comment, direction: VoteDirection) -> Comment {
    let (vote_state, delta) = transition(comment.vote_state, direction);
    Comment {
        vote_state,
        score: comment.score + delta,
        ..comment.clone()
    }
}

pub fn cast_vote_in_pages(pages: &[Page], id: &CommentId, direction: VoteDirection) -> Vec<Page> {
    tree::update_in_pages(pages, id, |comment| cast_vote(comment, direction))
}

/// Copies the vote fields of `before` back onto `current`.
pub fn restore_vote(before: &Comment, current: &Comment) -> Comment {
    Comment {
        vote_state: before.vote_state,
        score: before.score,
        ..current.clone()
    }
}

/// Folds a server receipt into the current snapshot.
///
/// The server score only lands while the node still shows the vote the server
/// recorded. If the user has voted again in the meantime, the later request
/// owns the node and its own receipt will settle the score.
pub fn reconcile_receipt(pages: &[Page], id: &CommentId, receipt: &VoteReceipt) -> Option<Vec<Page>> {
    let current = tree::find_in_pages(pages, id)?;
    if current.vote_state != receipt.vote_state {
        tracing::debug!(%id, "vote superseded locally, skipping server score");
        return None;
    }
    if current.score == receipt.score {
        return None;
    }
    Some(tree::update_in_pages(pages, id, |comment| Comment {
        score: receipt.score,
        ..comment.clone()
    }))
}
