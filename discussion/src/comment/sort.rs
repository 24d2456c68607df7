use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use crate::models::{Comment, CommentId, SortMode};

/// Nests flat comment rows by `parent_id` in a single pass over the rows.
///
/// Rows whose parent is not part of `comments` are dropped: they belong to a
/// subtree that was not fetched.
pub fn build_tree(comments: Vec<Comment>) -> Vec<Arc<Comment>> {
    let total = comments.len();
    let mut roots = Vec::new();
    let mut children = HashMap::<CommentId, Vec<Comment>>::with_capacity(total);

    for comment in comments {
        match comment.parent_id.clone() {
            Some(parent_id) => children.entry(parent_id).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    let nested: Vec<Arc<Comment>> = roots
        .into_iter()
        .map(|root| attach_children(root, &mut children))
        .collect();

    let dropped = children.values().map(Vec::len).sum::<usize>();
    if dropped > 0 {
        tracing::debug!(dropped, total, "dropped comments with unknown parents");
    }

    nested
}

fn attach_children(mut comment: Comment, children: &mut HashMap<CommentId, Vec<Comment>>) -> Arc<Comment> {
    if let Some(replies) = children.remove(&comment.id) {
        comment.replies.extend(
            replies
                .into_iter()
                .map(|reply| attach_children(reply, children)),
        );
    }
    Arc::new(comment)
}

type Order = fn(&Comment, &Comment) -> Ordering;

fn by_best(a: &Comment, b: &Comment) -> Ordering {
    b.score.cmp(&a.score).then(a.created_at.cmp(&b.created_at))
}

fn by_new(a: &Comment, b: &Comment) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

fn by_old(a: &Comment, b: &Comment) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

/// Orders a thread the way the server does for `mode`. Pinned root comments
/// always come first. Replies under a newest-first view are still ranked by
/// score, matching the server's ordering.
pub fn sort_tree(trees: &[Arc<Comment>], mode: SortMode) -> Vec<Arc<Comment>> {
    let (roots, replies) = match mode {
        SortMode::Best => (by_best as Order, by_best as Order),
        SortMode::New => (by_new as Order, by_best as Order),
        SortMode::Old => (by_old as Order, by_old as Order),
    };

    let mut sorted: Vec<Arc<Comment>> = trees.iter().map(|c| sort_replies(c, replies)).collect();
    sorted.sort_by(|a, b| b.pinned.cmp(&a.pinned).then_with(|| roots(a, b)));
    sorted
}

fn sort_replies(comment: &Arc<Comment>, order: Order) -> Arc<Comment> {
    if comment.replies.is_empty() {
        return comment.clone();
    }

    let mut replies: Vec<Arc<Comment>> = comment
        .replies
        .iter()
        .map(|reply| sort_replies(reply, order))
        .collect();
    replies.sort_by(|a, b| order(a, b));

    Arc::new(Comment {
        replies,
        ..Comment::clone(comment)
    })
}
