//! Persistent operations over a list of comment trees.
//!
//! Nothing here mutates its input. A change rebuilds the nodes on the path from
//! the root to the changed node and shares every other subtree with the input
//! through `Arc`. Lookups are pre-order and stop at the first match, so a
//! corrupted tree with duplicated ids only ever has its first copy touched.

use std::sync::Arc;

use crate::models::{Comment, CommentId, Page, Parent};

/// Replaces the first node matching `id` with whatever `op` returns, or drops
/// it when `op` returns `None`. Returns `None` when `id` is not in `trees`.
fn splice<F>(trees: &[Arc<Comment>], id: &CommentId, op: &mut Option<F>) -> Option<Vec<Arc<Comment>>>
where
    F: FnOnce(&Arc<Comment>) -> Option<Arc<Comment>>,
{
    for (i, node) in trees.iter().enumerate() {
        if &node.id == id {
            let op = op.take()?;
            let mut out = trees.to_vec();
            match op(node) {
                Some(replacement) => out[i] = replacement,
                None => {
                    out.remove(i);
                }
            }
            return Some(out);
        }

        if let Some(replies) = splice(&node.replies, id, op) {
            let mut out = trees.to_vec();
            out[i] = Arc::new(Comment {
                replies,
                ..Comment::clone(node)
            });
            return Some(out);
        }
    }

    None
}

/// Applies `transform` to the first comment with the given id.
///
/// `transform` receives the unmodified node and returns its replacement; the
/// replacement keeps whatever `replies` it is given, so transforms that only
/// touch scalar fields should build it with `..node.clone()`. A missing id is
/// not an error: the result is equal to the input.
pub fn update_by_id<F>(trees: &[Arc<Comment>], id: &CommentId, transform: F) -> Vec<Arc<Comment>>
where
    F: FnOnce(&Comment) -> Comment,
{
    try_update_by_id(trees, id, transform).unwrap_or_else(|| trees.to_vec())
}

fn try_update_by_id<F>(trees: &[Arc<Comment>], id: &CommentId, transform: F) -> Option<Vec<Arc<Comment>>>
where
    F: FnOnce(&Comment) -> Comment,
{
    let mut op = Some(|node: &Arc<Comment>| Some(Arc::new(transform(&**node))));
    splice(trees, id, &mut op)
}

/// Removes the first comment with the given id together with its replies.
pub fn remove_by_id(trees: &[Arc<Comment>], id: &CommentId) -> Vec<Arc<Comment>> {
    try_remove_by_id(trees, id).unwrap_or_else(|| trees.to_vec())
}

fn try_remove_by_id(trees: &[Arc<Comment>], id: &CommentId) -> Option<Vec<Arc<Comment>>> {
    let mut op = Some(|_: &Arc<Comment>| None);
    splice(trees, id, &mut op)
}

/// Appends `child` to the replies of `parent`, or to the root list for
/// [`Parent::Root`].
pub fn insert_reply(trees: &[Arc<Comment>], parent: &Parent, child: Comment) -> Vec<Arc<Comment>> {
    match parent {
        Parent::Root => {
            let mut out = trees.to_vec();
            out.push(Arc::new(child));
            out
        }
        Parent::Comment(parent_id) => update_by_id(trees, parent_id, |node| append_reply(node, child)),
    }
}

fn append_reply(node: &Comment, child: Comment) -> Comment {
    let mut replies = node.replies.clone();
    replies.push(Arc::new(child));
    Comment {
        replies,
        ..node.clone()
    }
}

pub fn find_by_id<'a>(trees: &'a [Arc<Comment>], id: &CommentId) -> Option<&'a Arc<Comment>> {
    for node in trees {
        if &node.id == id {
            return Some(node);
        }
        if let Some(found) = find_by_id(&node.replies, id) {
            return Some(found);
        }
    }
    None
}

/// Ids from the root comment down to `id`, both included. Stands in for a
/// parent back-pointer: the parent of a comment is the second to last entry.
pub fn path_to(trees: &[Arc<Comment>], id: &CommentId) -> Option<Vec<CommentId>> {
    for node in trees {
        if &node.id == id {
            return Some(vec![node.id.clone()]);
        }
        if let Some(mut path) = path_to(&node.replies, id) {
            path.insert(0, node.id.clone());
            return Some(path);
        }
    }
    None
}

// The same operations lifted to a page snapshot. Only the page holding the
// first match is rebuilt, every other page is shared as is.

fn splice_pages<F>(pages: &[Page], id: &CommentId, op: F) -> Option<Vec<Page>>
where
    F: FnOnce(&Arc<Comment>) -> Option<Arc<Comment>>,
{
    let mut op = Some(op);
    for (i, page) in pages.iter().enumerate() {
        if let Some(results) = splice(&page.results, id, &mut op) {
            let mut out = pages.to_vec();
            out[i] = page.with_results(results);
            return Some(out);
        }
    }
    None
}

pub fn update_in_pages<F>(pages: &[Page], id: &CommentId, transform: F) -> Vec<Page>
where
    F: FnOnce(&Comment) -> Comment,
{
    splice_pages(pages, id, |node| Some(Arc::new(transform(&**node)))).unwrap_or_else(|| pages.to_vec())
}

pub fn remove_in_pages(pages: &[Page], id: &CommentId) -> Vec<Page> {
    splice_pages(pages, id, |_| None).unwrap_or_else(|| pages.to_vec())
}

/// Root comments go to the end of the last loaded page; a thread with no page
/// yet gets a first one.
pub fn insert_in_pages(pages: &[Page], parent: &Parent, child: Comment) -> Vec<Page> {
    match parent {
        Parent::Root => {
            let mut out = pages.to_vec();
            match out.last_mut() {
                Some(last) => {
                    *last = last.with_results(insert_reply(&last.results, parent, child));
                }
                None => out.push(Page::new(1, vec![child], 1, 1)),
            }
            out
        }
        Parent::Comment(parent_id) => update_in_pages(pages, parent_id, |node| append_reply(node, child)),
    }
}

pub fn find_in_pages<'a>(pages: &'a [Page], id: &CommentId) -> Option<&'a Arc<Comment>> {
    pages.iter().find_map(|page| find_by_id(&page.results, id))
}

pub fn path_in_pages(pages: &[Page], id: &CommentId) -> Option<Vec<CommentId>> {
    pages.iter().find_map(|page| path_to(&page.results, id))
}

/// How to take one action back out of a snapshot that may have changed since.
#[derive(Clone)]
pub enum Undo {
    /// Rebuild a comment from its earlier version and its current one. The
    /// function gets `(before, current)` and should only copy back the fields
    /// the action wrote.
    Restore(CommentId, fn(&Comment, &Comment) -> Comment),
    /// Take out a comment the action inserted.
    Remove(CommentId),
    /// Put back a comment the action removed, at its old position.
    Reinsert(CommentId),
}

/// Reverts the change described by `undo` on `current`, reading the old state
/// from `previous`. Every other change in `current` is kept.
pub fn undo_in_pages(previous: &[Page], current: &[Page], undo: &Undo) -> Vec<Page> {
    match undo {
        Undo::Restore(id, restore) => match find_in_pages(previous, id) {
            Some(before) => update_in_pages(current, id, |node| restore(before, node)),
            None => current.to_vec(),
        },
        Undo::Remove(id) => remove_in_pages(current, id),
        Undo::Reinsert(id) => reinsert_in_pages(previous, current, id),
    }
}

fn reinsert_in_pages(previous: &[Page], current: &[Page], id: &CommentId) -> Vec<Page> {
    if find_in_pages(current, id).is_some() {
        return current.to_vec();
    }
    let Some((page_index, parent, position, node)) = locate(previous, id) else {
        return current.to_vec();
    };

    match parent {
        Parent::Comment(parent_id) => update_in_pages(current, &parent_id, |parent| {
            let mut replies = parent.replies.clone();
            replies.insert(position.min(replies.len()), node);
            Comment {
                replies,
                ..parent.clone()
            }
        }),
        Parent::Root => {
            let mut out = current.to_vec();
            // a page that is gone was refetched without the comment
            if let Some(page) = out.iter_mut().find(|page| page.index == page_index) {
                let mut results = page.results.clone();
                results.insert(position.min(results.len()), node);
                *page = page.with_results(results);
            }
            out
        }
    }
}

/// Page index, parent and position among its siblings of the first comment
/// with the given id.
fn locate(pages: &[Page], id: &CommentId) -> Option<(usize, Parent, usize, Arc<Comment>)> {
    for page in pages {
        let Some(path) = path_to(&page.results, id) else {
            continue;
        };
        let (parent, siblings) = match path.len() {
            1 => (Parent::Root, &page.results),
            n => {
                let parent_id = path[n - 2].clone();
                let siblings = &find_by_id(&page.results, &parent_id)?.replies;
                (Parent::Comment(parent_id), siblings)
            }
        };
        let position = siblings.iter().position(|c| &c.id == id)?;
        return Some((page.index, parent, position, siblings[position].clone()));
    }
    None
}
