use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_stream::wrappers::BroadcastStream;

use crate::{
    comment::{
        VoteDirection, VoteReceipt,
        tree::{self, Undo},
        vote,
    },
    config::EngineConfig,
    directory::EntityDirectory,
    error::SyncError,
    merge::MergeEngine,
    models::{Comment, CommentId, EntityId, MergeDirection, MergeRecord, Page, Parent, ThreadKey},
    notify::{Notification, Notifier, Operation},
    reconcile::Reconciler,
    store::{self, Generation, PageStore},
    transport::{CommentSubmission, Transport, with_timeout},
};

/// Entry point for the UI: owns the page cache, the entity directory and the
/// collaborators, and exposes one method per user action.
#[derive(Clone)]
pub struct Discussion {
    pub config: Arc<EngineConfig>,
    pub store: Arc<PageStore>,
    pub directory: Arc<EntityDirectory>,
    transport: Arc<dyn Transport>,
    notifier: Notifier,
    reconciler: Arc<Reconciler>,
    merges: Arc<MergeEngine>,
    viewer_name: Arc<ArcSwap<Option<String>>>,
}

impl Discussion {
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        let store = Arc::new(PageStore::new());
        let directory = Arc::new(EntityDirectory::new());
        let notifier = Notifier::new(config.notification_capacity);
        let reconciler = Reconciler::new(store.clone(), notifier.clone(), config.request_timeout);
        let merges = MergeEngine::new(
            transport.clone(),
            store.clone(),
            directory.clone(),
            notifier.clone(),
            config.request_timeout,
        );

        Self {
            config: Arc::new(config),
            store,
            directory,
            transport,
            notifier,
            reconciler: Arc::new(reconciler),
            merges: Arc::new(merges),
            viewer_name: Arc::new(ArcSwap::new(Arc::new(None))),
        }
    }

    pub fn notifications(&self) -> BroadcastStream<Notification> {
        self.notifier.subscribe()
    }

    /// Name shown on comments posted from this client until the server
    /// confirms them.
    pub fn set_viewer_name(&self, name: Option<String>) {
        self.viewer_name.store(Arc::new(name));
    }

    /// Starts displaying a thread. A thread of a merged entity resolves to the
    /// surviving entity; the returned key is the one to use from then on.
    pub fn open(&self, key: &ThreadKey) -> ThreadKey {
        let entity_id = self.directory.resolve(&key.entity_id);
        if entity_id != key.entity_id {
            tracing::debug!(from = %key.entity_id, to = %entity_id, "following merge redirect");
        }
        let key = key.for_entity(entity_id);
        self.store.open(&key);
        key
    }

    /// Stops displaying a thread. In-flight work for it is discarded when it
    /// resolves.
    pub fn close(&self, key: &ThreadKey) {
        self.store.close(key);
    }

    /// The deduplicated root comments of every loaded page.
    pub fn comments(&self, key: &ThreadKey) -> Vec<Arc<Comment>> {
        self.store
            .get(key)
            .map(|pages| store::flatten(&pages))
            .unwrap_or_default()
    }

    /// Ids from the root comment down to `id`.
    pub fn path_to(&self, key: &ThreadKey, id: &CommentId) -> Option<Vec<CommentId>> {
        tree::path_in_pages(&self.store.get(key)?, id)
    }

    /// Fetches the page after the last loaded one. Returns whether a page was
    /// added: `false` once every page is loaded or when the thread was left
    /// while the page was in flight.
    pub async fn load_next_page(&self, key: &ThreadKey) -> Result<bool, SyncError> {
        let Some(index) = self.store.next_page_index(key) else {
            tracing::debug!(%key, "no more pages to load");
            return Ok(false);
        };
        let generation = self.store.generation(key).ok_or(SyncError::StaleState)?;

        let page = with_timeout(self.config.request_timeout, self.transport.fetch_page(key, index))
            .await
            .map_err(|err| self.report_load(&generation, err.into()))?;

        match self
            .store
            .update(&generation, |pages| store::insert_page(pages, page))
        {
            Ok(_) => Ok(true),
            Err(_) => {
                tracing::debug!(%key, index, "thread went inactive, discarding page");
                Ok(false)
            }
        }
    }

    /// Refetches every loaded page and swaps them in together.
    pub async fn revalidate(&self, key: &ThreadKey) -> Result<(), SyncError> {
        let generation = self.store.generation(key).ok_or(SyncError::StaleState)?;
        let mut indices: Vec<usize> = self
            .store
            .get(key)
            .map(|pages| pages.iter().map(|p| p.index).collect())
            .unwrap_or_default();
        if indices.is_empty() {
            indices.push(1);
        }

        let fetches = indices.into_iter().map(|index| {
            with_timeout(self.config.request_timeout, self.transport.fetch_page(key, index))
        });
        let pages: Vec<Page> = futures::future::try_join_all(fetches)
            .await
            .map_err(|err| self.report_load(&generation, err.into()))?;

        if self.store.replace(&generation, Arc::new(pages)).is_err() {
            tracing::debug!(%key, "thread went inactive, discarding revalidation");
        }
        Ok(())
    }

    /// Posts a new top-level comment.
    pub async fn post(&self, key: &ThreadKey, content: &str, is_private: bool) -> Result<Comment, SyncError> {
        self.submit(key, Parent::Root, content, is_private).await
    }

    pub async fn reply(&self, key: &ThreadKey, parent_id: &CommentId, content: &str) -> Result<Comment, SyncError> {
        self.ensure_confirmed(parent_id)?;
        // replies inherit the visibility of the comment they answer
        let is_private = self
            .store
            .get(key)
            .and_then(|pages| tree::find_in_pages(&pages, parent_id).map(|c| c.is_private))
            .unwrap_or(false);
        self.submit(key, Parent::Comment(parent_id.clone()), content, is_private)
            .await
    }

    async fn submit(
        &self,
        key: &ThreadKey,
        parent: Parent,
        content: &str,
        is_private: bool,
    ) -> Result<Comment, SyncError> {
        let content = self.config.content_limits.validate(content)?;
        let operation = match parent {
            Parent::Root => Operation::Post,
            Parent::Comment(_) => Operation::Reply,
        };

        let author_name =
            Option::clone(&self.viewer_name.load_full()).unwrap_or_else(|| "You".to_string());
        let provisional = Comment::provisional(parent.comment_id().cloned(), author_name, content.clone(), is_private);
        let provisional_id = provisional.id.clone();
        let submission = CommentSubmission {
            parent_id: parent.comment_id().cloned(),
            content,
            is_private,
        };

        self.directory.adjust_comment_count(&key.entity_id, 1);
        let result = self
            .reconciler
            .apply(
                operation,
                key,
                |pages| tree::insert_in_pages(pages, &parent, provisional),
                Undo::Remove(provisional_id.clone()),
                self.transport.post_comment(key, &submission),
                |server: &Comment, pages| {
                    Some(tree::update_in_pages(pages, &provisional_id, |node| {
                        node.with_server_fields(server)
                    }))
                },
            )
            .await;

        if result.is_err() {
            self.directory.adjust_comment_count(&key.entity_id, -1);
        }
        result
    }

    pub async fn edit(&self, key: &ThreadKey, id: &CommentId, content: &str) -> Result<Comment, SyncError> {
        self.ensure_confirmed(id)?;
        let content = self.config.content_limits.validate(content)?;

        self.reconciler
            .apply(
                Operation::Edit,
                key,
                |pages| {
                    tree::update_in_pages(pages, id, |node| Comment {
                        content: content.clone(),
                        ..node.clone()
                    })
                },
                Undo::Restore(id.clone(), restore_content),
                self.transport.post_edit(id, &content),
                // the server owns the stored text and the moderation flag
                |server: &Comment, pages| {
                    Some(tree::update_in_pages(pages, id, |node| Comment {
                        content: server.content.clone(),
                        in_review: server.in_review,
                        ..node.clone()
                    }))
                },
            )
            .await
    }

    pub async fn delete(&self, key: &ThreadKey, id: &CommentId) -> Result<(), SyncError> {
        self.ensure_confirmed(id)?;
        let removed = self
            .store
            .get(key)
            .and_then(|pages| tree::find_in_pages(&pages, id).map(|c| c.subtree_len()))
            .unwrap_or(0) as i64;

        self.directory.adjust_comment_count(&key.entity_id, -removed);
        let result = self
            .reconciler
            .apply(
                Operation::Delete,
                key,
                |pages| tree::remove_in_pages(pages, id),
                Undo::Reinsert(id.clone()),
                self.transport.post_delete(id),
                |_, _| None,
            )
            .await;

        if result.is_err() {
            self.directory.adjust_comment_count(&key.entity_id, removed);
        }
        result
    }

    pub async fn vote(
        &self,
        key: &ThreadKey,
        id: &CommentId,
        direction: VoteDirection,
    ) -> Result<VoteReceipt, SyncError> {
        self.ensure_confirmed(id)?;
        self.reconciler
            .apply(
                Operation::Vote,
                key,
                |pages| vote::cast_vote_in_pages(pages, id, direction),
                Undo::Restore(id.clone(), vote::restore_vote),
                self.transport.post_vote(id, direction),
                |receipt, pages| vote::reconcile_receipt(pages, id, receipt),
            )
            .await
    }

    pub async fn set_pinned(&self, key: &ThreadKey, id: &CommentId, pinned: bool) -> Result<(), SyncError> {
        self.ensure_confirmed(id)?;
        let operation = if pinned { Operation::Pin } else { Operation::Unpin };
        self.reconciler
            .apply(
                operation,
                key,
                |pages| tree::update_in_pages(pages, id, |node| Comment { pinned, ..node.clone() }),
                Undo::Restore(id.clone(), restore_pinned),
                self.transport.post_pin(id, pinned),
                |_, _| None,
            )
            .await
    }

    pub async fn set_private(&self, key: &ThreadKey, id: &CommentId, is_private: bool) -> Result<(), SyncError> {
        self.ensure_confirmed(id)?;
        let operation = if is_private {
            Operation::MakePrivate
        } else {
            Operation::MakePublic
        };
        self.reconciler
            .apply(
                operation,
                key,
                |pages| {
                    tree::update_in_pages(pages, id, |node| Comment {
                        is_private,
                        ..node.clone()
                    })
                },
                Undo::Restore(id.clone(), restore_privacy),
                self.transport.post_privacy(id, is_private),
                |_, _| None,
            )
            .await
    }

    /// Releases a comment from moderation hold.
    pub async fn approve(&self, key: &ThreadKey, id: &CommentId) -> Result<(), SyncError> {
        self.ensure_confirmed(id)?;
        self.reconciler
            .apply(
                Operation::Approve,
                key,
                |pages| {
                    tree::update_in_pages(pages, id, |node| Comment {
                        in_review: false,
                        ..node.clone()
                    })
                },
                Undo::Restore(id.clone(), restore_review),
                self.transport.post_approve(id),
                |_, _| None,
            )
            .await
    }

    pub async fn merge(
        &self,
        source: &EntityId,
        target: &EntityId,
        direction: MergeDirection,
    ) -> Result<MergeRecord, SyncError> {
        self.merges.merge(source, target, direction).await
    }

    fn ensure_confirmed(&self, id: &CommentId) -> Result<(), SyncError> {
        if id.is_provisional() {
            return Err("This comment is still being posted".into());
        }
        Ok(())
    }

    /// Reports a failed page fetch, unless the thread it was for is gone.
    fn report_load(&self, generation: &Generation, err: SyncError) -> SyncError {
        if !self.store.is_current(generation) {
            tracing::debug!(key = %generation.key(), %err, "thread went inactive, dropping fetch failure");
            return SyncError::StaleState;
        }
        tracing::warn!(key = %generation.key(), %err, "could not load comments");
        self.notifier.failure(Operation::Load, &err);
        err
    }
}

// Rollbacks copy back only the fields the action wrote.

fn restore_content(before: &Comment, current: &Comment) -> Comment {
    Comment {
        content: before.content.clone(),
        in_review: before.in_review,
        ..current.clone()
    }
}

fn restore_pinned(before: &Comment, current: &Comment) -> Comment {
    Comment {
        pinned: before.pinned,
        ..current.clone()
    }
}

fn restore_privacy(before: &Comment, current: &Comment) -> Comment {
    Comment {
        is_private: before.is_private,
        ..current.clone()
    }
}

fn restore_review(before: &Comment, current: &Comment) -> Comment {
    Comment {
        in_review: before.in_review,
        ..current.clone()
    }
}

#[cfg(test)]
mod test {
    use futures::{FutureExt, StreamExt};
    use tokio::sync::Notify;

    use super::*;
    use crate::{
        error::TransportError,
        models::{Entity, ListingKey, VoteState},
        testing::{Scripted, ScriptedTransport, comment},
    };

    fn discussion() -> (Discussion, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let discussion = Discussion::new(EngineConfig::default(), transport.clone());
        (discussion, transport)
    }

    /// Opens the thread of `p1` with a single loaded page.
    async fn loaded(comments: Vec<Comment>) -> (Discussion, Arc<ScriptedTransport>, ThreadKey) {
        let (discussion, transport) = discussion();
        discussion.directory.upsert(Entity {
            comment_count: comments.len() as u64,
            ..Entity::new("p1", "Dark mode")
        });
        let total = comments.len();
        transport.push(Scripted::Page(Page::new(1, comments, total, 1)));
        let key = discussion.open(&ThreadKey::new(EntityId::from("p1")));
        assert!(discussion.load_next_page(&key).await.unwrap());
        (discussion, transport, key)
    }

    fn node(discussion: &Discussion, key: &ThreadKey, id: &str) -> Arc<Comment> {
        let pages = discussion.store.get(key).unwrap();
        tree::find_in_pages(&pages, &CommentId::from(id)).unwrap().clone()
    }

    fn comment_count(discussion: &Discussion) -> u64 {
        discussion
            .directory
            .entity(&EntityId::from("p1"))
            .unwrap()
            .comment_count
    }

    #[tokio::test]
    async fn test_vote_then_failed_vote_rolls_back() {
        let (discussion, transport, key) = loaded(vec![comment("C1")]).await;
        let c1 = CommentId::from("C1");

        transport.push(Scripted::Vote(VoteReceipt {
            score: 1,
            vote_state: VoteState::Up,
        }));
        discussion.vote(&key, &c1, VoteDirection::Up).await.unwrap();
        let after_up = node(&discussion, &key, "C1");
        assert_eq!((after_up.score, after_up.vote_state), (1, VoteState::Up));

        transport.push(Scripted::Fail(TransportError::Timeout));
        let result = discussion.vote(&key, &c1, VoteDirection::Down).await;
        assert!(matches!(result, Err(SyncError::Transient(_))));
        let rolled_back = node(&discussion, &key, "C1");
        assert_eq!((rolled_back.score, rolled_back.vote_state), (1, VoteState::Up));
    }

    #[tokio::test]
    async fn test_pagination_stops_at_last_page() {
        let (discussion, transport) = discussion();
        let key = discussion.open(&ThreadKey::new(EntityId::from("p1")));

        transport.push(Scripted::Page(Page::new(1, vec![comment("a"), comment("b")], 3, 2)));
        // the server shifted by one, so page 2 repeats `b`
        transport.push(Scripted::Page(Page::new(2, vec![comment("b"), comment("c")], 3, 2)));

        assert!(discussion.load_next_page(&key).await.unwrap());
        assert!(discussion.load_next_page(&key).await.unwrap());
        assert!(!discussion.load_next_page(&key).await.unwrap());
        assert_eq!(transport.calls(), vec!["fetch_page p1 1", "fetch_page p1 2"]);

        let ids: Vec<_> = discussion.comments(&key).iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_page_for_left_thread_is_discarded() {
        let (discussion, transport) = discussion();
        let key = discussion.open(&ThreadKey::new(EntityId::from("p1")));
        let gate = Arc::new(Notify::new());
        transport.push(Scripted::Gated(
            gate.clone(),
            Box::new(Scripted::Page(Page::new(1, vec![comment("a")], 1, 1))),
        ));

        let leave = async {
            discussion.close(&key);
            // the user comes back with a different sort: a different thread
            discussion.open(&key.clone().with_sort(crate::models::SortMode::New));
            gate.notify_one();
        };
        let (loaded, _) = tokio::join!(discussion.load_next_page(&key), leave);

        assert_eq!(loaded, Ok(false));
        assert!(discussion.store.get(&key).is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_for_left_thread_is_silent() {
        let (discussion, transport) = discussion();
        let mut events = discussion.notifications();
        let key = discussion.open(&ThreadKey::new(EntityId::from("p1")));
        let gate = Arc::new(Notify::new());
        transport.push(Scripted::Gated(
            gate.clone(),
            Box::new(Scripted::Fail(TransportError::Timeout)),
        ));

        let leave = async {
            discussion.close(&key);
            gate.notify_one();
        };
        let (loaded, _) = tokio::join!(discussion.load_next_page(&key), leave);

        assert_eq!(loaded, Err(SyncError::StaleState));
        assert!(events.next().now_or_never().is_none(), "Nothing should be reported");
    }

    #[tokio::test]
    async fn test_revalidation_failure_after_reset_is_silent() {
        let (discussion, transport, key) = loaded(vec![comment("a")]).await;
        let mut events = discussion.notifications();
        let gate = Arc::new(Notify::new());
        transport.push(Scripted::Gated(
            gate.clone(),
            Box::new(Scripted::Fail(TransportError::Connection("reset".into()))),
        ));

        let restart = async {
            discussion.store.reset(&key);
            gate.notify_one();
        };
        let (result, _) = tokio::join!(discussion.revalidate(&key), restart);

        assert_eq!(result, Err(SyncError::StaleState));
        assert!(events.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported() {
        let (discussion, transport) = discussion();
        let mut events = discussion.notifications();
        let key = discussion.open(&ThreadKey::new(EntityId::from("p1")));
        transport.push(Scripted::Fail(TransportError::Timeout));

        let loaded = discussion.load_next_page(&key).await;
        assert_eq!(loaded, Err(SyncError::Transient(TransportError::Timeout)));
        assert!(matches!(
            events.next().await,
            Some(Ok(Notification::Failure {
                operation: Operation::Load,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn test_reply_replaces_provisional_comment() {
        let (discussion, transport, key) = loaded(vec![comment("c1"), comment("c2")]).await;
        discussion.set_viewer_name(Some("Alex".into()));
        let gate = Arc::new(Notify::new());
        let server = Comment {
            parent_id: Some(CommentId::from("c1")),
            content: "thanks!".into(),
            ..comment("r1")
        };
        transport.push(Scripted::Gated(gate.clone(), Box::new(Scripted::Comment(server))));

        let observe = async {
            let c1 = node(&discussion, &key, "c1");
            gate.notify_one();
            c1
        };
        let c1 = CommentId::from("c1");
        let (result, pending) = tokio::join!(discussion.reply(&key, &c1, "  thanks!  "), observe);

        assert_eq!(pending.replies.len(), 1);
        assert!(pending.replies[0].id.is_provisional());
        assert_eq!(pending.replies[0].author_name, "Alex");
        assert_eq!(pending.replies[0].content, "thanks!");

        assert_eq!(result.unwrap().id.as_str(), "r1");
        let c1 = node(&discussion, &key, "c1");
        let ids: Vec<_> = c1.replies.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["r1"]);
        assert_eq!(comment_count(&discussion), 3);
        assert_eq!(transport.calls().last().unwrap(), "post_comment p1 c1");
    }

    #[tokio::test]
    async fn test_failed_post_rolls_back_counter() {
        let (discussion, transport, key) = loaded(vec![comment("c1")]).await;
        let before = discussion.store.get(&key).unwrap();
        transport.push(Scripted::Fail(TransportError::Server {
            status: 500,
            message: "boom".into(),
        }));

        let result = discussion.post(&key, "first!", false).await;
        assert!(matches!(result, Err(SyncError::Transient(_))));
        assert_eq!(discussion.store.get(&key).unwrap(), before);
        assert_eq!(comment_count(&discussion), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_transport() {
        let (discussion, transport, key) = loaded(vec![comment("c1")]).await;
        let calls = transport.calls().len();

        let empty = discussion.post(&key, "   ", false).await;
        assert!(matches!(empty, Err(SyncError::Validation(_))));

        let provisional = CommentId::provisional();
        let early = discussion.reply(&key, &provisional, "hello").await;
        assert!(matches!(early, Err(SyncError::Validation(_))));

        assert_eq!(transport.calls().len(), calls);
        assert_eq!(comment_count(&discussion), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_and_counts() {
        let parent = Comment {
            replies: vec![Arc::new(Comment {
                parent_id: Some(CommentId::from("c1")),
                ..comment("r1")
            })],
            ..comment("c1")
        };
        let (discussion, transport, key) = loaded(vec![parent, comment("c2")]).await;
        discussion.directory.adjust_comment_count(&EntityId::from("p1"), 1);
        assert_eq!(comment_count(&discussion), 3);

        transport.push(Scripted::Done);
        discussion.delete(&key, &CommentId::from("c1")).await.unwrap();

        let ids: Vec<_> = discussion.comments(&key).iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, vec!["c2"]);
        assert_eq!(comment_count(&discussion), 1);
    }

    #[tokio::test]
    async fn test_edit_takes_moderation_flag_from_server() {
        let (discussion, transport, key) = loaded(vec![comment("c1")]).await;
        transport.push(Scripted::Comment(Comment {
            content: "buy cheap watches".into(),
            in_review: true,
            score: 99,
            ..comment("c1")
        }));

        discussion
            .edit(&key, &CommentId::from("c1"), "buy cheap watches")
            .await
            .unwrap();
        let c1 = node(&discussion, &key, "c1");
        assert!(c1.in_review);
        assert_eq!(c1.content, "buy cheap watches");
        assert_eq!(c1.score, 0, "Edits do not own the score");
    }

    #[tokio::test]
    async fn test_flag_mutators() {
        let (discussion, transport, key) = loaded(vec![Comment {
            in_review: true,
            ..comment("c1")
        }])
        .await;
        let c1 = CommentId::from("c1");

        transport.push(Scripted::Done);
        discussion.set_pinned(&key, &c1, true).await.unwrap();
        transport.push(Scripted::Done);
        discussion.set_private(&key, &c1, true).await.unwrap();
        transport.push(Scripted::Done);
        discussion.approve(&key, &c1).await.unwrap();

        let node = node(&discussion, &key, "c1");
        assert!(node.pinned && node.is_private && !node.in_review);

        transport.push(Scripted::Fail(TransportError::Rejected {
            status: 403,
            message: "forbidden".into(),
        }));
        let result = discussion.set_pinned(&key, &c1, false).await;
        assert!(matches!(result, Err(SyncError::Conflict(_))));
        assert!(self::node(&discussion, &key, "c1").pinned);
    }

    #[tokio::test]
    async fn test_reply_path_lookup() {
        let parent = Comment {
            replies: vec![Arc::new(Comment {
                parent_id: Some(CommentId::from("c1")),
                ..comment("r1")
            })],
            ..comment("c1")
        };
        let (discussion, _, key) = loaded(vec![parent]).await;
        let path = discussion.path_to(&key, &CommentId::from("r1")).unwrap();
        assert_eq!(path, vec![CommentId::from("c1"), CommentId::from("r1")]);
    }

    #[tokio::test]
    async fn test_merged_thread_redirects_to_survivor() {
        let (discussion, transport, p1_key) =
            loaded(vec![comment("a"), comment("b"), comment("c")]).await;
        discussion.directory.set_listing(
            ListingKey::from("board"),
            vec![Entity::new("p1", "Dark mode"), Entity::new("p2", "Night theme")],
        );
        let p2_key = discussion.open(&ThreadKey::new(EntityId::from("p2")));
        transport.push(Scripted::Page(Page::new(1, vec![comment("d")], 1, 1)));
        discussion.load_next_page(&p2_key).await.unwrap();

        transport.push(Scripted::Done);
        discussion
            .merge(&EntityId::from("p1"), &EntityId::from("p2"), MergeDirection::Forward)
            .await
            .unwrap();

        let listing = discussion.directory.listing(&ListingKey::from("board")).unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].id, EntityId::from("p2"));

        // reopening the merged thread lands on the survivor, which is refetched
        let redirected = discussion.open(&p1_key);
        assert_eq!(redirected, p2_key);
        assert!(discussion.comments(&redirected).is_empty());
        transport.push(Scripted::Page(Page::new(
            1,
            vec![comment("a"), comment("b"), comment("c"), comment("d")],
            4,
            1,
        )));
        discussion.revalidate(&redirected).await.unwrap();
        assert_eq!(discussion.comments(&redirected).len(), 4);
    }
}
