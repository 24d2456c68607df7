//! Cache of fetched comment pages, one entry per open thread key.
//!
//! Every entry carries a generation stamp. Writers capture the stamp before
//! they suspend and commit only if the entry still has it, so a response for a
//! thread that was closed or restarted in the meantime never lands.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    error::SyncError,
    models::{Comment, EntityId, Page, ThreadKey},
};

pub type Snapshot = Arc<Vec<Page>>;

/// Token proving which incarnation of a thread entry a write was computed
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    key: ThreadKey,
    stamp: u64,
}

impl Generation {
    pub fn key(&self) -> &ThreadKey {
        &self.key
    }
}

struct ThreadSlot {
    stamp: u64,
    pages: Snapshot,
}

impl ThreadSlot {
    fn empty(stamp: u64) -> Self {
        ThreadSlot {
            stamp,
            pages: Arc::new(Vec::new()),
        }
    }
}

pub struct PageStore {
    threads: scc::HashMap<ThreadKey, ThreadSlot>,
    next_stamp: AtomicU64,
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore {
    pub fn new() -> Self {
        Self {
            threads: scc::HashMap::new(),
            next_stamp: AtomicU64::new(1),
        }
    }

    fn stamp(&self) -> u64 {
        self.next_stamp.fetch_add(1, Ordering::Relaxed)
    }

    /// Starts tracking `key`, or returns the running generation if it is
    /// already open.
    pub fn open(&self, key: &ThreadKey) -> Generation {
        let entry = self
            .threads
            .entry_sync(key.clone())
            .or_insert_with(|| ThreadSlot::empty(self.stamp()));
        Generation {
            key: key.clone(),
            stamp: entry.get().stamp,
        }
    }

    /// Drops the pages of `key` and starts a new generation, so pagination
    /// starts over and pending writes for the old one are discarded.
    pub fn reset(&self, key: &ThreadKey) -> Generation {
        let stamp = self.stamp();
        self.threads
            .entry_sync(key.clone())
            .and_modify(|slot| *slot = ThreadSlot::empty(stamp))
            .or_insert_with(|| ThreadSlot::empty(stamp));
        Generation {
            key: key.clone(),
            stamp,
        }
    }

    /// Stops tracking `key`. Returns whether it was open.
    pub fn close(&self, key: &ThreadKey) -> bool {
        self.threads.remove_sync(key).is_some()
    }

    pub fn get(&self, key: &ThreadKey) -> Option<Snapshot> {
        self.threads.read_sync(key, |_, slot| slot.pages.clone())
    }

    pub fn generation(&self, key: &ThreadKey) -> Option<Generation> {
        self.threads.read_sync(key, |_, slot| Generation {
            key: key.clone(),
            stamp: slot.stamp,
        })
    }

    pub fn is_current(&self, generation: &Generation) -> bool {
        self.threads
            .read_sync(&generation.key, |_, slot| slot.stamp == generation.stamp)
            .unwrap_or(false)
    }

    /// Swaps in `pages` wholesale if `generation` is still current. Returns the
    /// snapshot that was replaced.
    pub fn replace(&self, generation: &Generation, pages: Snapshot) -> Result<Snapshot, SyncError> {
        self.threads
            .update_sync(&generation.key, |_, slot| {
                (slot.stamp == generation.stamp).then(|| std::mem::replace(&mut slot.pages, pages))
            })
            .flatten()
            .ok_or(SyncError::StaleState)
    }

    /// Computes the next snapshot from the current one and swaps it in, as one
    /// step with respect to other writers of the same key. Returns the
    /// `(previous, next)` pair.
    pub fn update<F>(&self, generation: &Generation, f: F) -> Result<(Snapshot, Snapshot), SyncError>
    where
        F: FnOnce(&[Page]) -> Vec<Page>,
    {
        self.threads
            .update_sync(&generation.key, |_, slot| {
                if slot.stamp != generation.stamp {
                    return None;
                }
                let previous = slot.pages.clone();
                let next = Arc::new(f(&previous));
                slot.pages = next.clone();
                Some((previous, next))
            })
            .flatten()
            .ok_or(SyncError::StaleState)
    }

    /// Takes back a change that produced `produced`. While the thread still
    /// holds exactly that snapshot, `previous` is swapped back in as is;
    /// otherwise `undo` rebuilds the current snapshot without the change.
    pub fn revert<F>(
        &self,
        generation: &Generation,
        produced: &Snapshot,
        previous: Snapshot,
        undo: F,
    ) -> Result<Snapshot, SyncError>
    where
        F: FnOnce(&[Page], &[Page]) -> Vec<Page>,
    {
        self.threads
            .update_sync(&generation.key, |_, slot| {
                if slot.stamp != generation.stamp {
                    return None;
                }
                let next = if Arc::ptr_eq(&slot.pages, produced) {
                    previous
                } else {
                    Arc::new(undo(&previous, &slot.pages))
                };
                slot.pages = next.clone();
                Some(next)
            })
            .flatten()
            .ok_or(SyncError::StaleState)
    }

    /// The page to request next, or `None` once the last page is loaded.
    pub fn next_page_index(&self, key: &ThreadKey) -> Option<usize> {
        let pages = self.get(key)?;
        match pages.iter().max_by_key(|page| page.index) {
            None => Some(1),
            Some(last) if last.is_last() => None,
            Some(last) => Some(last.index + 1),
        }
    }

    /// Closes every thread of `entity_id`. Returns how many were open.
    pub fn discard_entity(&self, entity_id: &EntityId) -> usize {
        let mut discarded = 0;
        self.threads.retain_sync(|key, _| {
            let keep = &key.entity_id != entity_id;
            if !keep {
                discarded += 1;
            }
            keep
        });
        discarded
    }

    /// Empties every thread of `entity_id` under a new generation so the next
    /// read fetches it again. Returns how many were open.
    pub fn invalidate_entity(&self, entity_id: &EntityId) -> usize {
        let mut invalidated = 0;
        self.threads.retain_sync(|key, slot| {
            if &key.entity_id == entity_id {
                *slot = ThreadSlot::empty(self.stamp());
                invalidated += 1;
            }
            true
        });
        invalidated
    }
}

/// Root comments across `pages` in page order, skipping ids already emitted.
pub fn flatten(pages: &[Page]) -> Vec<Arc<Comment>> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for page in pages {
        for comment in &page.results {
            if seen.insert(&comment.id) {
                roots.push(comment.clone());
            }
        }
    }
    roots
}

/// Adds a fetched page to a snapshot. A page fetched twice replaces the copy
/// already held; pages stay ordered by index.
pub fn insert_page(pages: &[Page], page: Page) -> Vec<Page> {
    let mut out = pages.to_vec();
    match out.iter_mut().find(|p| p.index == page.index) {
        Some(existing) => *existing = page,
        None => {
            out.push(page);
            out.sort_by_key(|p| p.index);
        }
    }
    out
}
