use std::{collections::HashSet, sync::Arc};

use scc::hash_map::Entry;

use crate::models::{Entity, EntityId, ListingKey};

pub type Listing = Arc<Vec<EntityId>>;

/// Locally known entities and the listings that display them.
///
/// Listings only hold ids; the entity records are shared so that a counter or
/// merge marker changes once for every listing.
#[derive(Default)]
pub struct EntityDirectory {
    entities: scc::HashMap<EntityId, Entity>,
    listings: scc::HashMap<ListingKey, Listing>,
}

impl EntityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, entity: Entity) {
        match self.entities.entry_sync(entity.id.clone()) {
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = entity;
            }
            Entry::Vacant(vacant) => {
                vacant.insert_entry(entity);
            }
        }
    }

    pub fn entity(&self, id: &EntityId) -> Option<Entity> {
        self.entities.read_sync(id, |_, entity| entity.clone())
    }

    /// Stores a freshly fetched listing, replacing any previous one.
    pub fn set_listing(&self, key: ListingKey, entities: Vec<Entity>) {
        let ids: Listing = Arc::new(entities.iter().map(|e| e.id.clone()).collect());
        for entity in entities {
            self.upsert(entity);
        }
        match self.listings.entry_sync(key) {
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = ids;
            }
            Entry::Vacant(vacant) => {
                vacant.insert_entry(ids);
            }
        }
    }

    pub fn listing(&self, key: &ListingKey) -> Option<Vec<Entity>> {
        let ids = self.listings.read_sync(key, |_, ids| ids.clone())?;
        Some(ids.iter().filter_map(|id| self.entity(id)).collect())
    }

    /// Drops `id` from every listing showing it. Returns the listings it was
    /// removed from and its position in each, so the removal can be undone.
    pub fn remove_from_listings(&self, id: &EntityId) -> Vec<(ListingKey, usize)> {
        let mut removed = Vec::new();
        self.listings.retain_sync(|key, ids| {
            if let Some(position) = ids.iter().position(|other| other == id) {
                let mut filtered = ids.to_vec();
                filtered.remove(position);
                *ids = Arc::new(filtered);
                removed.push((key.clone(), position));
            }
            true
        });
        removed
    }

    /// Puts `id` back into the listings it was removed from. Listings keep
    /// whatever else changed in them since; one that already shows `id` again
    /// is left alone.
    pub fn restore_listings(&self, id: &EntityId, removed: Vec<(ListingKey, usize)>) {
        for (key, position) in removed {
            // a listing that has been dropped since stays dropped
            self.listings.update_sync(&key, |_, ids| {
                if !ids.contains(id) {
                    let mut restored = ids.to_vec();
                    restored.insert(position.min(restored.len()), id.clone());
                    *ids = Arc::new(restored);
                }
            });
        }
    }

    pub fn adjust_comment_count(&self, id: &EntityId, delta: i64) {
        self.entities.update_sync(id, |_, entity| {
            entity.comment_count = entity.comment_count.saturating_add_signed(delta);
        });
    }

    pub fn merged_to(&self, id: &EntityId) -> Option<EntityId> {
        self.entities
            .read_sync(id, |_, entity| entity.merged_to_id.clone())
            .flatten()
    }

    /// Flags `merged_id` as merged into `surviving_id` and moves its comment
    /// count over to the survivor.
    pub fn mark_merged(&self, merged_id: &EntityId, surviving_id: &EntityId) {
        let moved = match self.entities.entry_sync(merged_id.clone()) {
            Entry::Occupied(mut occupied) => {
                let merged = occupied.get_mut();
                merged.merged_to_id = Some(surviving_id.clone());
                std::mem::take(&mut merged.comment_count)
            }
            Entry::Vacant(vacant) => {
                vacant.insert_entry(Entity {
                    merged_to_id: Some(surviving_id.clone()),
                    ..Entity::new(merged_id.0.clone(), String::new())
                });
                0
            }
        };

        if moved > 0 {
            self.entities.update_sync(surviving_id, |_, survivor| {
                survivor.comment_count = survivor.comment_count.saturating_add(moved);
            });
        }
    }

    /// Follows merge markers to the entity that currently owns the discussion.
    pub fn resolve(&self, id: &EntityId) -> EntityId {
        let mut current = id.clone();
        let mut visited = HashSet::from([current.clone()]);
        while let Some(next) = self.merged_to(&current) {
            if !visited.insert(next.clone()) {
                tracing::warn!(%id, "merge markers form a cycle");
                break;
            }
            current = next;
        }
        current
    }
}
