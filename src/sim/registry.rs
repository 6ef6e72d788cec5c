//! Entity registry with deferred mutation
//!
//! Additions go to a pending list and only become visible to iteration
//! after `flush`. Expiry marks an entity inert straight away so later
//! lookups in the same tick skip it, but the record stays in place until
//! `flush`. Both lists stay sorted by id because ids are handed out in
//! increasing order, so lookups are binary searches.

use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityId, EntityKind};
use super::motion::Motion;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    /// Entities visible to iteration (sorted by id)
    live: Vec<Entity>,
    /// Added this tick, visible after the next flush (sorted by id)
    pending: Vec<Entity>,
    next_id: u32,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            live: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate an entity id
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create an entity and queue it for the next flush
    pub fn spawn(&mut self, kind: EntityKind, motion: Motion) -> EntityId {
        let id = self.next_id();
        self.pending.push(Entity::new(id, kind, motion));
        id
    }

    /// Queue a prepared entity (its id must come from `next_id`)
    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        match self.pending.last() {
            Some(last) if last.id > id => {
                let at = self.pending.partition_point(|e| e.id < id);
                self.pending.insert(at, entity);
            }
            _ => self.pending.push(entity),
        }
        id
    }

    fn find(&self, id: EntityId) -> Option<&Entity> {
        let list = if self.pending.first().is_some_and(|e| e.id <= id) {
            &self.pending
        } else {
            &self.live
        };
        list.binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &list[i])
    }

    fn find_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let list = if self.pending.first().is_some_and(|e| e.id <= id) {
            &mut self.pending
        } else {
            &mut self.live
        };
        match list.binary_search_by_key(&id, |e| e.id) {
            Ok(i) => Some(&mut list[i]),
            Err(_) => None,
        }
    }

    /// Non-expired entity by id, live or pending
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.find(id).filter(|e| !e.expired)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.find_mut(id).filter(|e| !e.expired)
    }

    /// Whether the entity exists and has not expired
    #[inline]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Mark an entity inert and queue it for removal.
    ///
    /// Returns its kind if this call expired it; `None` if it was already
    /// expired or never existed, so side effects run exactly once.
    pub fn expire(&mut self, id: EntityId) -> Option<EntityKind> {
        let entity = self.get_mut(id)?;
        entity.expired = true;
        Some(entity.kind)
    }

    /// Live, non-expired entities in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.live.iter().filter(|e| !e.expired)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.live.iter_mut().filter(|e| !e.expired)
    }

    /// Count non-expired entities, pending ones included
    pub fn count(&self, mut pred: impl FnMut(&EntityKind) -> bool) -> usize {
        self.live
            .iter()
            .chain(self.pending.iter())
            .filter(|e| !e.expired && pred(&e.kind))
            .count()
    }

    /// Drop expired entities, then make pending ones visible.
    /// Returns how many were removed.
    pub fn flush(&mut self) -> usize {
        let before = self.live.len() + self.pending.len();
        self.live.retain(|e| !e.expired);
        self.pending.retain(|e| !e.expired);
        self.live.append(&mut self.pending);
        before - self.live.len()
    }

    /// Expire and flush everything, pending additions included
    pub fn clear(&mut self) -> usize {
        for e in self.live.iter_mut().chain(self.pending.iter_mut()) {
            e.expired = true;
        }
        self.flush()
    }

    /// Number of visible entities
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of additions waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
