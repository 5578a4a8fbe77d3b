//! Entity registry - canonical per-identity state

use ahash::AHashMap;
use tokio::sync::mpsc;

use crate::core::error::{Result, TrackerError};
use crate::core::types::{EntityId, Position};
use crate::registry::entity::{Entity, EntityUpdate};

/// What an upsert did to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Notification sent to subscribers after every successful upsert
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryChange {
    pub id: EntityId,
    pub position: Position,
    pub kind: UpsertOutcome,
}

pub type RegistryReceiver = mpsc::UnboundedReceiver<RegistryChange>;

/// Point-in-time copy of the registry, ordered by identity
///
/// Owns its entities; iterating never observes later upserts and can be
/// repeated any number of times.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entities: Vec<Entity>,
}

impl RegistrySnapshot {
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.entities
    }
}

/// The single mutable store of entity state
#[derive(Default)]
pub struct Registry {
    entities: AHashMap<EntityId, Entity>,
    subscribers: Vec<mpsc::UnboundedSender<RegistryChange>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unseen identity or merge the present fields into a known one.
    ///
    /// The update is validated before anything is written, so a rejected
    /// update leaves the registry exactly as it was.
    pub fn upsert(&mut self, update: &EntityUpdate) -> Result<UpsertOutcome> {
        update.validate()?;

        let (outcome, position) = match self.entities.get_mut(&update.id) {
            Some(entity) => {
                entity.apply(update);
                (UpsertOutcome::Updated, entity.position)
            }
            None => {
                let mut entity = Entity::new(update.id.clone());
                entity.apply(update);
                let position = entity.position;
                self.entities.insert(update.id.clone(), entity);
                (UpsertOutcome::Inserted, position)
            }
        };

        self.notify(RegistryChange {
            id: update.id.clone(),
            position,
            kind: outcome,
        });

        Ok(outcome)
    }

    /// Register an observer; it receives every change from now on
    pub fn subscribe(&mut self) -> RegistryReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, change: RegistryChange) {
        // Dropped receivers are pruned here
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn require(&self, id: &EntityId) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| TrackerError::EntityNotFound(id.clone()))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut entities: Vec<Entity> = self.entities.values().cloned().collect();
        entities.sort_by(|a, b| a.id.cmp(&b.id));
        RegistrySnapshot { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
