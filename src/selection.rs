//! Selection set and per-entity path history
//!
//! Two independent mechanisms feed the selection: entities the user toggled
//! on, and entities matched by the active species filter. The selection set
//! is their union. Every selected entity owns a path that starts with its
//! position at selection time and grows by one point per registry change.
//! Leaving the selection discards the path. Filter membership follows the
//! entity's current species, so a species change can move an entity into or
//! out of the filter selection.

use std::sync::{Arc, OnceLock};

use ahash::{AHashMap, AHashSet};
use geo::HaversineDistance;

use crate::core::types::{EntityId, Position};
use crate::registry::{Entity, Registry, RegistryChange};

/// Result of a selection toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
    /// The identity is not in the registry; nothing changed
    Unknown,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    toggled: AHashSet<EntityId>,
    filter: Option<SpeciesFilter>,
    filter_matched: AHashSet<EntityId>,
    /// Filter members the user deselected; cleared when the filter is reapplied
    dismissed: AHashSet<EntityId>,
    paths: AHashMap<EntityId, PathRecord>,
}

/// Recorded positions with a running length and a lazily built shared copy
#[derive(Debug, Default)]
struct PathRecord {
    points: Vec<Position>,
    meters: f64,
    shared: OnceLock<Arc<[Position]>>,
}

impl PathRecord {
    fn start(position: Position) -> Self {
        Self {
            points: vec![position],
            ..Self::default()
        }
    }

    fn push(&mut self, position: Position) {
        if let Some(last) = self.points.last() {
            self.meters += last.to_point().haversine_distance(&position.to_point());
        }
        self.points.push(position);
        self.shared = OnceLock::new();
    }

    fn shared(&self) -> Arc<[Position]> {
        self.shared
            .get_or_init(|| Arc::from(self.points.as_slice()))
            .clone()
    }
}

/// Case-insensitive substring match on species name
#[derive(Debug, Clone)]
struct SpeciesFilter {
    text: String,
    needle: String,
}

impl SpeciesFilter {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            needle: text.to_lowercase(),
        }
    }

    fn matches(&self, entity: &Entity) -> bool {
        entity.species.to_lowercase().contains(&self.needle)
    }
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &EntityId) -> bool {
        self.toggled.contains(id) || self.filter_matched.contains(id)
    }

    /// Flip user selection for `id`.
    ///
    /// Deselecting removes the entity from both mechanisms, so a filter-matched
    /// entity can be dismissed individually until the filter is next applied.
    pub fn toggle(&mut self, id: &EntityId, registry: &Registry) -> Toggle {
        if self.is_selected(id) {
            self.toggled.remove(id);
            if self.filter_matched.remove(id) {
                self.dismissed.insert(id.clone());
            }
            self.paths.remove(id);
            tracing::debug!("Deselected {}", id);
            return Toggle::Deselected;
        }

        let Some(entity) = registry.get(id) else {
            return Toggle::Unknown;
        };

        self.dismissed.remove(id);
        self.toggled.insert(id.clone());
        self.paths.insert(id.clone(), PathRecord::start(entity.position));
        tracing::debug!("Selected {}", id);
        Toggle::Selected
    }

    /// Observe one registry change. Returns true when the selection or a path changed.
    ///
    /// With a filter active the changed entity's membership is re-evaluated:
    /// it joins when its species now matches and leaves when it no longer does.
    pub fn on_registry_change(&mut self, change: &RegistryChange, registry: &Registry) -> bool {
        let matches = match (&self.filter, registry.get(&change.id)) {
            (Some(filter), Some(entity)) => Some(filter.matches(entity)),
            _ => None,
        };

        match matches {
            Some(true)
                if !self.is_selected(&change.id) && !self.dismissed.contains(&change.id) =>
            {
                self.filter_matched.insert(change.id.clone());
                self.paths.insert(change.id.clone(), PathRecord::start(change.position));
                tracing::debug!("{} joined the filter selection", change.id);
                return true;
            }
            Some(false) if self.filter_matched.contains(&change.id) => {
                self.filter_matched.remove(&change.id);
                if !self.toggled.contains(&change.id) {
                    self.paths.remove(&change.id);
                    tracing::debug!("{} left the filter selection", change.id);
                    return true;
                }
            }
            _ => {}
        }

        if self.is_selected(&change.id) {
            match self.paths.get_mut(&change.id) {
                Some(record) => record.push(change.position),
                None => {
                    self.paths
                        .insert(change.id.clone(), PathRecord::start(change.position));
                }
            }
            return true;
        }

        false
    }

    /// Replace the filter and recompute its members.
    ///
    /// Blank text clears the filter: filter-selected entities leave the
    /// selection and lose their paths, user-toggled entities keep theirs.
    pub fn set_filter(&mut self, text: &str, registry: &Registry) {
        let text = text.trim();
        let filter = (!text.is_empty()).then(|| SpeciesFilter::new(text));

        let matched: AHashSet<EntityId> = match &filter {
            Some(filter) => registry
                .snapshot()
                .iter()
                .filter(|e| filter.matches(e))
                .map(|e| e.id.clone())
                .collect(),
            None => AHashSet::new(),
        };

        self.dismissed.clear();
        let previous = std::mem::take(&mut self.filter_matched);
        for id in previous.difference(&matched) {
            if !self.toggled.contains(id) {
                self.paths.remove(id);
            }
        }
        for id in &matched {
            if !self.paths.contains_key(id) {
                if let Some(entity) = registry.get(id) {
                    self.paths.insert(id.clone(), PathRecord::start(entity.position));
                }
            }
        }

        tracing::debug!(
            "Filter {:?} matched {} entities",
            filter.as_ref().map(|f| f.text.as_str()),
            matched.len()
        );
        self.filter_matched = matched;
        self.filter = filter;
    }

    pub fn filter_text(&self) -> Option<&str> {
        self.filter.as_ref().map(|f| f.text.as_str())
    }

    /// True when no filter is active or the entity's species matches it
    pub fn matches_filter(&self, entity: &Entity) -> bool {
        self.filter.as_ref().map_or(true, |f| f.matches(entity))
    }

    /// Selected identities in sorted order
    pub fn selected(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .toggled
            .union(&self.filter_matched)
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn selected_count(&self) -> usize {
        self.toggled.union(&self.filter_matched).count()
    }

    pub fn path(&self, id: &EntityId) -> Option<&[Position]> {
        self.paths.get(id).map(|record| record.points.as_slice())
    }

    /// Shared copy of the path, rebuilt only after the path has grown
    pub fn shared_path(&self, id: &EntityId) -> Option<Arc<[Position]>> {
        self.paths.get(id).map(PathRecord::shared)
    }

    /// Great-circle length of the recorded path in kilometres
    pub fn path_length_km(&self, id: &EntityId) -> Option<f64> {
        self.paths.get(id).map(|record| record.meters / 1000.0)
    }
}
