//! Read-only view published to the renderer after every state change

use std::sync::Arc;

use serde::Serialize;

use crate::core::types::{EntityId, Position};
use crate::dashboard::options::VisualOptions;
use crate::registry::Entity;
use crate::stats::StatisticsSnapshot;
use crate::telemetry::{ConnectionStatus, PlaybackState};

/// A selected entity and its recorded path
///
/// The path is shared with the tracker, so publishing a view does not copy
/// paths that have not grown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPath {
    pub id: EntityId,
    pub path: Arc<[Position]>,
    pub length_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub statistics: StatisticsSnapshot,
    /// Entities passing the species filter (all of them when no filter is set)
    pub entities: Vec<Entity>,
    pub selected: Vec<TrackedPath>,
    pub filter: Option<String>,
    pub playback: PlaybackState,
    pub connection: ConnectionStatus,
    pub options: VisualOptions,
    /// Records rejected as malformed since startup
    pub rejected_records: u64,
    /// User commands applied so far
    pub commands_applied: u64,
}

impl DashboardView {
    pub fn path_of(&self, id: &EntityId) -> Option<&TrackedPath> {
        self.selected.iter().find(|t| &t.id == id)
    }

    pub fn selected_ids(&self) -> Vec<EntityId> {
        self.selected.iter().map(|t| t.id.clone()).collect()
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            statistics: StatisticsSnapshot::default(),
            entities: Vec::new(),
            selected: Vec::new(),
            filter: None,
            playback: PlaybackState::Playing,
            connection: ConnectionStatus::Disconnected,
            options: VisualOptions::default(),
            rejected_records: 0,
            commands_applied: 0,
        }
    }
}
