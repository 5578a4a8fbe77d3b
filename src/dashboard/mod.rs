//! Dashboard controller - the single point of serialization
//!
//! Owns the registry and every piece of session state. Producer events arrive
//! through the inbox and user commands through a command queue; each is
//! applied to completion before the next, and a fresh view is published after
//! every change.

pub mod command;
pub mod options;
pub mod view;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::core::config::TrackerConfig;
use crate::core::types::EntityId;
use crate::registry::{EntityUpdate, Registry, RegistryReceiver};
use crate::selection::{SelectionTracker, Toggle};
use crate::stats::aggregate;
use crate::telemetry::channel::StreamChannel;
use crate::telemetry::motion::MotionSimulator;
use crate::telemetry::playback::{PlaybackController, PlaybackState};
use crate::telemetry::transport::Transport;
use crate::telemetry::wire::DecodedBatch;
use crate::telemetry::{Inbound, InboundReceiver};

pub use command::Command;
pub use options::VisualOptions;
pub use view::{DashboardView, TrackedPath};

pub struct Dashboard {
    registry: Registry,
    changes: RegistryReceiver,
    tracker: SelectionTracker,
    channel: StreamChannel,
    motion: MotionSimulator,
    playback: PlaybackController,
    options: VisualOptions,
    rejected: u64,
    commands_applied: u64,
    view_tx: watch::Sender<DashboardView>,
}

impl Dashboard {
    /// Build the dashboard and the inbox its producers report into.
    ///
    /// Nothing is spawned until `start`.
    pub fn new(config: &TrackerConfig, transport: Arc<dyn Transport>) -> (Self, InboundReceiver) {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let mut registry = Registry::new();
        let changes = registry.subscribe();
        let (view_tx, _) = watch::channel(DashboardView::default());

        let dashboard = Self {
            registry,
            changes,
            tracker: SelectionTracker::new(),
            channel: StreamChannel::new(config, transport, inbox_tx.clone()),
            motion: MotionSimulator::new(config, inbox_tx),
            playback: PlaybackController::new(),
            options: VisualOptions::default(),
            rejected: 0,
            commands_applied: 0,
            view_tx,
        };
        (dashboard, inbox_rx)
    }

    /// Open the stream if playback is running. Requires a tokio runtime.
    pub fn start(&mut self) {
        if self.playback.is_playing() {
            self.channel.connect();
        }
        self.publish();
    }

    pub fn subscribe_view(&self) -> watch::Receiver<DashboardView> {
        self.view_tx.subscribe()
    }

    /// Apply the startup bulk load. Not gated by playback.
    pub fn load_bulk(&mut self, batch: DecodedBatch) -> usize {
        self.rejected += batch.rejected.len() as u64;
        let applied = self.apply_updates(&batch.updates);
        tracing::info!("Bulk load applied {} records", applied);
        self.publish();
        applied
    }

    /// Apply one producer event. Returns true when it mutated the registry.
    pub fn handle_inbound(&mut self, event: Inbound) -> bool {
        match event {
            Inbound::Stream { epoch, batch } => {
                if !self.playback.is_playing() || !self.channel.accepts(epoch) {
                    tracing::debug!(
                        "Dropping {} stream records from inactive session",
                        batch.updates.len()
                    );
                    return false;
                }
                self.rejected += batch.rejected.len() as u64;
                let applied = self.apply_updates(&batch.updates);
                tracing::debug!(
                    "Applied {} stream records ({})",
                    applied,
                    if batch.bulk { "bulk" } else { "incremental" }
                );
                self.publish();
                applied > 0
            }
            Inbound::MotionTick { epoch } => {
                if !self.playback.is_playing() || !self.motion.accepts(epoch) {
                    return false;
                }
                let updates = self.motion.perturb(&self.registry.snapshot());
                let applied = self.apply_updates(&updates);
                self.publish();
                applied > 0
            }
            Inbound::Status { epoch, status } => {
                if self.channel.apply_status(epoch, status) {
                    self.publish();
                }
                false
            }
        }
    }

    fn apply_updates(&mut self, updates: &[EntityUpdate]) -> usize {
        let mut applied = 0;
        for update in updates {
            match self.registry.upsert(update) {
                Ok(_) => applied += 1,
                Err(e) => {
                    tracing::warn!("Rejected update for {}: {}", update.id, e);
                    self.rejected += 1;
                }
            }
            self.drain_changes();
        }
        applied
    }

    fn drain_changes(&mut self) {
        while let Ok(change) = self.changes.try_recv() {
            self.tracker.on_registry_change(&change, &self.registry);
        }
    }

    /// Apply one user command. The published view counts it even when the
    /// command changed nothing.
    pub fn execute(&mut self, command: Command) {
        self.commands_applied += 1;
        match command {
            Command::SetFilter(text) => self.set_filter_text(&text),
            Command::Toggle(id) => {
                self.toggle_selection(&id);
            }
            Command::SetVisualOptions(options) => self.set_visual_options(options),
            Command::Pause => {
                self.pause();
            }
            Command::Resume => {
                self.resume();
            }
            Command::TogglePlayback => {
                self.toggle_playback();
            }
            Command::Shutdown => self.shutdown(),
        }
        self.publish();
    }

    pub fn set_filter_text(&mut self, text: &str) {
        self.tracker.set_filter(text, &self.registry);
        self.publish();
    }

    pub fn toggle_selection(&mut self, id: &EntityId) -> Toggle {
        let outcome = self.tracker.toggle(id, &self.registry);
        if outcome != Toggle::Unknown {
            self.publish();
        }
        outcome
    }

    pub fn set_visual_options(&mut self, options: VisualOptions) {
        self.options = options;
        self.motion.set_active(options.blinking);
        self.publish();
    }

    pub fn pause(&mut self) -> bool {
        let changed = self.playback.pause(&mut self.channel, &mut self.motion);
        if changed {
            self.publish();
        }
        changed
    }

    pub fn resume(&mut self) -> bool {
        let changed = self.playback.resume(&mut self.channel, &mut self.motion);
        if changed {
            self.publish();
        }
        changed
    }

    pub fn toggle_playback(&mut self) -> PlaybackState {
        let state = self.playback.toggle(&mut self.channel, &mut self.motion);
        self.publish();
        state
    }

    /// Release every producer
    pub fn shutdown(&mut self) {
        self.channel.disconnect();
        self.motion.disarm();
        self.publish();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    pub fn channel(&self) -> &StreamChannel {
        &self.channel
    }

    pub fn motion(&self) -> &MotionSimulator {
        &self.motion
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    pub fn options(&self) -> VisualOptions {
        self.options
    }

    /// Build the current view from scratch
    pub fn view(&self) -> DashboardView {
        let entities: Vec<_> = self
            .registry
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|e| self.tracker.matches_filter(e))
            .collect();
        let statistics = aggregate(&entities);

        let selected = self
            .tracker
            .selected()
            .into_iter()
            .map(|id| TrackedPath {
                path: self.tracker.shared_path(&id).unwrap_or_else(|| Arc::from(Vec::new())),
                length_km: self.tracker.path_length_km(&id).unwrap_or(0.0),
                id,
            })
            .collect();

        DashboardView {
            statistics,
            entities,
            selected,
            filter: self.tracker.filter_text().map(str::to_string),
            playback: self.playback.state(),
            connection: self.channel.status().clone(),
            options: self.options,
            rejected_records: self.rejected,
            commands_applied: self.commands_applied,
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }

    /// Drive the dashboard until `Command::Shutdown` or the command queue closes
    pub async fn run(mut self, mut inbound: InboundReceiver, mut commands: mpsc::Receiver<Command>) {
        self.start();
        tracing::info!("Dashboard running");

        loop {
            tokio::select! {
                Some(event) = inbound.recv() => {
                    self.handle_inbound(event);
                }
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.execute(command),
                },
            }
        }

        self.shutdown();
        tracing::info!("Dashboard stopped with {} entities", self.registry.len());
    }
}
