//! Stream channel - one logical connection to the remote publisher
//!
//! The channel owns at most one session task. Connecting spawns it under a
//! fresh epoch; disconnecting drops it and bumps the epoch again, so anything
//! the old session already queued is recognisably stale. While connected the
//! session never gives up: failures are reported as `Degraded` and retried
//! with exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use crate::core::config::TrackerConfig;
use crate::telemetry::task::TaskGuard;
use crate::telemetry::transport::Transport;
use crate::telemetry::wire::decode_frame;
use crate::telemetry::{ConnectionStatus, Inbound, InboundSender};

#[derive(Debug, Clone, Copy)]
struct Backoff {
    initial: Duration,
    max: Duration,
}

pub struct StreamChannel {
    transport: Arc<dyn Transport>,
    topic: String,
    backoff: Backoff,
    inbox: InboundSender,
    epoch: u64,
    session: Option<TaskGuard>,
    status: ConnectionStatus,
}

impl StreamChannel {
    pub fn new(config: &TrackerConfig, transport: Arc<dyn Transport>, inbox: InboundSender) -> Self {
        Self {
            transport,
            topic: config.topic.clone(),
            backoff: Backoff {
                initial: config.reconnect_initial(),
                max: config.reconnect_max(),
            },
            inbox,
            epoch: 0,
            session: None,
            status: ConnectionStatus::Disconnected,
        }
    }

    /// Start a session. No-op (returns false) when already connected.
    pub fn connect(&mut self) -> bool {
        if self.session.is_some() {
            return false;
        }

        self.epoch += 1;
        self.status = ConnectionStatus::Connecting;
        tracing::info!(
            "Connecting stream channel to {} (epoch {})",
            self.transport.describe(),
            self.epoch
        );

        self.session = Some(TaskGuard::spawn(run_session(
            self.transport.clone(),
            self.topic.clone(),
            self.backoff,
            self.epoch,
            self.inbox.clone(),
        )));
        true
    }

    pub fn reconnect(&mut self) -> bool {
        self.connect()
    }

    /// Drop the session. No-op (returns false) when already disconnected.
    ///
    /// Frames still queued from the dropped session are rejected by
    /// `accepts` from here on.
    pub fn disconnect(&mut self) -> bool {
        if self.session.take().is_none() {
            return false;
        }

        self.epoch += 1;
        self.status = ConnectionStatus::Disconnected;
        tracing::info!("Stream channel disconnected");
        true
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Whether an event from `epoch` may still be applied
    pub fn accepts(&self, epoch: u64) -> bool {
        self.session.is_some() && epoch == self.epoch
    }

    /// Record a status report from the current session; stale reports are ignored
    pub fn apply_status(&mut self, epoch: u64, status: ConnectionStatus) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.status = status;
        true
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

async fn run_session(
    transport: Arc<dyn Transport>,
    topic: String,
    backoff: Backoff,
    epoch: u64,
    inbox: InboundSender,
) {
    let mut attempt: u32 = 0;
    let mut delay = backoff.initial;

    loop {
        let reason = match transport.open().await {
            Ok(mut frames) => {
                attempt = 0;
                delay = backoff.initial;
                tracing::info!("Stream connected to {}", transport.describe());
                let connected = Inbound::Status {
                    epoch,
                    status: ConnectionStatus::Connected,
                };
                if inbox.send(connected).is_err() {
                    return;
                }

                while let Some(frame) = frames.recv().await {
                    match decode_frame(&frame, &topic) {
                        Ok(Some(batch)) => {
                            if inbox.send(Inbound::Stream { epoch, batch }).is_err() {
                                return;
                            }
                        }
                        Ok(None) => tracing::trace!("Ignoring frame for another topic"),
                        Err(e) => tracing::warn!("Dropping frame: {}", e),
                    }
                }
                "connection closed by publisher".to_string()
            }
            Err(e) => e.to_string(),
        };

        attempt += 1;
        tracing::warn!(
            "Stream degraded (attempt {}): {}; retrying in {:?}",
            attempt,
            reason,
            delay
        );
        let degraded = Inbound::Status {
            epoch,
            status: ConnectionStatus::Degraded { attempt, reason },
        };
        if inbox.send(degraded).is_err() {
            return;
        }

        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(backoff.max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EntityId;
    use crate::registry::EntityUpdate;
    use crate::telemetry::transport::LocalPublisher;
    use crate::telemetry::InboundReceiver;
    use tokio::sync::mpsc;

    fn channel_with(publisher: &LocalPublisher) -> (StreamChannel, InboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = TrackerConfig::default();
        let transport = Arc::new(publisher.transport(config.frame_buffer));
        (StreamChannel::new(&config, transport, tx), rx)
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_are_idempotent() {
        let publisher = LocalPublisher::new(16);
        let (mut channel, _rx) = channel_with(&publisher);

        assert!(channel.connect());
        assert!(!channel.connect());
        assert!(!channel.reconnect());
        assert!(channel.is_connected());

        assert!(channel.disconnect());
        assert!(!channel.disconnect());
        assert_eq!(channel.status(), &ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_session_reports_connected_then_delivers_batches() {
        let publisher = LocalPublisher::new(16);
        let (mut channel, mut rx) = channel_with(&publisher);
        channel.connect();

        let Some(Inbound::Status { epoch, status }) = rx.recv().await else {
            panic!("expected status event");
        };
        assert!(channel.apply_status(epoch, status));
        assert_eq!(channel.status(), &ConnectionStatus::Connected);

        let update = EntityUpdate::new(EntityId::new("a")).with_speed(4.0);
        publisher.publish("animalData", &vec![update.clone()]).unwrap();
        publisher.publish("chatMessage", &"hello").unwrap();
        publisher.publish("animalData", &update).unwrap();

        let Some(Inbound::Stream { epoch: first, batch }) = rx.recv().await else {
            panic!("expected stream event");
        };
        assert!(channel.accepts(first));
        assert!(batch.bulk);
        assert_eq!(batch.updates, vec![update.clone()]);

        // The chat frame never reaches the inbox
        let Some(Inbound::Stream { batch, .. }) = rx.recv().await else {
            panic!("expected stream event");
        };
        assert!(!batch.bulk);
    }

    #[tokio::test]
    async fn test_events_from_old_epoch_are_stale() {
        let publisher = LocalPublisher::new(16);
        let (mut channel, mut rx) = channel_with(&publisher);
        channel.connect();
        let Some(Inbound::Status { epoch, .. }) = rx.recv().await else {
            panic!("expected status event");
        };

        channel.disconnect();
        assert!(!channel.accepts(epoch));
        channel.connect();
        assert!(!channel.accepts(epoch));
        assert!(channel.accepts(channel.epoch()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_degrades_and_retries() {
        let publisher = LocalPublisher::new(16);
        publisher.set_online(false);
        let (mut channel, mut rx) = channel_with(&publisher);
        channel.connect();

        let Some(Inbound::Status { epoch, status }) = rx.recv().await else {
            panic!("expected status event");
        };
        assert!(matches!(status, ConnectionStatus::Degraded { attempt: 1, .. }));
        channel.apply_status(epoch, status);

        let Some(Inbound::Status { status, .. }) = rx.recv().await else {
            panic!("expected status event");
        };
        assert!(matches!(status, ConnectionStatus::Degraded { attempt: 2, .. }));

        publisher.set_online(true);
        let Some(Inbound::Status { status, .. }) = rx.recv().await else {
            panic!("expected status event");
        };
        assert_eq!(status, ConnectionStatus::Connected);
    }
}
