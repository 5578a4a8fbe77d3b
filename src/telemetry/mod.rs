//! Live telemetry producers and the events they deliver
//!
//! The stream channel and the motion simulator both run as background tasks
//! and report into one inbox owned by the dashboard. Every event carries the
//! epoch of the session or timer that produced it; the dashboard discards
//! events whose producer has since been disconnected or disarmed.

pub mod bulk;
pub mod channel;
pub mod demo;
pub mod motion;
pub mod playback;
pub mod task;
pub mod transport;
pub mod wire;

use serde::Serialize;
use tokio::sync::mpsc;

pub use bulk::BulkLoader;
pub use channel::StreamChannel;
pub use motion::MotionSimulator;
pub use playback::{PlaybackController, PlaybackState, Producer};
pub use transport::{LocalPublisher, TcpTransport, Transport};
pub use wire::DecodedBatch;

/// Connectivity of the stream channel as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// The session failed; the channel keeps retrying
    Degraded { attempt: u32, reason: String },
}

/// Events delivered to the dashboard inbox
#[derive(Debug)]
pub enum Inbound {
    Stream { epoch: u64, batch: DecodedBatch },
    Status { epoch: u64, status: ConnectionStatus },
    MotionTick { epoch: u64 },
}

pub type InboundSender = mpsc::UnboundedSender<Inbound>;
pub type InboundReceiver = mpsc::UnboundedReceiver<Inbound>;
