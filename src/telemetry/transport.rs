//! Push transports feeding raw frames to the stream channel
//!
//! A transport opens one session at a time and hands back a bounded queue of
//! raw text frames. The queue closing means the session ended; the channel
//! decides whether and when to open another.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};

use crate::core::error::{Result, TrackerError};
use crate::telemetry::wire::Envelope;

pub type FrameReceiver = mpsc::Receiver<String>;

pub type OpenFuture<'a> = Pin<Box<dyn Future<Output = Result<FrameReceiver>> + Send + 'a>>;

/// A source of push frames
pub trait Transport: Send + Sync + 'static {
    /// Establish a session. Frames arrive on the returned queue until the
    /// session ends or the queue is dropped.
    fn open(&self) -> OpenFuture<'_>;

    /// Human-readable endpoint for logs
    fn describe(&self) -> String;
}

// === IN-PROCESS ===

/// In-process publisher; every open session receives every frame published
/// after it subscribed.
#[derive(Clone)]
pub struct LocalPublisher {
    sender: broadcast::Sender<String>,
    online: Arc<AtomicBool>,
}

impl LocalPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Publish a raw frame; returns the number of sessions it reached
    pub fn publish_frame(&self, frame: String) -> usize {
        self.sender.send(frame).unwrap_or(0)
    }

    /// Wrap `payload` in an envelope for `topic` and publish it
    pub fn publish<T: Serialize>(&self, topic: &str, payload: &T) -> Result<usize> {
        let envelope = Envelope::new(topic, serde_json::to_value(payload)?);
        Ok(self.publish_frame(serde_json::to_string(&envelope)?))
    }

    /// While offline, new sessions fail to open
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn transport(&self, frame_buffer: usize) -> LocalTransport {
        LocalTransport {
            publisher: self.clone(),
            frame_buffer,
        }
    }
}

pub struct LocalTransport {
    publisher: LocalPublisher,
    frame_buffer: usize,
}

impl Transport for LocalTransport {
    fn open(&self) -> OpenFuture<'_> {
        Box::pin(async move {
            if !self.publisher.online.load(Ordering::SeqCst) {
                return Err(TrackerError::Channel("local publisher offline".into()));
            }

            let mut source = self.publisher.sender.subscribe();
            let (tx, rx) = mpsc::channel(self.frame_buffer.max(1));

            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        received = source.recv() => match received {
                            Ok(frame) => {
                                if tx.send(frame).await.is_err() {
                                    break;
                                }
                            }
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::warn!("Local session lagged, skipped {} frames", skipped);
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        },
                    }
                }
            });

            Ok(rx)
        })
    }

    fn describe(&self) -> String {
        "local publisher".into()
    }
}

// === TCP ===

/// Newline-delimited frames over a plain TCP connection
pub struct TcpTransport {
    addr: String,
    frame_buffer: usize,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>, frame_buffer: usize) -> Self {
        Self {
            addr: addr.into(),
            frame_buffer,
        }
    }
}

impl Transport for TcpTransport {
    fn open(&self) -> OpenFuture<'_> {
        Box::pin(async move {
            let stream = TcpStream::connect(&self.addr)
                .await
                .map_err(|e| TrackerError::Channel(format!("connect {}: {}", self.addr, e)))?;

            let (tx, rx) = mpsc::channel(self.frame_buffer.max(1));
            let addr = self.addr.clone();

            tokio::spawn(async move {
                let mut lines = BufReader::new(stream).lines();
                loop {
                    tokio::select! {
                        _ = tx.closed() => break,
                        line = lines.next_line() => match line {
                            Ok(Some(line)) => {
                                if line.trim().is_empty() {
                                    continue;
                                }
                                if tx.send(line).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {
                                tracing::debug!("{} closed the connection", addr);
                                break;
                            }
                            Err(e) => {
                                tracing::warn!("Read from {} failed: {}", addr, e);
                                break;
                            }
                        },
                    }
                }
            });

            Ok(rx)
        })
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}
