// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::engine::BuildEvent;
use crate::errors::OrchestratorError;

/// One element of a job's event channel.
///
/// The terminal sentinel has neither an id nor a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub event_id: Option<String>,
    /// One NDJSON record, newline included.
    pub payload: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl QueuedEvent {
    fn sentinel() -> Self {
        Self {
            event_id: None,
            payload: None,
            timestamp: Utc::now(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.payload.is_none()
    }
}

/// Writing half of an event channel. Cheap to clone.
///
/// After `close` every further event is dropped, so the sentinel is always the last
/// element and is sent exactly once.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: mpsc::UnboundedSender<QueuedEvent>,
    closed: Arc<Mutex<bool>>,
}

impl EventEmitter {
    pub fn emit(&self, event: &BuildEvent) -> Result<(), OrchestratorError> {
        let mut payload = serde_json::to_string(event)?;
        payload.push('\n');
        let queued = QueuedEvent {
            event_id: Some(format!("{}-{}", event.name(), uuid::Uuid::new_v4())),
            payload: Some(payload),
            timestamp: Utc::now(),
        };

        let closed = self.closed.lock();
        if !*closed {
            // a dropped receiver means nobody is listening anymore
            let _ = self.tx.send(queued);
        }
        Ok(())
    }

    /// Pushes the terminal sentinel. Returns false if it was already pushed.
    pub fn close(&self) -> bool {
        let mut closed = self.closed.lock();
        if *closed {
            return false;
        }
        *closed = true;
        let _ = self.tx.send(QueuedEvent::sentinel());
        true
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }
}

/// What a poll-mode consumer gets back from one `drain`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainBatch {
    /// Decoded records, in order.
    pub events: Vec<Value>,
    /// The sentinel was reached; nothing more will arrive.
    pub closed: bool,
}

/// The ordered, sentinel-terminated stream of one job's events.
///
/// Supports two delivery modes over the same queue: stream (`recv`, `write_ndjson`)
/// and poll (`drain`).
#[derive(Debug)]
pub struct EventChannel {
    emitter: EventEmitter,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<QueuedEvent>>,
    sentinel_seen: Mutex<bool>,
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl EventChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            emitter: EventEmitter {
                tx,
                closed: Arc::new(Mutex::new(false)),
            },
            rx: tokio::sync::Mutex::new(rx),
            sentinel_seen: Mutex::new(false),
        }
    }

    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    pub fn close(&self) -> bool {
        self.emitter.close()
    }

    pub fn is_closed(&self) -> bool {
        self.emitter.is_closed()
    }

    /// Next element, sentinel included. `None` once the sentinel has been handed out.
    pub async fn recv(&self) -> Option<QueuedEvent> {
        if *self.sentinel_seen.lock() {
            return None;
        }
        let next = self.rx.lock().await.recv().await;
        if next.as_ref().map_or(true, QueuedEvent::is_sentinel) {
            *self.sentinel_seen.lock() = true;
        }
        next
    }

    /// Everything currently buffered, decoded.
    ///
    /// Waits at most `timeout` for the first element; when nothing arrives an empty,
    /// still-open batch is returned.
    pub async fn drain(&self, timeout: Duration) -> DrainBatch {
        if *self.sentinel_seen.lock() {
            return DrainBatch {
                events: Vec::new(),
                closed: true,
            };
        }
        let mut rx = self.rx.lock().await;
        let mut batch = DrainBatch::default();

        let first = match tokio::time::timeout(timeout, rx.recv()).await {
            Ok(first) => first,
            Err(_) => return batch,
        };
        let mut next = first;
        loop {
            match next {
                Some(event) if !event.is_sentinel() => {
                    if let Some(payload) = &event.payload {
                        match serde_json::from_str(payload) {
                            Ok(value) => batch.events.push(value),
                            Err(e) => tracing::warn!(error = %e, "Dropping undecodable event record"),
                        }
                    }
                }
                _ => {
                    batch.closed = true;
                    *self.sentinel_seen.lock() = true;
                    break;
                }
            }
            next = match rx.try_recv() {
                Ok(event) => Some(event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => None,
            };
        }
        batch
    }

    /// Streams every record to `writer` as NDJSON until the sentinel. Returns the
    /// number of records written.
    pub async fn write_ndjson<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0;
        while let Some(event) = self.recv().await {
            let Some(payload) = event.payload else {
                break;
            };
            writer.write_all(payload.as_bytes()).await?;
            writer.flush().await?;
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn sentinel_is_last_and_sent_once() {
        let channel = EventChannel::new();
        let emitter = channel.emitter();

        emitter.emit(&BuildEvent::End {}).unwrap();
        assert!(emitter.close());
        assert!(!channel.close());
        emitter.emit(&BuildEvent::End {}).unwrap();

        let first = channel.recv().await.unwrap();
        assert_eq!(first.payload.as_deref(), Some("{\"event\":\"end\",\"data\":{}}\n"));
        assert!(first.event_id.unwrap().starts_with("end-"));
        assert!(channel.recv().await.unwrap().is_sentinel());
        assert!(channel.recv().await.is_none());
    }

    #[tokio::test]
    async fn drain_times_out_with_an_empty_open_batch() {
        let channel = EventChannel::new();

        let batch = channel.drain(Duration::from_millis(10)).await;

        assert_eq!(batch, DrainBatch::default());
    }

    #[tokio::test]
    async fn drain_returns_everything_buffered() {
        let channel = EventChannel::new();
        let emitter = channel.emitter();
        emitter
            .emit(&BuildEvent::Error {
                vertex_id: None,
                error: "boom".into(),
            })
            .unwrap();
        emitter.emit(&BuildEvent::End {}).unwrap();

        let open = channel.drain(Duration::from_millis(10)).await;
        emitter.close();
        let closed = channel.drain(Duration::from_millis(10)).await;
        let after = channel.drain(Duration::from_millis(10)).await;

        assert_eq!(open.events.len(), 2);
        assert_eq!(open.events[0]["data"]["error"], json!("boom"));
        assert!(!open.closed);
        assert!(closed.events.is_empty() && closed.closed);
        assert!(after.closed);
    }

    #[tokio::test]
    async fn write_ndjson_stops_at_the_sentinel() {
        let channel = EventChannel::new();
        let emitter = channel.emitter();
        emitter
            .emit(&BuildEvent::VerticesSorted {
                ids: vec!["a".into()],
                to_run: vec!["a".into()],
            })
            .unwrap();
        emitter.emit(&BuildEvent::End {}).unwrap();
        emitter.close();

        let mut out: Vec<u8> = Vec::new();
        let written = channel.write_ndjson(&mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(written, 2);
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with("{\"event\":\"end\",\"data\":{}}\n"));
    }
}
