//! Split run event system.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel. This is the push
//! half of the status surface; the polled half is the
//! orchestrator's status snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ids::RunId;

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// Payload describing what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    // -- Run lifecycle -------------------------------------------------------
    RunStarted {
        run_id: RunId,
    },
    RunProcessing {
        run_id: RunId,
        total_segments: usize,
    },
    RunCompleted {
        run_id: RunId,
        artifacts: Vec<String>,
    },
    RunFailed {
        run_id: RunId,
        error: String,
    },
    RunCancelled {
        run_id: RunId,
    },

    // -- Segment lifecycle ---------------------------------------------------
    SegmentStarted {
        run_id: RunId,
        index: usize,
        name: String,
    },
    SegmentProgress {
        run_id: RunId,
        index: usize,
        percent: u8,
    },
    SegmentCompleted {
        run_id: RunId,
        index: usize,
        name: String,
        size: u64,
    },
}

impl EventPayload {
    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RunCompleted { .. } | Self::RunFailed { .. } | Self::RunCancelled { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A timestamped event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event with a fresh UUID and the current timestamp.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel for run events.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus whose channel buffers `capacity` events per
    /// subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers.
    pub fn broadcast(&self, payload: EventPayload) {
        // Ignore send errors (no subscribers).
        let _ = self.tx.send(Event::new(payload));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let run_id = RunId::new();
        bus.broadcast(EventPayload::RunStarted { run_id });

        let event = rx.try_recv().unwrap();
        match &event.payload {
            EventPayload::RunStarted { run_id: received } => assert_eq!(*received, run_id),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn subscribers_see_events_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let run_id = RunId::new();

        bus.broadcast(EventPayload::RunStarted { run_id });
        bus.broadcast(EventPayload::RunProcessing { run_id, total_segments: 2 });
        bus.broadcast(EventPayload::RunCancelled { run_id });

        assert!(matches!(rx.try_recv().unwrap().payload, EventPayload::RunStarted { .. }));
        assert!(matches!(rx.try_recv().unwrap().payload, EventPayload::RunProcessing { .. }));
        assert!(rx.try_recv().unwrap().payload.is_terminal());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.broadcast(EventPayload::RunFailed {
            run_id: RunId::new(),
            error: "test".into(),
        });
    }

    #[test]
    fn only_run_endings_are_terminal() {
        let run_id = RunId::new();
        let payload = EventPayload::SegmentCompleted {
            run_id,
            index: 1,
            name: "output_2.mp4".into(),
            size: 1024,
        };
        assert!(!payload.is_terminal());
        assert!(EventPayload::RunFailed { run_id, error: "x".into() }.is_terminal());
        assert!(EventPayload::RunCompleted { run_id, artifacts: vec![] }.is_terminal());
    }

    #[test]
    fn payload_serializes_with_type_tag() {
        let payload = EventPayload::SegmentProgress {
            run_id: RunId::new(),
            index: 0,
            percent: 42,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "segment_progress");
        assert_eq!(json["percent"], 42);
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::default();
        bus.broadcast(EventPayload::RunStarted { run_id: RunId::new() });
        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
