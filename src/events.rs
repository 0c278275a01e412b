// Copyright 2026 Applyflow Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine event bus — typed events from every component.
//!
//! The bus is a `tokio::sync::broadcast` channel carrying [`EngineEvent`]
//! values. Any consumer — a dashboard, a log sink, a supervising agent — can
//! subscribe independently. When no subscribers exist, events are silently
//! dropped (zero overhead).

use crate::variants::SystemVariant;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Every event the engine emits. Serialized to JSON for external consumers.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A new application attempt has started.
    AttemptStarted { attempt_id: String, job_id: String },
    /// A page was classified.
    PageClassified {
        attempt_id: String,
        url: String,
        variant: SystemVariant,
    },
    /// Field mapping finished for one page.
    FieldsMapped {
        attempt_id: String,
        bound: usize,
        synthesized: usize,
        unresolved: usize,
    },
    /// One wizard step finished.
    StepCompleted {
        attempt_id: String,
        step: usize,
        action: String,
    },
    /// The attempt reached a terminal outcome.
    AttemptFinished {
        attempt_id: String,
        job_id: String,
        outcome: String,
    },
    /// The pacing controller refused an action.
    Throttled { action: String },
    /// A restriction signal was observed. The session is over.
    SessionBlocked { url: String },
}

/// Broadcast bus for engine events.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. Dropped silently when nobody is listening.
    pub fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(EngineEvent::AttemptStarted {
            attempt_id: "a-1".into(),
            job_id: "job-9".into(),
        });

        match rx.recv().await.unwrap() {
            EngineEvent::AttemptStarted { job_id, .. } => assert_eq!(job_id, "job-9"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.emit(EngineEvent::Throttled {
            action: "click".into(),
        });
    }

    #[test]
    fn test_events_serialize_tagged() {
        let json = serde_json::to_string(&EngineEvent::SessionBlocked {
            url: "https://x.test".into(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"SessionBlocked\""));
    }
}
