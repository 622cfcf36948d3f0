//! Disclosure auditor. Forwards reveal-flow events to a telemetry sink.
//!
//! Sink failures are logged and dropped. The reveal flow never waits on,
//! or changes course because of, telemetry.

use std::sync::Arc;

use thiserror::Error;

use crate::events::{DisclosureEvent, DisclosureKind, KeyType, TelemetryEvent};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Telemetry I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Fire-and-forget consumer of telemetry payloads.
pub trait TelemetrySink: Send + Sync {
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

pub struct DisclosureAuditor {
    sink: Arc<dyn TelemetrySink>,
    key_type: KeyType,
}

impl DisclosureAuditor {
    pub fn new(sink: Arc<dyn TelemetrySink>, key_type: KeyType) -> Self {
        Self { sink, key_type }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Event of `kind` tagged with this auditor's key type.
    pub fn event(&self, kind: DisclosureKind) -> DisclosureEvent {
        DisclosureEvent::new(kind, self.key_type)
    }

    pub fn record(&self, event: DisclosureEvent) {
        let payload = event.to_telemetry();
        tracing::debug!(event = %payload.event, "disclosure event");
        if let Err(e) = self.sink.track(&payload) {
            tracing::warn!("Failed to record telemetry event '{}': {e}", payload.event);
        }
    }

    pub fn record_all(&self, events: impl IntoIterator<Item = DisclosureEvent>) {
        for event in events {
            self.record(event);
        }
    }
}
