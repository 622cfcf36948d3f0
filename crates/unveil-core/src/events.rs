//! Disclosure events and the telemetry payloads they map to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Telemetry category shared by every disclosure event.
pub const KEYS_CATEGORY: &str = "Keys";

/// What kind of secret the reveal flow is guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// Secret recovery phrase.
    #[default]
    Srp,
    /// Single account private key.
    Pkey,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Srp => "srp",
            KeyType::Pkey => "pkey",
        }
    }
}

/// How the secret left the reveal screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMethod {
    Clipboard,
}

impl CopyMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyMethod::Clipboard => "clipboard",
        }
    }
}

/// One auditable step of the reveal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisclosureKind {
    /// A password reached the verifier.
    Requested,
    /// The verifier rejected the password.
    Failed,
    /// The hold gate completed and the secret became readable.
    Revealed,
    ViewedText,
    ViewedQr,
    /// Generic export-copied event.
    Copied,
    /// Recovery-phrase specific copy event, emitted right after `Copied`.
    CopiedToClipboard,
    /// Generic export-cancelled event.
    Cancelled,
    /// Reveal-screen close tracking for the cancel path.
    RevealCancelled,
    /// Reveal-screen close tracking after a completed reveal.
    Done,
}

impl DisclosureKind {
    /// Telemetry event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            DisclosureKind::Requested => "Key Export Requested",
            DisclosureKind::Failed => "Key Export Failed",
            DisclosureKind::Revealed => "Key Export Revealed",
            DisclosureKind::ViewedText => "SRP Views SRP Text",
            DisclosureKind::ViewedQr => "SRP Views SRP QR",
            DisclosureKind::Copied => "Key Export Copied",
            DisclosureKind::CopiedToClipboard => "SRP Copied To Clipboard",
            DisclosureKind::Cancelled => "Key Export Canceled",
            DisclosureKind::RevealCancelled => "SRP Reveal Cancelled",
            DisclosureKind::Done => "SRP Reveal Done Clicked",
        }
    }
}

/// Immutable record of a reveal-flow transition. Emitted, never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureEvent {
    pub kind: DisclosureKind,
    pub key_type: KeyType,
    /// Verifier message, only for `Failed`.
    pub reason: Option<String>,
    /// Only for the two copy events.
    pub copy_method: Option<CopyMethod>,
}

impl DisclosureEvent {
    pub fn new(kind: DisclosureKind, key_type: KeyType) -> Self {
        Self {
            kind,
            key_type,
            reason: None,
            copy_method: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_copy_method(mut self, method: CopyMethod) -> Self {
        self.copy_method = Some(method);
        self
    }

    /// Build the payload handed to the telemetry sink.
    pub fn to_telemetry(&self) -> TelemetryEvent {
        let mut properties = Map::new();
        properties.insert("key_type".into(), Value::from(self.key_type.as_str()));
        if self.kind == DisclosureKind::Failed {
            properties.insert(
                "reason".into(),
                self.reason.clone().map(Value::from).unwrap_or(Value::Null),
            );
        }
        if let Some(method) = self.copy_method {
            properties.insert("copy_method".into(), Value::from(method.as_str()));
        }
        TelemetryEvent {
            category: KEYS_CATEGORY.to_string(),
            event: self.kind.event_name().to_string(),
            properties,
        }
    }
}

/// Payload shape accepted by telemetry sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub category: String,
    pub event: String,
    pub properties: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_payload() {
        let event = DisclosureEvent::new(DisclosureKind::Requested, KeyType::Srp).to_telemetry();
        assert_eq!(event.category, "Keys");
        assert_eq!(event.event, "Key Export Requested");
        assert_eq!(event.properties.len(), 1);
        assert_eq!(event.properties["key_type"], "srp");
    }

    #[test]
    fn failed_payload_always_carries_reason_key() {
        let without = DisclosureEvent::new(DisclosureKind::Failed, KeyType::Srp).to_telemetry();
        assert_eq!(without.properties["reason"], Value::Null);

        let with = DisclosureEvent::new(DisclosureKind::Failed, KeyType::Srp)
            .with_reason("Incorrect password")
            .to_telemetry();
        assert_eq!(with.properties["reason"], "Incorrect password");
    }

    #[test]
    fn copy_payload_has_method() {
        let event = DisclosureEvent::new(DisclosureKind::CopiedToClipboard, KeyType::Srp)
            .with_copy_method(CopyMethod::Clipboard)
            .to_telemetry();
        assert_eq!(event.event, "SRP Copied To Clipboard");
        assert_eq!(event.properties["copy_method"], "clipboard");
    }

    #[test]
    fn reason_ignored_outside_failed() {
        let event = DisclosureEvent::new(DisclosureKind::Done, KeyType::Pkey)
            .with_reason("ignored")
            .to_telemetry();
        assert!(!event.properties.contains_key("reason"));
        assert_eq!(event.properties["key_type"], "pkey");
    }

    #[test]
    fn event_names_are_distinct() {
        let kinds = [
            DisclosureKind::Requested,
            DisclosureKind::Failed,
            DisclosureKind::Revealed,
            DisclosureKind::ViewedText,
            DisclosureKind::ViewedQr,
            DisclosureKind::Copied,
            DisclosureKind::CopiedToClipboard,
            DisclosureKind::Cancelled,
            DisclosureKind::RevealCancelled,
            DisclosureKind::Done,
        ];
        let names: std::collections::HashSet<_> = kinds.iter().map(|k| k.event_name()).collect();
        assert_eq!(names.len(), kinds.len());
    }

    #[test]
    fn key_type_deserializes_lowercase() {
        let kt: KeyType = serde_json::from_str("\"pkey\"").unwrap();
        assert_eq!(kt, KeyType::Pkey);
    }
}
