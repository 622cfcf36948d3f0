pub mod audit;
pub mod auth;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod hold;
pub mod lifecycle;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use audit::{DisclosureAuditor, TelemetryError, TelemetrySink};
pub use auth::{AuthError, AuthVerifier, SecretPhrase};
pub use clipboard::{Clipboard, ClipboardError};
pub use error::{RevealError, RevealResult};
pub use events::{DisclosureEvent, DisclosureKind, KeyType, TelemetryEvent};
pub use gate::{RevealGate, RevealState, ViewMode};
pub use hold::HoldOutcome;
