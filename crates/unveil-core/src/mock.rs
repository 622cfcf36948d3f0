//! In-memory collaborators for testing the reveal gate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::audit::{TelemetryError, TelemetrySink};
use crate::auth::{AuthError, AuthVerifier, SecretPhrase};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::events::TelemetryEvent;

/// Verifier that accepts exactly one password.
///
/// A latched verifier parks every call until [`ScriptedVerifier::release`],
/// which lets tests act while a check is in flight.
pub struct ScriptedVerifier {
    password: String,
    phrase: String,
    calls: AtomicUsize,
    unavailable: AtomicBool,
    latch: Option<Arc<Notify>>,
}

impl ScriptedVerifier {
    pub fn new(password: &str, phrase: &str) -> Self {
        Self {
            password: password.to_string(),
            phrase: phrase.to_string(),
            calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            latch: None,
        }
    }

    pub fn latched(mut self) -> Self {
        self.latch = Some(Arc::new(Notify::new()));
        self
    }

    /// Let one parked call proceed.
    pub fn release(&self) {
        if let Some(latch) = &self.latch {
            latch.notify_one();
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Yield until at least `n` calls have started.
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl AuthVerifier for ScriptedVerifier {
    async fn verify(&self, password: &str) -> Result<SecretPhrase, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latch) = &self.latch {
            latch.notified().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::VerifierUnavailable("scripted outage".into()));
        }
        if password == self.password {
            Ok(SecretPhrase::from(self.phrase.as_str()))
        } else {
            Err(AuthError::InvalidPassword)
        }
    }
}

/// Telemetry sink that keeps every payload, or fails every call.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
    attempts: AtomicUsize,
    failing: bool,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event.clone())
            .collect()
    }

    /// Calls to `track`, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn track(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(TelemetryError::Other("sink offline".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    copies: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn copies(&self) -> Vec<String> {
        self.copies.lock().unwrap().clone()
    }
}

impl Clipboard for RecordingClipboard {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClipboardError::Unavailable("scripted failure".into()));
        }
        self.copies.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
