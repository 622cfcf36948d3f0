//! Reveal gate: authorization and disclosure state machine for a wallet's
//! secret recovery phrase.
//!
//! Disclosure needs two things: a password the verifier accepts, then a
//! deliberate press-and-hold. The gate owns the session; UIs drive it
//! through the operations below and watch [`RevealGate::subscribe`] for
//! state changes.
//!
//! The session mutex is never held across the verifier `.await`, so
//! `cancel` takes effect while a check is still in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use zeroize::Zeroizing;

use crate::audit::DisclosureAuditor;
use crate::auth::{AuthVerifier, SecretPhrase};
use crate::clipboard::Clipboard;
use crate::config::RevealConfig;
use crate::error::{RevealError, RevealResult};
use crate::events::{CopyMethod, DisclosureKind};
use crate::hold::{HoldOutcome, HoldProgress, HoldToRevealTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevealState {
    /// Waiting for a password.
    Idle,
    /// A password is with the verifier.
    Verifying,
    /// Last password was rejected. Editing the password returns to `Idle`.
    Failed,
    /// Password accepted; waiting for the hold gesture.
    Armed,
    /// Reveal button is being held.
    Holding,
    /// Secret is readable.
    Revealed,
    /// Terminal.
    Closed,
}

/// How the revealed phrase is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Text,
    Qr,
}

impl ViewMode {
    fn viewed_kind(self) -> DisclosureKind {
        match self {
            ViewMode::Text => DisclosureKind::ViewedText,
            ViewMode::Qr => DisclosureKind::ViewedQr,
        }
    }
}

struct RevealSession {
    state: RevealState,
    attempt_count: u32,
    /// Readable secret. Only `Some` while `Revealed`.
    secret: Option<SecretPhrase>,
    /// Verifier result held between `Armed` and `Revealed`. Never exposed.
    armed_secret: Option<SecretPhrase>,
    view_mode: ViewMode,
    hold: Option<HoldProgress>,
}

impl RevealSession {
    fn new() -> Self {
        Self {
            state: RevealState::Idle,
            attempt_count: 0,
            secret: None,
            armed_secret: None,
            view_mode: ViewMode::Text,
            hold: None,
        }
    }

    /// Drop every copy of the secret. `SecretPhrase` zeroizes on drop.
    fn wipe(&mut self) {
        self.secret = None;
        self.armed_secret = None;
        self.hold = None;
    }
}

pub struct RevealGate {
    verifier: Arc<dyn AuthVerifier>,
    clipboard: Arc<dyn Clipboard>,
    auditor: DisclosureAuditor,
    timer: HoldToRevealTimer,
    session: Mutex<RevealSession>,
    state_tx: watch::Sender<RevealState>,
}

impl RevealGate {
    pub fn new(
        config: &RevealConfig,
        verifier: Arc<dyn AuthVerifier>,
        clipboard: Arc<dyn Clipboard>,
        auditor: DisclosureAuditor,
    ) -> Self {
        let (state_tx, _) = watch::channel(RevealState::Idle);
        Self {
            verifier,
            clipboard,
            auditor,
            timer: HoldToRevealTimer::new(config.hold_duration()),
            session: Mutex::new(RevealSession::new()),
            state_tx,
        }
    }

    // -- Observation ---

    pub fn state(&self) -> RevealState {
        self.session().state
    }

    /// Number of passwords that reached the verifier.
    pub fn attempt_count(&self) -> u32 {
        self.session().attempt_count
    }

    pub fn view_mode(&self) -> ViewMode {
        self.session().view_mode
    }

    pub fn hold_duration(&self) -> Duration {
        self.timer.required()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.state_tx.subscribe()
    }

    /// Copy of the phrase text, only while `Revealed`.
    pub fn secret_text(&self) -> Option<Zeroizing<String>> {
        let session = self.session();
        match session.state {
            RevealState::Revealed => session.secret.as_ref().map(SecretPhrase::to_text),
            _ => None,
        }
    }

    /// Run `f` against the raw secret, only while `Revealed`.
    pub fn with_secret<R>(&self, f: impl FnOnce(&SecretPhrase) -> R) -> Option<R> {
        let session = self.session();
        match session.state {
            RevealState::Revealed => session.secret.as_ref().map(f),
            _ => None,
        }
    }

    // -- Password ---

    /// Check `password` with the verifier.
    ///
    /// On success the gate is `Armed` and only `Requested` has been
    /// recorded; the secret stays hidden until the hold gesture completes.
    /// On rejection the gate is `Failed` and `Requested, Failed` have been
    /// recorded.
    pub async fn submit_password(&self, password: &str) -> RevealResult<()> {
        if password.is_empty() {
            return Err(RevealError::EmptyPassword);
        }

        let attempt = {
            let mut session = self.session();
            match session.state {
                RevealState::Idle | RevealState::Failed => {}
                RevealState::Verifying => return Err(RevealError::VerificationInProgress),
                RevealState::Closed => return Err(RevealError::SessionClosed),
                other => return Err(RevealError::InvalidState(other)),
            }
            session.attempt_count += 1;
            self.transition(&mut session, RevealState::Verifying);
            session.attempt_count
        };
        self.auditor.record(self.auditor.event(DisclosureKind::Requested));

        let mut pending = PendingVerification {
            gate: self,
            attempt,
            armed: true,
        };
        let outcome = self.verifier.verify(password).await;
        pending.armed = false;

        let mut session = self.session();
        if session.state != RevealState::Verifying || session.attempt_count != attempt {
            tracing::warn!(
                attempt,
                state = ?session.state,
                "Discarding verifier result for a session that moved on"
            );
            return Err(RevealError::SessionClosed);
        }

        match outcome {
            Ok(secret) => {
                session.armed_secret = Some(secret);
                self.transition(&mut session, RevealState::Armed);
                Ok(())
            }
            Err(e) => {
                self.transition(&mut session, RevealState::Failed);
                drop(session);
                tracing::info!(attempt, "Password rejected: {e}");
                self.auditor.record(
                    self.auditor
                        .event(DisclosureKind::Failed)
                        .with_reason(e.to_string()),
                );
                Err(e.into())
            }
        }
    }

    /// `Failed` → `Idle`, e.g. when the user edits the password field.
    pub fn clear_failure(&self) -> bool {
        let mut session = self.session();
        if session.state != RevealState::Failed {
            return false;
        }
        self.transition(&mut session, RevealState::Idle);
        true
    }

    // -- Hold to reveal ---

    /// Press-down on the reveal button. Only valid while `Armed`.
    pub fn on_press_start(&self) -> bool {
        self.press_start_at(Instant::now())
    }

    fn press_start_at(&self, now: Instant) -> bool {
        let mut session = self.session();
        if session.state != RevealState::Armed {
            tracing::debug!(state = ?session.state, "Ignoring press start");
            return false;
        }
        session.hold = Some(self.timer.start(now));
        self.transition(&mut session, RevealState::Holding);
        true
    }

    /// Press released after `elapsed`. Returns `None` if no press was active.
    pub fn on_press_end(&self, elapsed: Duration) -> Option<HoldOutcome> {
        self.end_press(self.session(), |_| elapsed)
    }

    /// Release, measuring elapsed time from the recorded press start.
    pub fn release(&self) -> Option<HoldOutcome> {
        self.release_at(Instant::now())
    }

    fn release_at(&self, now: Instant) -> Option<HoldOutcome> {
        self.end_press(self.session(), |hold| hold.elapsed_at(now))
    }

    /// Measure and classify the active press under one lock, so the
    /// elapsed time always belongs to the hold it completes.
    fn end_press(
        &self,
        mut session: MutexGuard<'_, RevealSession>,
        measure: impl FnOnce(&HoldProgress) -> Duration,
    ) -> Option<HoldOutcome> {
        if session.state != RevealState::Holding {
            tracing::debug!(state = ?session.state, "Ignoring press end");
            return None;
        }
        let hold = session.hold.take()?;
        let elapsed = measure(&hold);
        let required = hold.required;
        let outcome = hold.finish(elapsed);

        match outcome {
            HoldOutcome::TooShort { elapsed } => {
                tracing::debug!(?elapsed, ?required, "Hold released early");
                self.transition(&mut session, RevealState::Armed);
            }
            HoldOutcome::Completed => {
                let Some(secret) = session.armed_secret.take() else {
                    // Armed is only entered with a verified secret.
                    self.transition(&mut session, RevealState::Armed);
                    return None;
                };
                session.secret = Some(secret);
                session.view_mode = ViewMode::Text;
                self.transition(&mut session, RevealState::Revealed);
                drop(session);
                self.auditor.record_all([
                    self.auditor.event(DisclosureKind::Revealed),
                    self.auditor.event(ViewMode::Text.viewed_kind()),
                ]);
            }
        }
        Some(outcome)
    }

    /// Press interrupted (focus loss, pointer cancel). Same as an early release.
    pub fn interrupt(&self) -> bool {
        let mut session = self.session();
        if session.state != RevealState::Holding {
            return false;
        }
        session.hold = None;
        self.transition(&mut session, RevealState::Armed);
        true
    }

    // -- Revealed ---

    /// Switch between text and QR display. Records one event per change.
    pub fn set_view_mode(&self, mode: ViewMode) -> bool {
        let mut session = self.session();
        if session.state != RevealState::Revealed || session.view_mode == mode {
            return false;
        }
        session.view_mode = mode;
        drop(session);
        self.auditor.record(self.auditor.event(mode.viewed_kind()));
        true
    }

    /// Hand the phrase to the clipboard, then record both copy events.
    pub fn copy_to_clipboard(&self) -> RevealResult<()> {
        let text = self.secret_text().ok_or(RevealError::NotRevealed)?;
        self.clipboard.copy(&text)?;
        self.auditor.record_all([
            self.auditor
                .event(DisclosureKind::Copied)
                .with_copy_method(CopyMethod::Clipboard),
            self.auditor
                .event(DisclosureKind::CopiedToClipboard)
                .with_copy_method(CopyMethod::Clipboard),
        ]);
        Ok(())
    }

    /// Close after a completed reveal. Records `Done`.
    pub fn close(&self) -> bool {
        let mut session = self.session();
        if session.state != RevealState::Revealed {
            return false;
        }
        self.transition(&mut session, RevealState::Closed);
        drop(session);
        self.auditor.record(self.auditor.event(DisclosureKind::Done));
        true
    }

    /// Abandon the flow from any non-terminal state.
    /// Records `Cancelled, RevealCancelled` and wipes any secret.
    pub fn cancel(&self) -> bool {
        let mut session = self.session();
        if session.state == RevealState::Closed {
            return false;
        }
        self.transition(&mut session, RevealState::Closed);
        drop(session);
        self.auditor.record_all([
            self.auditor.event(DisclosureKind::Cancelled),
            self.auditor.event(DisclosureKind::RevealCancelled),
        ]);
        true
    }

    // -- Internals ---

    fn session(&self) -> MutexGuard<'_, RevealSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, session: &mut RevealSession, to: RevealState) {
        let from = session.state;
        session.state = to;
        if matches!(to, RevealState::Idle | RevealState::Closed) {
            session.wipe();
        }
        tracing::debug!(?from, ?to, "reveal state");
        self.state_tx.send_replace(to);
    }
}

/// Rolls an abandoned check back to `Idle`.
///
/// Lives across the verifier `.await`. If the caller drops the
/// `submit_password` future (timeout, losing `select!` arm, aborted task)
/// the attempt is no longer outstanding and a fresh submit must be allowed.
struct PendingVerification<'a> {
    gate: &'a RevealGate,
    attempt: u32,
    armed: bool,
}

impl Drop for PendingVerification<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = self.gate.session();
        if session.state == RevealState::Verifying && session.attempt_count == self.attempt {
            tracing::info!(attempt = self.attempt, "Password check abandoned");
            self.gate.transition(&mut session, RevealState::Idle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthError;
    use crate::events::KeyType;
    use crate::mock::{RecordingClipboard, RecordingTelemetry, ScriptedVerifier};

    const HOLD: Duration = Duration::from_millis(2000);

    struct Harness {
        gate: Arc<RevealGate>,
        verifier: Arc<ScriptedVerifier>,
        telemetry: Arc<RecordingTelemetry>,
        clipboard: Arc<RecordingClipboard>,
    }

    fn harness() -> Harness {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp"));
        harness_with(verifier)
    }

    fn harness_with(verifier: Arc<ScriptedVerifier>) -> Harness {
        let telemetry = Arc::new(RecordingTelemetry::new());
        let clipboard = Arc::new(RecordingClipboard::new());
        let config = RevealConfig {
            hold_duration_ms: HOLD.as_millis() as u64,
            key_type: KeyType::Srp,
        };
        let gate = Arc::new(RevealGate::new(
            &config,
            verifier.clone(),
            clipboard.clone(),
            DisclosureAuditor::new(telemetry.clone(), KeyType::Srp),
        ));
        Harness {
            gate,
            verifier,
            telemetry,
            clipboard,
        }
    }

    fn names(kinds: &[DisclosureKind]) -> Vec<String> {
        kinds.iter().map(|k| k.event_name().to_string()).collect()
    }

    async fn revealed(h: &Harness) {
        h.gate.submit_password("password").await.unwrap();
        assert!(h.gate.on_press_start());
        assert_eq!(h.gate.on_press_end(HOLD), Some(HoldOutcome::Completed));
        h.telemetry.clear();
    }

    #[tokio::test]
    async fn rejected_password_fails() {
        let h = harness();
        let err = h.gate.submit_password("bad-password").await.unwrap_err();
        assert!(matches!(err, RevealError::Auth(AuthError::InvalidPassword)));
        assert_eq!(h.gate.state(), RevealState::Failed);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Requested, DisclosureKind::Failed])
        );
        assert_eq!(h.telemetry.events()[1].properties["reason"], "Incorrect password");
        assert!(h.gate.secret_text().is_none());
    }

    #[tokio::test]
    async fn accepted_password_arms_without_reveal() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert_eq!(h.telemetry.names(), names(&[DisclosureKind::Requested]));
        assert!(h.gate.secret_text().is_none());
        assert_eq!(h.gate.attempt_count(), 1);
    }

    #[tokio::test]
    async fn empty_password_never_reaches_verifier() {
        let h = harness();
        let err = h.gate.submit_password("").await.unwrap_err();
        assert!(matches!(err, RevealError::EmptyPassword));
        assert_eq!(h.verifier.calls(), 0);
        assert_eq!(h.gate.state(), RevealState::Idle);
        assert!(h.telemetry.names().is_empty());
    }

    #[tokio::test]
    async fn retry_after_failure() {
        let h = harness();
        let _ = h.gate.submit_password("bad-password").await;
        h.telemetry.clear();
        h.gate.submit_password("password").await.unwrap();
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert_eq!(h.telemetry.names(), names(&[DisclosureKind::Requested]));
        assert_eq!(h.verifier.calls(), 2);
        assert_eq!(h.gate.attempt_count(), 2);
    }

    #[tokio::test]
    async fn clear_failure_returns_to_idle() {
        let h = harness();
        assert!(!h.gate.clear_failure());
        let _ = h.gate.submit_password("nope").await;
        assert!(h.gate.clear_failure());
        assert_eq!(h.gate.state(), RevealState::Idle);
    }

    #[tokio::test]
    async fn unavailable_verifier_is_a_failure() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp"));
        verifier.set_unavailable(true);
        let h = harness_with(verifier);
        let err = h.gate.submit_password("password").await.unwrap_err();
        assert!(matches!(
            err,
            RevealError::Auth(AuthError::VerifierUnavailable(_))
        ));
        assert_eq!(h.gate.state(), RevealState::Failed);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Requested, DisclosureKind::Failed])
        );
    }

    #[tokio::test]
    async fn submit_while_armed_is_invalid() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        let err = h.gate.submit_password("password").await.unwrap_err();
        assert!(matches!(err, RevealError::InvalidState(RevealState::Armed)));
        assert_eq!(h.verifier.calls(), 1);
    }

    #[tokio::test]
    async fn short_hold_rearms_silently() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        h.telemetry.clear();

        assert!(h.gate.on_press_start());
        assert_eq!(h.gate.state(), RevealState::Holding);
        let outcome = h.gate.on_press_end(HOLD - Duration::from_millis(1));
        assert!(matches!(outcome, Some(HoldOutcome::TooShort { .. })));
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert!(h.telemetry.names().is_empty());
        assert!(h.gate.secret_text().is_none());
    }

    #[tokio::test]
    async fn full_hold_reveals() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        h.telemetry.clear();

        assert!(h.gate.on_press_start());
        assert_eq!(h.gate.on_press_end(HOLD), Some(HoldOutcome::Completed));
        assert_eq!(h.gate.state(), RevealState::Revealed);
        assert_eq!(h.gate.secret_text().unwrap().as_str(), "test srp");
        assert_eq!(h.gate.view_mode(), ViewMode::Text);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Revealed, DisclosureKind::ViewedText])
        );
    }

    #[tokio::test]
    async fn second_press_end_is_ignored() {
        let h = harness();
        revealed(&h).await;
        assert_eq!(h.gate.on_press_end(HOLD), None);
        assert!(!h.gate.on_press_start());
        assert!(h.telemetry.names().is_empty());
    }

    #[tokio::test]
    async fn interrupt_is_early_release() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        h.telemetry.clear();
        assert!(h.gate.on_press_start());
        assert!(h.gate.interrupt());
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert!(!h.gate.interrupt());
        assert!(h.telemetry.names().is_empty());

        // Can hold again afterwards.
        assert!(h.gate.on_press_start());
        assert_eq!(h.gate.on_press_end(HOLD), Some(HoldOutcome::Completed));
    }

    #[tokio::test]
    async fn release_measures_from_press_start() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        let started = Instant::now() - HOLD - Duration::from_millis(10);
        assert!(h.gate.press_start_at(started));
        assert_eq!(h.gate.release(), Some(HoldOutcome::Completed));
        assert_eq!(h.gate.state(), RevealState::Revealed);
    }

    #[tokio::test]
    async fn release_measures_the_current_hold() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        let t0 = Instant::now();
        assert!(h.gate.press_start_at(t0));
        assert!(h.gate.interrupt());
        assert!(h.gate.press_start_at(t0 + HOLD));

        // Long enough since the first press, too short for the second.
        let outcome = h.gate.release_at(t0 + HOLD + Duration::from_millis(500));
        assert_eq!(
            outcome,
            Some(HoldOutcome::TooShort {
                elapsed: Duration::from_millis(500)
            })
        );
        assert_eq!(h.gate.state(), RevealState::Armed);
    }

    #[tokio::test]
    async fn quick_release_stays_armed() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        assert!(h.gate.on_press_start());
        assert!(matches!(h.gate.release(), Some(HoldOutcome::TooShort { .. })));
        assert_eq!(h.gate.state(), RevealState::Armed);
    }

    #[test]
    fn press_ignored_when_not_armed() {
        let h = harness();
        assert!(!h.gate.on_press_start());
        assert_eq!(h.gate.on_press_end(HOLD), None);
        assert_eq!(h.gate.release(), None);
        assert_eq!(h.gate.state(), RevealState::Idle);
    }

    #[tokio::test]
    async fn view_mode_switches_emit_once_each() {
        let h = harness();
        revealed(&h).await;

        assert!(h.gate.set_view_mode(ViewMode::Qr));
        assert!(!h.gate.set_view_mode(ViewMode::Qr));
        assert!(h.gate.set_view_mode(ViewMode::Text));
        assert!(!h.gate.set_view_mode(ViewMode::Text));
        assert!(h.gate.set_view_mode(ViewMode::Qr));
        assert_eq!(
            h.telemetry.names(),
            names(&[
                DisclosureKind::ViewedQr,
                DisclosureKind::ViewedText,
                DisclosureKind::ViewedQr
            ])
        );
    }

    #[tokio::test]
    async fn view_mode_ignored_before_reveal() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        h.telemetry.clear();
        assert!(!h.gate.set_view_mode(ViewMode::Qr));
        assert!(h.telemetry.names().is_empty());
    }

    #[tokio::test]
    async fn copy_emits_both_events() {
        let h = harness();
        revealed(&h).await;
        h.gate.copy_to_clipboard().unwrap();
        assert_eq!(h.clipboard.copies(), vec!["test srp".to_string()]);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Copied, DisclosureKind::CopiedToClipboard])
        );
        for event in h.telemetry.events() {
            assert_eq!(event.properties["copy_method"], "clipboard");
        }
    }

    #[tokio::test]
    async fn copy_before_reveal_is_refused() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        assert!(matches!(
            h.gate.copy_to_clipboard(),
            Err(RevealError::NotRevealed)
        ));
        assert!(h.clipboard.copies().is_empty());
    }

    #[tokio::test]
    async fn clipboard_failure_records_nothing() {
        let h = harness();
        revealed(&h).await;
        h.clipboard.set_failing(true);
        assert!(matches!(
            h.gate.copy_to_clipboard(),
            Err(RevealError::Clipboard(_))
        ));
        assert!(h.telemetry.names().is_empty());
        assert_eq!(h.gate.state(), RevealState::Revealed);
    }

    #[tokio::test]
    async fn close_records_done_and_wipes() {
        let h = harness();
        revealed(&h).await;
        assert!(h.gate.close());
        assert_eq!(h.gate.state(), RevealState::Closed);
        assert!(h.gate.secret_text().is_none());
        assert_eq!(h.telemetry.names(), names(&[DisclosureKind::Done]));
        assert!(!h.gate.close());
    }

    #[test]
    fn close_only_after_reveal() {
        let h = harness();
        assert!(!h.gate.close());
        assert_eq!(h.gate.state(), RevealState::Idle);
    }

    #[test]
    fn cancel_from_idle() {
        let h = harness();
        assert!(h.gate.cancel());
        assert_eq!(h.gate.state(), RevealState::Closed);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Cancelled, DisclosureKind::RevealCancelled])
        );
        assert!(!h.gate.cancel());
        assert_eq!(h.telemetry.names().len(), 2);
    }

    #[tokio::test]
    async fn cancel_from_revealed_clears_secret() {
        let h = harness();
        revealed(&h).await;
        assert!(h.gate.cancel());
        assert!(h.gate.secret_text().is_none());
        assert!(h.gate.with_secret(|s| s.len()).is_none());
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Cancelled, DisclosureKind::RevealCancelled])
        );
    }

    #[tokio::test]
    async fn press_after_cancel_is_ignored() {
        let h = harness();
        h.gate.submit_password("password").await.unwrap();
        assert!(h.gate.on_press_start());
        h.gate.cancel();
        h.telemetry.clear();
        assert_eq!(h.gate.on_press_end(HOLD), None);
        assert!(!h.gate.interrupt());
        assert_eq!(h.gate.state(), RevealState::Closed);
        assert!(h.telemetry.names().is_empty());
    }

    #[tokio::test]
    async fn submit_after_close_is_refused() {
        let h = harness();
        h.gate.cancel();
        assert!(matches!(
            h.gate.submit_password("password").await,
            Err(RevealError::SessionClosed)
        ));
        assert_eq!(h.verifier.calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_submit_is_rejected() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp").latched());
        let h = harness_with(verifier.clone());

        let gate = h.gate.clone();
        let first = tokio::spawn(async move { gate.submit_password("password").await });
        verifier.wait_for_calls(1).await;
        assert_eq!(h.gate.state(), RevealState::Verifying);

        let second = h.gate.submit_password("password").await;
        assert!(matches!(second, Err(RevealError::VerificationInProgress)));
        assert_eq!(verifier.calls(), 1);

        verifier.release();
        first.await.unwrap().unwrap();
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert_eq!(h.telemetry.names(), names(&[DisclosureKind::Requested]));
    }

    #[tokio::test]
    async fn abandoned_submit_allows_retry() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp").latched());
        let h = harness_with(verifier.clone());

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), h.gate.submit_password("password"))
                .await;
        assert!(timed_out.is_err());
        assert_eq!(h.gate.state(), RevealState::Idle);
        assert_eq!(h.gate.attempt_count(), 1);

        verifier.release();
        h.gate.submit_password("password").await.unwrap();
        assert_eq!(h.gate.state(), RevealState::Armed);
        assert_eq!(h.gate.attempt_count(), 2);
        assert_eq!(verifier.calls(), 2);
        assert_eq!(
            h.telemetry.names(),
            names(&[DisclosureKind::Requested, DisclosureKind::Requested])
        );
    }

    #[tokio::test]
    async fn aborted_submit_task_allows_retry() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp").latched());
        let h = harness_with(verifier.clone());

        let gate = h.gate.clone();
        let task = tokio::spawn(async move { gate.submit_password("password").await });
        verifier.wait_for_calls(1).await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(h.gate.state(), RevealState::Idle);

        verifier.release();
        h.gate.submit_password("password").await.unwrap();
        assert_eq!(h.gate.state(), RevealState::Armed);
    }

    #[tokio::test]
    async fn cancel_during_verification_discards_result() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp").latched());
        let h = harness_with(verifier.clone());

        let gate = h.gate.clone();
        let pending = tokio::spawn(async move { gate.submit_password("password").await });
        verifier.wait_for_calls(1).await;

        assert!(h.gate.cancel());
        verifier.release();
        let result = pending.await.unwrap();
        assert!(matches!(result, Err(RevealError::SessionClosed)));
        assert_eq!(h.gate.state(), RevealState::Closed);
        assert!(h.gate.secret_text().is_none());
        assert_eq!(
            h.telemetry.names(),
            names(&[
                DisclosureKind::Requested,
                DisclosureKind::Cancelled,
                DisclosureKind::RevealCancelled
            ])
        );
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let h = harness();
        let mut rx = h.gate.subscribe();
        assert_eq!(*rx.borrow(), RevealState::Idle);

        h.gate.submit_password("password").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), RevealState::Armed);

        h.gate.on_press_start();
        assert_eq!(*rx.borrow_and_update(), RevealState::Holding);
        h.gate.on_press_end(HOLD);
        assert_eq!(*rx.borrow_and_update(), RevealState::Revealed);
        h.gate.close();
        assert_eq!(*rx.borrow_and_update(), RevealState::Closed);
    }

    #[tokio::test]
    async fn telemetry_failure_does_not_block_reveal() {
        let verifier = Arc::new(ScriptedVerifier::new("password", "test srp"));
        let telemetry = Arc::new(RecordingTelemetry::failing());
        let gate = RevealGate::new(
            &RevealConfig::default(),
            verifier,
            Arc::new(RecordingClipboard::new()),
            DisclosureAuditor::new(telemetry.clone(), KeyType::Srp),
        );
        gate.submit_password("password").await.unwrap();
        gate.on_press_start();
        assert_eq!(
            gate.on_press_end(gate.hold_duration()),
            Some(HoldOutcome::Completed)
        );
        gate.copy_to_clipboard().unwrap();
        assert!(gate.close());
        assert_eq!(telemetry.attempts(), 6);
    }
}
