//! Lock orchestrator
//!
//! Owns the active mode and the input buffer, flushes completed input to the
//! mode and reports the outcome to a listener. All calls happen on the
//! owner's context; the only asynchronous edge is the biometric
//! authenticator, whose results are queued and applied through
//! [`LockOrchestrator::process_biometric_responses`] or
//! [`LockOrchestrator::next_biometric_response`].
//!
//! # Biometric races
//!
//! Each biometric request gets a [`BiometricTicket`] bound to the active
//! mode instance. A response is applied only if its ticket is still the
//! pending one. Manual success, cancel, reset and any mode change clear the
//! pending ticket, so a late result is dropped instead of producing a second
//! success.

use std::sync::{Arc, Weak};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::biometric::{
    BiometricAuthenticator, BiometricCompletion, BiometricOutcome, BiometricResponse,
    BiometricTicket, NoBiometrics,
};
use crate::config::LockConfig;
use crate::error::{LockError, Result};
use crate::listener::{LockListener, LockoutEvent};
use crate::mode::{Mode, Transition, Verdict};
use crate::passcode::{Passcode, Sign};
use crate::store::CredentialStore;

/// Capacity of the internally created lockout channel
const LOCKOUT_CHANNEL_CAPACITY: usize = 16;

/// Passcode lock state machine driver
pub struct LockOrchestrator<S: CredentialStore> {
    config: LockConfig,
    store: S,
    mode: Mode,
    buffer: Passcode,
    listener: Option<Weak<dyn LockListener>>,
    authenticator: Box<dyn BiometricAuthenticator>,
    lockout_tx: broadcast::Sender<LockoutEvent>,
    biometric_tx: mpsc::UnboundedSender<BiometricResponse>,
    biometric_rx: mpsc::UnboundedReceiver<BiometricResponse>,
    pending_biometric: Option<BiometricTicket>,
    biometric_serial: u64,
    auto_biometric_armed: bool,
}

impl<S: CredentialStore> LockOrchestrator<S> {
    /// Create an orchestrator; fails if the configuration is invalid
    pub fn new(config: LockConfig, store: S, mode: Mode) -> Result<Self> {
        config.validate()?;

        let (lockout_tx, _) = broadcast::channel(LOCKOUT_CHANNEL_CAPACITY);
        let (biometric_tx, biometric_rx) = mpsc::unbounded_channel();

        debug!(mode = ?mode.kind(), length = config.passcode_length, "Lock created");

        Ok(Self {
            buffer: Passcode::with_capacity(config.passcode_length),
            config,
            store,
            mode,
            listener: None,
            authenticator: Box::new(NoBiometrics),
            lockout_tx,
            biometric_tx,
            biometric_rx,
            pending_biometric: None,
            biometric_serial: 0,
            auto_biometric_armed: true,
        })
    }

    /// Use `authenticator` for biometric requests
    pub fn with_authenticator(mut self, authenticator: impl BiometricAuthenticator + 'static) -> Self {
        self.authenticator = Box::new(authenticator);
        self
    }

    /// Publish lockout events on `sender` instead of an internal channel
    pub fn with_lockout_channel(mut self, sender: broadcast::Sender<LockoutEvent>) -> Self {
        self.lockout_tx = sender;
        self
    }

    /// Attach a listener; the lock only keeps a weak reference
    pub fn set_listener<L: LockListener + 'static>(&mut self, listener: &Arc<L>) {
        let weak: Weak<dyn LockListener> = Arc::downgrade(listener) as Weak<dyn LockListener>;
        self.listener = Some(weak);
    }

    /// Subscribe to lockout events
    pub fn subscribe_lockouts(&self) -> broadcast::Receiver<LockoutEvent> {
        self.lockout_tx.subscribe()
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Number of signs entered so far
    pub fn entered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Ticket of the outstanding biometric request, if any
    pub fn pending_biometric(&self) -> Option<BiometricTicket> {
        self.pending_biometric
    }

    pub fn is_biometric_allowed_now(&self) -> bool {
        self.authenticator.is_available()
            && self.config.is_biometric_allowed
            && self.mode.is_biometric_allowed()
    }

    pub fn is_reset_allowed_now(&self) -> bool {
        self.config.is_reset_allowed && self.mode.is_reset_allowed()
    }

    /// Append a sign; flushes to the mode when the passcode is complete
    ///
    /// Returns `Ok(None)` while input is still being collected.
    pub fn add_sign(&mut self, sign: Sign) -> Result<Option<Verdict>> {
        self.buffer.push(sign);
        let index = self.buffer.len() - 1;
        self.notify(|l| l.on_sign_added(index));

        if self.buffer.len() < self.config.passcode_length {
            return Ok(None);
        }

        let candidate = self.buffer.take();
        debug!(mode = %self.mode.id(), "Flushing completed input");

        let mode = std::mem::replace(&mut self.mode, Mode::vacant());
        let transition = mode.accept(&candidate, &mut self.store, &self.config);
        self.apply(transition).map(Some)
    }

    /// Remove the last sign; no-op on an empty buffer
    pub fn remove_sign(&mut self) {
        if self.buffer.pop().is_some() {
            let index = self.buffer.len();
            self.notify(|l| l.on_sign_removed(index));
        }
    }

    /// Replace the active mode
    pub fn change_mode(&mut self, mode: Mode) {
        info!(from = ?self.mode.kind(), to = ?mode.kind(), "Changing lock mode");
        self.buffer.clear();
        self.pending_biometric = None;
        self.mode = mode;
        self.notify(|l| l.on_mode_changed());
    }

    /// Abandon the current mode
    pub fn cancel(&mut self) -> Result<()> {
        if !self.mode.is_cancellable() {
            return Err(LockError::NotCancellable);
        }

        debug!(mode = %self.mode.id(), "Lock cancelled");
        self.buffer.clear();
        self.pending_biometric = None;
        self.notify(|l| l.on_cancelled());
        Ok(())
    }

    /// Reset the store through an explicit action and switch to reset mode
    pub fn confirm_reset(&mut self) -> Result<()> {
        if !self.is_reset_allowed_now() {
            return Err(LockError::ResetNotAllowed);
        }

        self.store.reset()?;
        warn!(mode = ?self.mode.kind(), "Passcode store reset by explicit confirmation");

        self.buffer.clear();
        self.pending_biometric = None;
        self.mode = Mode::reset();
        self.notify(|l| l.on_mode_changed());
        Ok(())
    }

    /// Ask the authenticator for a biometric check
    pub fn request_biometric(&mut self) -> Result<BiometricTicket> {
        if !self.is_biometric_allowed_now() {
            return Err(LockError::BiometricNotAllowed);
        }
        if self.pending_biometric.is_some() {
            return Err(LockError::BiometricPending);
        }

        self.biometric_serial += 1;
        let ticket = BiometricTicket {
            mode: self.mode.id(),
            serial: self.biometric_serial,
        };
        self.pending_biometric = Some(ticket);

        debug!(?ticket, "Requesting biometric authentication");
        let completion = BiometricCompletion::new(ticket, self.biometric_tx.clone());
        self.authenticator
            .request_authentication(&self.config.biometric_reason, completion);

        Ok(ticket)
    }

    /// The lock became visible; requests biometrics if configured to
    pub fn activate(&mut self) -> Option<BiometricTicket> {
        if !self.config.request_biometric_immediately
            || !self.auto_biometric_armed
            || self.pending_biometric.is_some()
            || !self.is_biometric_allowed_now()
        {
            return None;
        }
        self.request_biometric().ok()
    }

    /// The app moved to the background; stop automatic biometric requests
    pub fn suspend(&mut self) {
        self.auto_biometric_armed = false;
    }

    /// The app returned to the foreground; re-arm and retry automatic
    /// biometrics unless a request is still outstanding
    pub fn resume(&mut self) -> Option<BiometricTicket> {
        self.auto_biometric_armed = true;
        self.activate()
    }

    /// Apply every queued biometric response; returns how many were read
    pub fn process_biometric_responses(&mut self) -> usize {
        let mut count = 0;
        while let Ok(response) = self.biometric_rx.try_recv() {
            count += 1;
            // Outcomes are already reported to the listener
            let _ = self.handle_biometric_response(response);
        }
        count
    }

    /// Wait for the next biometric response and apply it
    pub async fn next_biometric_response(&mut self) -> Result<Option<Verdict>> {
        match self.biometric_rx.recv().await {
            Some(response) => self.handle_biometric_response(response),
            None => Ok(None),
        }
    }

    /// Apply one biometric response
    ///
    /// Returns `Ok(None)` for a stale response.
    pub fn handle_biometric_response(&mut self, response: BiometricResponse) -> Result<Option<Verdict>> {
        let current = self.pending_biometric;
        if current != Some(response.ticket) || response.ticket.mode != self.mode.id() {
            debug!(ticket = ?response.ticket, ?current, "Discarding stale biometric response");
            return Ok(None);
        }
        self.pending_biometric = None;

        match response.outcome {
            BiometricOutcome::Success => {
                info!(mode = %self.mode.id(), "Biometric authentication succeeded");
                let mode = std::mem::replace(&mut self.mode, Mode::vacant());
                let transition = mode.accept_biometric(&mut self.store);
                self.apply(transition).map(Some)
            }
            BiometricOutcome::Failure => Err(self.biometric_failed(LockError::BiometricDenied)),
            BiometricOutcome::Unavailable => {
                Err(self.biometric_failed(LockError::BiometricUnavailable))
            }
        }
    }

    fn biometric_failed(&self, error: LockError) -> LockError {
        debug!(%error, "Biometric attempt failed, manual entry remains available");
        self.notify(|l| l.on_biometric_failed(&error));
        error
    }

    /// Install the next mode, then notify
    fn apply(&mut self, transition: Transition) -> Result<Verdict> {
        let Transition {
            next,
            verdict,
            lockout_reached,
            prompt_changed,
        } = transition;

        self.mode = next;

        if let Some(attempts) = lockout_reached {
            self.announce_lockout(attempts);
        }

        let verdict = match verdict {
            Ok(verdict) => verdict,
            Err(error) => {
                warn!(%error, mode = ?self.mode.kind(), "Lock operation failed");
                self.notify(|l| l.on_error(&error));
                return Err(error);
            }
        };

        self.buffer.clear();
        if prompt_changed {
            self.pending_biometric = None;
        }

        match verdict {
            Verdict::Granted => {
                info!(mode = ?self.mode.kind(), "Lock flow succeeded");
                self.pending_biometric = None;
                self.notify(|l| l.on_success());
            }
            Verdict::Denied(denial) => {
                debug!(?denial, "Input rejected");
                self.notify(|l| l.on_failure(denial));
                if prompt_changed {
                    self.notify(|l| l.on_mode_changed());
                }
            }
            Verdict::Continue => {
                debug!(mode = ?self.mode.kind(), "Lock flow advanced");
                self.notify(|l| l.on_mode_changed());
            }
        }

        Ok(verdict)
    }

    fn announce_lockout(&self, attempts: u32) {
        let event = LockoutEvent {
            mode: self.mode.kind(),
            attempts,
        };
        warn!(?event, "Lockout threshold reached");
        self.notify(|l| l.on_lockout_threshold_reached());
        if self.lockout_tx.send(event).is_err() {
            debug!("No lockout subscribers");
        }
    }

    fn notify(&self, f: impl FnOnce(&dyn LockListener)) {
        if let Some(listener) = self.listener.as_ref().and_then(Weak::upgrade) {
            f(listener.as_ref());
        }
    }
}
