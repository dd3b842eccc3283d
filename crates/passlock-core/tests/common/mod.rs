//! Shared test doubles

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use passlock_core::{
    BiometricAuthenticator, BiometricCompletion, BiometricOutcome, CredentialStore, Denial,
    LockConfig, LockError, LockListener, LockOrchestrator, MemoryStore, Mode, Passcode, Sign,
    Verdict,
};

/// Listener events, recorded in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SignAdded(usize),
    SignRemoved(usize),
    Success,
    Failure(Denial),
    ModeChanged,
    Lockout,
    Error(String),
    Cancelled,
    BiometricFailed(String),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }

    /// Success and failure notifications, in order
    pub fn outcomes(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, Event::Success | Event::Failure(_) | Event::Error(_)))
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl LockListener for RecordingListener {
    fn on_sign_added(&self, index: usize) {
        self.push(Event::SignAdded(index));
    }

    fn on_sign_removed(&self, index: usize) {
        self.push(Event::SignRemoved(index));
    }

    fn on_success(&self) {
        self.push(Event::Success);
    }

    fn on_failure(&self, denial: Denial) {
        self.push(Event::Failure(denial));
    }

    fn on_mode_changed(&self) {
        self.push(Event::ModeChanged);
    }

    fn on_lockout_threshold_reached(&self) {
        self.push(Event::Lockout);
    }

    fn on_error(&self, error: &LockError) {
        self.push(Event::Error(error.to_string()));
    }

    fn on_cancelled(&self) {
        self.push(Event::Cancelled);
    }

    fn on_biometric_failed(&self, error: &LockError) {
        self.push(Event::BiometricFailed(error.to_string()));
    }
}

/// Authenticator that parks completions until the test resolves them
#[derive(Clone, Default)]
pub struct ManualAuthenticator {
    pending: Arc<Mutex<Vec<BiometricCompletion>>>,
}

impl ManualAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Resolve the oldest parked request
    pub fn resolve(&self, outcome: BiometricOutcome) {
        let completion = self.pending.lock().unwrap().remove(0);
        completion.complete(outcome);
    }
}

impl BiometricAuthenticator for ManualAuthenticator {
    fn is_available(&self) -> bool {
        true
    }

    fn request_authentication(&self, _reason: &str, completion: BiometricCompletion) {
        self.pending.lock().unwrap().push(completion);
    }
}

pub fn code(s: &str) -> Passcode {
    Passcode::parse(s).unwrap()
}

pub fn config(length: usize, attempts: u32) -> LockConfig {
    LockConfig {
        passcode_length: length,
        maximum_incorrect_attempts: attempts,
        ..Default::default()
    }
}

/// Orchestrator over a memory store with a recording listener attached
pub fn lock_with(
    config: LockConfig,
    store: MemoryStore,
    mode: Mode,
) -> (LockOrchestrator<MemoryStore>, Arc<RecordingListener>) {
    let listener = RecordingListener::new();
    let mut lock = LockOrchestrator::new(config, store, mode).unwrap();
    lock.set_listener(&listener);
    (lock, listener)
}

/// Type every digit of `input`; returns the verdict of the final flush
pub fn type_code<S: CredentialStore>(
    lock: &mut LockOrchestrator<S>,
    input: &str,
) -> Result<Option<Verdict>, LockError> {
    let mut last = Ok(None);
    for c in input.chars() {
        last = lock.add_sign(Sign::from_char(c).unwrap());
    }
    last
}
