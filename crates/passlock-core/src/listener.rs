//! Listener contract for the presentation layer

use crate::error::LockError;
use crate::mode::{Denial, ModeKind};

/// Receives lock events
///
/// Every method has an empty default so a listener only implements what it
/// renders.
pub trait LockListener {
    /// A sign was appended at `index`
    fn on_sign_added(&self, _index: usize) {}

    /// The sign at `index` was removed
    fn on_sign_removed(&self, _index: usize) {}

    /// The flow completed; the listener decides what to dismiss or show next
    fn on_success(&self) {}

    /// A completed input was rejected
    fn on_failure(&self, _denial: Denial) {}

    /// The active mode or its prompt changed; clear displayed signs and
    /// refresh title, description and flags
    fn on_mode_changed(&self) {}

    /// Attempts on the current mode instance reached the configured maximum.
    /// Fires at most once per instance.
    fn on_lockout_threshold_reached(&self) {}

    /// An operation failed for a reason other than a wrong guess
    fn on_error(&self, _error: &LockError) {}

    /// The user cancelled the current mode
    fn on_cancelled(&self) {}

    /// A biometric attempt did not succeed; manual entry remains available
    fn on_biometric_failed(&self, _error: &LockError) {}
}

/// Process-wide signal sent when a mode instance exhausts its attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutEvent {
    pub mode: ModeKind,
    pub attempts: u32,
}
