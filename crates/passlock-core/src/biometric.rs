//! Biometric authenticator contract
//!
//! The authenticator is the only asynchronous boundary of the lock. A
//! request hands it a [`BiometricCompletion`]; the authenticator consumes the
//! completion exactly once, from any thread, and the response is queued back
//! to the orchestrator's owner.

use tokio::sync::mpsc;
use tracing::debug;

use crate::mode::ModeId;

/// Result reported by the authenticator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricOutcome {
    Success,
    Failure,
    Unavailable,
}

/// Identifies one biometric request
///
/// Valid only while it is the orchestrator's pending request for the same
/// mode instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BiometricTicket {
    pub mode: ModeId,
    pub serial: u64,
}

/// A completed biometric request waiting to be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiometricResponse {
    pub ticket: BiometricTicket,
    pub outcome: BiometricOutcome,
}

/// One-shot handle for delivering a biometric result
#[derive(Debug)]
pub struct BiometricCompletion {
    ticket: BiometricTicket,
    sender: mpsc::UnboundedSender<BiometricResponse>,
}

impl BiometricCompletion {
    pub(crate) fn new(
        ticket: BiometricTicket,
        sender: mpsc::UnboundedSender<BiometricResponse>,
    ) -> Self {
        Self { ticket, sender }
    }

    /// Ticket of the request this completion answers
    pub fn ticket(&self) -> BiometricTicket {
        self.ticket
    }

    /// Deliver the result
    pub fn complete(self, outcome: BiometricOutcome) {
        let response = BiometricResponse {
            ticket: self.ticket,
            outcome,
        };
        if self.sender.send(response).is_err() {
            debug!(?response, "Lock dropped before biometric result arrived");
        }
    }
}

/// Device-level biometric verification
pub trait BiometricAuthenticator: Send + Sync {
    /// Whether the device can evaluate biometrics at all
    fn is_available(&self) -> bool;

    /// Start a biometric check; `completion` must be consumed exactly once
    fn request_authentication(&self, reason: &str, completion: BiometricCompletion);
}

/// Authenticator for devices without biometrics
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBiometrics;

impl BiometricAuthenticator for NoBiometrics {
    fn is_available(&self) -> bool {
        false
    }

    fn request_authentication(&self, _reason: &str, completion: BiometricCompletion) {
        completion.complete(BiometricOutcome::Unavailable);
    }
}
