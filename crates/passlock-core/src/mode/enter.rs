//! Passcode verification

use tracing::{debug, warn};

use super::{Denial, ModeId, Prompt, Transition, Verdict, Verification, Verifier};
use crate::config::LockConfig;
use crate::passcode::Passcode;
use crate::store::CredentialStore;

const PROMPT: Prompt = Prompt {
    title: "Enter Passcode",
    description: "Enter your passcode to proceed",
};

/// Verify the stored passcode
#[derive(Debug, Clone)]
pub struct EnterMode {
    id: ModeId,
    cancellable: bool,
    verifier: Verifier,
}

impl Default for EnterMode {
    fn default() -> Self {
        Self::new()
    }
}

impl EnterMode {
    /// Non-cancellable verification
    pub fn new() -> Self {
        Self {
            id: ModeId::next(),
            cancellable: false,
            verifier: Verifier::default(),
        }
    }

    /// Allow or forbid cancelling
    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    pub fn id(&self) -> ModeId {
        self.id
    }

    pub fn prompt(&self) -> Prompt {
        PROMPT
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    pub fn incorrect_attempts(&self) -> u32 {
        self.verifier.attempts()
    }

    pub(crate) fn accept(
        mut self,
        candidate: &Passcode,
        store: &mut dyn CredentialStore,
        config: &LockConfig,
    ) -> Transition {
        let verification =
            match self
                .verifier
                .verify(candidate, store, config.maximum_incorrect_attempts)
            {
                Ok(v) => v,
                Err(e) => return Transition::new(self, Err(e)),
            };

        match verification {
            Verification::Matched => {
                debug!(mode = %self.id, "Passcode accepted");
                Transition::new(self, Ok(Verdict::Granted))
            }
            Verification::Mismatched {
                attempts,
                lockout_reached,
            } => {
                if lockout_reached {
                    warn!(mode = %self.id, attempts, "Incorrect attempt limit reached");
                } else {
                    debug!(mode = %self.id, attempts, "Incorrect passcode");
                }
                Transition::new(self, Ok(Verdict::Denied(Denial::Mismatch { attempts })))
                    .with_lockout(lockout_reached.then_some(attempts))
            }
        }
    }
}
