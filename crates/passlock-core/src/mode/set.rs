//! Two-phase passcode enrollment

use tracing::{debug, info};

use super::{Denial, ModeId, Prompt, Transition, Verdict};
use crate::error::LockError;
use crate::passcode::Passcode;
use crate::store::CredentialStore;

const FIRST_ENTRY: Prompt = Prompt {
    title: "Set Passcode",
    description: "Enter a new passcode",
};

const CONFIRMATION: Prompt = Prompt {
    title: "Confirm Passcode",
    description: "Enter the new passcode again",
};

/// Enrollment phase
#[derive(Debug, Clone, Default)]
pub(crate) enum Enrollment {
    #[default]
    AwaitingFirstEntry,
    AwaitingConfirmation(Passcode),
}

impl Enrollment {
    pub(crate) fn prompt(&self) -> Prompt {
        match self {
            Enrollment::AwaitingFirstEntry => FIRST_ENTRY,
            Enrollment::AwaitingConfirmation(_) => CONFIRMATION,
        }
    }

    /// Feed one completed input; returns the next phase and the verdict
    ///
    /// Every mismatch drops the pending candidate and restarts phase one.
    pub(crate) fn advance(
        self,
        candidate: &Passcode,
        store: &mut dyn CredentialStore,
    ) -> (Enrollment, Result<Verdict, LockError>) {
        match self {
            Enrollment::AwaitingFirstEntry => {
                debug!("First passcode entry stashed, awaiting confirmation");
                (
                    Enrollment::AwaitingConfirmation(candidate.clone()),
                    Ok(Verdict::Continue),
                )
            }
            Enrollment::AwaitingConfirmation(pending) if pending == *candidate => {
                match store.save(&pending) {
                    Ok(()) => {
                        info!("New passcode enrolled");
                        (Enrollment::AwaitingFirstEntry, Ok(Verdict::Granted))
                    }
                    Err(e) => (Enrollment::AwaitingConfirmation(pending), Err(e.into())),
                }
            }
            Enrollment::AwaitingConfirmation(_) => {
                debug!("Confirmation mismatch, restarting enrollment");
                (
                    Enrollment::AwaitingFirstEntry,
                    Ok(Verdict::Denied(Denial::ConfirmationMismatch)),
                )
            }
        }
    }
}

/// Enroll a new passcode: enter it, then confirm it
#[derive(Debug, Clone)]
pub struct SetMode {
    id: ModeId,
    cancellable: bool,
    enrollment: Enrollment,
}

impl Default for SetMode {
    fn default() -> Self {
        Self::new()
    }
}

impl SetMode {
    pub fn new() -> Self {
        Self {
            id: ModeId::next(),
            cancellable: false,
            enrollment: Enrollment::default(),
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
        self.enrollment.prompt()
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Whether the first entry is stashed and confirmation is expected
    pub fn is_awaiting_confirmation(&self) -> bool {
        matches!(self.enrollment, Enrollment::AwaitingConfirmation(_))
    }

    pub(crate) fn accept(
        mut self,
        candidate: &Passcode,
        store: &mut dyn CredentialStore,
    ) -> Transition {
        let (enrollment, verdict) = std::mem::take(&mut self.enrollment).advance(candidate, store);
        self.enrollment = enrollment;
        Transition::new(self, verdict)
    }
}
