//! Forgot-passcode reset

use tracing::{debug, warn};

use super::{Denial, ModeId, Prompt, Transition, Verdict};
use crate::config::{LockConfig, ResetPolicy};
use crate::store::CredentialStore;

const PROMPT: Prompt = Prompt {
    title: "Reset Passcode",
    description: "Resetting removes the stored passcode",
};

/// Reset the store without knowing the passcode
///
/// Under [`ResetPolicy::AnyInput`] any completed input resets the store; the
/// content is never compared. Under [`ResetPolicy::ExplicitConfirmation`]
/// digits are refused and only the orchestrator's `confirm_reset` resets.
#[derive(Debug, Clone)]
pub struct ResetMode {
    id: ModeId,
}

impl Default for ResetMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetMode {
    pub fn new() -> Self {
        Self { id: ModeId::next() }
    }

    /// Stand-in held only while the real mode is moved out
    pub(super) fn vacant() -> Self {
        Self { id: ModeId(0) }
    }

    pub fn id(&self) -> ModeId {
        self.id
    }

    pub fn prompt(&self) -> Prompt {
        PROMPT
    }

    pub(crate) fn accept(self, store: &mut dyn CredentialStore, config: &LockConfig) -> Transition {
        match config.reset_policy {
            ResetPolicy::AnyInput => {
                warn!(
                    mode = %self.id,
                    "Resetting passcode store on arbitrary input (reset_policy = any_input)"
                );
                match store.reset() {
                    // Re-arm with a fresh instance
                    Ok(()) => Transition::new(ResetMode::new(), Ok(Verdict::Continue))
                        .with_prompt_changed(true),
                    Err(e) => Transition::new(self, Err(e.into())),
                }
            }
            ResetPolicy::ExplicitConfirmation => {
                debug!(mode = %self.id, "Digit input ignored, reset needs confirmation");
                Transition::new(self, Ok(Verdict::Denied(Denial::ConfirmationRequired)))
            }
        }
    }
}
