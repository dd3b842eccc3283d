//! Turn the passcode off

use tracing::{debug, info, warn};

use super::{Denial, ModeId, Prompt, Transition, Verdict, Verification, Verifier};
use crate::config::LockConfig;
use crate::passcode::Passcode;
use crate::store::CredentialStore;

const PROMPT: Prompt = Prompt {
    title: "Enter Passcode",
    description: "Enter your passcode to turn it off",
};

/// Verify the passcode, then delete it
#[derive(Debug, Clone)]
pub struct RemoveMode {
    id: ModeId,
    cancellable: bool,
    verifier: Verifier,
}

impl Default for RemoveMode {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoveMode {
    /// Cancellable removal
    pub fn new() -> Self {
        Self {
            id: ModeId::next(),
            cancellable: true,
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
            Verification::Matched => self.delete(store),
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

    pub(crate) fn accept_biometric(self, store: &mut dyn CredentialStore) -> Transition {
        self.delete(store)
    }

    /// The deletion completes before success is reported
    fn delete(self, store: &mut dyn CredentialStore) -> Transition {
        match store.delete() {
            Ok(()) => {
                info!(mode = %self.id, "Passcode removed");
                Transition::new(self, Ok(Verdict::Granted))
            }
            Err(e) => Transition::new(self, Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LockError;
    use crate::mode::Mode;
    use crate::store::MemoryStore;

    fn code(s: &str) -> Passcode {
        Passcode::parse(s).unwrap()
    }

    #[test]
    fn test_correct_passcode_deletes() {
        let mut store = MemoryStore::with_passcode(code("1234"));
        let t = Mode::remove().accept(&code("1234"), &mut store, &LockConfig::default());

        assert!(matches!(t.verdict, Ok(Verdict::Granted)));
        assert!(!store.has_passcode().unwrap());
    }

    #[test]
    fn test_wrong_passcode_keeps_store() {
        let mut store = MemoryStore::with_passcode(code("1234"));
        let t = Mode::remove().accept(&code("4321"), &mut store, &LockConfig::default());

        assert!(matches!(
            t.verdict,
            Ok(Verdict::Denied(Denial::Mismatch { attempts: 1 }))
        ));
        assert_eq!(store.current_passcode().unwrap(), Some(code("1234")));
    }

    #[test]
    fn test_lockout_latch() {
        let mut store = MemoryStore::with_passcode(code("1234"));
        let config = LockConfig {
            maximum_incorrect_attempts: 1,
            ..Default::default()
        };

        let t = Mode::remove().accept(&code("0000"), &mut store, &config);
        assert_eq!(t.lockout_reached, Some(1));
        let t = t.next.accept(&code("0000"), &mut store, &config);
        assert!(t.lockout_reached.is_none());
    }

    #[test]
    fn test_biometric_deletes() {
        let mut store = MemoryStore::with_passcode(code("1234"));
        let t = Mode::remove().accept_biometric(&mut store);

        assert!(matches!(t.verdict, Ok(Verdict::Granted)));
        assert!(!store.has_passcode().unwrap());
    }

    #[test]
    fn test_delete_failure_after_match() {
        let mut store = MemoryStore::with_passcode(code("1234")).with_failing_writes();
        let mode = Mode::remove();
        let id = mode.id();

        let t = mode.accept(&code("1234"), &mut store, &LockConfig::default());
        assert!(matches!(t.verdict, Err(LockError::Store(_))));
        assert_eq!(t.next.id(), id);
        assert_eq!(t.next.incorrect_attempts(), 0);
        assert!(store.has_passcode().unwrap());
    }

    #[test]
    fn test_no_passcode_configured() {
        let mut store = MemoryStore::new();
        let t = Mode::remove().accept(&code("1234"), &mut store, &LockConfig::default());
        assert!(matches!(t.verdict, Err(LockError::NoCredentialConfigured)));
    }
}
