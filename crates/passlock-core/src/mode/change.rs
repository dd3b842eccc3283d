//! Change the passcode: verify the current one, then enroll a new one

use tracing::{debug, warn};

use super::set::Enrollment;
use super::{Denial, ModeId, Prompt, Transition, Verdict, Verification, Verifier};
use crate::config::LockConfig;
use crate::passcode::Passcode;
use crate::store::CredentialStore;

const VERIFYING: Prompt = Prompt {
    title: "Enter Passcode",
    description: "Enter your current passcode",
};

#[derive(Debug, Clone)]
enum Phase {
    Verifying(Verifier),
    Enrolling(Enrollment),
}

/// Verify, then enroll
///
/// Attempts are only counted while verifying. Once verified, a mismatched
/// confirmation just restarts enrollment.
#[derive(Debug, Clone)]
pub struct ChangeMode {
    id: ModeId,
    cancellable: bool,
    phase: Phase,
}

impl Default for ChangeMode {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeMode {
    pub fn new() -> Self {
        Self {
            id: ModeId::next(),
            cancellable: true,
            phase: Phase::Verifying(Verifier::default()),
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
        match &self.phase {
            Phase::Verifying(_) => VERIFYING,
            Phase::Enrolling(enrollment) => enrollment.prompt(),
        }
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Whether the current passcode has been verified
    pub fn is_verified(&self) -> bool {
        matches!(self.phase, Phase::Enrolling(_))
    }

    pub fn incorrect_attempts(&self) -> u32 {
        match &self.phase {
            Phase::Verifying(verifier) => verifier.attempts(),
            Phase::Enrolling(_) => 0,
        }
    }

    pub(crate) fn accept(
        mut self,
        candidate: &Passcode,
        store: &mut dyn CredentialStore,
        config: &LockConfig,
    ) -> Transition {
        let phase = std::mem::replace(&mut self.phase, Phase::Verifying(Verifier::default()));

        match phase {
            Phase::Verifying(mut verifier) => {
                let verification =
                    verifier.verify(candidate, store, config.maximum_incorrect_attempts);
                match verification {
                    Ok(Verification::Matched) => {
                        debug!(mode = %self.id, "Current passcode verified, enrolling");
                        self.phase = Phase::Enrolling(Enrollment::default());
                        Transition::new(self, Ok(Verdict::Continue))
                    }
                    Ok(Verification::Mismatched {
                        attempts,
                        lockout_reached,
                    }) => {
                        if lockout_reached {
                            warn!(mode = %self.id, attempts, "Incorrect attempt limit reached");
                        }
                        self.phase = Phase::Verifying(verifier);
                        Transition::new(self, Ok(Verdict::Denied(Denial::Mismatch { attempts })))
                            .with_lockout(lockout_reached.then_some(attempts))
                    }
                    Err(e) => {
                        self.phase = Phase::Verifying(verifier);
                        Transition::new(self, Err(e))
                    }
                }
            }
            Phase::Enrolling(enrollment) => {
                let (enrollment, verdict) = enrollment.advance(candidate, store);
                // A completed change starts over from verification
                self.phase = match verdict {
                    Ok(Verdict::Granted) => Phase::Verifying(Verifier::default()),
                    _ => Phase::Enrolling(enrollment),
                };
                Transition::new(self, verdict)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::store::MemoryStore;

    fn code(s: &str) -> Passcode {
        Passcode::parse(s).unwrap()
    }

    fn feed(mode: Mode, input: &str, store: &mut MemoryStore, config: &LockConfig) -> Transition {
        mode.accept(&code(input), store, config)
    }

    #[test]
    fn test_change_flow() {
        let mut store = MemoryStore::with_passcode(code("1111"));
        let config = LockConfig::default();

        let t = feed(Mode::change(), "1111", &mut store, &config);
        assert!(matches!(t.verdict, Ok(Verdict::Continue)));
        assert!(t.prompt_changed);

        let t = feed(t.next, "2222", &mut store, &config);
        assert!(matches!(t.verdict, Ok(Verdict::Continue)));
        assert_eq!(store.current_passcode().unwrap(), Some(code("1111")));

        let t = feed(t.next, "2222", &mut store, &config);
        assert!(matches!(t.verdict, Ok(Verdict::Granted)));
        assert_eq!(store.current_passcode().unwrap(), Some(code("2222")));
    }

    #[test]
    fn test_verification_counts_and_locks_out() {
        let mut store = MemoryStore::with_passcode(code("1111"));
        let config = LockConfig {
            maximum_incorrect_attempts: 2,
            ..Default::default()
        };

        let t = feed(Mode::change(), "0000", &mut store, &config);
        assert!(t.lockout_reached.is_none());
        let t = feed(t.next, "0000", &mut store, &config);
        assert_eq!(t.lockout_reached, Some(2));
        let t = feed(t.next, "0000", &mut store, &config);
        assert!(t.lockout_reached.is_none());
        assert_eq!(t.next.incorrect_attempts(), 3);
    }

    #[test]
    fn test_enrollment_mismatch_is_not_counted() {
        let mut store = MemoryStore::with_passcode(code("1111"));
        let config = LockConfig {
            maximum_incorrect_attempts: 1,
            ..Default::default()
        };

        let t = feed(Mode::change(), "1111", &mut store, &config);
        let t = feed(t.next, "2222", &mut store, &config);
        let t = feed(t.next, "3333", &mut store, &config);
        assert!(matches!(
            t.verdict,
            Ok(Verdict::Denied(Denial::ConfirmationMismatch))
        ));
        assert!(t.lockout_reached.is_none());
        assert_eq!(t.next.incorrect_attempts(), 0);

        match t.next {
            Mode::Change(m) => assert!(m.is_verified()),
            other => panic!("unexpected mode {:?}", other.kind()),
        }
    }
}
