//! Lock modes
//!
//! A [`Mode`] decides what a completed input sequence means. Modes are
//! values: [`Mode::accept`] consumes the active mode and returns a
//! [`Transition`] carrying the mode to install next, so the orchestrator never
//! mutates a mode in place.
//!
//! | Mode   | Cancellable | Biometric | Reset | Counts attempts |
//! |--------|-------------|-----------|-------|-----------------|
//! | Enter  | opt-in      | yes       | yes   | yes             |
//! | Set    | opt-in      | no        | no    | no              |
//! | Change | yes         | no        | no    | while verifying |
//! | Remove | yes         | yes       | yes   | yes             |
//! | Reset  | yes         | no        | yes   | no              |

mod change;
mod enter;
mod remove;
mod reset;
mod set;

pub use change::ChangeMode;
pub use enter::EnterMode;
pub use remove::RemoveMode;
pub use reset::ResetMode;
pub use set::SetMode;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::LockConfig;
use crate::error::LockError;
use crate::passcode::Passcode;
use crate::store::CredentialStore;

static NEXT_MODE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one mode instance
///
/// Internal phase changes keep the id; building a fresh mode mints a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModeId(u64);

impl ModeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mode#{}", self.0)
    }
}

/// Mode variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    Enter,
    Set,
    Change,
    Remove,
    Reset,
}

/// Presentation strings for the active mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub title: &'static str,
    pub description: &'static str,
}

/// Why a completed input was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Wrong passcode; counted toward lockout
    Mismatch { attempts: u32 },
    /// Confirmation differed from the first entry; enrollment restarts
    ConfirmationMismatch,
    /// Reset mode only resets through an explicit confirmation
    ConfirmationRequired,
}

/// What a completed input achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The flow completed successfully
    Granted,
    /// The input was rejected
    Denied(Denial),
    /// The flow moved on to another phase
    Continue,
}

/// Result of feeding input to a mode
#[derive(Debug)]
pub struct Transition {
    /// Mode to install
    pub next: Mode,
    /// Outcome of the input
    pub verdict: Result<Verdict, LockError>,
    /// Set when this input exhausted the attempts of the mode instance;
    /// carries the attempt count
    pub lockout_reached: Option<u32>,
    /// The prompt of `next` differs from the previous one
    pub prompt_changed: bool,
}

impl Transition {
    pub(crate) fn new(next: impl Into<Mode>, verdict: Result<Verdict, LockError>) -> Self {
        Self {
            next: next.into(),
            verdict,
            lockout_reached: None,
            prompt_changed: false,
        }
    }

    pub(crate) fn with_lockout(mut self, attempts: Option<u32>) -> Self {
        self.lockout_reached = attempts;
        self
    }

    pub(crate) fn with_prompt_changed(mut self, changed: bool) -> Self {
        self.prompt_changed = changed;
        self
    }
}

/// Attempt counter and lockout latch for one verifying mode instance
#[derive(Debug, Clone, Default)]
pub(crate) struct Verifier {
    attempts: u32,
    lockout_notified: bool,
}

/// Result of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verification {
    Matched,
    Mismatched {
        attempts: u32,
        lockout_reached: bool,
    },
}

impl Verifier {
    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Compare `candidate` to the stored passcode
    ///
    /// A store without a passcode is a configuration error and is not
    /// counted as an attempt.
    pub(crate) fn verify(
        &mut self,
        candidate: &Passcode,
        store: &dyn CredentialStore,
        maximum_attempts: u32,
    ) -> Result<Verification, LockError> {
        if !store.has_passcode()? {
            return Err(LockError::NoCredentialConfigured);
        }

        if store.check(candidate)? {
            return Ok(Verification::Matched);
        }

        self.attempts = self.attempts.saturating_add(1);
        let lockout_reached = self.attempts >= maximum_attempts && !self.lockout_notified;
        if lockout_reached {
            self.lockout_notified = true;
        }

        Ok(Verification::Mismatched {
            attempts: self.attempts,
            lockout_reached,
        })
    }
}

/// The active credential flow
#[derive(Debug, Clone)]
pub enum Mode {
    Enter(EnterMode),
    Set(SetMode),
    Change(ChangeMode),
    Remove(RemoveMode),
    Reset(ResetMode),
}

impl Mode {
    /// Verify the passcode to unlock
    pub fn enter() -> Self {
        EnterMode::new().into()
    }

    /// Enroll a new passcode
    pub fn set() -> Self {
        SetMode::new().into()
    }

    /// Verify the current passcode, then enroll a new one
    pub fn change() -> Self {
        ChangeMode::new().into()
    }

    /// Verify the passcode, then delete it
    pub fn remove() -> Self {
        RemoveMode::new().into()
    }

    /// Forgot-passcode reset
    pub fn reset() -> Self {
        ResetMode::new().into()
    }

    /// Placeholder swapped in while the active mode is being judged
    pub(crate) fn vacant() -> Self {
        Mode::Reset(ResetMode::vacant())
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Enter(_) => ModeKind::Enter,
            Mode::Set(_) => ModeKind::Set,
            Mode::Change(_) => ModeKind::Change,
            Mode::Remove(_) => ModeKind::Remove,
            Mode::Reset(_) => ModeKind::Reset,
        }
    }

    pub fn id(&self) -> ModeId {
        match self {
            Mode::Enter(m) => m.id(),
            Mode::Set(m) => m.id(),
            Mode::Change(m) => m.id(),
            Mode::Remove(m) => m.id(),
            Mode::Reset(m) => m.id(),
        }
    }

    pub fn prompt(&self) -> Prompt {
        match self {
            Mode::Enter(m) => m.prompt(),
            Mode::Set(m) => m.prompt(),
            Mode::Change(m) => m.prompt(),
            Mode::Remove(m) => m.prompt(),
            Mode::Reset(m) => m.prompt(),
        }
    }

    pub fn is_cancellable(&self) -> bool {
        match self {
            Mode::Enter(m) => m.is_cancellable(),
            Mode::Set(m) => m.is_cancellable(),
            Mode::Change(m) => m.is_cancellable(),
            Mode::Remove(m) => m.is_cancellable(),
            Mode::Reset(_) => true,
        }
    }

    pub fn is_biometric_allowed(&self) -> bool {
        matches!(self, Mode::Enter(_) | Mode::Remove(_))
    }

    pub fn is_reset_allowed(&self) -> bool {
        matches!(self, Mode::Enter(_) | Mode::Remove(_) | Mode::Reset(_))
    }

    /// Wrong guesses counted on this instance so far
    pub fn incorrect_attempts(&self) -> u32 {
        match self {
            Mode::Enter(m) => m.incorrect_attempts(),
            Mode::Change(m) => m.incorrect_attempts(),
            Mode::Remove(m) => m.incorrect_attempts(),
            Mode::Set(_) | Mode::Reset(_) => 0,
        }
    }

    /// Judge a completed input sequence
    pub fn accept(
        self,
        candidate: &Passcode,
        store: &mut dyn CredentialStore,
        config: &LockConfig,
    ) -> Transition {
        let before = self.prompt();
        let transition = match self {
            Mode::Enter(m) => m.accept(candidate, store, config),
            Mode::Set(m) => m.accept(candidate, store),
            Mode::Change(m) => m.accept(candidate, store, config),
            Mode::Remove(m) => m.accept(candidate, store, config),
            Mode::Reset(m) => m.accept(store, config),
        };
        let changed = transition.prompt_changed || transition.next.prompt() != before;
        transition.with_prompt_changed(changed)
    }

    /// Apply a successful biometric check
    pub fn accept_biometric(self, store: &mut dyn CredentialStore) -> Transition {
        let before = self.prompt();
        let transition = match self {
            Mode::Enter(m) => Transition::new(m, Ok(Verdict::Granted)),
            Mode::Remove(m) => m.accept_biometric(store),
            other @ (Mode::Set(_) | Mode::Change(_) | Mode::Reset(_)) => {
                Transition::new(other, Err(LockError::BiometricNotAllowed))
            }
        };
        let changed = transition.next.prompt() != before;
        transition.with_prompt_changed(changed)
    }
}

macro_rules! impl_from_mode {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Mode {
                fn from(mode: $ty) -> Self {
                    Mode::$variant(mode)
                }
            }
        )*
    };
}

impl_from_mode! {
    Enter => EnterMode,
    Set => SetMode,
    Change => ChangeMode,
    Remove => RemoveMode,
    Reset => ResetMode,
}
