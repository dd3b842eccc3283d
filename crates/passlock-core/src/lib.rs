//! Passlock core - passcode lock state machine
//!
//! This crate decides, for a given mode and input, whether access is
//! granted, denied, or the credential store should change:
//! - Modes: enter, set, change, remove and reset ([`mode`])
//! - Input buffering, dispatch and biometric coordination ([`LockOrchestrator`])
//! - Attempt counting with a one-shot lockout signal per mode instance
//! - Credential stores: in-memory and Argon2id-hashed file ([`store`])
//!
//! Rendering, sensors and cooldown enforcement live outside; they talk to
//! the core through [`LockListener`], [`BiometricAuthenticator`] and the
//! lockout broadcast.
//!
//! # Example
//!
//! ```
//! use passlock_core::{LockConfig, LockOrchestrator, MemoryStore, Mode, Passcode, Sign, Verdict};
//!
//! let store = MemoryStore::with_passcode(Passcode::parse("1234").unwrap());
//! let mut lock = LockOrchestrator::new(LockConfig::default(), store, Mode::enter()).unwrap();
//!
//! let mut verdict = None;
//! for c in "1234".chars() {
//!     verdict = lock.add_sign(Sign::from_char(c).unwrap()).unwrap();
//! }
//! assert_eq!(verdict, Some(Verdict::Granted));
//! ```

pub mod biometric;
pub mod config;
pub mod error;
pub mod listener;
pub mod lock;
pub mod mode;
pub mod passcode;
pub mod store;

pub use biometric::{
    BiometricAuthenticator, BiometricCompletion, BiometricOutcome, BiometricResponse,
    BiometricTicket, NoBiometrics,
};
pub use config::{LockConfig, ResetPolicy};
pub use error::{ConfigError, LockError, Result, StoreError};
pub use listener::{LockListener, LockoutEvent};
pub use lock::LockOrchestrator;
pub use mode::{
    ChangeMode, Denial, EnterMode, Mode, ModeId, ModeKind, Prompt, RemoveMode, ResetMode, SetMode,
    Transition, Verdict,
};
pub use passcode::{Passcode, Sign};
pub use store::{CredentialStore, FileStore, MemoryStore};
