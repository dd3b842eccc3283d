//! Error types for the passcode lock

use thiserror::Error;

/// Result type alias for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

/// Errors surfaced by the lock orchestrator and its modes
#[derive(Debug, Error)]
pub enum LockError {
    /// Verification was attempted but the store holds no passcode.
    /// This is a configuration problem, not a guess.
    #[error("No passcode configured")]
    NoCredentialConfigured,

    /// The credential store failed
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),

    /// Cancel requested in a mode that does not allow it
    #[error("Current mode cannot be cancelled")]
    NotCancellable,

    /// Reset requested while reset is not allowed
    #[error("Passcode reset is not allowed in the current mode")]
    ResetNotAllowed,

    /// Biometric request while biometrics are not allowed
    #[error("Biometric authentication is not allowed right now")]
    BiometricNotAllowed,

    /// A biometric request is already outstanding
    #[error("A biometric request is already pending")]
    BiometricPending,

    /// The authenticator reported that biometrics are unavailable
    #[error("Biometric authentication unavailable")]
    BiometricUnavailable,

    /// The authenticator rejected the biometric check
    #[error("Biometric authentication denied")]
    BiometricDenied,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Credential store failures
///
/// A store must never report one of these as "no passcode".
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Hashing or verification failed
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// The store keeps only a one-way hash of the passcode
    #[error("Stored passcode cannot be retrieved")]
    NotRetrievable,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Passcode length must be greater than zero")]
    InvalidPasscodeLength,

    #[error("Maximum incorrect attempts must be greater than zero")]
    InvalidMaximumAttempts,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Serialization(e.to_string())
    }
}
