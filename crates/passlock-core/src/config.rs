//! Lock configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a completed input sequence in reset mode is treated
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Any completed input resets the store without comparing it to anything.
    /// Kept for compatibility; every such reset is logged as a risk.
    #[default]
    AnyInput,
    /// Digits never reset; only an explicit `confirm_reset` does
    ExplicitConfirmation,
}

/// Lock configuration
///
/// Validated once by [`LockConfig::validate`] before an orchestrator is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockConfig {
    /// Number of signs in a passcode
    pub passcode_length: usize,

    /// Wrong guesses on one mode instance before the lockout signal fires
    pub maximum_incorrect_attempts: u32,

    /// Whether biometric unlock may be offered at all
    pub is_biometric_allowed: bool,

    /// Request biometrics as soon as the lock is shown
    pub request_biometric_immediately: bool,

    /// Whether the "forgot passcode" reset may be offered
    pub is_reset_allowed: bool,

    /// Reset mode acceptance policy
    pub reset_policy: ResetPolicy,

    /// Reason string passed to the biometric authenticator
    pub biometric_reason: String,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            passcode_length: 4,
            maximum_incorrect_attempts: 3,
            is_biometric_allowed: true,
            request_biometric_immediately: true,
            is_reset_allowed: true,
            reset_policy: ResetPolicy::AnyInput,
            biometric_reason: "Unlock".to_string(),
        }
    }
}

impl LockConfig {
    /// Config with the given passcode length and defaults elsewhere
    pub fn with_length(passcode_length: usize) -> Self {
        Self {
            passcode_length,
            ..Default::default()
        }
    }

    /// Check the construction preconditions
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passcode_length == 0 {
            return Err(ConfigError::InvalidPasscodeLength);
        }
        if self.maximum_incorrect_attempts == 0 {
            return Err(ConfigError::InvalidMaximumAttempts);
        }
        Ok(())
    }

    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = LockConfig::default();
        assert_eq!(config.passcode_length, 4);
        assert_eq!(config.maximum_incorrect_attempts, 3);
        assert!(config.is_biometric_allowed);
        assert!(config.is_reset_allowed);
        assert_eq!(config.reset_policy, ResetPolicy::AnyInput);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_length_rejected() {
        let config = LockConfig::with_length(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPasscodeLength)
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let config = LockConfig {
            maximum_incorrect_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMaximumAttempts)
        ));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: LockConfig =
            serde_json::from_str(r#"{"passcode_length": 6, "reset_policy": "explicit_confirmation"}"#)
                .unwrap();
        assert_eq!(config.passcode_length, 6);
        assert_eq!(config.maximum_incorrect_attempts, 3);
        assert_eq!(config.reset_policy, ResetPolicy::ExplicitConfirmation);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("lock.json");

        let config = LockConfig {
            passcode_length: 6,
            is_biometric_allowed: false,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = LockConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lock.json");
        std::fs::write(&path, r#"{"passcode_length": 0}"#).unwrap();

        assert!(matches!(
            LockConfig::load(&path),
            Err(ConfigError::InvalidPasscodeLength)
        ));
    }
}
