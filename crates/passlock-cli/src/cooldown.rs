//! Progressive cooldown after lockouts
//!
//! The lock only signals that a mode instance ran out of attempts. The
//! terminal front end turns each signal into a wait, escalating with every
//! lockout seen in the session:
//!
//! - 1st lockout: 30 seconds
//! - 2nd lockout: 5 minutes
//! - 3rd lockout: 30 minutes
//! - 4th and later: 24 hours

use std::time::Duration;

use clap::ValueEnum;

/// Named cooldown schedules selectable from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CooldownPreset {
    #[default]
    Standard,
    Strict,
    Lenient,
    /// No waiting; for scripted use
    Off,
}

/// Escalating wait applied after each lockout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Wait for each lockout level (in seconds); the last entry repeats
    pub durations: Vec<u64>,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            durations: vec![
                30,    // 1st lockout: 30 seconds
                300,   // 2nd: 5 minutes
                1800,  // 3rd: 30 minutes
                86400, // 4th+: 24 hours
            ],
        }
    }
}

impl From<CooldownPreset> for CooldownPolicy {
    fn from(preset: CooldownPreset) -> Self {
        match preset {
            CooldownPreset::Standard => Self::default(),
            CooldownPreset::Strict => Self::strict(),
            CooldownPreset::Lenient => Self::lenient(),
            CooldownPreset::Off => Self::off(),
        }
    }
}

impl CooldownPolicy {
    /// Longer waits from the first lockout
    pub fn strict() -> Self {
        Self {
            durations: vec![60, 600, 3600, 86400],
        }
    }

    /// Short waits that cap at 30 minutes
    pub fn lenient() -> Self {
        Self {
            durations: vec![15, 60, 300, 1800],
        }
    }

    pub fn off() -> Self {
        Self {
            durations: Vec::new(),
        }
    }

    /// Wait after the `lockouts`-th lockout of the session (1-based)
    ///
    /// Returns None before any lockout or when the policy is off.
    pub fn cooldown(&self, lockouts: u32) -> Option<Duration> {
        if lockouts == 0 {
            return None;
        }
        let last = self.durations.len().checked_sub(1)?;
        let level = ((lockouts - 1) as usize).min(last);
        Some(Duration::from_secs(self.durations[level]))
    }

    /// Human-readable wait for the `lockouts`-th lockout
    pub fn describe(&self, lockouts: u32) -> String {
        match self.cooldown(lockouts) {
            Some(duration) => {
                let secs = duration.as_secs();
                if secs < 60 {
                    format!("Locked for {} seconds", secs)
                } else if secs < 3600 {
                    format!("Locked for {} minutes", secs / 60)
                } else if secs < 86400 {
                    format!("Locked for {} hours", secs / 3600)
                } else {
                    format!("Locked for {} days", secs / 86400)
                }
            }
            None => "Not locked".to_string(),
        }
    }
}
