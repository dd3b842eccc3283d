//! Credential stores
//!
//! The lock never persists anything itself. Every read and mutation of the
//! passcode goes through a [`CredentialStore`], and only the active mode's
//! `accept` call mutates it.

mod file;

pub use file::FileStore;

use crate::error::StoreError;
use crate::passcode::Passcode;

/// Persistence abstraction for the passcode value
///
/// All operations are synchronous. A failing backend must return an error;
/// it must never pretend no passcode is configured.
pub trait CredentialStore {
    /// The stored passcode, if the store can reveal it
    fn current_passcode(&self) -> Result<Option<Passcode>, StoreError>;

    /// Whether a passcode is configured
    fn has_passcode(&self) -> Result<bool, StoreError>;

    /// Replace the stored passcode
    fn save(&mut self, passcode: &Passcode) -> Result<(), StoreError>;

    /// Remove the stored passcode
    fn delete(&mut self) -> Result<(), StoreError>;

    /// "Forgot passcode" reset: drop the credential and return the store
    /// to its initial state
    fn reset(&mut self) -> Result<(), StoreError>;

    /// Compare a candidate to the stored passcode
    ///
    /// Returns `Ok(false)` when no passcode is configured.
    fn check(&self, candidate: &Passcode) -> Result<bool, StoreError> {
        Ok(self.current_passcode()?.as_ref() == Some(candidate))
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn current_passcode(&self) -> Result<Option<Passcode>, StoreError> {
        (**self).current_passcode()
    }

    fn has_passcode(&self) -> Result<bool, StoreError> {
        (**self).has_passcode()
    }

    fn save(&mut self, passcode: &Passcode) -> Result<(), StoreError> {
        (**self).save(passcode)
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        (**self).delete()
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        (**self).reset()
    }

    fn check(&self, candidate: &Passcode) -> Result<bool, StoreError> {
        (**self).check(candidate)
    }
}

/// In-memory reference store
#[derive(Debug, Default)]
pub struct MemoryStore {
    passcode: Option<Passcode>,
    reset_count: u32,
    failing: bool,
    failing_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with a passcode
    pub fn with_passcode(passcode: Passcode) -> Self {
        Self {
            passcode: Some(passcode),
            ..Default::default()
        }
    }

    /// Store whose every operation fails with [`StoreError::Unavailable`]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    /// Make every mutation fail with [`StoreError::Unavailable`] while reads
    /// keep working
    pub fn with_failing_writes(mut self) -> Self {
        self.failing_writes = true;
        self
    }

    /// Number of resets performed on this store
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        self.ensure_available()?;
        if self.failing_writes {
            return Err(StoreError::Unavailable("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

impl CredentialStore for MemoryStore {
    fn current_passcode(&self) -> Result<Option<Passcode>, StoreError> {
        self.ensure_available()?;
        Ok(self.passcode.clone())
    }

    fn has_passcode(&self) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.passcode.is_some())
    }

    fn save(&mut self, passcode: &Passcode) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.passcode = Some(passcode.clone());
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.passcode = None;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.ensure_writable()?;
        self.passcode = None;
        self.reset_count += 1;
        Ok(())
    }

    fn check(&self, candidate: &Passcode) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.passcode.as_ref() == Some(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Passcode {
        Passcode::parse(s).unwrap()
    }

    #[test]
    fn test_memory_store_lifecycle() {
        let mut store = MemoryStore::new();
        assert!(!store.has_passcode().unwrap());
        assert!(!store.check(&code("1234")).unwrap());

        store.save(&code("1234")).unwrap();
        assert!(store.has_passcode().unwrap());
        assert_eq!(store.current_passcode().unwrap(), Some(code("1234")));
        assert!(store.check(&code("1234")).unwrap());
        assert!(!store.check(&code("4321")).unwrap());

        store.delete().unwrap();
        assert!(!store.has_passcode().unwrap());
        assert_eq!(store.reset_count(), 0);
    }

    #[test]
    fn test_memory_store_reset() {
        let mut store = MemoryStore::with_passcode(code("0000"));
        store.reset().unwrap();
        assert!(!store.has_passcode().unwrap());
        assert_eq!(store.reset_count(), 1);
    }

    #[test]
    fn test_failing_store_never_reports_empty() {
        let mut store = MemoryStore::failing();
        assert!(matches!(store.has_passcode(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.current_passcode(), Err(StoreError::Unavailable(_))));
        assert!(store.check(&code("1234")).is_err());
        assert!(store.save(&code("1234")).is_err());
        assert!(store.delete().is_err());
        assert!(store.reset().is_err());
    }

    #[test]
    fn test_failing_writes_keep_reads() {
        let mut store = MemoryStore::with_passcode(code("1234")).with_failing_writes();
        assert!(store.has_passcode().unwrap());
        assert!(store.check(&code("1234")).unwrap());

        assert!(matches!(store.save(&code("0000")), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.delete(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.reset(), Err(StoreError::Unavailable(_))));
        assert!(store.check(&code("1234")).unwrap());
        assert_eq!(store.reset_count(), 0);
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn CredentialStore> = Box::new(MemoryStore::new());
        store.save(&code("5555")).unwrap();
        assert!(store.check(&code("5555")).unwrap());
    }
}
