//! File-backed credential store
//!
//! The passcode is hashed with Argon2id and kept in a small JSON record.
//! Writes go through a temp file and an atomic rename.

use std::fs;
use std::path::{Path, PathBuf};

use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CredentialStore;
use crate::error::StoreError;
use crate::passcode::Passcode;

/// Current record format version
const RECORD_VERSION: u32 = 1;

/// Persisted record
#[derive(Debug, Default, Serialize, Deserialize)]
struct PasscodeRecord {
    /// Version for future migrations
    version: u32,
    /// Hashed credential, if one is set
    credential: Option<StoredCredential>,
    /// When the store was last reset
    last_reset_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    /// Argon2id PHC string
    hash: String,
    set_at: DateTime<Utc>,
}

/// Credential store persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    record: PasscodeRecord,
}

impl FileStore {
    /// Default location for the passcode record
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("passlock")
            .join("passcode.json")
    }

    /// Open the store at `path`, loading an existing record if present
    ///
    /// A record that exists but cannot be parsed is an error, never an
    /// empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let record = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents).map_err(|e| {
                StoreError::Serialization(format!("Failed to parse passcode record: {}", e))
            })?
        } else {
            PasscodeRecord {
                version: RECORD_VERSION,
                ..Default::default()
            }
        };

        debug!(path = %path.display(), "Opened passcode store");
        Ok(Self { path, record })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the current passcode was set
    pub fn passcode_set_at(&self) -> Option<DateTime<Utc>> {
        self.record.credential.as_ref().map(|c| c.set_at)
    }

    /// When the store was last reset
    pub fn last_reset_at(&self) -> Option<DateTime<Utc>> {
        self.record.last_reset_at
    }

    fn hash(passcode: &Passcode) -> Result<String, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        let bytes = passcode.to_ascii();

        Argon2::default()
            .hash_password(&bytes, &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Crypto(format!("Failed to hash passcode: {}", e)))
    }

    /// Persist `record` and only then adopt it
    fn commit(&mut self, record: PasscodeRecord) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(&record)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)?;
        fs::rename(&temp_path, &self.path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        self.record = record;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn current_passcode(&self) -> Result<Option<Passcode>, StoreError> {
        match self.record.credential {
            Some(_) => Err(StoreError::NotRetrievable),
            None => Ok(None),
        }
    }

    fn has_passcode(&self) -> Result<bool, StoreError> {
        Ok(self.record.credential.is_some())
    }

    fn save(&mut self, passcode: &Passcode) -> Result<(), StoreError> {
        let hash = Self::hash(passcode)?;
        self.commit(PasscodeRecord {
            version: RECORD_VERSION,
            credential: Some(StoredCredential {
                hash,
                set_at: Utc::now(),
            }),
            last_reset_at: self.record.last_reset_at,
        })?;
        info!("Passcode saved");
        Ok(())
    }

    fn delete(&mut self) -> Result<(), StoreError> {
        self.commit(PasscodeRecord {
            version: RECORD_VERSION,
            credential: None,
            last_reset_at: self.record.last_reset_at,
        })?;
        info!("Passcode deleted");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StoreError> {
        self.commit(PasscodeRecord {
            version: RECORD_VERSION,
            credential: None,
            last_reset_at: Some(Utc::now()),
        })?;
        info!("Passcode store reset");
        Ok(())
    }

    fn check(&self, candidate: &Passcode) -> Result<bool, StoreError> {
        let Some(credential) = &self.record.credential else {
            return Ok(false);
        };

        let parsed = PasswordHash::new(&credential.hash)
            .map_err(|e| StoreError::Crypto(format!("Invalid stored hash: {}", e)))?;

        let bytes = candidate.to_ascii();
        match Argon2::default().verify_password(&bytes, &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(StoreError::Crypto(format!("Failed to verify passcode: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockConfig;
    use crate::error::LockError;
    use crate::mode::Mode;
    use tempfile::tempdir;

    fn code(s: &str) -> Passcode {
        Passcode::parse(s).unwrap()
    }

    #[test]
    fn test_save_and_check() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("passcode.json")).unwrap();
        assert!(!store.has_passcode().unwrap());

        store.save(&code("1234")).unwrap();
        assert!(store.has_passcode().unwrap());
        assert!(store.check(&code("1234")).unwrap());
        assert!(!store.check(&code("4321")).unwrap());
        assert!(store.passcode_set_at().is_some());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passcode.json");

        {
            let mut store = FileStore::open(&path).unwrap();
            store.save(&code("2468")).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert!(store.has_passcode().unwrap());
        assert!(store.check(&code("2468")).unwrap());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passcode.json");
        let mut store = FileStore::open(&path).unwrap();
        store.save(&code("13579")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("$argon2id$"));
        assert!(!contents.contains("13579"));
    }

    #[test]
    fn test_current_passcode_not_retrievable() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("passcode.json")).unwrap();
        assert!(store.current_passcode().unwrap().is_none());

        store.save(&code("1234")).unwrap();
        assert!(matches!(
            store.current_passcode(),
            Err(StoreError::NotRetrievable)
        ));
    }

    #[test]
    fn test_delete_and_reset() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("passcode.json")).unwrap();

        store.save(&code("1111")).unwrap();
        store.delete().unwrap();
        assert!(!store.has_passcode().unwrap());
        assert!(store.last_reset_at().is_none());

        store.save(&code("2222")).unwrap();
        store.reset().unwrap();
        assert!(!store.has_passcode().unwrap());
        assert!(store.last_reset_at().is_some());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passcode.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileStore::open(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_unusable_hash_params_are_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("passcode.json");
        // Well-formed PHC string whose memory cost argon2 refuses
        let record = r#"{
            "version": 1,
            "credential": {
                "hash": "$argon2id$v=19$m=1,t=1,p=1$c2FsdHNhbHRzYWx0$aGFzaGhhc2hoYXNoaGFzaGhhc2hoYXNoaGFzaGhhc2g",
                "set_at": "2026-01-01T00:00:00Z"
            },
            "last_reset_at": null
        }"#;
        fs::write(&path, record).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert!(store.has_passcode().unwrap());
        assert!(matches!(
            store.check(&code("1234")),
            Err(StoreError::Crypto(_))
        ));

        // Surfaces as a store error and is not counted as a guess
        let t = Mode::enter().accept(&code("1234"), &mut store, &LockConfig::default());
        assert!(matches!(
            t.verdict,
            Err(LockError::Store(StoreError::Crypto(_)))
        ));
        assert_eq!(t.next.incorrect_attempts(), 0);
        assert!(t.lockout_reached.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("passcode.json");
        let mut store = FileStore::open(&path).unwrap();
        store.save(&code("1234")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
