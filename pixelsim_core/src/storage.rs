//! Sled-backed durable flag storage.
//!
//! Production implementation of [`FlagStore`]; an embedded key-value
//! database stands in for the browser-local storage the flag originally
//! lived in.

use pixelsim_env::{EnvError, FlagStore};
use std::path::Path;

/// Sled-based persistent flag store.
pub struct SledFlagStore {
    db: sled::Db,
}

impl SledFlagStore {
    /// Open a persistent store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let db = sled::open(path)
            .map_err(|e| EnvError::storage(format!("Failed to open sled DB: {}", e)))?;
        Ok(Self { db })
    }

    /// Create a temporary store (for testing)
    #[cfg(test)]
    pub fn open_temp() -> Result<Self, EnvError> {
        let config = sled::Config::new().temporary(true);
        let db = config
            .open()
            .map_err(|e| EnvError::storage(format!("Failed to open temp DB: {}", e)))?;
        Ok(Self { db })
    }
}

impl FlagStore for SledFlagStore {
    fn get(&self, key: &str) -> Result<bool, EnvError> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| EnvError::storage(format!("Read failed: {}", e)))?;
        Ok(matches!(value.as_deref(), Some([1])))
    }

    fn set(&self, key: &str, value: bool) -> Result<(), EnvError> {
        self.db
            .insert(key.as_bytes(), &[value as u8])
            .map_err(|e| EnvError::storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), EnvError> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| EnvError::storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_key_reads_false() {
        let store = SledFlagStore::open_temp().unwrap();
        assert!(!store.get("tutorial_completed").unwrap());
    }

    #[test]
    fn test_set_get_clear_roundtrip() {
        let store = SledFlagStore::open_temp().unwrap();
        store.set("tutorial_completed", true).unwrap();
        assert!(store.get("tutorial_completed").unwrap());

        store.clear("tutorial_completed").unwrap();
        assert!(!store.get("tutorial_completed").unwrap());
    }

    #[test]
    fn test_false_value_reads_false() {
        let store = SledFlagStore::open_temp().unwrap();
        store.set("flag", false).unwrap();
        assert!(!store.get("flag").unwrap());
    }

    #[test]
    fn test_flags_survive_reopen() {
        let dir = std::env::temp_dir().join(format!("pixelsim_sled_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        {
            let store = SledFlagStore::open(&dir).unwrap();
            store.set("tutorial_completed", true).unwrap();
        }
        {
            let store = SledFlagStore::open(&dir).unwrap();
            assert!(store.get("tutorial_completed").unwrap());
        }
        let _ = std::fs::remove_dir_all(&dir);
    }
}
