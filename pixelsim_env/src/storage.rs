//! Durable boolean flag storage.
//!
//! The only thing Pixelsim persists across sessions is the
//! "tutorial completed" flag; this trait keeps the core logic
//! storage-backend-agnostic (sled in production, in-memory for tests).

use crate::error::EnvError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value persistence capability for a small set of boolean flags.
///
/// Implementations must be usable from a shared reference; interior
/// mutability is the implementation's concern.
pub trait FlagStore: Send + Sync {
    /// Reads a flag. An absent key reads as `false`.
    fn get(&self, key: &str) -> Result<bool, EnvError>;

    /// Writes a flag durably.
    fn set(&self, key: &str, value: bool) -> Result<(), EnvError>;

    /// Removes a flag, so subsequent reads return `false`.
    fn clear(&self, key: &str) -> Result<(), EnvError>;
}

impl<T: FlagStore + ?Sized> FlagStore for &T {
    fn get(&self, key: &str) -> Result<bool, EnvError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: bool) -> Result<(), EnvError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), EnvError> {
        (**self).clear(key)
    }
}

impl<T: FlagStore + ?Sized> FlagStore for Box<T> {
    fn get(&self, key: &str) -> Result<bool, EnvError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: bool) -> Result<(), EnvError> {
        (**self).set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), EnvError> {
        (**self).clear(key)
    }
}

/// In-memory flag store for simulation and tests. Nothing survives the
/// process.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> Result<bool, EnvError> {
        let flags = self
            .flags
            .lock()
            .map_err(|e| EnvError::storage(e.to_string()))?;
        Ok(flags.get(key).copied().unwrap_or(false))
    }

    fn set(&self, key: &str, value: bool) -> Result<(), EnvError> {
        let mut flags = self
            .flags
            .lock()
            .map_err(|e| EnvError::storage(e.to_string()))?;
        flags.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), EnvError> {
        let mut flags = self
            .flags
            .lock()
            .map_err(|e| EnvError::storage(e.to_string()))?;
        flags.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_absent_key_reads_false() {
        let store = MemoryFlagStore::new();
        assert!(!store.get("tutorial_completed").unwrap());
    }

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemoryFlagStore::new();
        store.set("tutorial_completed", true).unwrap();
        assert!(store.get("tutorial_completed").unwrap());

        store.clear("tutorial_completed").unwrap();
        assert!(!store.get("tutorial_completed").unwrap());
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryFlagStore::new();
        store.set("flag", true).unwrap();
        store.set("flag", false).unwrap();
        assert!(!store.get("flag").unwrap());
    }
}
