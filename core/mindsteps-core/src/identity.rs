//! Device identity: a stable per-installation id used to scope sessions to
//! a device without user accounts.
//!
//! Read-or-generate-and-persist: the first call mints a ULID and writes it
//! under the storage root; every later call returns the same value. The
//! engine fetches the id once at construction and holds it as plain state;
//! there is deliberately no module-level cache.

use crate::error::{MindError, Result};
use crate::storage::StorageConfig;
use fs_err as fs;

/// Returns the persisted device id, creating and persisting one on first use.
pub fn get_or_init_device_id(storage: &StorageConfig) -> Result<String> {
    let path = storage.device_id_file();

    if path.exists() {
        let existing = fs::read_to_string(&path).map_err(|source| MindError::Io {
            context: format!("reading {}", path.display()),
            source,
        })?;
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
        // Empty file: fall through and mint a fresh id.
    }

    let id = ulid::Ulid::new().to_string();
    fs::create_dir_all(storage.root()).map_err(|source| MindError::Io {
        context: format!("creating {}", storage.root().display()),
        source,
    })?;
    fs::write(&path, &id).map_err(|source| MindError::Io {
        context: format!("writing {}", path.display()),
        source,
    })?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path().join("mindsteps"));
        (temp, storage)
    }

    #[test]
    fn mints_and_persists_on_first_call() {
        let (_temp, storage) = setup_storage();
        let id = get_or_init_device_id(&storage).unwrap();
        assert!(!id.is_empty());
        assert!(storage.device_id_file().exists());
    }

    #[test]
    fn returns_same_id_across_calls() {
        let (_temp, storage) = setup_storage();
        let first = get_or_init_device_id(&storage).unwrap();
        let second = get_or_init_device_id(&storage).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn reads_existing_id() {
        let (_temp, storage) = setup_storage();
        fs::create_dir_all(storage.root()).unwrap();
        fs::write(storage.device_id_file(), "device-from-disk\n").unwrap();
        let id = get_or_init_device_id(&storage).unwrap();
        assert_eq!(id, "device-from-disk");
    }

    #[test]
    fn replaces_empty_file() {
        let (_temp, storage) = setup_storage();
        fs::create_dir_all(storage.root()).unwrap();
        fs::write(storage.device_id_file(), "  \n").unwrap();
        let id = get_or_init_device_id(&storage).unwrap();
        assert!(!id.trim().is_empty());
        // And the minted id sticks.
        assert_eq!(get_or_init_device_id(&storage).unwrap(), id);
    }
}
