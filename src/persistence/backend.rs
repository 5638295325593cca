use crate::error::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const PROBE_KEY: &str = "__storage_probe__";

/// String key/value storage holding dashboard snapshots.
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Writes then removes a sentinel key. Any failure means the backend must
/// not be used for this session.
pub fn probe(backend: &dyn StorageBackend) -> Result<(), StorageError> {
    backend.set_item(PROBE_KEY, PROBE_KEY)?;
    backend.remove_item(PROBE_KEY)
}

/// One `<key>.json` file per key under `root_dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root_dir: PathBuf,
}

impl FileStorage {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for_key(&self, key: &str) -> Result<PathBuf, StorageError> {
        let file_stem = sanitize_key(key);
        if file_stem.is_empty() {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root_dir.join(format!("{file_stem}.json")))
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for_key(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let final_path = self.path_for_key(key)?;
        fs::create_dir_all(&self.root_dir).map_err(|source| StorageError::Io {
            path: self.root_dir.clone(),
            source,
        })?;

        let tmp_path = final_path.with_extension("json.tmp");
        fs::write(&tmp_path, value).map_err(|source| StorageError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        let replace = || -> io::Result<()> {
            match fs::rename(&tmp_path, &final_path) {
                Ok(()) => Ok(()),
                Err(rename_err) => {
                    if final_path.exists() {
                        fs::remove_file(&final_path)?;
                        fs::rename(&tmp_path, &final_path)
                    } else {
                        Err(rename_err)
                    }
                }
            }
        };
        replace().map_err(|source| StorageError::Io {
            path: final_path.clone(),
            source,
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for_key(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-process storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects every operation, like a browser in private mode.
    #[cfg(test)]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        if self.unavailable {
            return Err(StorageError::Unavailable);
        }
        self.entries.lock().map_err(|_| StorageError::Unavailable)
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{probe, FileStorage, MemoryStorage, StorageBackend};
    use crate::error::StorageError;

    #[test]
    fn file_storage_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage
            .get_item("dashboard_layout_state")
            .expect("missing key should read")
            .is_none());
        storage
            .set_item("dashboard_layout_state", "{\"a\":1}")
            .expect("first write should succeed");
        storage
            .set_item("dashboard_layout_state", "{\"a\":2}")
            .expect("overwrite should succeed");
        assert_eq!(
            storage
                .get_item("dashboard_layout_state")
                .expect("key should read")
                .as_deref(),
            Some("{\"a\":2}")
        );
        assert!(dir
            .path()
            .join("nested")
            .join("dashboard_layout_state.json")
            .exists());

        storage
            .remove_item("dashboard_layout_state")
            .expect("remove should succeed");
        storage
            .remove_item("dashboard_layout_state")
            .expect("removing twice should be fine");
        assert!(storage
            .get_item("dashboard_layout_state")
            .expect("key should read")
            .is_none());
    }

    #[test]
    fn file_storage_rejects_keys_that_sanitize_to_nothing() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let storage = FileStorage::new(dir.path());
        let error = storage.set_item("../", "x").expect_err("key should be rejected");
        assert!(matches!(error, StorageError::InvalidKey(_)));
    }

    #[test]
    fn probe_leaves_no_sentinel_behind() {
        let storage = MemoryStorage::new();
        probe(&storage).expect("memory storage should be available");
        assert!(storage
            .get_item(super::PROBE_KEY)
            .expect("read should succeed")
            .is_none());

        let dir = tempfile::tempdir().expect("temp dir should be created");
        let files = FileStorage::new(dir.path());
        probe(&files).expect("file storage should be available");
        assert_eq!(
            std::fs::read_dir(dir.path())
                .expect("dir should list")
                .count(),
            0
        );
    }

    #[test]
    fn probe_fails_for_unavailable_storage() {
        assert!(matches!(
            probe(&MemoryStorage::unavailable()),
            Err(StorageError::Unavailable)
        ));
    }
}
