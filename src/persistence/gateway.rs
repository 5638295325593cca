use crate::dashboard::store::LayoutStore;
use crate::persistence::backend::{probe, StorageBackend};
use crate::persistence::{
    decode_snapshot, encode_snapshot, RestoredState, Snapshot, SCHEMA_VERSION,
};
use chrono::Utc;
use tracing::{debug, info, warn};

/// Best-effort snapshot storage. Failures are logged and never reach the
/// caller.
pub struct PersistenceGateway {
    backend: Option<Box<dyn StorageBackend>>,
    key: String,
}

impl PersistenceGateway {
    /// Probes `backend` once; an unusable backend disables persistence.
    pub fn new(backend: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let key = key.into();
        match probe(backend.as_ref()) {
            Ok(()) => Self {
                backend: Some(backend),
                key,
            },
            Err(err) => {
                warn!(error = %err, "storage unavailable; dashboard state will not be saved");
                Self { backend: None, key }
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            key: String::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Writes the current dashboard, skipping a store with nothing in it.
    pub fn save(&self, store: &LayoutStore) {
        if store.is_empty() {
            debug!("skipping save of empty dashboard");
            return;
        }
        let snapshot = Snapshot::capture(store.widgets(), store.layout(), store.chats(), Utc::now());
        self.write(&snapshot);
    }

    pub fn write(&self, snapshot: &Snapshot) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let result = encode_snapshot(snapshot).and_then(|bytes| {
            let json = String::from_utf8_lossy(&bytes);
            backend.set_item(&self.key, &json).map_err(Into::into)
        });
        match result {
            Ok(()) => debug!(
                key = %self.key,
                widgets = snapshot.components.len(),
                "dashboard snapshot saved"
            ),
            Err(err) => warn!(key = %self.key, error = %err, "failed to save dashboard snapshot"),
        }
    }

    /// Last saved state, or `None` when nothing usable is stored.
    pub fn restore(&self) -> Option<RestoredState> {
        let backend = self.backend.as_ref()?;
        let raw = match backend.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to read dashboard snapshot");
                return None;
            }
        };

        let snapshot = match decode_snapshot(raw.as_bytes()) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(key = %self.key, error = %err, "ignoring corrupt dashboard snapshot");
                return None;
            }
        };
        // No migrations exist yet; older or newer records are loaded as-is.
        if snapshot.version != SCHEMA_VERSION {
            warn!(
                expected = SCHEMA_VERSION,
                found = %snapshot.version,
                "dashboard snapshot version mismatch"
            );
        }
        info!(
            widgets = snapshot.components.len(),
            saved_at = ?snapshot.saved_at(),
            "dashboard snapshot restored"
        );
        Some(snapshot.into_restored())
    }

    pub fn clear(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(err) = backend.remove_item(&self.key) {
            warn!(key = %self.key, error = %err, "failed to clear dashboard snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PersistenceGateway;
    use crate::chat::ChatOwner;
    use crate::dashboard::store::LayoutStore;
    use crate::persistence::backend::{FileStorage, MemoryStorage, StorageBackend};
    use crate::persistence::STORAGE_KEY;
    use crate::widgets::catalog::WidgetRegistry;
    use pretty_assertions::assert_eq;

    fn populated_store(registry: &WidgetRegistry) -> LayoutStore {
        let mut store = LayoutStore::default();
        let mut chart = registry.instantiate("chart", None);
        chart.id = "chart-1".to_string();
        store.add(chart, None, registry);
        let mut list = registry.instantiate("list", Some("Deploys"));
        list.id = "list-2".to_string();
        store.add(list, None, registry);
        store
            .open_chat(&ChatOwner::Widget("chart-1".to_string()))
            .0
            .push_user("make it red");
        store
    }

    #[test]
    fn save_then_restore_rebuilds_the_dashboard() {
        let registry = WidgetRegistry::builtin();
        let storage = MemoryStorage::new();
        let gateway = PersistenceGateway::new(Box::new(storage.clone()), STORAGE_KEY);
        assert!(gateway.is_available());

        let store = populated_store(&registry);
        gateway.save(&store);
        assert!(storage
            .get_item(STORAGE_KEY)
            .expect("read should succeed")
            .is_some());

        let restored = gateway.restore().expect("state should restore");
        let mut rebuilt = LayoutStore::default();
        rebuilt.restore(
            restored.rehydrate(&registry),
            restored.layout.clone(),
            restored.chats.clone(),
            &registry,
        );

        assert_eq!(rebuilt.layout(), store.layout());
        assert_eq!(rebuilt.widgets(), store.widgets());
        let chat = rebuilt
            .chat(&ChatOwner::Widget("chart-1".to_string()))
            .expect("chat should restore");
        assert_eq!(chat.messages()[0].text, "make it red");
    }

    #[test]
    fn empty_dashboard_is_not_saved() {
        let storage = MemoryStorage::new();
        let gateway = PersistenceGateway::new(Box::new(storage.clone()), STORAGE_KEY);
        gateway.save(&LayoutStore::default());
        assert!(storage
            .get_item(STORAGE_KEY)
            .expect("read should succeed")
            .is_none());
    }

    #[test]
    fn corrupt_or_missing_state_restores_nothing() {
        let storage = MemoryStorage::new();
        let gateway = PersistenceGateway::new(Box::new(storage.clone()), STORAGE_KEY);
        assert!(gateway.restore().is_none());

        storage
            .set_item(STORAGE_KEY, "{\"components\": [")
            .expect("write should succeed");
        assert!(gateway.restore().is_none());
    }

    #[test]
    fn version_mismatch_still_restores() {
        let storage = MemoryStorage::new();
        storage
            .set_item(
                STORAGE_KEY,
                r#"{"version":"0.1.0","timestamp":0,"components":[{"id":"gauge-3","type":"gauge","title":"CPU"}],"layout":[],"chatMessages":{}}"#,
            )
            .expect("write should succeed");
        let gateway = PersistenceGateway::new(Box::new(storage), STORAGE_KEY);

        let restored = gateway.restore().expect("mismatched version should still load");
        assert_eq!(restored.version, "0.1.0");
        assert_eq!(restored.widgets[0].title, "CPU");
    }

    #[test]
    fn unavailable_storage_disables_persistence_quietly() {
        let registry = WidgetRegistry::builtin();
        let gateway = PersistenceGateway::new(Box::new(MemoryStorage::unavailable()), STORAGE_KEY);
        assert!(!gateway.is_available());
        gateway.save(&populated_store(&registry));
        assert!(gateway.restore().is_none());
        gateway.clear();
    }

    #[test]
    fn clear_removes_the_stored_snapshot_on_disk() {
        let registry = WidgetRegistry::builtin();
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let gateway = PersistenceGateway::new(Box::new(FileStorage::new(dir.path())), STORAGE_KEY);

        gateway.save(&populated_store(&registry));
        assert!(dir.path().join("dashboard_layout_state.json").exists());
        gateway.clear();
        assert!(!dir.path().join("dashboard_layout_state.json").exists());
        assert!(gateway.restore().is_none());
    }
}
