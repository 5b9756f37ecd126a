#[cfg(test)]
pub mod test {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use crate::document::Document;
    use crate::manager::SettingsManager;
    use crate::schema::{Registry, Value};
    use crate::store::{FileStore, MemoryStore};
    use crate::sync::Surface;

    pub const APP: &str = "deskfig-test";

    pub fn doc(toml_str: &str) -> Document {
        Document::parse(toml_str).unwrap()
    }

    /// Manager over an in-memory store, plus a handle onto that store.
    pub fn memory_manager(stored: Option<Document>) -> (SettingsManager<MemoryStore>, MemoryStore) {
        let store = match stored {
            Some(d) => MemoryStore::with_document(d),
            None => MemoryStore::new(),
        };
        let manager = SettingsManager::new(store.clone(), Registry::builtin(), APP);
        (manager, store)
    }

    /// Manager over a TOML file seeded from the builtin template.
    pub fn file_manager(path: &Path) -> SettingsManager<FileStore> {
        let registry = Registry::builtin();
        let store = FileStore::new(path).with_template(registry.template());
        SettingsManager::new(store, registry, APP)
    }

    /// A surface that records what it was shown. Clones share the record.
    #[derive(Debug, Clone)]
    pub struct RecordingSurface {
        id: String,
        pub shown: Arc<Mutex<Vec<(String, Value)>>>,
    }

    impl RecordingSurface {
        pub fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                shown: Arc::default(),
            }
        }

        pub fn shown(&self) -> Vec<(String, Value)> {
            self.shown.lock().unwrap().clone()
        }

        pub fn last(&self, name: &str) -> Option<Value> {
            self.shown()
                .into_iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v)
        }
    }

    impl Surface for RecordingSurface {
        fn id(&self) -> &str {
            &self.id
        }

        fn show(&mut self, name: &str, value: &Value) {
            self.shown
                .lock()
                .unwrap()
                .push((name.to_string(), value.clone()));
        }
    }

    #[test]
    fn memory_manager_starts_at_defaults() {
        let (manager, store) = memory_manager(None);
        assert_eq!(manager.settings(), &Registry::builtin().default_settings());
        assert!(store.contents().is_none());
    }
}
