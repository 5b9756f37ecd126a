//! Settings persistence.
//!
//! [`FileStore`] keeps the settings document as TOML on disk. Saves patch the
//! existing file through `toml_edit`, touching only leaves whose value
//! changed, so comments, ordering and keys the application doesn't know
//! about survive. When no file exists yet the store starts from a template
//! so the first file written carries doc comments.
//!
//! [`MemoryStore`] keeps the document in memory and can be told to fail
//! writes; hosts without a filesystem and tests use it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::document::{Document, Scalar, split_path};
use crate::error::DeskfigError;

/// Where the settings document lives.
pub trait Store {
    /// Read the whole document.
    ///
    /// An absent or blank resource is `NotFound`, malformed content is
    /// `Parse`, and anything else unreadable is `Io`.
    fn load(&self) -> Result<Document, DeskfigError>;

    /// Replace the stored document.
    fn save(&self, document: &Document) -> Result<(), DeskfigError>;

    /// Human-readable location for diagnostics.
    fn location(&self) -> String;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn load(&self) -> Result<Document, DeskfigError> {
        (**self).load()
    }

    fn save(&self, document: &Document) -> Result<(), DeskfigError> {
        (**self).save(document)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// TOML file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    template: Option<String>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            template: None,
        }
    }

    /// Seed new files from `template` instead of an empty document.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for FileStore {
    fn load(&self) -> Result<Document, DeskfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeskfigError::NotFound {
                    location: self.location(),
                });
            }
            Err(e) => {
                return Err(DeskfigError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        if content.trim().is_empty() {
            return Err(DeskfigError::NotFound {
                location: self.location(),
            });
        }

        Document::parse(&content).map_err(|e| DeskfigError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    fn save(&self, document: &Document) -> Result<(), DeskfigError> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(c) => Some(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(DeskfigError::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let new_content =
            patch_document(existing.as_deref(), self.template.as_deref(), document)?;
        if existing.as_deref() == Some(new_content.as_str()) {
            debug!(path = %self.path.display(), "settings unchanged, skipping write");
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| DeskfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        std::fs::write(&self.path, &new_content).map_err(|e| DeskfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        debug!(path = %self.path.display(), "settings written");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pure function: write every leaf of `document` into a TOML text.
///
/// `existing` is the current file content, if any. Without it (or when it
/// no longer parses) the patch starts from `template`. Leaves whose value is
/// already in place are not touched; keys missing from `document` are kept.
pub fn patch_document(
    existing: Option<&str>,
    template: Option<&str>,
    document: &Document,
) -> Result<String, DeskfigError> {
    let mut doc = existing
        .and_then(|content| match content.parse::<toml_edit::DocumentMut>() {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, "existing settings file is malformed, rewriting it");
                None
            }
        })
        .or_else(|| template.and_then(|t| t.parse().ok()))
        .unwrap_or_default();

    for (path, scalar) in document.leaves() {
        set_leaf(&mut doc, &path, scalar)?;
    }

    Ok(doc.to_string())
}

fn set_leaf(
    doc: &mut toml_edit::DocumentMut,
    path: &str,
    scalar: &Scalar,
) -> Result<(), DeskfigError> {
    let segments = split_path(path)?;
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| DeskfigError::InvalidKeyPath(path.to_string()))?;

    let mut current: &mut toml_edit::Item = doc.as_item_mut();
    for segment in parents {
        let is_table = current.get(*segment).is_some_and(|item| item.is_table_like());
        if !is_table {
            current[*segment] = toml_edit::Item::Table(toml_edit::Table::new());
        }
        current = &mut current[*segment];
    }

    if current.get(*leaf).is_some_and(|item| same_item(item, scalar)) {
        return Ok(());
    }

    let mut new_value = to_edit_value(path, scalar)?;
    match current.get_mut(*leaf).and_then(toml_edit::Item::as_value_mut) {
        Some(existing) => {
            // Keep the trailing comment on the line.
            *new_value.decor_mut() = existing.decor().clone();
            *existing = new_value;
        }
        None => current[*leaf] = toml_edit::Item::Value(new_value),
    }
    Ok(())
}

fn same_item(item: &toml_edit::Item, scalar: &Scalar) -> bool {
    let Ok(mut value) = item.clone().into_value() else {
        return false;
    };
    value.decor_mut().clear();
    match scalar {
        Scalar::Boolean(b) => value.as_bool() == Some(*b),
        Scalar::Integer(i) => value.as_integer() == Some(*i),
        Scalar::Float(f) => value.as_float() == Some(*f),
        Scalar::String(s) => value.as_str() == Some(s.as_str()),
        Scalar::Other(v) => toml::from_str::<toml::Table>(&format!("v = {value}"))
            .is_ok_and(|table| table.get("v") == Some(v)),
    }
}

fn to_edit_value(path: &str, scalar: &Scalar) -> Result<toml_edit::Value, DeskfigError> {
    Ok(match scalar {
        Scalar::Boolean(b) => toml_edit::Value::from(*b),
        Scalar::Integer(i) => toml_edit::Value::from(*i),
        Scalar::Float(f) => toml_edit::Value::from(*f),
        Scalar::String(s) => toml_edit::Value::from(s.as_str()),
        Scalar::Other(v) => {
            v.to_string()
                .parse()
                .map_err(|e: toml_edit::TomlError| DeskfigError::InvalidValue {
                    key: path.to_string(),
                    reason: e.to_string(),
                })?
        }
    })
}

#[derive(Debug, Default)]
struct MemoryState {
    document: Option<Document>,
    fail_writes: bool,
    saves: usize,
}

/// In-memory store. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Document) -> Self {
        let store = Self::default();
        store.state().document = Some(document);
        store
    }

    /// Make every following `save` fail with an I/O error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Snapshot of what is currently stored.
    pub fn contents(&self) -> Option<Document> {
        self.state().document.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn load(&self) -> Result<Document, DeskfigError> {
        match &self.state().document {
            Some(doc) if !doc.is_empty() => Ok(doc.clone()),
            _ => Err(DeskfigError::NotFound {
                location: self.location(),
            }),
        }
    }

    fn save(&self, document: &Document) -> Result<(), DeskfigError> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(DeskfigError::Io {
                path: PathBuf::from(self.location()),
                source: std::io::Error::other("writes are disabled"),
            });
        }
        state.document = Some(document.clone());
        state.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Node;
    use crate::schema::Registry;
    use std::fs;
    use tempfile::TempDir;

    fn doc(toml_str: &str) -> Document {
        Document::parse(toml_str).unwrap()
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("config.toml"));
        match store.load() {
            Err(DeskfigError::NotFound { location }) => assert!(location.contains("config.toml")),
            other => panic!("Expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_blank_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n\n").unwrap();
        assert!(matches!(
            FileStore::new(&path).load(),
            Err(DeskfigError::NotFound { .. })
        ));
    }

    #[test]
    fn load_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[application\ntheme = ").unwrap();
        match FileStore::new(&path).load() {
            Err(DeskfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("Expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn load_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileStore::new(dir.path()).load(),
            Err(DeskfigError::Io { .. })
        ));
    }

    #[test]
    fn save_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("dir").join("config.toml");
        let store = FileStore::new(&path);
        store.save(&doc("[window]\nwidth = 700\n")).unwrap();
        assert_eq!(store.load().unwrap(), doc("[window]\nwidth = 700\n"));
    }

    #[test]
    fn save_seeds_from_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let registry = Registry::builtin();
        let store = FileStore::new(&path).with_template(registry.template());

        let mut document = registry.default_document();
        document
            .set("application.theme", Node::leaf("dark"))
            .unwrap();
        store.save(&document).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# Color scheme"));
        assert!(content.contains("theme = \"dark\""));
        assert_eq!(store.load().unwrap(), document);
    }

    #[test]
    fn unchanged_save_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let before = "# mine\n[window]\nwidth   =   700 # wide enough\n";
        fs::write(&path, before).unwrap();

        let store = FileStore::new(&path);
        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn changed_value_keeps_comments() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "# top comment\n[window]\n# size\nwidth = 700 # px\nheight = 800\n",
        )
        .unwrap();

        let store = FileStore::new(&path);
        store
            .save(&doc("[window]\nwidth = 1024\nheight = 800\n"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("# top comment"));
        assert!(content.contains("# size"));
        assert!(content.contains("width = 1024 # px"));
    }

    #[test]
    fn keys_missing_from_document_are_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[plugins]\nenabled = [\"a\"]\n[window]\nwidth = 1\n").unwrap();

        let store = FileStore::new(&path);
        store.save(&doc("[window]\nwidth = 2\n")).unwrap();

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.get_scalar("window.width"), Some(&Scalar::Integer(2)));
        assert!(matches!(
            reloaded.get_scalar("plugins.enabled"),
            Some(Scalar::Other(_))
        ));
    }

    #[test]
    fn malformed_file_is_replaced_on_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        let store = FileStore::new(&path);
        store.save(&doc("[window]\nwidth = 700\n")).unwrap();
        assert_eq!(store.load().unwrap(), doc("[window]\nwidth = 700\n"));
    }

    #[test]
    fn save_replaces_leaf_that_blocks_a_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "window = \"flat\"\n").unwrap();

        let store = FileStore::new(&path);
        store.save(&doc("[window]\nwidth = 700\n")).unwrap();
        assert_eq!(
            store.load().unwrap().get_scalar("window.width"),
            Some(&Scalar::Integer(700))
        );
    }

    #[test]
    fn save_into_unwritable_location_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(blocker.join("config.toml"));
        match store.save(&doc("a = 1")) {
            Err(DeskfigError::Io { .. }) => {}
            other => panic!("Expected Io, got {other:?}"),
        }
    }

    #[test]
    fn patch_without_existing_or_template_starts_empty() {
        let out = patch_document(None, None, &doc("[a]\nb = true\n")).unwrap();
        assert_eq!(Document::parse(&out).unwrap(), doc("[a]\nb = true\n"));
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(matches!(store.load(), Err(DeskfigError::NotFound { .. })));

        store.save(&doc("a = 1")).unwrap();
        assert_eq!(store.load().unwrap(), doc("a = 1"));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(&doc("a = 1")).unwrap();
        assert_eq!(handle.contents(), Some(doc("a = 1")));
    }

    #[test]
    fn memory_store_failing_writes() {
        let store = MemoryStore::with_document(doc("a = 1"));
        store.set_fail_writes(true);
        assert!(matches!(
            store.save(&doc("a = 2")),
            Err(DeskfigError::Io { .. })
        ));
        assert_eq!(store.contents(), Some(doc("a = 1")));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn memory_store_empty_document_is_not_found() {
        let store = MemoryStore::with_document(Document::new());
        assert!(matches!(store.load(), Err(DeskfigError::NotFound { .. })));
    }
}
