//! Settings operations: list, get, set, path and template generation.
//!
//! Provides the logic behind `settings list|get|set|path|gen` and the
//! `ActionResult` callers display. Keys accept either a logical name
//! (`theme`) or a key path (`application.theme`).

use std::fmt;
use std::path::PathBuf;

use crate::error::DeskfigError;
use crate::manager::SettingsManager;
use crate::schema::Value;
use crate::store::Store;

/// A settings operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Path,
    Gen { output: Option<PathBuf> },
}

/// Result of a settings operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// A generated TOML template string.
    Template(String),
    /// Confirmation that a template was written to a file.
    TemplateWritten { path: PathBuf },
    /// A setting's current value and its description.
    KeyValue {
        key: String,
        value: String,
        doc: String,
    },
    /// Confirmation that a value was set and saved.
    ValueSet { key: String, value: String },
    /// Every setting as `(key path, value)`, in registry order.
    Listing { entries: Vec<(String, String)> },
    /// Where settings are stored.
    Location(String),
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Template(t) => write!(f, "{t}"),
            ActionResult::TemplateWritten { path } => {
                write!(f, "Settings template written to {}", path.display())
            }
            ActionResult::KeyValue { key, value, doc } => {
                writeln!(f, "# {doc}")?;
                write!(f, "{key} = {value}")
            }
            ActionResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ActionResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ActionResult::Location(location) => write!(f, "{location}"),
        }
    }
}

impl<S: Store> SettingsManager<S> {
    /// Run a settings operation. `Set` saves immediately.
    pub fn handle(&mut self, action: SettingsAction) -> Result<ActionResult, DeskfigError> {
        match action {
            SettingsAction::List => Ok(self.list()),
            SettingsAction::Get { key } => {
                let d = self.registry().lookup(&key)?;
                Ok(ActionResult::KeyValue {
                    key: d.path.to_string(),
                    value: (d.read)(self.settings()).to_string(),
                    doc: d.doc.to_string(),
                })
            }
            SettingsAction::Set { key, value } => {
                let d = self.registry().lookup(&key)?;
                let (name, path) = (d.name, d.path);
                self.set(name, Value::Str(value))?;
                self.save()?;
                Ok(ActionResult::ValueSet {
                    key: path.to_string(),
                    value: self.get(name)?.to_string(),
                })
            }
            SettingsAction::Path => Ok(ActionResult::Location(self.location())),
            SettingsAction::Gen { output } => {
                let template = self.registry().template();
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent()
                            && !parent.as_os_str().is_empty()
                        {
                            std::fs::create_dir_all(parent).map_err(|e| DeskfigError::Io {
                                path: parent.to_path_buf(),
                                source: e,
                            })?;
                        }
                        std::fs::write(&path, &template).map_err(|e| DeskfigError::Io {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ActionResult::TemplateWritten { path })
                    }
                    None => Ok(ActionResult::Template(template)),
                }
            }
        }
    }

    fn list(&self) -> ActionResult {
        let entries = self
            .registry()
            .iter()
            .map(|d| (d.path.to_string(), (d.read)(self.settings()).to_string()))
            .collect();
        ActionResult::Listing { entries }
    }
}
