//! The settings facade.
//!
//! [`SettingsManager`] owns the typed [`Settings`], the [`Registry`] that
//! describes them and the [`Store`] they persist to. Loading never fails:
//! a missing or unreadable document is replaced by defaults (and written
//! back), and a single bad field falls back to its own default without
//! disturbing the rest. Saving writes every registered setting on top of the
//! document last loaded, so keys this version doesn't know survive.

use tracing::{debug, error, info, warn};

use crate::autostart::AutoStart;
use crate::document::{Document, Node};
use crate::error::DeskfigError;
use crate::merge::{ShapeConflict, deep_merge};
use crate::schema::{Registry, Settings, Value};
use crate::store::Store;

const AUTO_START_PATH: &str = "application.auto_start";

/// Where the values in effect after [`SettingsManager::load`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    /// Read from the store.
    Stored,
    /// The store had nothing usable; defaults were synthesized.
    Defaults { reason: String },
}

/// A stored value that was ignored in favor of the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub path: String,
    pub reason: String,
}

/// What happened during [`SettingsManager::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub rejected: Vec<Rejection>,
    /// False only when defaults were synthesized and could not be written.
    pub persisted: bool,
}

impl LoadReport {
    /// Every stored value was accepted.
    pub fn is_clean(&self) -> bool {
        self.source == LoadSource::Stored && self.rejected.is_empty()
    }
}

/// Outcome of [`SettingsManager::reconcile_auto_start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// OS registration already matched the settings.
    InSync,
    /// OS registration was changed to match the settings.
    Corrected { enabled: bool },
    /// The settings had no entry and took over the OS registration.
    Adopted { enabled: bool },
}

pub struct SettingsManager<S: Store> {
    store: S,
    registry: Registry,
    app_name: String,
    shape_conflict: ShapeConflict,
    defaults: Settings,
    settings: Settings,
    loaded: Document,
    auto_start_present: bool,
}

impl<S: Store> SettingsManager<S> {
    /// Create a manager holding defaults. Nothing is read until [`load`](Self::load).
    pub fn new(store: S, registry: Registry, app_name: impl Into<String>) -> Self {
        let defaults = registry.default_settings();
        Self {
            store,
            registry,
            app_name: app_name.into(),
            shape_conflict: ShapeConflict::default(),
            settings: defaults.clone(),
            defaults,
            loaded: Document::new(),
            auto_start_present: false,
        }
    }

    /// How to resolve group/leaf collisions between the compiled-in defaults
    /// and [`with_default_overrides`](Self::with_default_overrides). Call it
    /// first. Saves always let registered settings win over stale stored
    /// keys.
    pub fn with_shape_conflict(mut self, policy: ShapeConflict) -> Self {
        self.shape_conflict = policy;
        self
    }

    /// Replace compiled-in defaults with values from `overrides`.
    ///
    /// Overrides are deep-merged onto the registry's default document; an
    /// override that doesn't convert or validate is ignored with a warning.
    pub fn with_default_overrides(mut self, overrides: Document) -> Self {
        let merged = deep_merge(
            self.registry.default_document(),
            overrides,
            self.shape_conflict,
        );
        let mut defaults = self.registry.default_settings();
        for d in self.registry.iter() {
            let Some(scalar) = merged.document.get_scalar(d.path) else {
                continue;
            };
            match d.accept(scalar) {
                Ok(value) => (d.write)(&mut defaults, value),
                Err(reason) => {
                    warn!(key = d.path, %reason, "ignoring default override");
                }
            }
        }
        self.settings = defaults.clone();
        self.defaults = defaults;
        self
    }

    /// Populate settings from the store.
    pub fn load(&mut self) -> LoadReport {
        self.settings = self.defaults.clone();

        let document = match self.store.load() {
            Ok(doc) => doc,
            Err(e) => return self.recover(e),
        };

        let mut rejected = Vec::new();
        for d in self.registry.iter() {
            let accepted = match document.get(d.path) {
                None => continue,
                Some(Node::Leaf(scalar)) => d.accept(scalar),
                Some(Node::Group(_)) => Err(format!("expected {}, found a table", d.kind)),
            };
            match accepted {
                Ok(value) => {
                    debug!(key = d.path, %value, "loaded setting");
                    (d.write)(&mut self.settings, value);
                }
                Err(reason) => {
                    warn!(key = d.path, %reason, "stored value rejected, using default");
                    rejected.push(Rejection {
                        name: d.name.to_string(),
                        path: d.path.to_string(),
                        reason,
                    });
                }
            }
        }

        self.auto_start_present = document.contains(self.auto_start_path());
        self.loaded = document;
        info!(location = %self.store.location(), "settings loaded");

        LoadReport {
            source: LoadSource::Stored,
            rejected,
            persisted: true,
        }
    }

    fn recover(&mut self, cause: DeskfigError) -> LoadReport {
        match &cause {
            DeskfigError::NotFound { .. } => {
                debug!(location = %self.store.location(), "no stored settings, writing defaults");
            }
            e if e.is_recoverable_load() => {
                error!(error = %e, "failed to load settings, resetting to defaults");
            }
            e => {
                error!(error = %e, "settings store failed unexpectedly, resetting to defaults");
            }
        }

        self.loaded = Document::new();
        self.auto_start_present = false;
        let persisted = self.save().is_ok();

        LoadReport {
            source: LoadSource::Defaults {
                reason: cause.to_string(),
            },
            rejected: Vec::new(),
            persisted,
        }
    }

    /// Write every setting to the store.
    ///
    /// On failure the in-memory settings are left as they are.
    pub fn save(&self) -> Result<(), DeskfigError> {
        let document = self.document();
        self.store.save(&document).map_err(|e| {
            error!(location = %self.store.location(), error = %e, "failed to save settings");
            e
        })
    }

    /// The document a save would write: the retained document with every
    /// registered setting written over it.
    pub fn document(&self) -> Document {
        let current = self.registry.document_from(&self.settings);
        deep_merge(self.loaded.clone(), current, ShapeConflict::Replace).document
    }

    /// Bring OS auto-start registration and the `auto_start` setting into
    /// agreement.
    ///
    /// A stored setting wins and the OS is forced to match it. Without a
    /// stored setting the OS registration is adopted and saved.
    pub fn reconcile_auto_start(
        &mut self,
        os: &dyn AutoStart,
    ) -> Result<Reconciliation, DeskfigError> {
        let actual = os.is_registered(&self.app_name)?;

        if !self.auto_start_present {
            self.settings.auto_start = actual;
            self.auto_start_present = true;
            debug!(enabled = actual, "adopted auto-start state from the OS");
            if let Err(e) = self.save() {
                warn!(error = %e, "adopted auto-start state was not saved");
            }
            return Ok(Reconciliation::Adopted { enabled: actual });
        }

        let configured = self.settings.auto_start;
        if configured != actual {
            warn!(
                configured,
                actual, "auto-start registration disagrees with settings, applying settings"
            );
        }
        os.apply(&self.app_name, configured)?;

        if configured == actual {
            Ok(Reconciliation::InSync)
        } else {
            Ok(Reconciliation::Corrected {
                enabled: configured,
            })
        }
    }

    /// Current value of a setting by logical name.
    pub fn get(&self, name: &str) -> Result<Value, DeskfigError> {
        let d = self.registry.describe(name)?;
        Ok((d.read)(&self.settings))
    }

    /// Set a setting by logical name. The value is converted and validated;
    /// a rejected value leaves the setting unchanged. Nothing is saved.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), DeskfigError> {
        let d = self.registry.describe(name)?;
        let accepted = d
            .accept_value(value)
            .map_err(|reason| DeskfigError::InvalidValue {
                key: name.to_string(),
                reason,
            })?;
        (d.write)(&mut self.settings, accepted);
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Record the window size and save.
    pub fn save_window_size(&mut self, width: i64, height: i64) -> Result<(), DeskfigError> {
        self.settings.window_width = width;
        self.settings.window_height = height;
        self.save()
    }

    pub fn window_size(&self) -> (i64, i64) {
        (self.settings.window_width, self.settings.window_height)
    }

    /// Put every setting back to its default. Nothing is saved.
    pub fn reset_to_defaults(&mut self) {
        self.settings = self.defaults.clone();
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn auto_start_path(&self) -> &'static str {
        self.registry
            .describe("auto_start")
            .map(|d| d.path)
            .unwrap_or(AUTO_START_PATH)
    }
}
