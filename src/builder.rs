use crate::app::{AppInfo, AppPaths, ConfigLocation, SystemConfig};
use crate::document::Document;
use crate::error::DeskfigError;
use crate::manager::{LoadReport, SettingsManager};
use crate::merge::ShapeConflict;
use crate::schema::Registry;
use crate::store::{FileStore, Store};

/// Entry point for building a settings manager.
pub struct Deskfig;

impl Deskfig {
    pub fn builder() -> DeskfigBuilder {
        DeskfigBuilder::new()
    }
}

/// Builder wiring app identity, file location, registry and store into a
/// [`SettingsManager`].
///
/// Only the app name is required. Everything else defaults: the builtin
/// registry, the location named by [`SystemConfig`] (the platform config
/// directory unless `config_dir_name` is set), and `config.toml`.
#[derive(Debug, Default)]
pub struct DeskfigBuilder {
    app_info: Option<AppInfo>,
    app_name: Option<String>,
    location: Option<ConfigLocation>,
    file_name: Option<String>,
    system: Option<SystemConfig>,
    default_overrides: Option<Document>,
    shape_conflict: ShapeConflict,
    registry: Option<Registry>,
}

impl DeskfigBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Set the application identity. Its name is used unless
    /// [`app_name`](Self::app_name) overrides it.
    pub fn app_info(mut self, info: AppInfo) -> Self {
        self.app_info = Some(info);
        self
    }

    /// Set the application name. It names the platform config directory and
    /// the OS auto-start entry.
    pub fn app_name(mut self, name: &str) -> Self {
        self.app_name = Some(name.to_string());
        self
    }

    /// Override where the settings directory lives.
    pub fn location(mut self, location: ConfigLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Override the settings file name (default: `SystemConfig::config_file_name`).
    pub fn file_name(mut self, name: &str) -> Self {
        self.file_name = Some(name.to_string());
        self
    }

    /// Use this system configuration instead of the defaults.
    pub fn system_config(mut self, system: SystemConfig) -> Self {
        self.system = Some(system);
        self
    }

    /// Deep-merge these values over the compiled-in defaults.
    pub fn default_overrides(mut self, overrides: Document) -> Self {
        self.default_overrides = Some(overrides);
        self
    }

    /// Set the group/leaf collision policy applied to default overrides
    /// (default: [`ShapeConflict::Replace`]).
    pub fn shape_conflict(mut self, policy: ShapeConflict) -> Self {
        self.shape_conflict = policy;
        self
    }

    /// Replace the builtin registry.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Resolve the effective app name, or error if not set.
    fn effective_app_name(&self) -> Result<&str, DeskfigError> {
        self.app_name
            .as_deref()
            .or_else(|| self.app_info.as_ref().map(|info| info.name.as_str()))
            .filter(|name| !name.trim().is_empty())
            .ok_or(DeskfigError::AppNameRequired)
    }

    fn effective_system(&self) -> SystemConfig {
        let mut system = self.system.clone().unwrap_or_default();
        if let Some(name) = &self.file_name {
            system.config_file_name = name.clone();
        }
        system
    }

    fn effective_location(&self, system: &SystemConfig) -> ConfigLocation {
        self.location
            .clone()
            .unwrap_or_else(|| ConfigLocation::from_system(system))
    }

    fn effective_registry(&self) -> Registry {
        self.registry.clone().unwrap_or_default()
    }

    /// Resolve the settings file and log directory.
    pub fn paths(&self) -> Result<AppPaths, DeskfigError> {
        let app_name = self.effective_app_name()?;
        let system = self.effective_system();
        let location = self.effective_location(&system);
        AppPaths::resolve(&location, app_name, &system)
    }

    /// Build a manager over the settings file. Nothing is read yet.
    pub fn build(self) -> Result<SettingsManager<FileStore>, DeskfigError> {
        let paths = self.paths()?;
        let store =
            FileStore::new(paths.config_file).with_template(self.effective_registry().template());
        self.build_with_store(store)
    }

    /// Build a manager over the settings file and load it.
    pub fn load(self) -> Result<(SettingsManager<FileStore>, LoadReport), DeskfigError> {
        let mut manager = self.build()?;
        let report = manager.load();
        Ok((manager, report))
    }

    /// Build a manager over a caller-supplied store. Nothing is read yet.
    pub fn build_with_store<S: Store>(self, store: S) -> Result<SettingsManager<S>, DeskfigError> {
        let app_name = self.effective_app_name()?.to_string();
        let registry = self.effective_registry();

        let mut manager = SettingsManager::new(store, registry, app_name)
            .with_shape_conflict(self.shape_conflict);
        if let Some(overrides) = self.default_overrides {
            manager = manager.with_default_overrides(overrides);
        }
        Ok(manager)
    }
}
