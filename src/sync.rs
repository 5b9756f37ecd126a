//! Keeps UI surfaces and the settings facade in step.
//!
//! A setting can be shown in more than one place (a checkbox on the main
//! panel and a checkable tray action, say). When one of them changes it,
//! [`SettingsSync::change`] updates the facade, mirrors the new value to the
//! other surfaces without echoing it back to the one that produced it,
//! applies side effects, and saves.

use tracing::{debug, warn};

use crate::autostart::AutoStart;
use crate::error::DeskfigError;
use crate::logging::LogHandle;
use crate::manager::SettingsManager;
use crate::schema::Value;
use crate::store::Store;

/// Something that displays setting values: a checkbox, a menu action.
pub trait Surface {
    /// Stable identifier, passed back as the origin of changes.
    fn id(&self) -> &str;

    /// Display `value` for the setting `name` without reporting it as a
    /// user change.
    fn show(&mut self, name: &str, value: &Value);
}

/// Result of a successful [`SettingsSync::change`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// False when the change is held in memory only.
    pub saved: bool,
}

pub struct SettingsSync<S: Store> {
    manager: SettingsManager<S>,
    surfaces: Vec<Box<dyn Surface>>,
    auto_start: Box<dyn AutoStart>,
    log: Option<LogHandle>,
}

impl<S: Store> SettingsSync<S> {
    pub fn new(manager: SettingsManager<S>, auto_start: Box<dyn AutoStart>) -> Self {
        Self {
            manager,
            surfaces: Vec::new(),
            auto_start,
            log: None,
        }
    }

    /// Route `debug_mode` changes to this logging handle.
    pub fn with_log_handle(mut self, handle: LogHandle) -> Self {
        self.log = Some(handle);
        self
    }

    pub fn with_surface(mut self, surface: impl Surface + 'static) -> Self {
        self.add_surface(Box::new(surface));
        self
    }

    pub fn add_surface(&mut self, surface: Box<dyn Surface>) {
        self.surfaces.push(surface);
    }

    /// Show every setting on every surface.
    pub fn initialize(&mut self) {
        let settings = self.manager.settings();
        for d in self.manager.registry().iter() {
            let value = (d.read)(settings);
            for surface in &mut self.surfaces {
                surface.show(d.name, &value);
            }
        }
    }

    /// Apply a change made on the surface `origin`.
    ///
    /// A rejected value is re-shown everywhere with the value still held and
    /// the error returned. A failed save is logged and reported through
    /// [`ChangeOutcome::saved`]; the change itself stands.
    pub fn change(
        &mut self,
        origin: &str,
        name: &str,
        value: Value,
    ) -> Result<ChangeOutcome, DeskfigError> {
        if let Err(e) = self.manager.set(name, value) {
            if let Ok(held) = self.manager.get(name) {
                for surface in &mut self.surfaces {
                    surface.show(name, &held);
                }
            }
            return Err(e);
        }

        let value = self.manager.get(name)?;
        for surface in self.surfaces.iter_mut().filter(|s| s.id() != origin) {
            surface.show(name, &value);
        }
        debug!(setting = name, %value, origin, "setting changed");

        match name {
            "auto_start" => {
                let enabled = self.manager.settings().auto_start;
                if let Err(e) = self.auto_start.apply(self.manager.app_name(), enabled) {
                    warn!(error = %e, enabled, "failed to update auto-start registration");
                }
            }
            "debug_mode" => {
                if let Some(log) = &self.log
                    && let Err(e) = log.set_debug(self.manager.settings().debug_mode)
                {
                    warn!(error = %e, "failed to switch log level");
                }
            }
            _ => {}
        }

        let saved = match self.manager.save() {
            Ok(()) => true,
            Err(e) => {
                warn!(setting = name, error = %e, "setting changed but not saved");
                false
            }
        };
        Ok(ChangeOutcome { saved })
    }

    pub fn manager(&self) -> &SettingsManager<S> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SettingsManager<S> {
        &mut self.manager
    }

    pub fn log_handle(&self) -> Option<&LogHandle> {
        self.log.as_ref()
    }

    pub fn into_manager(self) -> SettingsManager<S> {
        self.manager
    }
}
