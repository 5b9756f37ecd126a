//! OS auto-start registration.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::DeskfigError;

/// Launch-at-login registration for an application.
pub trait AutoStart {
    fn is_registered(&self, app: &str) -> Result<bool, DeskfigError>;
    fn register(&self, app: &str) -> Result<(), DeskfigError>;
    fn unregister(&self, app: &str) -> Result<(), DeskfigError>;

    /// Register or unregister to match `enabled`.
    fn apply(&self, app: &str, enabled: bool) -> Result<(), DeskfigError> {
        if enabled {
            self.register(app)
        } else {
            self.unregister(app)
        }
    }
}

/// Registration through the platform's login items (registry run key,
/// launch agent or XDG autostart entry), pointing at the running executable.
#[cfg(feature = "system-autostart")]
#[derive(Debug, Clone, Default)]
pub struct SystemAutoStart {
    args: Vec<String>,
}

#[cfg(feature = "system-autostart")]
impl SystemAutoStart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arguments passed to the executable when launched at login.
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn launcher(&self, app: &str) -> Result<auto_launch::AutoLaunch, DeskfigError> {
        let exe = std::env::current_exe().map_err(|e| DeskfigError::AutoStart {
            app: app.to_string(),
            reason: format!("cannot locate executable: {e}"),
        })?;
        let exe = exe.to_string_lossy();
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();

        auto_launch::AutoLaunchBuilder::new()
            .set_app_name(app)
            .set_app_path(&exe)
            .set_args(args.as_slice())
            .build()
            .map_err(|e| auto_start_error(app, e))
    }
}

#[cfg(feature = "system-autostart")]
fn auto_start_error(app: &str, e: auto_launch::Error) -> DeskfigError {
    DeskfigError::AutoStart {
        app: app.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(feature = "system-autostart")]
impl AutoStart for SystemAutoStart {
    fn is_registered(&self, app: &str) -> Result<bool, DeskfigError> {
        self.launcher(app)?
            .is_enabled()
            .map_err(|e| auto_start_error(app, e))
    }

    fn register(&self, app: &str) -> Result<(), DeskfigError> {
        self.launcher(app)?
            .enable()
            .map_err(|e| auto_start_error(app, e))
    }

    fn unregister(&self, app: &str) -> Result<(), DeskfigError> {
        let launcher = self.launcher(app)?;
        // Removing an entry that was never written fails on some platforms.
        if !launcher.is_enabled().map_err(|e| auto_start_error(app, e))? {
            return Ok(());
        }
        launcher.disable().map_err(|e| auto_start_error(app, e))
    }
}

/// A call made against [`MemoryAutoStart`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoStartCall {
    Query(String),
    Register(String),
    Unregister(String),
}

#[derive(Debug, Default)]
struct MemoryAutoStartState {
    registered: HashSet<String>,
    calls: Vec<AutoStartCall>,
    failing: bool,
}

/// In-memory registration that records every call. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAutoStart {
    state: Arc<Mutex<MemoryAutoStartState>>,
}

impl MemoryAutoStart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `app` already registered.
    pub fn registered(app: &str) -> Self {
        let os = Self::default();
        os.state().registered.insert(app.to_string());
        os
    }

    /// Make every following call fail.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn is_set(&self, app: &str) -> bool {
        self.state().registered.contains(app)
    }

    pub fn calls(&self) -> Vec<AutoStartCall> {
        self.state().calls.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryAutoStartState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: AutoStartCall) -> Result<MutexGuard<'_, MemoryAutoStartState>, DeskfigError> {
        let mut state = self.state();
        if state.failing {
            let app = match &call {
                AutoStartCall::Query(a) | AutoStartCall::Register(a) | AutoStartCall::Unregister(a) => {
                    a.clone()
                }
            };
            return Err(DeskfigError::AutoStart {
                app,
                reason: "registration unavailable".to_string(),
            });
        }
        state.calls.push(call);
        Ok(state)
    }
}

impl AutoStart for MemoryAutoStart {
    fn is_registered(&self, app: &str) -> Result<bool, DeskfigError> {
        let state = self.record(AutoStartCall::Query(app.to_string()))?;
        Ok(state.registered.contains(app))
    }

    fn register(&self, app: &str) -> Result<(), DeskfigError> {
        let mut state = self.record(AutoStartCall::Register(app.to_string()))?;
        state.registered.insert(app.to_string());
        Ok(())
    }

    fn unregister(&self, app: &str) -> Result<(), DeskfigError> {
        let mut state = self.record(AutoStartCall::Unregister(app.to_string()))?;
        state.registered.remove(app);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_register_and_unregister() {
        let os = MemoryAutoStart::new();
        assert!(!os.is_registered("app").unwrap());
        os.register("app").unwrap();
        assert!(os.is_registered("app").unwrap());
        os.unregister("app").unwrap();
        assert!(!os.is_set("app"));
    }

    #[test]
    fn apply_dispatches_on_flag() {
        let os = MemoryAutoStart::new();
        os.apply("app", true).unwrap();
        os.apply("app", false).unwrap();
        assert_eq!(
            os.calls(),
            vec![
                AutoStartCall::Register("app".into()),
                AutoStartCall::Unregister("app".into()),
            ]
        );
    }

    #[test]
    fn failing_calls_report_app() {
        let os = MemoryAutoStart::registered("app");
        os.set_failing(true);
        match os.unregister("app") {
            Err(DeskfigError::AutoStart { app, .. }) => assert_eq!(app, "app"),
            other => panic!("Expected AutoStart error, got {other:?}"),
        }
        assert!(os.is_set("app"));
        assert!(os.calls().is_empty());
    }
}
