use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskfigError {
    #[error("No settings document at {location}")]
    NotFound { location: String },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Invalid key path '{0}'")]
    InvalidKeyPath(String),

    #[error("Invalid settings registry: {0}")]
    InvalidRegistry(String),

    #[error("Auto-start registration failed for '{app}': {reason}")]
    AutoStart { app: String, reason: String },

    #[error("An update check is already in progress")]
    CheckInProgress,

    #[error("Update check failed: {0}")]
    UpdateCheck(String),

    #[error("System configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("App name is required: call .app_name() or .app_info() on the builder")]
    AppNameRequired,

    #[error("Could not determine a configuration directory for '{0}'")]
    NoConfigDir(String),
}

impl DeskfigError {
    /// Load failures the facade repairs by synthesizing defaults.
    pub fn is_recoverable_load(&self) -> bool {
        matches!(
            self,
            DeskfigError::NotFound { .. } | DeskfigError::Parse { .. } | DeskfigError::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_formats_correctly() {
        let err = DeskfigError::InvalidValue {
            key: "application.theme".into(),
            reason: "'blue' is not accepted".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("application.theme"));
        assert!(msg.contains("blue"));
    }

    #[test]
    fn unknown_setting_formats() {
        let err = DeskfigError::UnknownSetting("colour".into());
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn app_name_required_formats() {
        let err = DeskfigError::AppNameRequired;
        assert!(err.to_string().contains("app_name"));
    }

    #[test]
    fn load_failures_are_recoverable() {
        let not_found = DeskfigError::NotFound {
            location: "/tmp/config.toml".into(),
        };
        assert!(not_found.is_recoverable_load());
        assert!(!DeskfigError::UnknownSetting("x".into()).is_recoverable_load());
        assert!(!DeskfigError::CheckInProgress.is_recoverable_load());
    }
}
