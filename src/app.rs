//! Application identity, system configuration and on-disk locations.
//!
//! [`AppInfo`] names the application and its release feed. [`SystemConfig`]
//! holds deployment knobs that aren't user settings (where the settings file
//! lives, the network timeout the host's update transport should use). It is
//! loaded through confique from defaults, an optional TOML file and
//! `DESKFIG_*` environment variables.

use std::path::{Path, PathBuf};

use confique::Config;
use serde::{Deserialize, Serialize};

use crate::error::DeskfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    /// GitHub repository as `owner/name`.
    pub github_repo: Option<String>,
}

impl AppInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: String::new(),
            description: String::new(),
            github_repo: None,
        }
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn github_repo(mut self, repo: impl Into<String>) -> Self {
        self.github_repo = Some(repo.into());
        self
    }

    /// Human-facing releases page.
    pub fn releases_url(&self) -> Option<String> {
        let repo = self.github_repo.as_deref()?;
        Some(format!("https://github.com/{repo}/releases"))
    }

    /// API endpoint describing the latest release.
    pub fn api_url(&self) -> Option<String> {
        let repo = self.github_repo.as_deref()?;
        Some(format!("https://api.github.com/repos/{repo}/releases/latest"))
    }
}

#[derive(Config, Debug, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    /// Settings directory under the home directory. Empty uses the platform
    /// config directory.
    #[config(default = "", env = "DESKFIG_CONFIG_DIR_NAME")]
    pub config_dir_name: String,

    /// Log directory, relative to the settings directory.
    #[config(default = "logs", env = "DESKFIG_LOG_DIR_NAME")]
    pub log_dir_name: String,

    /// Settings file name.
    #[config(default = "config.toml", env = "DESKFIG_CONFIG_FILE_NAME")]
    pub config_file_name: String,

    /// Timeout for update checks, in seconds.
    #[config(default = 10, env = "DESKFIG_NETWORK_TIMEOUT_SECS")]
    pub network_timeout_secs: u64,

    /// Whether the application must run elevated.
    #[config(default = false, env = "DESKFIG_REQUIRE_ADMIN_PRIVILEGES")]
    pub require_admin_privileges: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            config_dir_name: String::new(),
            log_dir_name: "logs".to_string(),
            config_file_name: "config.toml".to_string(),
            network_timeout_secs: 10,
            require_admin_privileges: false,
        }
    }
}

impl SystemConfig {
    /// Defaults overlaid with `DESKFIG_*` environment variables.
    pub fn load() -> Result<Self, DeskfigError> {
        Ok(Self::builder().env().load()?)
    }

    /// Like [`load`](Self::load), with `path` between defaults and the
    /// environment. A missing file is skipped.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, DeskfigError> {
        Ok(Self::builder().env().file(path.as_ref()).load()?)
    }

    /// Commented TOML listing every field and its default.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}

/// Where the settings directory lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Platform config directory (XDG on Linux, Application Support on macOS,
    /// AppData on Windows).
    Platform,
    /// A subdirectory under the user's home directory.
    Home(String),
    /// An explicit directory.
    Path(PathBuf),
}

impl ConfigLocation {
    pub fn from_system(system: &SystemConfig) -> Self {
        let name = system.config_dir_name.trim();
        if name.is_empty() {
            ConfigLocation::Platform
        } else {
            ConfigLocation::Home(name.to_string())
        }
    }

    pub fn resolve(&self, app_name: &str) -> Result<PathBuf, DeskfigError> {
        let resolved = match self {
            ConfigLocation::Platform => directories::ProjectDirs::from("", "", app_name)
                .map(|proj| proj.config_dir().to_path_buf()),
            ConfigLocation::Home(subdir) => {
                directories::UserDirs::new().map(|user| user.home_dir().join(subdir))
            }
            ConfigLocation::Path(p) => Some(p.clone()),
        };
        resolved.ok_or_else(|| DeskfigError::NoConfigDir(app_name.to_string()))
    }
}

/// Concrete paths for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn resolve(
        location: &ConfigLocation,
        app_name: &str,
        system: &SystemConfig,
    ) -> Result<Self, DeskfigError> {
        let config_dir = location.resolve(app_name)?;
        Ok(Self {
            config_file: config_dir.join(&system.config_file_name),
            log_dir: config_dir.join(&system.log_dir_name),
            config_dir,
        })
    }

    /// Create the settings and log directories.
    pub fn ensure_dirs(&self) -> Result<(), DeskfigError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|e| DeskfigError::Io {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn release_urls_derive_from_repo() {
        let info = AppInfo::new("Tray", "1.0.0").github_repo("owner/tray");
        assert_eq!(
            info.releases_url().as_deref(),
            Some("https://github.com/owner/tray/releases")
        );
        assert_eq!(
            info.api_url().as_deref(),
            Some("https://api.github.com/repos/owner/tray/releases/latest")
        );
        assert!(AppInfo::new("Tray", "1.0.0").releases_url().is_none());
    }

    #[test]
    fn system_defaults_match_builder() {
        let loaded = SystemConfig::builder().load().unwrap();
        assert_eq!(loaded, SystemConfig::default());
    }

    #[test]
    fn system_config_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("system.toml");
        fs::write(&path, "config_dir_name = \".tray\"\nnetwork_timeout_secs = 30\n").unwrap();

        let config = SystemConfig::builder().file(&path).load().unwrap();
        assert_eq!(config.config_dir_name, ".tray");
        assert_eq!(config.network_timeout_secs, 30);
        assert_eq!(config.log_dir_name, "logs");
    }

    #[test]
    fn system_config_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = SystemConfig::builder()
            .file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(config, SystemConfig::default());
    }

    #[test]
    fn system_template_lists_fields() {
        let template = SystemConfig::template();
        assert!(template.contains("config_file_name"));
        assert!(template.contains("network_timeout_secs"));
    }

    #[test]
    fn location_from_system_config() {
        assert_eq!(
            ConfigLocation::from_system(&SystemConfig::default()),
            ConfigLocation::Platform
        );
        let system = SystemConfig {
            config_dir_name: ".tray".into(),
            ..SystemConfig::default()
        };
        assert_eq!(
            ConfigLocation::from_system(&system),
            ConfigLocation::Home(".tray".into())
        );
    }

    #[test]
    fn paths_join_file_and_log_names() {
        let dir = TempDir::new().unwrap();
        let location = ConfigLocation::Path(dir.path().to_path_buf());
        let paths = AppPaths::resolve(&location, "tray", &SystemConfig::default()).unwrap();
        assert_eq!(paths.config_file, dir.path().join("config.toml"));
        assert_eq!(paths.log_dir, dir.path().join("logs"));

        paths.ensure_dirs().unwrap();
        assert!(paths.log_dir.is_dir());
    }

    #[test]
    fn platform_location_ends_in_app_dir() {
        if let Ok(dir) = ConfigLocation::Platform.resolve("deskfig-test-app") {
            assert!(dir.to_string_lossy().contains("deskfig-test-app"));
        }
    }
}
