//! Update check contract.
//!
//! The crate doesn't talk to the network. A host supplies a
//! [`ReleaseSource`] that fetches the latest release; [`UpdateChecker`]
//! compares it with the running version and hands back an [`UpdateResult`],
//! either synchronously or on a background thread.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use tracing::{debug, info, warn};

use crate::error::DeskfigError;

/// Compare dotted numeric versions. A leading `v` is ignored, segments that
/// aren't numbers count as zero, and missing segments count as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        strip_prefix(v)
            .split('.')
            .map(|seg| seg.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    Ordering::Equal
}

fn strip_prefix(version: &str) -> &str {
    let v = version.trim();
    v.strip_prefix(['v', 'V']).unwrap_or(v)
}

/// Why a check was started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckMode {
    /// Startup check; the UI shows at most a tray note.
    Silent,
    /// User-requested check; the UI reports the outcome in a dialog.
    #[default]
    Interactive,
}

/// The latest published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    /// Release metadata as JSON, passed through to the UI.
    pub metadata_json: String,
}

/// Fetches the latest release. Implemented by the host.
pub trait ReleaseSource: Send + Sync {
    fn latest_release(&self) -> Result<Release, DeskfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub has_update: bool,
    pub current_version: String,
    pub latest_version: Option<String>,
    pub update_info: Option<String>,
    pub error: Option<String>,
    pub mode: CheckMode,
}

impl UpdateResult {
    /// Where to send the user for the new release: the metadata's
    /// `download_url`, then its `url`, then `fallback`.
    pub fn download_url(&self, fallback: &str) -> String {
        let Some(info) = &self.update_info else {
            return fallback.to_string();
        };
        let Ok(json) = serde_json::from_str::<serde_json::Value>(info) else {
            return fallback.to_string();
        };

        ["download_url", "url"]
            .iter()
            .find_map(|key| json.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or(fallback)
            .to_string()
    }

    /// A silent check found a release worth a tray note.
    pub fn should_notify(&self, show_notifications: bool) -> bool {
        self.mode == CheckMode::Silent && self.has_update && show_notifications
    }
}

/// Clears the in-flight flag when the check ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, AtomicOrdering::Release);
    }
}

pub struct UpdateChecker {
    current_version: String,
    source: Arc<dyn ReleaseSource>,
    in_flight: Arc<AtomicBool>,
}

impl UpdateChecker {
    pub fn new(current_version: impl Into<String>, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            current_version: current_version.into(),
            source,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// A background check is running.
    pub fn is_checking(&self) -> bool {
        self.in_flight.load(AtomicOrdering::Acquire)
    }

    /// Check synchronously. Source failures land in `UpdateResult::error`.
    pub fn check(&self, mode: CheckMode) -> UpdateResult {
        run_check(&self.current_version, self.source.as_ref(), mode)
    }

    /// Check on a background thread and pass the result to `on_done`.
    ///
    /// Only one background check runs at a time; a second request while one
    /// is running fails with `CheckInProgress`.
    pub fn check_async<F>(&self, mode: CheckMode, on_done: F) -> Result<(), DeskfigError>
    where
        F: FnOnce(UpdateResult) + Send + 'static,
    {
        if self
            .in_flight
            .compare_exchange(false, true, AtomicOrdering::AcqRel, AtomicOrdering::Acquire)
            .is_err()
        {
            return Err(DeskfigError::CheckInProgress);
        }
        let guard = InFlight(Arc::clone(&self.in_flight));

        let current = self.current_version.clone();
        let source = Arc::clone(&self.source);
        std::thread::Builder::new()
            .name("update-check".into())
            .spawn(move || {
                let result = run_check(&current, source.as_ref(), mode);
                drop(guard);
                on_done(result);
            })
            .map_err(|e| {
                // The closure (and the guard with it) was dropped, clearing the flag.
                DeskfigError::UpdateCheck(format!("cannot start update thread: {e}"))
            })?;
        Ok(())
    }
}

fn run_check(current: &str, source: &dyn ReleaseSource, mode: CheckMode) -> UpdateResult {
    debug!(current, ?mode, "checking for updates");
    match source.latest_release() {
        Ok(release) => {
            let latest = strip_prefix(&release.version).to_string();
            let has_update = compare_versions(&latest, current) == Ordering::Greater;
            if has_update {
                info!(current, latest = %latest, "newer release available");
            }
            UpdateResult {
                has_update,
                current_version: current.to_string(),
                latest_version: Some(latest),
                update_info: Some(release.metadata_json),
                error: None,
                mode,
            }
        }
        Err(e) => {
            warn!(error = %e, "update check failed");
            UpdateResult {
                has_update: false,
                current_version: current.to_string(),
                latest_version: None,
                update_info: None,
                error: Some(e.to_string()),
                mode,
            }
        }
    }
}
