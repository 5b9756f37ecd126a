//! Typed, self-healing settings for desktop application shells.
//!
//! Deskfig is the settings core of a tray application: the list of recognized
//! settings, their persistence in a TOML file, the typed struct the app reads
//! at runtime, and the plumbing that keeps checkboxes, tray actions and OS
//! auto-start registration in step with it. Rendering, window management and
//! the network side of update checks stay with the host.
//!
//! ```ignore
//! let (mut settings, report) = Deskfig::builder()
//!     .app_info(AppInfo::new("Tray", env!("CARGO_PKG_VERSION")))
//!     .load()?;
//! settings.reconcile_auto_start(&SystemAutoStart::new())?;
//! ```
//!
//! That call resolves the platform config directory for `Tray`, reads
//! `config.toml` (writing a documented default file on first run), and hands
//! back a [`SettingsManager`] holding a fully populated [`Settings`].
//!
//! # Registry as source of truth
//!
//! Every setting is a [`Descriptor`] in a [`Registry`]: a logical name
//! (`theme`), a key path in the file (`application.theme`), a kind, a
//! compiled-in default, a one-line description and an optional validator.
//! Loading, saving, listing, `settings get|set` and template generation all
//! walk the same registry, so a setting added there shows up everywhere.
//!
//! # Loading never fails
//!
//! [`SettingsManager::load`] returns a [`LoadReport`], not a `Result`:
//!
//! - **Missing, blank, malformed or unreadable file**: every setting takes its
//!   default and the defaults are written back at once.
//! - **One bad value** (`theme = "blue"`, `width = "wide"`): that setting
//!   alone falls back to its default; the rest load normally. Rejections are
//!   logged and listed in the report.
//! - **Unknown keys**: kept in memory and written back on save, never exposed
//!   as settings. Files written by a newer version survive an older one.
//!
//! Values convert leniently where the intent is clear: `"true"` and `1` load
//! as booleans, `"14"` and `14.0` as integers.
//!
//! # Saving
//!
//! Saves are explicit. [`FileStore`] patches the existing file through
//! `toml_edit`, rewriting only values that changed, so user comments and
//! formatting survive and an unchanged save leaves the file byte-identical.
//! A failed save is returned as an error; the in-memory settings stay as
//! they are.
//!
//! # Auto-start
//!
//! [`SettingsManager::reconcile_auto_start`] resolves disagreements between
//! the stored `auto_start` setting and the OS registration. A stored value
//! wins and the OS is forced to match; with no stored value the OS state is
//! adopted. [`SystemAutoStart`] (feature `system-autostart`, on by default)
//! talks to the platform; [`MemoryAutoStart`] records calls for tests.
//!
//! # UI surfaces
//!
//! [`SettingsSync`] owns the manager and the [`Surface`]s showing settings.
//! A change from one surface is mirrored to all the others (never echoed back
//! to its origin), auto-start and log level side effects are applied, and the
//! settings are saved.
//!
//! # Update checks
//!
//! [`UpdateChecker`] compares the running version with what a host-supplied
//! [`ReleaseSource`] reports, synchronously or on a background thread, and
//! rejects a second background check while one is running.
//!
//! # Logging
//!
//! Library code logs through `tracing`. [`logging::init`] installs a console
//! layer and a rolling file layer configured from the logging settings; the
//! returned [`LogHandle`] switches debug level on and off at runtime.
//!
//! # Error handling
//!
//! All fallible operations return [`DeskfigError`]. Messages are user-facing
//! and name the file, key or builder method involved.

pub mod app;
pub mod autostart;
pub mod document;
pub mod error;
pub mod logging;
pub mod merge;
pub mod schema;
pub mod store;
pub mod sync;
pub mod update;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod manager;
mod ops;

#[cfg(test)]
mod fixtures;

pub use app::{AppInfo, AppPaths, ConfigLocation, SystemConfig};
#[cfg(feature = "system-autostart")]
pub use autostart::SystemAutoStart;
pub use autostart::{AutoStart, MemoryAutoStart};
pub use builder::{Deskfig, DeskfigBuilder};
#[cfg(feature = "clap")]
pub use cli::{SettingsArgs, SettingsSubcommand};
pub use document::{Document, Node, Scalar};
pub use error::DeskfigError;
pub use logging::{LogHandle, LogOptions};
pub use manager::{LoadReport, LoadSource, Reconciliation, Rejection, SettingsManager};
pub use merge::{Merged, ShapeConflict};
pub use ops::{ActionResult, SettingsAction};
pub use schema::{Descriptor, Registry, Settings, Theme, Value, ValueKind};
pub use store::{FileStore, MemoryStore, Store};
pub use sync::{ChangeOutcome, SettingsSync, Surface};
pub use update::{CheckMode, Release, ReleaseSource, UpdateChecker, UpdateResult};
