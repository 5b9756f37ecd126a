//! Clap adapter for settings operations.
//!
//! Compiled only with the `clap` Cargo feature (on by default). Embed
//! [`SettingsArgs`] in an application's clap derive to get
//! `settings list|get|set|path|gen` subcommands; [`SettingsArgs::into_action`]
//! converts the parsed arguments into a [`SettingsAction`] that
//! [`SettingsManager::handle`](crate::SettingsManager::handle) runs.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::ops::SettingsAction;

/// Clap-derived args for the `settings` subcommand group.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Settings(SettingsArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: Option<SettingsSubcommand>,
}

/// Available settings subcommands.
#[derive(Debug, Subcommand)]
pub enum SettingsSubcommand {
    /// Show every setting and its current value.
    List,
    /// Show the value and description of one setting.
    Get {
        /// Setting name (e.g. "theme") or key path (e.g. "application.theme").
        key: String,
    },
    /// Change a setting and save it.
    Set {
        /// Setting name or key path.
        key: String,
        /// New value.
        value: String,
    },
    /// Print where settings are stored.
    Path,
    /// Generate a commented settings file holding the defaults.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl SettingsArgs {
    /// Convert clap-parsed args into a framework-agnostic `SettingsAction`.
    ///
    /// Bare `settings` and `settings list` both list.
    pub fn into_action(self) -> SettingsAction {
        match self.action {
            None | Some(SettingsSubcommand::List) => SettingsAction::List,
            Some(SettingsSubcommand::Get { key }) => SettingsAction::Get { key },
            Some(SettingsSubcommand::Set { key, value }) => SettingsAction::Set { key, value },
            Some(SettingsSubcommand::Path) => SettingsAction::Path,
            Some(SettingsSubcommand::Gen { output }) => SettingsAction::Gen { output },
        }
    }
}
