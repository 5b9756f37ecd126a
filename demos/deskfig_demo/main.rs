//! # deskfig demo application
//!
//! A headless stand-in for a tray application shell, showing how the pieces
//! of [deskfig](https://docs.rs/deskfig) fit together. Surfaces print to the
//! terminal instead of drawing widgets.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example deskfig_demo -- run
//! cargo run --example deskfig_demo -- settings list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                     | How to exercise it                                                   |
//! |-----------------------------|----------------------------------------------------------------------|
//! | First-run defaults          | `run` with no settings file writes a documented `config.toml`        |
//! | Self-healing load           | Put `theme = "blue"` under `[application]`, then `run`               |
//! | Surface mirroring           | `run --toggle close_to_tray` shows the change on the other surface   |
//! | Debug log level at runtime  | `run --toggle debug_mode`                                            |
//! | Auto-start reconciliation   | `run` reports `InSync`, `Corrected` or `Adopted`                     |
//! | Update check                | `run --latest 9.9.9`                                                 |
//! | `settings get`              | `cargo run --example deskfig_demo -- settings get theme`             |
//! | `settings set`              | `cargo run --example deskfig_demo -- settings set theme dark`        |
//! | `settings path`             | `cargo run --example deskfig_demo -- settings path`                  |
//! | `settings gen`              | `cargo run --example deskfig_demo -- settings gen`                   |

use std::sync::Arc;

use clap::{Parser, Subcommand};

use deskfig::logging::{self, LogOptions};
use deskfig::{
    AppInfo, CheckMode, Deskfig, DeskfigError, LoadSource, MemoryAutoStart, Release, ReleaseSource,
    SettingsArgs, SettingsSync, Surface, UpdateChecker, Value,
};

/// deskfig demo: a sample tray-shell for showcasing deskfig integration.
#[derive(Parser, Debug)]
#[command(name = "deskfig-demo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the shell: load settings, sync surfaces, check for updates.
    Run {
        /// Flip a boolean setting from the main panel.
        #[arg(long)]
        toggle: Option<String>,

        /// Version the fake release feed reports.
        #[arg(long, default_value = "1.0.0")]
        latest: String,
    },
    /// Inspect or change settings (list, get, set, path, gen).
    Settings(SettingsArgs),
}

fn app_info() -> AppInfo {
    AppInfo::new("deskfig-demo", "1.0.0")
        .author("deskfig")
        .description("Headless tray shell")
        .github_repo("deskfig/deskfig-demo")
}

/// Prints what a checkbox or tray action would display.
struct ConsoleSurface {
    id: String,
}

impl Surface for ConsoleSurface {
    fn id(&self) -> &str {
        &self.id
    }

    fn show(&mut self, name: &str, value: &Value) {
        println!("  [{}] {name} = {value}", self.id);
    }
}

/// Release feed with a fixed answer; a real shell would query `api_url()`.
struct StaticFeed {
    version: String,
    page: String,
}

impl ReleaseSource for StaticFeed {
    fn latest_release(&self) -> Result<Release, DeskfigError> {
        Ok(Release {
            version: self.version.clone(),
            metadata_json: serde_json::json!({ "url": self.page }).to_string(),
        })
    }
}

fn run(toggle: Option<String>, latest: String) -> Result<(), DeskfigError> {
    let builder = Deskfig::builder().app_info(app_info());
    let paths = builder.paths()?;
    let (mut manager, report) = builder.load()?;

    let log = logging::init(&LogOptions::from_settings(
        manager.settings(),
        &paths.log_dir,
        manager.app_name(),
    ))?;
    // The subscriber depends on the loaded settings, so replay what load saw.
    if let LoadSource::Defaults { reason } = &report.source {
        tracing::warn!(%reason, persisted = report.persisted, "settings reset to defaults");
    }
    for rejection in &report.rejected {
        tracing::warn!(
            key = %rejection.path,
            reason = %rejection.reason,
            "stored value rejected, using default"
        );
    }
    tracing::info!(location = %manager.location(), "settings ready");

    let os = MemoryAutoStart::new();
    let reconciliation = manager.reconcile_auto_start(&os)?;
    println!("auto-start: {reconciliation:?}");

    let check_on_start = manager.settings().check_update_on_start;
    let show_notifications = manager.settings().show_notifications;

    let mut sync = SettingsSync::new(manager, Box::new(os))
        .with_log_handle(log)
        .with_surface(ConsoleSurface { id: "panel".into() })
        .with_surface(ConsoleSurface { id: "tray".into() });

    println!("initial state:");
    sync.initialize();

    if let Some(name) = toggle {
        let current = sync.manager().get(&name)?;
        let flipped = match current {
            Value::Bool(b) => Value::Bool(!b),
            other => {
                eprintln!("{name} is not a switch (currently {other})");
                std::process::exit(1);
            }
        };
        println!("panel toggles {name}:");
        let outcome = sync.change("panel", &name, flipped)?;
        println!("saved: {}", outcome.saved);
    }

    let info = app_info();
    let releases = info.releases_url().unwrap_or_default();
    let checker = UpdateChecker::new(
        info.version.clone(),
        Arc::new(StaticFeed {
            version: latest,
            page: releases.clone(),
        }),
    );
    let mode = if check_on_start {
        CheckMode::Silent
    } else {
        CheckMode::Interactive
    };
    let result = checker.check(mode);
    if result.should_notify(show_notifications) {
        println!(
            "tray note: v{} available at {}",
            result.latest_version.as_deref().unwrap_or("?"),
            result.download_url(&releases)
        );
    } else if let Some(error) = &result.error {
        println!("update check failed: {error}");
    } else {
        println!(
            "update available: {} (current {})",
            result.has_update, result.current_version
        );
    }

    let (width, height) = sync.manager().window_size();
    sync.manager_mut().save_window_size(width, height)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run { toggle, latest } => run(toggle, latest),
        Commands::Settings(args) => Deskfig::builder()
            .app_info(app_info())
            .load()
            .and_then(|(mut manager, _)| manager.handle(args.into_action()))
            .map(|result| println!("{result}")),
    };

    if let Err(e) = outcome {
        eprintln!("deskfig-demo error:\n{e}");
        std::process::exit(1);
    }
}
