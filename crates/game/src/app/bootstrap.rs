use std::path::PathBuf;
use std::sync::Arc;

use brawl_engine::{
    load_roster, resolve_app_paths, FighterDescriptor, LoopConfig, RosterError, Screen,
    StartupError,
};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::select::{SelectionCoordinator, SelectionError, SelectionServices};
use super::services::{LoggingAudio, LoggingMatchLauncher, TimedMusic};
use super::settings::{load_settings, settings_path, Settings};

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) screen: Box<dyn Screen>,
}

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Paths(#[from] StartupError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("no playable fighters found under {dir}")]
    EmptyRoster { dir: PathBuf },
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Brawl Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "app_paths_resolved");

    let settings_file = settings_path(&paths.settings_dir);
    let settings = load_settings(&settings_file).unwrap_or_else(|error| {
        warn!(error = %error, "settings_invalid_using_defaults");
        Settings::default()
    });

    let roster = load_roster(&paths.fighters_dir)?;
    if roster.fighters.is_empty() {
        return Err(BootstrapError::EmptyRoster {
            dir: paths.fighters_dir,
        });
    }
    info!(
        fighters = roster.fighters.len(),
        skipped = roster.failures.len(),
        "roster_loaded"
    );
    let fighters: Arc<[FighterDescriptor]> = roster.fighters.into();

    let services = SelectionServices {
        audio: Box::new(LoggingAudio),
        music: Box::new(TimedMusic::default()),
        launcher: Box::new(LoggingMatchLauncher::default()),
    };
    let screen = SelectionCoordinator::new(fighters, &settings, services)?;

    let config = LoopConfig {
        window_title: settings.window.title.clone(),
        window_width: settings.window.width,
        window_height: settings.window.height,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        screen: Box::new(screen),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
