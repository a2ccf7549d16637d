pub mod calendar;
pub mod chart;
pub mod db;
pub mod error;
pub mod refresh;
pub mod settings;
pub mod source;
pub mod utils;
pub mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::info;

use chart::LogSink;
use db::Database;
use refresh::RefreshController;
use settings::{SettingsStore, SourceSettings};
use source::{JsonFileSource, RecordSource};

/// Initializes logging (reads RUST_LOG env var).
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

/// Runs the dashboard refresh loop until Ctrl-C.
pub async fn run(data_dir: &Path) -> Result<()> {
    info!("trendboard starting up...");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let settings = settings_store.dashboard();
    info!("Loaded settings from {}", settings_store.path().display());

    let widgets = settings.build_widgets()?;
    let interval = settings.refresh_interval()?;
    let source = open_source(data_dir, &settings.source, &settings.value_field)?;

    let mut controller = RefreshController::new();
    controller.start(source, widgets, Arc::new(LogSink), interval)?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    controller.stop().await
}

/// Loads a JSON document export into the SQLite store. Refused when the
/// settings read records from a JSON file, since `run` would never see them.
pub async fn import(data_dir: &Path, file: &Path) -> Result<usize> {
    let settings = SettingsStore::new(data_dir.join("settings.json"))?.dashboard();
    if let SourceSettings::JsonFile { path } = &settings.source {
        bail!(
            "configured source is the JSON file {}; point it at sqlite before importing",
            path.display()
        );
    }
    let db = Database::new(sqlite_path(data_dir, &settings.source))?;
    source::import_documents(&db, file, &settings.value_field).await
}

fn open_source(
    data_dir: &Path,
    settings: &SourceSettings,
    value_field: &str,
) -> Result<Arc<dyn RecordSource>> {
    match settings {
        SourceSettings::Sqlite { .. } => {
            let db = Database::new(sqlite_path(data_dir, settings))?;
            Ok(Arc::new(db))
        }
        SourceSettings::JsonFile { path } => Ok(Arc::new(JsonFileSource::new(
            data_dir.join(path),
            value_field,
        ))),
    }
}

fn sqlite_path(data_dir: &Path, settings: &SourceSettings) -> PathBuf {
    match settings {
        SourceSettings::Sqlite { path: Some(path) } => data_dir.join(path),
        _ => data_dir.join("trendboard.sqlite3"),
    }
}
