use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::calendar::offset_from_minutes;
use crate::error::ConfigError;
use crate::source::DEFAULT_VALUE_FIELD;
use crate::widgets::{Widget, WidgetSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SourceSettings {
    /// The bundled SQLite store. A relative `path` resolves against the data directory.
    Sqlite {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// A JSON document export, re-read on every refresh.
    JsonFile { path: PathBuf },
}

fn default_value_field() -> String {
    DEFAULT_VALUE_FIELD.into()
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings::Sqlite { path: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    /// Minutes east of UTC used for every calendar computation.
    pub utc_offset_minutes: i32,
    pub refresh_interval_secs: u64,
    /// Document field holding the numeric value.
    pub value_field: String,
    pub source: SourceSettings,
    pub widgets: Vec<WidgetSettings>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            refresh_interval_secs: 600,
            value_field: default_value_field(),
            source: SourceSettings::default(),
            widgets: vec![
                WidgetSettings::daily_month_trends(),
                WidgetSettings::daily_weekend_trends(),
            ],
        }
    }
}

impl DashboardSettings {
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        offset_from_minutes(self.utc_offset_minutes)
    }

    pub fn refresh_interval(&self) -> Result<Duration, ConfigError> {
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::ZeroRefreshInterval);
        }
        Ok(Duration::from_secs(self.refresh_interval_secs))
    }

    /// Validates and builds every widget. The first bad definition aborts.
    pub fn build_widgets(&self) -> Result<Vec<Widget>, ConfigError> {
        let offset = self.utc_offset()?;
        let mut seen = HashSet::new();
        self.widgets
            .iter()
            .map(|settings| {
                if !seen.insert(settings.name.as_str()) {
                    return Err(ConfigError::DuplicateWidget(settings.name.clone()));
                }
                Widget::from_settings(settings, offset)
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.refresh_interval()?;
        self.build_widgets().map(|_| ())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DashboardSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`, writing defaults there first if it does not
    /// exist. Unparsable or invalid settings are an error.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            let defaults = DashboardSettings::default();
            persist(&path, &defaults)?;
            defaults
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dashboard(&self) -> DashboardSettings {
        self.read().clone()
    }

    pub fn update_dashboard(&self, settings: DashboardSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        persist(&self.path, &settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: DashboardSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        *self.write() = data;
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, DashboardSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, DashboardSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn persist(path: &Path, data: &DashboardSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create settings directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(data)?;
    fs::write(path, serialized)
        .with_context(|| format!("Failed to write settings to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::new(path.clone()).unwrap();
        assert!(path.exists());
        assert_eq!(store.dashboard(), DashboardSettings::default());
        assert_eq!(store.dashboard().build_widgets().unwrap().len(), 2);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"utcOffsetMinutes": -300}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().dashboard();
        assert_eq!(settings.utc_offset_minutes, -300);
        assert_eq!(settings.refresh_interval_secs, 600);
        assert_eq!(settings.source, SourceSettings::Sqlite { path: None });
        assert_eq!(settings.utc_offset().unwrap().local_minus_utc(), -300 * 60);
    }

    #[test]
    fn unknown_window_kind_fails_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"widgets": [{"name": "w", "title": "W", "window": "year", "metric": "count"}]}"#,
        )
        .unwrap();

        let err = SettingsStore::new(path).err().unwrap();
        let config = err.downcast_ref::<ConfigError>().unwrap();
        assert_eq!(config, &ConfigError::UnknownWindowKind("year".into()));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(SettingsStore::new(path).is_err());
    }

    #[test]
    fn duplicate_widget_names_are_rejected() {
        let settings = DashboardSettings {
            widgets: vec![
                WidgetSettings::daily_month_trends(),
                WidgetSettings::daily_month_trends(),
            ],
            ..DashboardSettings::default()
        };
        assert_eq!(
            settings.build_widgets(),
            Err(ConfigError::DuplicateWidget("daily-month-trends".into()))
        );
    }

    #[test]
    fn zero_interval_is_rejected() {
        let settings = DashboardSettings {
            refresh_interval_secs: 0,
            ..DashboardSettings::default()
        };
        assert_eq!(settings.validate(), Err(ConfigError::ZeroRefreshInterval));
    }

    #[test]
    fn json_file_source_round_trips() {
        let json = r#"{"source": {"kind": "jsonFile", "path": "tweets.json"}}"#;
        let settings: DashboardSettings = serde_json::from_str(json).unwrap();
        assert_eq!(
            settings.source,
            SourceSettings::JsonFile {
                path: PathBuf::from("tweets.json"),
            }
        );
        assert_eq!(settings.value_field, DEFAULT_VALUE_FIELD);
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut updated = store.dashboard();
        updated.refresh_interval_secs = 60;
        store.update_dashboard(updated.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.dashboard(), updated);

        let mut invalid = updated;
        invalid.utc_offset_minutes = 100_000;
        assert!(store.update_dashboard(invalid).is_err());
        store.reload().unwrap();
        assert_eq!(store.dashboard().refresh_interval_secs, 60);
    }
}
