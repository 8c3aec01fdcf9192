//! Settings file: backend location, platform fee schedules, logging.
//!
//! Fee rates are validated here, once, so nothing downstream has to guard
//! against an undefined breakeven.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::domain::{FeeScheduleError, PlatformFeeSchedule};
use crate::util::logging::LoggingConfig;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "TicketValueScanner";
const APP_NAME: &str = "TicketValueScanner";

/// Overrides the settings location, mostly for scripted runs.
pub const SETTINGS_PATH_ENV: &str = "TICKET_SCANNER_SETTINGS";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/api/";
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub name: String,
    pub fee_rate: f64,
}

/// On-disk shape of the settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<PlatformEntry>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            platforms: default_platforms(),
            logging: LoggingConfig::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_platforms() -> Vec<PlatformEntry> {
    vec![
        PlatformEntry {
            name: "Vivid".to_string(),
            fee_rate: 0.10,
        },
        PlatformEntry {
            name: "StubHub".to_string(),
            fee_rate: 0.15,
        },
    ]
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

/// Validated settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub platforms: Vec<PlatformFeeSchedule>,
    pub logging: LoggingConfig,
    pub cache_ttl: Duration,
}

impl Settings {
    pub fn from_file(file: SettingsFile) -> Result<Self, SettingsError> {
        if file.platforms.is_empty() {
            return Err(SettingsError::NoPlatforms);
        }

        let mut seen = HashSet::new();
        let mut platforms = Vec::with_capacity(file.platforms.len());
        for entry in file.platforms {
            if !seen.insert(entry.name.to_lowercase()) {
                return Err(SettingsError::DuplicatePlatform(entry.name));
            }
            platforms.push(PlatformFeeSchedule::new(entry.name, entry.fee_rate)?);
        }

        Ok(Self {
            backend_url: file.backend_url,
            platforms,
            logging: file.logging,
            cache_ttl: Duration::from_secs(file.cache_ttl_secs),
        })
    }

    pub fn to_file(&self) -> SettingsFile {
        SettingsFile {
            backend_url: self.backend_url.clone(),
            platforms: self
                .platforms
                .iter()
                .map(|schedule| PlatformEntry {
                    name: schedule.name().to_string(),
                    fee_rate: schedule.fee_rate(),
                })
                .collect(),
            logging: self.logging.clone(),
            cache_ttl_secs: self.cache_ttl.as_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error("no platforms configured")]
    NoPlatforms,
    #[error("platform {0} is configured more than once")]
    DuplicatePlatform(String),
    #[error(transparent)]
    FeeSchedule(#[from] FeeScheduleError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}

pub fn settings_file() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

/// Loads settings from the default location; a missing file yields defaults.
pub fn load_settings() -> Result<Settings, SettingsError> {
    let path = settings_file().ok_or(SettingsError::StorageUnavailable)?;
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no settings file, using defaults");
        return Settings::from_file(SettingsFile::default());
    }
    let data = fs::read_to_string(path)?;
    let file: SettingsFile = serde_json::from_str(&data)?;
    let settings = Settings::from_file(file)?;
    tracing::debug!(
        path = %path.display(),
        platforms = settings.platforms.len(),
        "loaded settings"
    );
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<(), SettingsError> {
    let path = settings_file().ok_or(SettingsError::StorageUnavailable)?;
    save_settings_to(&path, settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(&settings.to_file())?;
    fs::write(path, json)?;
    tracing::info!(path = %path.display(), "saved settings");
    Ok(())
}
