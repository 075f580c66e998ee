use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::utils;

pub const DATABASE_ENV: &str = "EVENT_BOOKING_DATABASE";
pub const TIMEZONE_ENV: &str = "EVENT_BOOKING_TZ";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("config mutex poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: Option<PathBuf>,
    /// IANA zone used for dates given without an offset.
    pub timezone: Option<String>,
    pub log_filter: Option<String>,
}

impl AppConfig {
    /// `EVENT_BOOKING_DATABASE`, then the saved path, then the data directory.
    pub fn database_path(&self) -> PathBuf {
        std::env::var_os(DATABASE_ENV)
            .map(PathBuf::from)
            .or_else(|| self.database_path.clone())
            .unwrap_or_else(utils::default_database_path)
    }

    /// `EVENT_BOOKING_TZ`, then the saved zone, then UTC.
    pub fn timezone(&self) -> Tz {
        let from_env = std::env::var(TIMEZONE_ENV).ok();
        resolve_timezone(from_env.as_deref().or(self.timezone.as_deref()))
    }
}

pub fn resolve_timezone(name: Option<&str>) -> Tz {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        None => chrono_tz::UTC,
        Some(name) => name.parse::<Tz>().unwrap_or_else(|err| {
            warn!(timezone = name, error = %err, "unknown timezone, using UTC");
            chrono_tz::UTC
        }),
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: Mutex<AppConfig>,
}

impl ConfigStore {
    pub fn load() -> Self {
        Self::load_from(utils::config_path())
    }

    pub fn load_from(path: PathBuf) -> Self {
        let data = read_config(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "ignoring unreadable config");
            AppConfig::default()
        });
        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<AppConfig, ConfigError> {
        self.data
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| ConfigError::Poisoned)
    }

    pub fn update<F>(&self, transform: F) -> Result<AppConfig, ConfigError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.data.lock().map_err(|_| ConfigError::Poisoned)?;
        transform(&mut guard);
        write_config(&self.path, &guard)?;
        Ok(guard.clone())
    }
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_config(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    utils::ensure_parent(path);
    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents)?;
    Ok(())
}
