//! Persisted search box preferences

use crate::{error::SearchResult, search::LocationOptIn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Environment variable overriding the preferences file location
pub const SETTINGS_ENV: &str = "SEARCHBOX_SETTINGS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Whether remote suggestions are fetched while typing
    pub show_web_suggestions: bool,
    /// Mirror of the system location opt-in
    pub location_opt_in: LocationOptIn,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_web_suggestions: true,
            location_opt_in: LocationOptIn::Unset,
        }
    }
}

/// JSON file holding [`Preferences`]
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$SEARCHBOX_SETTINGS`, or `searchbox/settings.json` under the
    /// XDG config directory (`~/.config` when unset).
    pub fn default_location() -> Self {
        if let Ok(path) = env::var(SETTINGS_ENV) {
            if !path.is_empty() {
                return Self::new(path);
            }
        }

        let config_dir = env::var("XDG_CONFIG_HOME")
            .ok()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::var("HOME").ok().map(|home| Path::new(&home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::new(config_dir.join("searchbox").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current preferences; defaults if nothing has been saved yet
    pub fn load(&self) -> SearchResult<Preferences> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, prefs: &Preferences) -> SearchResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(prefs)?)?;
        log::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }

    pub fn set_show_web_suggestions(&self, enabled: bool) -> SearchResult<Preferences> {
        self.update(|prefs| prefs.show_web_suggestions = enabled)
    }

    pub fn set_location_opt_in(&self, opt_in: LocationOptIn) -> SearchResult<Preferences> {
        self.update(|prefs| prefs.location_opt_in = opt_in)
    }

    fn update(&self, change: impl FnOnce(&mut Preferences)) -> SearchResult<Preferences> {
        let mut prefs = self.load()?;
        change(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}
