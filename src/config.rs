use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "medialist";
const SETTINGS_FILE: &str = "settings.json";
pub const CONFIG_DIR_ENV: &str = "MEDIALIST_CONFIG_DIR";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(override_dir));
    }

    let base = dirs::config_dir().context("no configuration directory for this platform")?;
    Ok(base.join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

/// Application-scoped key/value settings backed by one JSON file.
///
/// Nothing is written until [`Settings::sync`] is called.
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl Settings {
    /// Opens `path`. A missing file starts empty; so does a file that is not
    /// a JSON object, after logging a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "no settings file yet");
            return Ok(Self::empty(path));
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let values = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(values)) => values,
            Ok(_) | Err(_) => {
                warn!(path = %path.display(), "settings file is corrupt, starting empty");
                Map::new()
            }
        };
        Ok(Self { path, values })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(settings_path()?)
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: Map::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Writes the whole file, keeping the previous version as `.json.bak`.
    pub fn sync(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        if self.path.exists() {
            let backup = self.path.with_extension("json.bak");
            let _ = fs::copy(&self.path, &backup);
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sync_and_reopen_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SETTINGS_FILE);

        let mut settings = Settings::open(&path).expect("open");
        settings.set_value("Playlist/currentIndex", 2);
        settings.set_value("Playlist/mediaList", "[]");
        settings.sync().expect("sync");

        let reopened = Settings::open(&path).expect("reopen");
        assert_eq!(reopened.value("Playlist/currentIndex"), Some(&Value::from(2)));
        assert_eq!(reopened.value("Playlist/mediaList"), Some(&Value::from("[]")));
        assert_eq!(reopened.value("missing"), None);
    }

    #[test]
    fn second_sync_keeps_backup() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        let mut settings = Settings::open(&path).expect("open");
        settings.set_value("a", 1);
        settings.sync().expect("first sync");
        settings.set_value("a", 2);
        settings.sync().expect("second sync");

        let backup = fs::read_to_string(path.with_extension("json.bak")).expect("backup");
        assert!(backup.contains("\"a\": 1"));
    }

    #[test]
    fn corrupt_file_opens_empty() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "{not json").expect("write");

        let settings = Settings::open(&path).expect("open");
        assert!(settings.value("Playlist/mediaList").is_none());

        fs::write(&path, "[1, 2]").expect("write array");
        let settings = Settings::open(&path).expect("open array");
        assert!(settings.value("0").is_none());
    }

    #[test]
    fn env_override_wins() {
        let dir = tempdir().expect("tempdir");
        unsafe {
            env::set_var(CONFIG_DIR_ENV, dir.path().to_string_lossy().as_ref());
        }

        assert_eq!(config_root().expect("root"), dir.path());
        assert_eq!(
            settings_path().expect("path"),
            dir.path().join(SETTINGS_FILE)
        );
    }
}
