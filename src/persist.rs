//! Playlist records inside the settings store.
//!
//! Three keys are used: the entry list as a compact JSON array string, the
//! current index (-1 for none) and the play mode ordinal.

use crate::config::Settings;
use crate::model::{MediaEntry, PersistedPlaylist, PlayMode};
use anyhow::Result;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

pub const MEDIA_LIST_KEY: &str = "Playlist/mediaList";
pub const CURRENT_INDEX_KEY: &str = "Playlist/currentIndex";
pub const PLAY_MODE_KEY: &str = "Playlist/playMode";

pub fn write_playlist(settings: &mut Settings, state: &PersistedPlaylist) -> Result<()> {
    let media_list = serde_json::to_string(&state.entries)?;
    let current = state
        .current_index
        .and_then(|idx| i64::try_from(idx).ok())
        .unwrap_or(-1);

    settings.set_value(MEDIA_LIST_KEY, media_list);
    settings.set_value(CURRENT_INDEX_KEY, current);
    settings.set_value(PLAY_MODE_KEY, state.mode.ordinal());
    Ok(())
}

/// Reads the playlist back. Never fails: unreadable parts degrade to an
/// empty list, and entries whose files are gone are dropped.
pub fn read_playlist(settings: &Settings) -> PersistedPlaylist {
    let records = settings
        .value(MEDIA_LIST_KEY)
        .map(parse_records)
        .unwrap_or_default();
    let stored_count = records.len();

    let stored_current = settings
        .value(CURRENT_INDEX_KEY)
        .and_then(Value::as_i64)
        .and_then(|idx| usize::try_from(idx).ok());
    let current_path = stored_current
        .and_then(|idx| records.get(idx))
        .map(|entry| entry.file_path.clone());

    let mut seen = HashSet::new();
    let entries: Vec<MediaEntry> = records
        .into_iter()
        .filter(|entry| {
            if entry.file_path.is_file() {
                return true;
            }
            debug!(path = %entry.file_path.display(), "dropping entry for missing file");
            false
        })
        .filter(|entry| seen.insert(entry.file_path.clone()))
        .collect();

    let current_index = match current_path {
        Some(path) => entries
            .iter()
            .position(|entry| entry.file_path == path)
            .or_else(|| clamp_index(stored_current, entries.len())),
        None => clamp_index(stored_current, entries.len()),
    };

    let mode = settings
        .value(PLAY_MODE_KEY)
        .and_then(Value::as_i64)
        .and_then(PlayMode::from_ordinal)
        .unwrap_or_default();

    info!(
        stored = stored_count,
        kept = entries.len(),
        ?current_index,
        %mode,
        "loaded playlist settings"
    );
    PersistedPlaylist {
        entries,
        current_index,
        mode,
    }
}

fn parse_records(value: &Value) -> Vec<MediaEntry> {
    let parsed = match value {
        Value::String(raw) => serde_json::from_str::<Vec<Value>>(raw),
        Value::Array(items) => Ok(items.clone()),
        _ => {
            warn!("playlist settings hold an unexpected value, ignoring");
            return Vec::new();
        }
    };

    let items = match parsed {
        Ok(items) => items,
        Err(err) => {
            warn!(%err, "playlist settings are corrupt, ignoring");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<MediaEntry>(item) {
            Ok(entry) if !entry.file_path.as_os_str().is_empty() => Some(entry),
            Ok(_) => None,
            Err(err) => {
                warn!(%err, "skipping malformed playlist record");
                None
            }
        })
        .collect()
}

fn clamp_index(index: Option<usize>, len: usize) -> Option<usize> {
    let index = index?;
    if len == 0 {
        return None;
    }
    Some(index.min(len - 1))
}
