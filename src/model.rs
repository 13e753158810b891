use crate::media;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayMode {
    #[default]
    Sequential,
    Loop,
    Random,
    RepeatOne,
}

impl PlayMode {
    pub const ALL: [Self; 4] = [Self::Sequential, Self::Loop, Self::Random, Self::RepeatOne];

    pub fn next(self) -> Self {
        match self {
            Self::Sequential => Self::Loop,
            Self::Loop => Self::Random,
            Self::Random => Self::RepeatOne,
            Self::RepeatOne => Self::Sequential,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::Loop => "Loop",
            Self::Random => "Random",
            Self::RepeatOne => "Repeat one",
        }
    }

    /// Integer form used by the settings store.
    pub fn ordinal(self) -> i64 {
        match self {
            Self::Sequential => 0,
            Self::Loop => 1,
            Self::Random => 2,
            Self::RepeatOne => 3,
        }
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Sequential),
            1 => Some(Self::Loop),
            2 => Some(Self::Random),
            3 => Some(Self::RepeatOne),
            _ => None,
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PlayMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" | "normal" => Ok(Self::Sequential),
            "loop" => Ok(Self::Loop),
            "random" | "shuffle" => Ok(Self::Random),
            "repeat-one" | "repeatone" | "repeat_one" => Ok(Self::RepeatOne),
            other => Err(format!("unknown play mode {other}")),
        }
    }
}

/// One playlist item. `file_path` is the identity key inside a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub file_path: PathBuf,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    /// Milliseconds, 0 when unknown.
    #[serde(default)]
    pub duration: u64,
    #[serde(rename = "addTime", default = "now", with = "add_time")]
    pub added_at: OffsetDateTime,
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub is_favorite: bool,
}

impl MediaEntry {
    /// Builds an entry whose title and artist are guessed from the file name.
    pub fn from_path(path: &Path) -> Self {
        let stem = media::file_stem(path);
        let (artist, title) = media::split_artist_title(&stem);
        Self {
            file_path: path.to_path_buf(),
            title: if title.is_empty() { stem } else { title },
            artist,
            album: String::new(),
            duration: 0,
            added_at: now(),
            play_count: 0,
            is_favorite: false,
        }
    }

    pub fn display_name(&self) -> String {
        if !self.title.is_empty() && !self.artist.is_empty() {
            return format!("{} - {}", self.artist, self.title);
        }
        if self.title.is_empty() {
            media::file_stem(&self.file_path)
        } else {
            self.title.clone()
        }
    }

    pub fn matches_keyword(&self, lowered_keyword: &str) -> bool {
        self.display_name()
            .to_lowercase()
            .contains(lowered_keyword)
            || self
                .file_path
                .to_string_lossy()
                .to_lowercase()
                .contains(lowered_keyword)
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration / 1000
    }

    /// Human readable property sheet, one `label: value` per line.
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        let or_unknown = |value: &str| {
            if value.is_empty() {
                String::from("Unknown")
            } else {
                value.to_string()
            }
        };
        vec![
            ("Path", self.file_path.display().to_string()),
            ("Title", or_unknown(&self.title)),
            ("Artist", or_unknown(&self.artist)),
            ("Album", or_unknown(&self.album)),
            ("Duration", media::format_duration(self.duration)),
            ("Added", format_added_at(self.added_at)),
            ("Plays", self.play_count.to_string()),
        ]
    }
}

/// Host-supplied metadata refresh. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<u64>,
}

impl EntryMetadata {
    pub fn apply(&self, entry: &mut MediaEntry) {
        if let Some(title) = &self.title {
            entry.title = title.trim().to_string();
        }
        if let Some(artist) = &self.artist {
            entry.artist = artist.trim().to_string();
        }
        if let Some(album) = &self.album {
            entry.album = album.trim().to_string();
        }
        if let Some(duration) = self.duration {
            entry.duration = duration;
        }
    }
}

/// Snapshot of everything the settings store keeps for a playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedPlaylist {
    pub entries: Vec<MediaEntry>,
    pub current_index: Option<usize>,
    pub mode: PlayMode,
}

pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn format_added_at(value: OffsetDateTime) -> String {
    value
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| String::from("Unknown"))
}

/// Accepts RFC 3339 and the offset-less `YYYY-MM-DDTHH:MM:SS` form older
/// settings files used. Offset-less times are taken as UTC.
pub(crate) fn parse_add_time(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(parsed);
    }
    time::PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    )
    .ok()
    .map(time::PrimitiveDateTime::assume_utc)
}

mod add_time {
    use super::{Rfc3339, now, parse_add_time};
    use serde::{Deserialize, Deserializer, Serializer};
    use time::OffsetDateTime;

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.as_deref().and_then(parse_add_time).unwrap_or_else(now))
    }
}

impl Serialize for PlayMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for PlayMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Self::from_ordinal(value).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_cycle_visits_every_mode() {
        let mut mode = PlayMode::Sequential;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(seen, PlayMode::ALL.to_vec());
        assert_eq!(mode, PlayMode::Sequential);
    }

    #[test]
    fn ordinals_round_trip_and_reject_unknown() {
        for mode in PlayMode::ALL {
            assert_eq!(PlayMode::from_ordinal(mode.ordinal()), Some(mode));
        }
        assert_eq!(PlayMode::from_ordinal(7), None);
        assert_eq!(PlayMode::from_ordinal(-1), None);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("Shuffle".parse::<PlayMode>(), Ok(PlayMode::Random));
        assert_eq!("repeat-one".parse::<PlayMode>(), Ok(PlayMode::RepeatOne));
        assert!("sideways".parse::<PlayMode>().is_err());
    }

    #[test]
    fn entry_from_path_splits_artist_and_title() {
        let entry = MediaEntry::from_path(Path::new("/music/Daft Punk - One More Time.mp3"));
        assert_eq!(entry.artist, "Daft Punk");
        assert_eq!(entry.title, "One More Time");
        assert_eq!(entry.display_name(), "Daft Punk - One More Time");
        assert_eq!(entry.play_count, 0);
        assert!(!entry.is_favorite);
    }

    #[test]
    fn entry_from_plain_name_uses_stem() {
        let entry = MediaEntry::from_path(Path::new("/videos/holiday.mkv"));
        assert_eq!(entry.artist, "");
        assert_eq!(entry.title, "holiday");
        assert_eq!(entry.display_name(), "holiday");
    }

    #[test]
    fn display_name_falls_back_to_stem_when_title_is_empty() {
        let mut entry = MediaEntry::from_path(Path::new("/videos/clip.mp4"));
        entry.title.clear();
        entry.artist = String::from("Someone");
        assert_eq!(entry.display_name(), "clip");
    }

    #[test]
    fn serializes_with_settings_field_names() {
        let mut entry = MediaEntry::from_path(Path::new("/music/a.mp3"));
        entry.added_at = parse_add_time("2024-03-01T10:20:30Z").expect("time");
        entry.play_count = 3;
        entry.is_favorite = true;

        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(value["filePath"], "/music/a.mp3");
        assert_eq!(value["addTime"], "2024-03-01T10:20:30Z");
        assert_eq!(value["playCount"], 3);
        assert_eq!(value["isFavorite"], true);
        assert_eq!(value["duration"], 0);
    }

    #[test]
    fn deserializes_partial_and_legacy_records() {
        let entry: MediaEntry = serde_json::from_str(
            r#"{"filePath":"/music/b.flac","addTime":"2023-12-31T23:59:58","playCount":2}"#,
        )
        .expect("deserialize");
        assert_eq!(entry.file_path, PathBuf::from("/music/b.flac"));
        assert_eq!(entry.play_count, 2);
        assert_eq!(entry.title, "");
        assert_eq!(entry.added_at.year(), 2023);
        assert_eq!(entry.added_at.second(), 58);
    }

    #[test]
    fn metadata_refresh_only_touches_given_fields() {
        let mut entry = MediaEntry::from_path(Path::new("/music/x.ogg"));
        EntryMetadata {
            album: Some(String::from("  Live  ")),
            duration: Some(61_000),
            ..EntryMetadata::default()
        }
        .apply(&mut entry);
        assert_eq!(entry.title, "x");
        assert_eq!(entry.album, "Live");
        assert_eq!(entry.duration_seconds(), 61);
    }

    #[test]
    fn properties_report_unknown_for_missing_fields() {
        let entry = MediaEntry::from_path(Path::new("/music/song.wav"));
        let properties = entry.properties();
        assert!(properties.contains(&("Artist", String::from("Unknown"))));
        assert!(properties.contains(&("Duration", String::from("Unknown"))));
        assert!(properties.contains(&("Plays", String::from("0"))));
    }
}
