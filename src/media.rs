use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "3gp", "ogv", "mp3", "wav", "flac",
    "ogg", "aac", "wma", "m4a",
];

const ARTIST_TITLE_SEPARATOR: &str = " - ";

pub fn is_media_file(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Splits `"Artist - Title"` at the first separator. Returns empty strings
/// when the name carries no separator or either side is blank.
pub fn split_artist_title(stem: &str) -> (String, String) {
    let Some((artist, title)) = stem.split_once(ARTIST_TITLE_SEPARATOR) else {
        return (String::new(), String::new());
    };
    let artist = artist.trim();
    let title = title.trim();
    if artist.is_empty() || title.is_empty() {
        return (String::new(), String::new());
    }
    (artist.to_string(), title.to_string())
}

pub fn format_duration(duration_ms: u64) -> String {
    if duration_ms == 0 {
        return String::from("Unknown");
    }

    let total_seconds = duration_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds / 60) % 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// Media files directly inside `dir`, ordered by file name.
pub fn scan_directory(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_media_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}
