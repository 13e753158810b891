use crate::error::PlaylistFileError;
use crate::media;
use crate::model::MediaEntry;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistFormat {
    M3u,
    Pls,
}

impl PlaylistFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?;
        ext.parse().ok()
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::M3u => "m3u",
            Self::Pls => "pls",
        }
    }
}

impl FromStr for PlaylistFormat {
    type Err = PlaylistFileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "m3u" | "m3u8" => Ok(Self::M3u),
            "pls" => Ok(Self::Pls),
            other => Err(PlaylistFileError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Valid media paths listed in the file.
    pub found: usize,
    /// Entries that were not already in the playlist.
    pub added: usize,
}

pub fn render_m3u(entries: &[MediaEntry]) -> String {
    let mut out = String::from("#EXTM3U\n");
    for entry in entries {
        let artist = if entry.artist.is_empty() {
            "Unknown"
        } else {
            entry.artist.as_str()
        };
        let title = if entry.title.is_empty() {
            media::file_stem(&entry.file_path)
        } else {
            entry.title.clone()
        };
        let _ = writeln!(
            out,
            "#EXTINF:{},{artist} - {title}",
            entry.duration_seconds()
        );
        let _ = writeln!(out, "{}", entry.file_path.display());
    }
    out
}

pub fn render_pls(entries: &[MediaEntry]) -> String {
    let mut out = String::from("[playlist]\n");
    for (idx, entry) in entries.iter().enumerate() {
        let n = idx + 1;
        let _ = writeln!(out, "File{n}={}", entry.file_path.display());
        let _ = writeln!(out, "Title{n}={}", entry.display_name());
        let _ = writeln!(out, "Length{n}={}", entry.duration_seconds());
    }
    let _ = writeln!(out, "NumberOfEntries={}", entries.len());
    out.push_str("Version=2\n");
    out
}

/// Every non-comment line, resolved against `base_dir` when relative.
pub fn parse_m3u(text: &str, base_dir: &Path) -> Vec<PathBuf> {
    text.lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| resolve(line, base_dir))
        .collect()
}

/// Every `File<N>=` value, resolved against `base_dir` when relative.
pub fn parse_pls(text: &str, base_dir: &Path) -> Vec<PathBuf> {
    text.lines()
        .filter_map(|line| line.trim().split_once('='))
        .filter(|(key, _)| {
            key.trim()
                .strip_prefix("File")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        })
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| resolve(value, base_dir))
        .collect()
}

/// Writes `entries` to `path` in one go and returns how many were written.
pub fn write_playlist(
    path: &Path,
    entries: &[MediaEntry],
    format: PlaylistFormat,
) -> Result<usize, PlaylistFileError> {
    let text = match format {
        PlaylistFormat::M3u => render_m3u(entries),
        PlaylistFormat::Pls => render_pls(entries),
    };
    fs::write(path, text).map_err(|source| PlaylistFileError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), ?format, count = entries.len(), "exported playlist");
    Ok(entries.len())
}

/// Reads a playlist file, keeping paths that exist and look like media.
/// The format is picked from the file extension.
pub fn read_playlist(path: &Path) -> Result<Vec<PathBuf>, PlaylistFileError> {
    let format = match path.extension().and_then(OsStr::to_str) {
        Some(ext) => ext.parse::<PlaylistFormat>()?,
        None => {
            return Err(PlaylistFileError::UnsupportedFormat(
                path.display().to_string(),
            ));
        }
    };
    let text = fs::read_to_string(path).map_err(|source| PlaylistFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = playlist_dir(path);
    let listed = match format {
        PlaylistFormat::M3u => parse_m3u(&text, &base_dir),
        PlaylistFormat::Pls => parse_pls(&text, &base_dir),
    };
    let listed_count = listed.len();
    let valid: Vec<PathBuf> = listed
        .into_iter()
        .filter(|candidate| candidate.exists() && media::is_media_file(candidate))
        .collect();
    debug!(
        path = %path.display(),
        listed = listed_count,
        valid = valid.len(),
        "parsed playlist file"
    );
    Ok(valid)
}

fn playlist_dir(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn resolve(raw: &str, base_dir: &Path) -> PathBuf {
    let candidate = PathBuf::from(raw);
    if candidate.is_absolute() {
        candidate
    } else {
        base_dir.join(candidate)
    }
}
