use crate::config::Settings;
use crate::error::PlaylistFileError;
use crate::media;
use crate::model::{EntryMetadata, MediaEntry, PersistedPlaylist, PlayMode};
use crate::notify::{Notifier, PlaylistEvent, PlaylistObserver};
use crate::persist;
use crate::playlist_file::{self, ImportReport, PlaylistFormat};
use crate::sequencer::PlaybackSequencer;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    /// Lowercased search text.
    Keyword(String),
    FavoritesOnly,
}

impl Filter {
    fn matches(&self, entry: &MediaEntry) -> bool {
        match self {
            Self::Keyword(keyword) => entry.matches_keyword(keyword),
            Self::FavoritesOnly => entry.is_favorite,
        }
    }
}

/// A narrowed view over the playlist. `unfiltered` is the canonical list and
/// receives every mutation made while the view is active.
#[derive(Debug)]
struct Overlay {
    filter: Filter,
    unfiltered: Vec<MediaEntry>,
    /// Path of the current entry while the filter hides it.
    hidden_current: Option<PathBuf>,
}

/// The playlist engine: ordered entries, the current cursor, the play mode
/// and the filter overlay. Hosts drive it through `&mut self` calls and
/// learn about changes through subscribed [`PlaylistObserver`]s.
pub struct PlaylistCore {
    entries: Vec<MediaEntry>,
    overlay: Option<Overlay>,
    current_index: Option<usize>,
    selected_row: Option<usize>,
    sequencer: PlaybackSequencer,
    notifier: Notifier,
}

impl Default for PlaylistCore {
    fn default() -> Self {
        Self::from_persisted(PersistedPlaylist::default())
    }
}

impl PlaylistCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_persisted(state: PersistedPlaylist) -> Self {
        let sequencer = PlaybackSequencer::new(state.mode);
        Self::with_sequencer(state, sequencer)
    }

    /// Builds a core around an existing sequencer, e.g. a seeded one. The
    /// sequencer's mode is replaced by `state.mode`.
    pub fn with_sequencer(state: PersistedPlaylist, mut sequencer: PlaybackSequencer) -> Self {
        let (entries, current_index) = dedup_entries(state.entries, state.current_index);
        sequencer.set_mode(state.mode, entries.len(), current_index);

        let mut core = Self {
            entries,
            overlay: None,
            current_index,
            selected_row: None,
            sequencer,
            notifier: Notifier::default(),
        };
        core.reshuffle_if_random();
        core
    }

    pub fn subscribe(&mut self, observer: Box<dyn PlaylistObserver>) {
        self.notifier.subscribe(observer);
    }

    /// Canonical state for persistence. Ignores any active filter.
    pub fn persisted(&self) -> PersistedPlaylist {
        let entries = self.canonical().to_vec();
        let current_index = self
            .current_path()
            .and_then(|current| entries.iter().position(|e| e.file_path == current));
        PersistedPlaylist {
            entries,
            current_index,
            mode: self.mode(),
        }
    }

    pub fn save(&self, settings: &mut Settings) -> anyhow::Result<()> {
        let state = self.persisted();
        persist::write_playlist(settings, &state)?;
        settings.sync()?;
        info!(
            entries = state.entries.len(),
            path = %settings.path().display(),
            "playlist saved"
        );
        Ok(())
    }

    /// Replaces the playlist with what `settings` holds. Restoring the cursor
    /// does not count as a play. Returns the number of entries loaded.
    pub fn load(&mut self, settings: &Settings) -> usize {
        let state = persist::read_playlist(settings);
        self.overlay = None;
        let (entries, current_index) = dedup_entries(state.entries, state.current_index);
        self.entries = entries;
        self.current_index = current_index;
        self.selected_row = None;

        self.set_mode(state.mode);
        self.reshuffle_if_random();

        self.notifier.emit(PlaylistEvent::PlaylistChanged);
        if self.current_index.is_some() {
            self.notifier
                .emit(PlaylistEvent::SelectionChanged(self.current_index));
        }
        self.entries.len()
    }

    /// Adds one media file. Missing files, unsupported extensions and paths
    /// already in the playlist are ignored and `false` is returned.
    pub fn add(&mut self, path: impl AsRef<Path>) -> bool {
        if !self.insert_path(path.as_ref()) {
            return false;
        }
        self.reshuffle_if_random();
        self.notifier.emit(PlaylistEvent::PlaylistChanged);
        true
    }

    /// Adds files in order and returns how many were accepted. The shuffle
    /// table is rebuilt once at the end.
    pub fn add_all<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let added = paths
            .into_iter()
            .filter(|path| self.insert_path(path.as_ref()))
            .count();
        if added > 0 {
            self.reshuffle_if_random();
            self.notifier.emit(PlaylistEvent::PlaylistChanged);
        }
        added
    }

    /// Drag-and-drop style add: directories contribute the media files
    /// directly inside them, sorted by name.
    pub fn add_dropped<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut files = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_dir() {
                files.extend(media::scan_directory(path));
            } else if path.is_file() && media::is_media_file(path) {
                files.push(path.to_path_buf());
            }
        }
        self.add_all(files)
    }

    pub fn remove_selected(&mut self) -> bool {
        match self.selected_row {
            Some(row) => self.remove_at(row),
            None => false,
        }
    }

    pub fn remove_at(&mut self, row: usize) -> bool {
        if row >= self.entries.len() {
            return false;
        }

        let removed = self.entries.remove(row);
        if let Some(overlay) = &mut self.overlay {
            overlay
                .unfiltered
                .retain(|entry| entry.file_path != removed.file_path);
        }
        debug!(path = %removed.file_path.display(), row, "removed entry");

        let len = self.entries.len();
        self.selected_row = self.selected_row.and_then(|selected| {
            if selected > row {
                Some(selected - 1)
            } else {
                clamp_row(selected, len)
            }
        });

        let mut selection_changed = false;
        match self.current_index {
            Some(current) if current == row => {
                self.current_index = clamp_row(current, len);
                selection_changed = true;
            }
            Some(current) if current > row => self.current_index = Some(current - 1),
            _ => {}
        }

        self.reshuffle_if_random();
        if selection_changed {
            self.notifier
                .emit(PlaylistEvent::SelectionChanged(self.current_index));
        }
        self.notifier.emit(PlaylistEvent::PlaylistChanged);
        true
    }

    /// Reorders the list, keeping the cursor and the selection on the same
    /// entries. Ignored while a filter is active.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        let len = self.entries.len();
        if self.overlay.is_some() || from >= len || to >= len || from == to {
            return false;
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.current_index = self.current_index.map(|idx| moved_index(idx, from, to));
        self.selected_row = self.selected_row.map(|idx| moved_index(idx, from, to));

        self.reshuffle_if_random();
        self.notifier.emit(PlaylistEvent::PlaylistChanged);
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.overlay = None;
        self.current_index = None;
        self.selected_row = None;
        self.sequencer.clear();
        info!("playlist cleared");

        self.notifier.emit(PlaylistEvent::PlaylistChanged);
        self.notifier.emit(PlaylistEvent::SelectionChanged(None));
    }

    /// Makes `index` current and counts a play for it. Out-of-range requests
    /// are ignored and return `false`.
    pub fn set_current_index(&mut self, index: Option<usize>) -> bool {
        if index.is_some_and(|idx| idx >= self.entries.len()) {
            debug!(?index, len = self.entries.len(), "ignoring out-of-range index");
            return false;
        }

        self.current_index = index;
        if let Some(overlay) = &mut self.overlay {
            overlay.hidden_current = None;
        }
        if let Some(idx) = index {
            let entry = &mut self.entries[idx];
            entry.play_count = entry.play_count.saturating_add(1);
            let path = entry.file_path.clone();
            self.mirror(&path, |entry| {
                entry.play_count = entry.play_count.saturating_add(1);
            });
            self.sequencer.sync_position(index);
        }

        self.notifier.emit(PlaylistEvent::SelectionChanged(index));
        true
    }

    /// Records the host's highlighted row, the target of
    /// [`Self::remove_selected`] and [`Self::toggle_favorite_selected`].
    pub fn select_row(&mut self, row: Option<usize>) -> bool {
        if row.is_some_and(|idx| idx >= self.entries.len()) {
            return false;
        }
        self.selected_row = row;
        true
    }

    pub fn next_index(&self) -> Option<usize> {
        self.sequencer
            .next_index(self.current_index, self.entries.len())
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.sequencer
            .previous_index(self.current_index, self.entries.len())
    }

    /// Moves to the next entry. `None` means the end of the list was reached
    /// and the host should stop playback.
    pub fn advance(&mut self) -> Option<&MediaEntry> {
        let next = self.next_index()?;
        self.set_current_index(Some(next));
        self.entries.get(next)
    }

    pub fn step_back(&mut self) -> Option<&MediaEntry> {
        let previous = self.previous_index()?;
        self.set_current_index(Some(previous));
        self.entries.get(previous)
    }

    /// The user picked a row directly (double click, context menu "play").
    pub fn activate_row(&mut self, row: usize) -> bool {
        if !self.set_current_index(Some(row)) {
            return false;
        }
        self.notifier.emit(PlaylistEvent::PlayRequested);
        true
    }

    pub fn request_next(&mut self) {
        self.notifier.emit(PlaylistEvent::NextRequested);
    }

    pub fn request_previous(&mut self) {
        self.notifier.emit(PlaylistEvent::PreviousRequested);
    }

    pub fn set_mode(&mut self, mode: PlayMode) {
        if self
            .sequencer
            .set_mode(mode, self.entries.len(), self.current_index)
        {
            info!(%mode, "play mode changed");
            self.notifier.emit(PlaylistEvent::ModeChanged(mode));
        }
    }

    pub fn cycle_mode(&mut self) {
        self.set_mode(self.mode().next());
    }

    /// Case-insensitive filter over display names and paths. An empty
    /// keyword restores the full list.
    pub fn search(&mut self, keyword: &str) {
        if keyword.is_empty() {
            self.clear_filter();
        } else {
            self.apply_filter(Filter::Keyword(keyword.to_lowercase()));
        }
    }

    pub fn show_favorites_only(&mut self, favorites_only: bool) {
        if favorites_only {
            self.apply_filter(Filter::FavoritesOnly);
        } else {
            self.clear_filter();
        }
    }

    /// Flips the favorite flag and returns the new value. Under the
    /// favorites-only view an unmarked entry drops out of the view.
    pub fn toggle_favorite(&mut self, row: usize) -> Option<bool> {
        let entry = self.entries.get_mut(row)?;
        entry.is_favorite = !entry.is_favorite;
        let favorite = entry.is_favorite;
        let path = entry.file_path.clone();
        self.mirror(&path, |entry| entry.is_favorite = favorite);
        if self
            .overlay
            .as_ref()
            .is_some_and(|overlay| overlay.filter == Filter::FavoritesOnly)
        {
            self.apply_filter(Filter::FavoritesOnly);
        }
        Some(favorite)
    }

    pub fn toggle_favorite_selected(&mut self) -> Option<bool> {
        let row = self.selected_row?;
        self.toggle_favorite(row)
    }

    pub fn update_metadata(&mut self, row: usize, metadata: &EntryMetadata) -> bool {
        let Some(entry) = self.entries.get_mut(row) else {
            return false;
        };
        metadata.apply(entry);
        let path = entry.file_path.clone();
        self.mirror(&path, |entry| metadata.apply(entry));
        true
    }

    /// Writes the full playlist, ignoring any active filter.
    pub fn export_to(
        &self,
        path: impl AsRef<Path>,
        format: PlaylistFormat,
    ) -> Result<usize, PlaylistFileError> {
        playlist_file::write_playlist(path.as_ref(), self.canonical(), format)
    }

    pub fn import_from(&mut self, path: impl AsRef<Path>) -> Result<ImportReport, PlaylistFileError> {
        let path = path.as_ref();
        let found = playlist_file::read_playlist(path)?;
        if found.is_empty() {
            return Err(PlaylistFileError::NoMediaFound(path.to_path_buf()));
        }

        let added = self.add_all(&found);
        info!(path = %path.display(), found = found.len(), added, "imported playlist");
        Ok(ImportReport {
            found: found.len(),
            added,
        })
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_entry(&self) -> Option<&MediaEntry> {
        self.entries.get(self.current_index?)
    }

    pub fn entry_at(&self, index: usize) -> Option<&MediaEntry> {
        self.entries.get(index)
    }

    /// The visible list; a filtered view while a search is active.
    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mode(&self) -> PlayMode {
        self.sequencer.mode()
    }

    pub fn is_filtered(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selected_row
    }

    pub fn shuffle_order(&self) -> &[usize] {
        self.sequencer.shuffle_order()
    }

    pub fn supported_extensions() -> &'static [&'static str] {
        media::SUPPORTED_EXTENSIONS
    }

    fn insert_path(&mut self, path: &Path) -> bool {
        let path = absolute_path(path);
        if !path.is_file() {
            debug!(path = %path.display(), "skipping missing file");
            return false;
        }
        if !media::is_media_file(&path) {
            debug!(path = %path.display(), "skipping unsupported file");
            return false;
        }
        if self.canonical().iter().any(|entry| entry.file_path == path) {
            debug!(path = %path.display(), "skipping duplicate");
            return false;
        }

        let entry = MediaEntry::from_path(&path);
        let visible = self
            .overlay
            .as_ref()
            .is_none_or(|overlay| overlay.filter.matches(&entry));
        if let Some(overlay) = &mut self.overlay {
            overlay.unfiltered.push(entry.clone());
        }
        debug!(path = %path.display(), visible, "added entry");

        if visible {
            self.entries.push(entry);
            if self.entries.len() == 1 {
                self.set_current_index(Some(0));
            }
        }
        true
    }

    fn apply_filter(&mut self, filter: Filter) {
        let current = self.current_path();
        let selected = self.selected_path();

        let unfiltered = match self.overlay.take() {
            Some(overlay) => overlay.unfiltered,
            None => std::mem::take(&mut self.entries),
        };
        self.entries = unfiltered
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        debug!(?filter, shown = self.entries.len(), total = unfiltered.len(), "filter applied");

        self.relocate(current.clone(), selected);
        let hidden_current = if self.current_index.is_none() {
            current
        } else {
            None
        };
        self.overlay = Some(Overlay {
            filter,
            unfiltered,
            hidden_current,
        });
        self.reshuffle_if_random();
        self.notifier.emit(PlaylistEvent::PlaylistChanged);
    }

    fn clear_filter(&mut self) {
        let current = self.current_path();
        let selected = self.selected_path();
        let Some(overlay) = self.overlay.take() else {
            return;
        };

        self.entries = overlay.unfiltered;
        self.relocate(current, selected);
        self.reshuffle_if_random();
        self.notifier.emit(PlaylistEvent::PlaylistChanged);
    }

    fn relocate(&mut self, current: Option<PathBuf>, selected: Option<PathBuf>) {
        self.current_index = current.and_then(|path| self.position_of(&path));
        self.selected_row = selected.and_then(|path| self.position_of(&path));
    }

    fn current_path(&self) -> Option<PathBuf> {
        self.current_entry()
            .map(|entry| entry.file_path.clone())
            .or_else(|| {
                self.overlay
                    .as_ref()
                    .and_then(|overlay| overlay.hidden_current.clone())
            })
    }

    fn selected_path(&self) -> Option<PathBuf> {
        self.selected_row
            .and_then(|row| self.entries.get(row))
            .map(|entry| entry.file_path.clone())
    }

    fn position_of(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|entry| entry.file_path == path)
    }

    fn canonical(&self) -> &[MediaEntry] {
        match &self.overlay {
            Some(overlay) => &overlay.unfiltered,
            None => &self.entries,
        }
    }

    /// Applies `update` to the canonical copy of `path` while filtered.
    fn mirror(&mut self, path: &Path, update: impl FnOnce(&mut MediaEntry)) {
        if let Some(entry) = self
            .overlay
            .as_mut()
            .and_then(|overlay| overlay.unfiltered.iter_mut().find(|e| e.file_path == path))
        {
            update(entry);
        }
    }

    fn reshuffle_if_random(&mut self) {
        if self.sequencer.mode() == PlayMode::Random {
            self.sequencer
                .reshuffle(self.entries.len(), self.current_index);
        }
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Drops empty and repeated paths. The cursor stays on the entry it pointed
/// at, which may now sit at a lower index.
fn dedup_entries(
    entries: Vec<MediaEntry>,
    current: Option<usize>,
) -> (Vec<MediaEntry>, Option<usize>) {
    let current_path = current
        .and_then(|idx| entries.get(idx))
        .map(|entry| entry.file_path.clone());
    let mut seen = HashSet::new();
    let entries: Vec<MediaEntry> = entries
        .into_iter()
        .filter(|entry| !entry.file_path.as_os_str().is_empty())
        .filter(|entry| seen.insert(entry.file_path.clone()))
        .collect();
    let current = current_path.and_then(|path| entries.iter().position(|e| e.file_path == path));
    (entries, current)
}

fn clamp_row(row: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| row.min(len - 1))
}

fn moved_index(idx: usize, from: usize, to: usize) -> usize {
    if idx == from {
        to
    } else if from < idx && idx <= to {
        idx - 1
    } else if to <= idx && idx < from {
        idx + 1
    } else {
        idx
    }
}
