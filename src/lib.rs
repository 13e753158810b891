pub mod config;
pub mod core;
pub mod error;
pub mod media;
pub mod model;
pub mod notify;
pub mod persist;
pub mod playlist_file;
pub mod sequencer;

pub use crate::core::PlaylistCore;
pub use crate::error::PlaylistFileError;
pub use crate::model::{EntryMetadata, MediaEntry, PersistedPlaylist, PlayMode};
pub use crate::notify::{EventLog, PlaylistEvent, PlaylistObserver};
pub use crate::playlist_file::{ImportReport, PlaylistFormat};
