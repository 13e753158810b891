use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a playlist import or export did not happen. The `Display` text is
/// meant to be shown to the user as is.
#[derive(Debug, Error)]
pub enum PlaylistFileError {
    #[error("cannot open {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unsupported playlist format: {0}")]
    UnsupportedFormat(String),

    #[error("no valid media files found in {}", .0.display())]
    NoMediaFound(PathBuf),
}
