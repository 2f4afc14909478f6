//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// This enum encapsulates every failure a listing, lookup or side-effect
/// operation can report. Nothing in `core` retries; the caller decides.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The user-supplied path could not be percent-decoded.
    #[error("Invalid path {0:?}: {1}")]
    InvalidPath(String, String),

    /// The resolved path would leave the configured root directory.
    #[error("Path is outside of root directory: {0}")]
    PathOutsideRoot(String),

    /// The directory of a flat listing could not be read.
    #[error("Error reading directory {1}: {0}")]
    DirectoryRead(#[source] std::io::Error, PathBuf),

    /// A recursive walk could not start or hit an unreadable entry.
    #[error("Error walking directory {1}: {0}")]
    Traversal(#[source] std::io::Error, PathBuf),

    /// The requested sort field is not one of the supported fields.
    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    /// A search was requested without a query string.
    #[error("Query parameter is required")]
    MissingQuery,

    /// A required request field was absent or empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The client-supplied upload file name has no usable base name.
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    /// The target of a serve, stream or thumbnail request does not exist.
    /// The path stays out of the message so it never reaches a client.
    #[error("File not found")]
    NotFound(PathBuf),

    /// A stream was requested for a file whose MIME type is not `video/*`.
    #[error("Not a video file: {0}")]
    NotAVideo(PathBuf),

    /// The external frame extractor failed to produce a thumbnail.
    #[error("Error generating thumbnail for {0}: {1}")]
    ThumbnailGeneration(PathBuf, String),

    /// A folder could not be created.
    #[error("Unable to create folder {1}: {0}")]
    FolderCreation(#[source] std::io::Error, PathBuf),

    /// An uploaded file could not be written.
    #[error("Unable to save file {1}: {0}")]
    Upload(#[source] std::io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking or being cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// `true` when the failure was caused by bad client input rather than
    /// by the filesystem or an external process.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidPath(..)
                | CoreError::PathOutsideRoot(_)
                | CoreError::InvalidSortField(_)
                | CoreError::MissingQuery
                | CoreError::MissingField(_)
                | CoreError::InvalidFileName(_)
                | CoreError::NotFound(_)
                | CoreError::NotAVideo(_)
        )
    }
}
