//! Turns filesystem metadata into [`EntryRecord`]s.

use super::EntryRecord;
use crate::utils::file_detection::{mime_type_for, DIRECTORY_MIME};
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Supplies the `owner` field of an entry.
///
/// No real ownership lookup exists yet; implement this to plug one in.
pub trait OwnerLookup: Send + Sync {
    fn owner_of(&self, path: &Path, metadata: &Metadata) -> String;
}

/// Reports the same placeholder identity for every entry.
#[derive(Debug, Clone)]
pub struct StaticOwner(pub String);

impl OwnerLookup for StaticOwner {
    fn owner_of(&self, _path: &Path, _metadata: &Metadata) -> String {
        self.0.clone()
    }
}

#[derive(Clone)]
pub struct EntryClassifier {
    owner: Arc<dyn OwnerLookup>,
}

impl EntryClassifier {
    pub fn new(owner: Arc<dyn OwnerLookup>) -> Self {
        Self { owner }
    }

    pub fn with_static_owner(owner: impl Into<String>) -> Self {
        Self::new(Arc::new(StaticOwner(owner.into())))
    }

    /// Builds the record for one entry.
    ///
    /// Directories always get `inode/directory`; files get the MIME type of
    /// their extension, or an empty string. Both timestamps carry the
    /// modification time, in milliseconds since the epoch.
    pub fn classify(
        &self,
        path: &Path,
        metadata: &Metadata,
        full_name: String,
    ) -> io::Result<EntryRecord> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("entry has no file name: {}", path.display()),
                )
            })?;

        let modified_ms = DateTime::<Utc>::from(metadata.modified()?).timestamp_millis();
        let is_directory = metadata.is_dir();
        let file_type = if is_directory {
            DIRECTORY_MIME.to_string()
        } else {
            mime_type_for(path)
        };

        Ok(EntryRecord {
            name,
            full_name,
            size: metadata.len(),
            is_directory,
            created_time: modified_ms,
            modified_time: modified_ms,
            file_type,
            owner: self.owner.owner_of(path, metadata),
        })
    }
}

impl Default for EntryClassifier {
    fn default() -> Self {
        Self::with_static_owner("user1")
    }
}
