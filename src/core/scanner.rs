use super::{CoreError, EntryClassifier, EntryRecord};
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// How a traversal reacts when a single entry cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Drop the entry and keep going. Used by the flat listing.
    SkipEntry,
    /// Abort the whole traversal. Used by the recursive modes.
    FailFast,
}

/// Reads directories and classifies what it finds.
pub struct DirectoryScanner {
    classifier: EntryClassifier,
}

impl DirectoryScanner {
    pub fn new(classifier: EntryClassifier) -> Self {
        Self { classifier }
    }

    /// Reads exactly one level of `dir`, directories included.
    ///
    /// Only a failure to open `dir` itself is an error; entries whose
    /// metadata cannot be read are skipped ([`ErrorPolicy::SkipEntry`]).
    pub fn read_level(&self, dir: &Path) -> Result<Vec<EntryRecord>, CoreError> {
        let read_dir =
            fs::read_dir(dir).map_err(|e| CoreError::DirectoryRead(e, dir.to_path_buf()))?;

        let paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    None
                }
            })
            .collect();

        // Rayon's collect keeps the directory-read order.
        let records: Vec<EntryRecord> = paths
            .par_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().to_string();
                let classified = fs::symlink_metadata(path)
                    .and_then(|metadata| self.classifier.classify(path, &metadata, name));
                match classified {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::debug!("Skipping {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(
            "Read {} of {} entries in {}",
            records.len(),
            paths.len(),
            dir.display()
        );
        Ok(records)
    }

    /// Walks the files below `root` and classifies those accepted by `include`.
    ///
    /// Directories are descended into (down to `max_depth` when given) but
    /// never returned. A `root` that is itself a file is visited as the only
    /// entry. The walk follows [`ErrorPolicy::FailFast`]: a missing root or
    /// the first unreadable entry aborts it with [`CoreError::Traversal`].
    pub fn walk_files<I, N>(
        &self,
        root: &Path,
        max_depth: Option<usize>,
        include: I,
        full_name: N,
    ) -> Result<Vec<EntryRecord>, CoreError>
    where
        I: Fn(&DirEntry) -> bool,
        N: Fn(&Path) -> String,
    {
        let traversal_error = |e: io::Error| CoreError::Traversal(e, root.to_path_buf());

        fs::metadata(root).map_err(traversal_error)?;

        let mut walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name();
        if let Some(depth) = max_depth {
            walker = walker.max_depth(depth);
        }

        let mut records = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| traversal_error(e.into()))?;
            if entry.file_type().is_dir() || !include(&entry) {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| traversal_error(e.into()))?;
            let record = self
                .classifier
                .classify(entry.path(), &metadata, full_name(entry.path()))
                .map_err(traversal_error)?;
            records.push(record);
        }

        tracing::debug!("Walk of {} matched {} files", root.display(), records.len());
        Ok(records)
    }
}
