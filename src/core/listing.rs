//! The three listing modes and the pipeline they share.

use super::resolver::slash_path;
use super::sorting::{paginate, SortSpec};
use super::{
    CoreError, DirectoryScanner, EntryClassifier, EntryRecord, ListQuery, ListResponse,
    PathResolver, SearchEngine,
};
use crate::config::ServerConfig;
use crate::utils::file_detection::is_video_file;
use std::path::Path;

/// Resolves, traverses, sorts and paginates.
///
/// Every call works on a fresh filesystem snapshot; nothing is cached.
pub struct ListingEngine {
    resolver: PathResolver,
    scanner: DirectoryScanner,
}

impl ListingEngine {
    pub fn new(resolver: PathResolver, classifier: EntryClassifier) -> Self {
        Self {
            resolver,
            scanner: DirectoryScanner::new(classifier),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            PathResolver::new(&config.root_dir, config.enforce_containment),
            EntryClassifier::with_static_owner(config.default_owner.clone()),
        )
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Lists one directory level, directories included.
    pub fn list_directory(&self, query: &ListQuery) -> Result<ListResponse, CoreError> {
        let dir = self.resolver.resolve(&query.path)?;
        let entries = self.scanner.read_level(&dir)?;
        tracing::debug!("Listed {} entries in {}", entries.len(), dir.display());
        Self::finish(entries, query)
    }

    /// Lists video files below the requested directory.
    ///
    /// With `recursive == false` only the immediate children are considered.
    /// `full_name` is relative to the requested directory. A `path` naming a
    /// single file lists that file if it is a video.
    pub fn list_videos(
        &self,
        query: &ListQuery,
        recursive: bool,
    ) -> Result<ListResponse, CoreError> {
        let walk_root = self.resolver.resolve(&query.path)?;
        let max_depth = if recursive { None } else { Some(1) };

        let entries = self.scanner.walk_files(
            &walk_root,
            max_depth,
            |entry| is_video_file(entry.path()),
            |path| relative_to(&walk_root, path),
        )?;
        tracing::debug!(
            "Found {} videos in {} (recursive: {})",
            entries.len(),
            walk_root.display(),
            recursive
        );
        Self::finish(entries, query)
    }

    /// Recursively finds files whose name contains `query_text`, ignoring case.
    ///
    /// `full_name` is the absolute path with the configured root stripped,
    /// e.g. `/shows/pilot.mkv`.
    pub fn search(&self, query_text: &str, query: &ListQuery) -> Result<ListResponse, CoreError> {
        if query_text.is_empty() {
            return Err(CoreError::MissingQuery);
        }

        let walk_root = self.resolver.resolve(&query.path)?;
        let entries = self.scanner.walk_files(
            &walk_root,
            None,
            |entry| SearchEngine::matches_search_query(entry.path(), query_text),
            |path| self.resolver.display_relative(path),
        )?;
        tracing::debug!(
            "Search for {:?} in {} matched {} files",
            query_text,
            walk_root.display(),
            entries.len()
        );
        Self::finish(entries, query)
    }

    fn finish(mut entries: Vec<EntryRecord>, query: &ListQuery) -> Result<ListResponse, CoreError> {
        let sort = SortSpec::parse(&query.sort_by, &query.order)?;
        sort.apply(&mut entries);

        let total_files = entries.len();
        let files = paginate(entries, query.skip, query.limit);

        Ok(ListResponse {
            total_files,
            files,
            skip: query.skip,
            limit: query.limit,
        })
    }
}

fn relative_to(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base).map(slash_path) {
        Ok(relative) if !relative.is_empty() => relative,
        // The walk root itself, when it is a file.
        Ok(_) => path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}
