pub mod classifier;
pub mod error;
pub mod file_handler;
pub mod listing;
pub mod resolver;
pub mod scanner;
pub mod search;
pub mod sorting;
pub mod thumbnail;

use serde::{Deserialize, Serialize};

/// Normalized metadata for one filesystem entry.
///
/// Built fresh for every request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub name: String,
    /// Location relative to the query root; its exact shape depends on the listing mode.
    pub full_name: String,
    pub size: u64,
    pub is_directory: bool,
    /// Same value as `modified_time`: only the modification time is available.
    pub created_time: i64,
    pub modified_time: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_type: String,
    pub owner: String,
}

/// One page of a listing plus the pagination parameters that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Number of matching entries before pagination.
    pub total_files: usize,
    pub files: Vec<EntryRecord>,
    pub skip: usize,
    pub limit: i64,
}

pub const DEFAULT_LIMIT: i64 = 25;

/// Parameters shared by every listing mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Directory relative to the root; empty means the root itself.
    pub path: String,
    pub skip: usize,
    /// Page size; zero or negative returns everything after `skip`.
    pub limit: i64,
    pub sort_by: String,
    pub order: String,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            path: String::new(),
            skip: 0,
            limit: DEFAULT_LIMIT,
            sort_by: String::new(),
            order: "asc".to_string(),
        }
    }
}

impl ListQuery {
    pub fn at(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn sorted(mut self, sort_by: &str, order: &str) -> Self {
        self.sort_by = sort_by.to_string();
        self.order = order.to_string();
        self
    }

    pub fn page(mut self, skip: usize, limit: i64) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }
}

pub use classifier::{EntryClassifier, OwnerLookup, StaticOwner};
pub use error::CoreError;
pub use file_handler::{FileHandler, ServedFile, UploadedFile};
pub use listing::ListingEngine;
pub use resolver::PathResolver;
pub use scanner::{DirectoryScanner, ErrorPolicy};
pub use search::SearchEngine;
pub use sorting::{SortField, SortOrder, SortSpec};
pub use thumbnail::{FfmpegExtractor, FrameExtractor, ThumbnailService};
