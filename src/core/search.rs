//! File-name matching used by the search listing mode.

use std::path::Path;

/// A utility struct for matching file names against a search query.
///
/// This struct is stateless and provides methods as associated functions.
pub struct SearchEngine;

impl SearchEngine {
    /// Checks if a path's file name contains the search query, ignoring case.
    pub fn matches_search_query(path: &Path, query: &str) -> bool {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();

        Self::contains_ignore_case(&file_name, query)
    }

    /// Case-insensitive substring test with Unicode lowercasing on both sides.
    pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_is_case_insensitive() {
        assert!(SearchEngine::matches_search_query(
            Path::new("movies/Holiday_2023.MP4"),
            "holiday"
        ));
        assert!(SearchEngine::matches_search_query(
            Path::new("README.md"),
            "ReadMe"
        ));
    }

    #[test]
    fn test_match_uses_file_name_only() {
        // The directory part of the path must not produce a match.
        assert!(!SearchEngine::matches_search_query(
            Path::new("holiday/clip.mp4"),
            "holiday"
        ));
    }

    #[test]
    fn test_unicode_lowercasing() {
        assert!(SearchEngine::contains_ignore_case("ÜBERSICHT.pdf", "übersicht"));
        assert!(!SearchEngine::contains_ignore_case("notes.txt", "todo"));
    }
}
