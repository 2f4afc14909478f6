use std::path::Path;

/// MIME type reported for every directory entry.
pub const DIRECTORY_MIME: &str = "inode/directory";

/// Fallback content type for files with an unknown extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Infers the MIME type of a file from its extension.
///
/// Returns an empty string when the extension is missing or unmapped.
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_default()
}

/// Like [`mime_type_for`], but falls back to `application/octet-stream`.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// `true` when the MIME type belongs to the `video/` family.
pub fn is_video_mime(mime: &str) -> bool {
    mime.starts_with("video/")
}

/// Determines if a file is a video by its extension.
pub fn is_video_file(path: &Path) -> bool {
    is_video_mime(&mime_type_for(path))
}
