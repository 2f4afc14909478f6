use super::resolver::slash_path;
use super::{CoreError, PathResolver, ThumbnailService};
use crate::utils::file_detection::{content_type_for, is_video_mime, mime_type_for};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncWriteExt};

/// A file that exists under the root and is ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub path: PathBuf,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes_written: u64,
}

/// Filesystem side effects: lookups for raw serving, thumbnails, folder
/// creation and uploads.
#[derive(Clone)]
pub struct FileHandler {
    resolver: PathResolver,
    thumbnails: ThumbnailService,
}

impl FileHandler {
    pub fn new(resolver: PathResolver, thumbnails: ThumbnailService) -> Self {
        Self {
            resolver,
            thumbnails,
        }
    }

    /// Resolves `path` to an existing regular file.
    pub async fn serve_file(&self, path: &str) -> Result<ServedFile, CoreError> {
        let abs_path = self.resolver.resolve(path)?;
        let metadata = match tokio::fs::metadata(&abs_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => {
                tracing::warn!("File does not exist: {}", abs_path.display());
                return Err(CoreError::NotFound(abs_path));
            }
        };

        Ok(ServedFile {
            content_type: content_type_for(&abs_path),
            size: metadata.len(),
            path: abs_path,
        })
    }

    /// Like [`serve_file`](Self::serve_file), but only for `video/*` files.
    pub async fn stream_file(&self, path: &str) -> Result<ServedFile, CoreError> {
        let served = self.serve_file(path).await?;
        let mime = mime_type_for(&served.path);
        if !is_video_mime(&mime) {
            return Err(CoreError::NotAVideo(served.path));
        }
        Ok(ServedFile {
            content_type: mime,
            ..served
        })
    }

    /// Returns the cached thumbnail of the video at `path`, generating it if needed.
    pub async fn thumbnail(&self, path: &str) -> Result<PathBuf, CoreError> {
        let abs_path = self.resolver.resolve(path)?;
        self.thumbnails.get_or_create(&abs_path).await
    }

    /// Creates `folder_name` (and any missing parents) inside `path`.
    ///
    /// Succeeds if the folder already exists. Returns the new folder's
    /// location relative to the root.
    pub async fn create_folder(&self, path: &str, folder_name: &str) -> Result<String, CoreError> {
        if folder_name.trim().is_empty() {
            return Err(CoreError::MissingField("foldername"));
        }

        let parent = self.resolver.resolve(path)?;
        let new_folder = self.resolver.resolve_child(&parent, folder_name)?;
        tracing::debug!("Creating folder '{}' at path: {}", folder_name, parent.display());

        tokio::fs::create_dir_all(&new_folder).await.map_err(|e| {
            tracing::error!("Error creating folder {}: {}", new_folder.display(), e);
            CoreError::FolderCreation(e, new_folder.clone())
        })?;

        tracing::info!("Created folder: {}", new_folder.display());
        Ok(self.relative_location(&new_folder))
    }

    /// Streams `reader` into `<location>/<file name>`, creating `location` if needed.
    ///
    /// Only the base name of `file_name` is used. An existing file of the
    /// same name is overwritten, and the file is written in place: readers
    /// can observe it partially written.
    pub async fn save_upload<R>(
        &self,
        location: &str,
        file_name: &str,
        reader: &mut R,
    ) -> Result<UploadedFile, CoreError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let base_name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::InvalidFileName(file_name.to_string()))?;

        let dir = self.resolver.resolve(location)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CoreError::Upload(e, dir.clone()))?;

        let file_path = dir.join(&base_name);
        tracing::debug!("Saving file to: {}", file_path.display());

        let upload_error = |e: std::io::Error| {
            tracing::error!("Error saving file {}: {}", file_path.display(), e);
            CoreError::Upload(e, file_path.clone())
        };
        let mut out = tokio::fs::File::create(&file_path)
            .await
            .map_err(upload_error)?;
        let bytes_written = tokio::io::copy(reader, &mut out)
            .await
            .map_err(upload_error)?;
        out.flush().await.map_err(upload_error)?;

        tracing::info!(
            "Uploaded {} ({} bytes)",
            file_path.display(),
            bytes_written
        );
        Ok(UploadedFile {
            path: file_path,
            file_name: base_name,
            bytes_written,
        })
    }

    fn relative_location(&self, abs_path: &Path) -> String {
        abs_path
            .strip_prefix(self.resolver.root())
            .map(slash_path)
            .unwrap_or_else(|_| abs_path.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FrameExtractor;
    use crate::utils::test_helpers::create_file;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    struct NoopExtractor;

    #[async_trait]
    impl FrameExtractor for NoopExtractor {
        async fn extract_frame(&self, _input: &Path, output: &Path) -> Result<(), CoreError> {
            tokio::fs::write(output, b"jpeg").await.unwrap();
            Ok(())
        }
    }

    fn handler(root: &TempDir) -> FileHandler {
        FileHandler::new(
            PathResolver::new(root.path(), true),
            ThumbnailService::new(root.path().join(".cache"), Arc::new(NoopExtractor)),
        )
    }

    #[tokio::test]
    async fn test_serve_file_requires_existing_file() {
        let root = tempdir().unwrap();
        create_file(root.path(), "docs/readme.txt", b"hello");
        let handler = handler(&root);

        let served = handler.serve_file("docs/readme.txt").await.unwrap();
        assert_eq!(served.size, 5);
        assert_eq!(served.content_type, "text/plain");

        assert!(matches!(
            handler.serve_file("docs/missing.txt").await,
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            handler.serve_file("docs").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_file_rejects_non_videos() {
        let root = tempdir().unwrap();
        create_file(root.path(), "clip.mp4", b"video");
        create_file(root.path(), "notes.txt", b"text");
        let handler = handler(&root);

        let served = handler.stream_file("clip.mp4").await.unwrap();
        assert_eq!(served.content_type, "video/mp4");
        assert!(matches!(
            handler.stream_file("notes.txt").await,
            Err(CoreError::NotAVideo(_))
        ));
        assert!(matches!(
            handler.stream_file("gone.mp4").await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_thumbnail_lands_in_cache_dir() {
        let root = tempdir().unwrap();
        create_file(root.path(), "clip.mp4", b"video");
        let handler = handler(&root);

        let thumb = handler.thumbnail("clip.mp4").await.unwrap();
        assert!(thumb.starts_with(root.path().join(".cache")));
        assert!(thumb.ends_with("thumbnail.jpg"));
        assert!(thumb.is_file());
    }

    #[tokio::test]
    async fn test_create_folder_is_idempotent() {
        let root = tempdir().unwrap();
        let handler = handler(&root);

        let created = handler.create_folder("media", "new/nested").await.unwrap();
        assert_eq!(created, "media/new/nested");
        assert!(root.path().join("media/new/nested").is_dir());

        let again = handler.create_folder("media", "new/nested").await.unwrap();
        assert_eq!(again, created);

        assert!(matches!(
            handler.create_folder("media", "  ").await,
            Err(CoreError::MissingField("foldername"))
        ));
        assert!(matches!(
            handler.create_folder("", "../outside").await,
            Err(CoreError::PathOutsideRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_create_folder_over_existing_file_fails() {
        let root = tempdir().unwrap();
        create_file(root.path(), "taken", b"file");
        let result = handler(&root).create_folder("", "taken").await;
        assert!(matches!(result, Err(CoreError::FolderCreation(..))));
    }

    #[tokio::test]
    async fn test_save_upload_creates_location_and_overwrites() {
        let root = tempdir().unwrap();
        let handler = handler(&root);

        let mut first: &[u8] = b"first version";
        let saved = handler
            .save_upload("incoming/today", "../../report.pdf", &mut first)
            .await
            .unwrap();
        assert_eq!(saved.file_name, "report.pdf");
        assert_eq!(saved.path, root.path().join("incoming/today/report.pdf"));
        assert_eq!(saved.bytes_written, 13);

        let mut second: &[u8] = b"v2";
        handler
            .save_upload("incoming/today", "report.pdf", &mut second)
            .await
            .unwrap();
        let content = std::fs::read(root.path().join("incoming/today/report.pdf")).unwrap();
        assert_eq!(content, b"v2");
    }

    #[tokio::test]
    async fn test_save_upload_rejects_empty_name() {
        let root = tempdir().unwrap();
        let mut data: &[u8] = b"x";
        let result = handler(&root).save_upload("", "", &mut data).await;
        assert!(matches!(result, Err(CoreError::InvalidFileName(_))));

        let mut data: &[u8] = b"x";
        let result = handler(&root).save_upload("", "..", &mut data).await;
        assert!(matches!(result, Err(CoreError::InvalidFileName(_))));
    }
}
