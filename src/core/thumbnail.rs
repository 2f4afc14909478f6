//! Video thumbnail extraction with an on-disk cache.

use super::CoreError;
use async_trait::async_trait;
use md5::{Digest, Md5};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

const THUMBNAIL_FILE: &str = "thumbnail.jpg";
const FRAME_TIMESTAMP: &str = "00:00:01";

/// Produces a single JPEG frame from a video.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), CoreError>;
}

/// Runs `ffmpeg` to grab the frame one second into the video, scaled to a
/// fixed width with proportional height.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: String,
    width: u32,
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<String>, width: u32) -> Self {
        Self {
            program: program.into(),
            width,
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), CoreError> {
        let scale = format!("scale={}:-1", self.width);
        let result = Command::new(&self.program)
            .arg("-i")
            .arg(input)
            .args(["-ss", FRAME_TIMESTAMP, "-vframes", "1", "-vf", scale.as_str(), "-y"])
            .arg(output)
            .output()
            .await
            .map_err(|e| {
                CoreError::ThumbnailGeneration(
                    input.to_path_buf(),
                    format!("failed to run {}: {}", self.program, e),
                )
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let last_line = stderr.lines().last().unwrap_or_default().trim().to_string();
            return Err(CoreError::ThumbnailGeneration(
                input.to_path_buf(),
                format!("{} exited with {}: {}", self.program, result.status, last_line),
            ));
        }
        Ok(())
    }
}

/// Hands out cached thumbnails, generating each one on first request.
///
/// The cache key is the MD5 of the absolute path string, not of the file
/// content: replacing a video in place keeps serving the old thumbnail.
#[derive(Clone)]
pub struct ThumbnailService {
    cache_dir: PathBuf,
    extractor: Arc<dyn FrameExtractor>,
}

impl ThumbnailService {
    pub fn new(cache_dir: impl Into<PathBuf>, extractor: Arc<dyn FrameExtractor>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            extractor,
        }
    }

    pub fn cache_key(video: &Path) -> String {
        let mut hasher = Md5::new();
        hasher.update(video.to_string_lossy().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Where the thumbnail for `video` lives, whether or not it exists yet.
    pub fn thumbnail_path(&self, video: &Path) -> PathBuf {
        self.cache_dir
            .join(Self::cache_key(video))
            .join(THUMBNAIL_FILE)
    }

    /// Returns the cached thumbnail for `video`, extracting it if missing.
    ///
    /// Concurrent first requests for the same video may both run the
    /// extractor; they write the same output path.
    pub async fn get_or_create(&self, video: &Path) -> Result<PathBuf, CoreError> {
        if tokio::fs::metadata(video).await.is_err() {
            tracing::error!("File does not exist: {}", video.display());
            return Err(CoreError::NotFound(video.to_path_buf()));
        }

        let output = self.thumbnail_path(video);
        if tokio::fs::metadata(&output).await.is_ok() {
            tracing::debug!("Serving cached thumbnail {}", output.display());
            return Ok(output);
        }

        if let Some(output_dir) = output.parent() {
            tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
                tracing::error!("Error creating thumbnail directory: {}", e);
                CoreError::ThumbnailGeneration(
                    video.to_path_buf(),
                    format!("failed to create thumbnail directory: {}", e),
                )
            })?;
        }

        tracing::info!("Generating thumbnail for video: {}", video.display());
        self.extractor.extract_frame(video, &output).await?;
        Ok(output)
    }
}
