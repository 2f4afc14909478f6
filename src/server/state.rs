//! Shared, read-only state handed to every request handler.

use crate::config::ServerConfig;
use crate::core::{
    FfmpegExtractor, FileHandler, FrameExtractor, ListingEngine, PathResolver, ThumbnailService,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Everything a handler needs, cheap to clone.
///
/// Nothing in here is mutated after startup except the request counter.
#[derive(Clone)]
pub struct AppState {
    /// The configuration the server was started with.
    pub config: Arc<ServerConfig>,
    /// Flat, video and search listings.
    pub listing: Arc<ListingEngine>,
    /// Serving, thumbnails, folder creation and uploads.
    pub files: Arc<FileHandler>,
    request_counter: Arc<AtomicU64>,
}

impl AppState {
    /// Builds the state using `extractor` for thumbnail generation.
    pub fn new(config: Arc<ServerConfig>, extractor: Arc<dyn FrameExtractor>) -> Self {
        let resolver = PathResolver::new(&config.root_dir, config.enforce_containment);
        let thumbnails = ThumbnailService::new(config.cache_dir(), extractor);

        Self {
            listing: Arc::new(ListingEngine::from_config(&config)),
            files: Arc::new(FileHandler::new(resolver, thumbnails)),
            config,
            request_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builds the state with thumbnails generated by the configured `ffmpeg`.
    pub fn from_config(config: ServerConfig) -> Self {
        let extractor = FfmpegExtractor::new(config.ffmpeg_path.clone(), config.thumbnail_width);
        Self::new(Arc::new(config), Arc::new(extractor))
    }

    /// Hands out the next request id, starting at 1.
    pub fn next_request_id(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}
