pub mod settings;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the thumbnail cache directory created inside the root by default.
pub const CACHE_DIR_NAME: &str = ".cache";

/// Process-wide settings, read once at startup and never mutated afterwards.
///
/// Shared behind an `Arc` by the server; every component borrows it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// The directory tree exposed over HTTP.
    pub root_dir: PathBuf,
    /// Where generated thumbnails are cached. Defaults to `<root_dir>/.cache`.
    pub temp_dir: Option<PathBuf>,
    pub bind_address: String,
    /// Reject request paths that normalize to a location above `root_dir`.
    pub enforce_containment: bool,
    /// Identity reported in the `owner` field of every entry.
    pub default_owner: String,
    pub ffmpeg_path: String,
    pub thumbnail_width: u32,
}

impl ServerConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// Creates a configuration rooted at `root_dir` with every other field at its default.
    pub fn with_root(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            ..Default::default()
        }
    }

    /// The effective thumbnail cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.root_dir.join(CACHE_DIR_NAME))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            root_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            temp_dir: None,
            bind_address: "0.0.0.0:8080".to_string(),
            enforce_containment: true,
            default_owner: "user1".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            thumbnail_width: 320,
        }
    }
}
