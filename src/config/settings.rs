use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::ServerConfig;

const APP_NAME: &str = "FilePi";
const CONFIG_FILE: &str = "config.json";

pub const ENV_CONFIG: &str = "FILE_PI_CONFIG";
pub const ENV_ROOT_DIR: &str = "FILE_PI_ROOT_DIR";
pub const ENV_TEMP_DIR: &str = "FILE_PI_TEMP_DIR";
pub const ENV_BIND: &str = "FILE_PI_BIND";
pub const ENV_ENFORCE_CONTAINMENT: &str = "FILE_PI_ENFORCE_CONTAINMENT";
pub const ENV_FFMPEG: &str = "FILE_PI_FFMPEG";
pub const ENV_LOG_LEVEL: &str = "FILE_PI_LOGLEVEL";

/// Returns the platform-specific configuration directory for the application.
pub fn get_config_directory() -> Option<PathBuf> {
    ProjectDirs::from("com", "filepi", APP_NAME)
        .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
}

/// Returns the full path to the default configuration file.
pub fn get_config_file_path() -> Option<PathBuf> {
    get_config_directory().map(|dir| dir.join(CONFIG_FILE))
}

/// Builds the server configuration.
///
/// Layers, lowest priority first: built-in defaults, a JSON config file
/// (`explicit_path`, then `FILE_PI_CONFIG`, then the platform config
/// directory if a file exists there), and finally `FILE_PI_*` environment
/// variables. A config file that cannot be parsed is logged and ignored.
///
/// The root directory must exist; the thumbnail cache directory is created.
pub fn load_config(explicit_path: Option<&Path>) -> Result<ServerConfig> {
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
        .or_else(|| get_config_file_path().filter(|p| p.exists()));

    let mut config = match config_path {
        Some(path) => read_config_file(&path)?,
        None => ServerConfig::default(),
    };

    apply_env_overrides(&mut config);
    finalize(config)
}

fn read_config_file(config_path: &Path) -> Result<ServerConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file {:?}", config_path))?;

    // Attempt to parse the config. If it fails, log a warning and fall back
    // to defaults rather than refusing to start.
    match serde_json::from_str::<ServerConfig>(&config_content) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse config file at {:?}: {}. Falling back to default config.",
                config_path,
                e
            );
            Ok(ServerConfig::default())
        }
    }
}

/// Overrides config fields with any `FILE_PI_*` variables that are set.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    if let Some(root) = non_empty_var(ENV_ROOT_DIR) {
        config.root_dir = PathBuf::from(root);
    }
    if let Some(temp) = non_empty_var(ENV_TEMP_DIR) {
        config.temp_dir = Some(PathBuf::from(temp));
    }
    if let Some(bind) = non_empty_var(ENV_BIND) {
        config.bind_address = bind;
    }
    if let Some(ffmpeg) = non_empty_var(ENV_FFMPEG) {
        config.ffmpeg_path = ffmpeg;
    }
    if let Some(raw) = non_empty_var(ENV_ENFORCE_CONTAINMENT) {
        match parse_bool(&raw) {
            Some(value) => config.enforce_containment = value,
            None => tracing::warn!(
                "Ignoring {}={:?}: expected true or false",
                ENV_ENFORCE_CONTAINMENT,
                raw
            ),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validates the root, canonicalizes it and creates the cache directory.
fn finalize(mut config: ServerConfig) -> Result<ServerConfig> {
    if !config.root_dir.is_dir() {
        anyhow::bail!(
            "Root directory {} does not exist or is not a directory",
            config.root_dir.display()
        );
    }
    config.root_dir = config
        .root_dir
        .canonicalize()
        .with_context(|| format!("Failed to canonicalize {}", config.root_dir.display()))?;

    let cache_dir = config.cache_dir();
    if !cache_dir.exists() {
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        tracing::info!("Created cache directory: {:?}", cache_dir);
    }
    config.temp_dir = Some(cache_dir);

    tracing::info!("Root directory: {}", config.root_dir.display());
    Ok(config)
}
