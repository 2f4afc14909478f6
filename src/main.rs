use filepi::config::{settings, ServerConfig};
use filepi::server::{self, AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = ServerConfig::load()?;
    tracing::info!(
        "Root directory: {}, thumbnail cache: {}, containment enforced: {}",
        config.root_dir.display(),
        config.cache_dir().display(),
        config.enforce_containment
    );

    server::serve(AppState::from_config(config)).await
}

/// Sets up the global subscriber from `FILE_PI_LOGLEVEL`.
fn init_logging() {
    let level = std::env::var(settings::ENV_LOG_LEVEL)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let (filter, rejected) = match EnvFilter::try_new(&level) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new("info"), Some(e)),
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = rejected {
        tracing::warn!("Invalid log level {:?} ({}), using info", level, e);
    }
}
