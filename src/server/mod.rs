//! The HTTP surface: routing, request logging and startup.

pub mod error;
pub mod handlers;
pub mod range;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::time::Instant;

/// Upper bound for a multipart upload request body.
pub const UPLOAD_BODY_LIMIT: usize = 512 * 1024 * 1024;

/// Builds the application router with every route under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/files", get(handlers::list_files))
        .route("/videos", get(handlers::list_videos))
        .route("/search", get(handlers::search))
        .route("/file/{*path}", get(handlers::serve_file))
        .route("/stream/{*path}", get(handlers::stream_file))
        .route("/thumbnail/{*path}", get(handlers::thumbnail))
        .route("/createfolder", post(handlers::create_folder))
        .route(
            "/uploadfile",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        );

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

/// Logs every request with a numeric id, its outcome and how long it took.
async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let request_id = state.next_request_id();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    tracing::debug!("[{}] --> {} {}", request_id, method, uri);
    let response = next.run(request).await;
    tracing::info!(
        "[{}] {} {} {} ({:?})",
        request_id,
        method,
        uri,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

/// Binds `bind_address` from the state's configuration and serves until the process exits.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_address = state.config.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(
        "Serving {} on http://{}",
        state.config.root_dir.display(),
        listener.local_addr()?
    );
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
