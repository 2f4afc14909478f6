//! Request handlers for the `/api/v1` routes.
//!
//! Handlers only translate between HTTP and `core`: they pull parameters out
//! of the request, run the matching core operation and shape the response.

use super::error::ApiError;
use super::range::ByteRange;
use super::state::AppState;
use crate::core::{
    CoreError, FileHandler, ListQuery, ListResponse, ListingEngine, ServedFile, UploadedFile,
};
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Form, Multipart, Query, RawPathParams, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio_util::io::ReaderStream;

/// Bytes in flight between the request body and the file being written.
const UPLOAD_PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct VideoOptions {
    #[serde(default = "default_recursive")]
    pub recursive: bool,
}

fn default_recursive() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SearchText {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderForm {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub foldername: String,
}

/// Runs a synchronous listing on the blocking pool.
async fn run_listing<F>(state: &AppState, listing: F) -> Result<ListResponse, ApiError>
where
    F: FnOnce(&ListingEngine) -> Result<ListResponse, CoreError> + Send + 'static,
{
    let engine = state.listing.clone();
    let response = tokio::task::spawn_blocking(move || listing(engine.as_ref()))
        .await
        .map_err(CoreError::from)??;
    Ok(response)
}

/// GET /files - One directory level, directories included.
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let response = run_listing(&state, move |engine| engine.list_directory(&query)).await?;
    Ok(Json(response))
}

/// GET /videos - Video files below `path`, recursively unless `recursive=false`.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(options): Query<VideoOptions>,
) -> Result<Json<ListResponse>, ApiError> {
    let response = run_listing(&state, move |engine| {
        engine.list_videos(&query, options.recursive)
    })
    .await?;
    Ok(Json(response))
}

/// GET /search - Files below `path` whose name contains `query`.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(text): Query<SearchText>,
) -> Result<Json<ListResponse>, ApiError> {
    let response = run_listing(&state, move |engine| engine.search(&text.query, &query)).await?;
    Ok(Json(response))
}

/// GET /file/{*path} - Raw file contents.
pub async fn serve_file(
    State(state): State<AppState>,
    params: RawPathParams,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let served = state.files.serve_file(wildcard(&params)).await?;
    Ok(file_response(served, &headers).await?)
}

/// GET /stream/{*path} - Raw contents of a video file.
pub async fn stream_file(
    State(state): State<AppState>,
    params: RawPathParams,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let served = state.files.stream_file(wildcard(&params)).await?;
    Ok(file_response(served, &headers).await?)
}

/// GET /thumbnail/{*path} - JPEG preview frame of a video.
pub async fn thumbnail(
    State(state): State<AppState>,
    params: RawPathParams,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let thumbnail = state.files.thumbnail(wildcard(&params)).await?;
    let size = tokio::fs::metadata(&thumbnail)
        .await
        .map_err(|_| CoreError::NotFound(thumbnail.clone()))?
        .len();
    let served = ServedFile {
        path: thumbnail,
        content_type: "image/jpeg".to_string(),
        size,
    };
    Ok(file_response(served, &headers).await?)
}

/// POST /createfolder - Form fields `path` and `foldername`.
pub async fn create_folder(
    State(state): State<AppState>,
    Form(form): Form<CreateFolderForm>,
) -> Result<Json<Value>, ApiError> {
    let created = state
        .files
        .create_folder(&form.path, &form.foldername)
        .await?;
    Ok(Json(json!({
        "message": "Folder created successfully",
        "path": created,
    })))
}

/// POST /uploadfile - Multipart fields `file`, `location` and `user`.
///
/// When `location` and `user` precede the file part, the file is streamed
/// to disk as it arrives. Otherwise the file part is held in memory until
/// the other fields have been read.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut location: Option<String> = None;
    let mut user: Option<String> = None;
    let mut streamed = None;
    let mut buffered = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "location" => location = Some(field.text().await?),
            "user" => user = Some(field.text().await?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                match location.as_deref() {
                    Some(location) if user.is_some() => {
                        let saved = stream_upload(&state.files, location, &file_name, field).await?;
                        streamed = Some(saved);
                    }
                    _ => {
                        tracing::debug!("Buffering {:?} until all fields are read", file_name);
                        buffered = Some((file_name, field.bytes().await?));
                    }
                }
            }
            _ => tracing::debug!("Ignoring multipart field {:?}", name),
        }
    }

    let location = location.ok_or(CoreError::MissingField("location"))?;
    let user = user.ok_or(CoreError::MissingField("user"))?;
    let saved = match (streamed, buffered) {
        (Some(saved), _) => saved,
        (None, Some((file_name, data))) => {
            state
                .files
                .save_upload(&location, &file_name, &mut &data[..])
                .await?
        }
        (None, None) => return Err(CoreError::MissingField("file").into()),
    };
    tracing::info!("{} uploaded {} bytes", user, saved.bytes_written);

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "filename": saved.file_name,
        "location": state.listing.resolver().display_relative(&saved.path),
        "uploaded_by": user,
    })))
}

/// Pipes the chunks of a multipart field into [`FileHandler::save_upload`].
///
/// A failure to save takes precedence over a failure to read the request.
async fn stream_upload(
    files: &FileHandler,
    location: &str,
    file_name: &str,
    mut field: Field<'_>,
) -> Result<UploadedFile, ApiError> {
    let (mut writer, mut reader) = tokio::io::duplex(UPLOAD_PIPE_CAPACITY);

    // The writer is dropped when the field is exhausted, which ends the copy.
    let pump = async move {
        while let Some(chunk) = field.chunk().await? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| CoreError::Upload(e, PathBuf::from(file_name)))?;
        }
        Ok::<(), ApiError>(())
    };
    // Owning the reader lets an early save failure unblock the pump.
    let save = async move { files.save_upload(location, file_name, &mut reader).await };

    let (pumped, saved) = tokio::join!(pump, save);
    let saved = saved?;
    pumped?;
    Ok(saved)
}

/// The undecoded value of the route's wildcard segment.
fn wildcard(params: &RawPathParams) -> &str {
    params
        .iter()
        .next()
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// Streams `served` from disk, honoring a single byte range.
async fn file_response(served: ServedFile, headers: &HeaderMap) -> Result<Response, CoreError> {
    let range_header = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    let range = ByteRange::parse(range_header, served.size);

    let mut file = tokio::fs::File::open(&served.path)
        .await
        .map_err(|_| CoreError::NotFound(served.path.clone()))?;

    let response = match range {
        ByteRange::Full => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, served.content_type),
                (header::CONTENT_LENGTH, served.size.to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response(),
        ByteRange::Partial { start, end } => {
            file.seek(SeekFrom::Start(start))
                .await
                .map_err(|_| CoreError::NotFound(served.path.clone()))?;
            let length = end - start + 1;
            tracing::debug!(
                "Serving bytes {}-{} of {}",
                start,
                end,
                served.path.display()
            );
            (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, served.content_type),
                    (header::CONTENT_LENGTH, length.to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                    (
                        header::CONTENT_RANGE,
                        range.content_range(served.size).unwrap_or_default(),
                    ),
                ],
                Body::from_stream(ReaderStream::new(file.take(length))),
            )
                .into_response()
        }
        ByteRange::Unsatisfiable => (
            StatusCode::RANGE_NOT_SATISFIABLE,
            [
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (
                    header::CONTENT_RANGE,
                    range.content_range(served.size).unwrap_or_default(),
                ),
            ],
        )
            .into_response(),
    };

    Ok(response)
}
