//! Serve the generated output directory.

use std::{
    io::ErrorKind,
    path::{Path as FsPath, PathBuf},
};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use mime_guess::Mime;
use tracing::error;

use crate::application::error::HttpError;

use super::http::HttpState;

const INDEX_FILE: &str = "index.html";
const NOT_FOUND_MESSAGE: &str = "File not found";

/// `/`: the site's index page.
pub async fn serve_root(State(state): State<HttpState>) -> Response {
    serve_output(state.root(), None).await
}

/// `/{*path}`: any file below the output directory.
pub async fn serve_path(State(state): State<HttpState>, Path(path): Path<String>) -> Response {
    serve_output(state.root(), Some(path)).await
}

async fn serve_output(root: &FsPath, path: Option<String>) -> Response {
    const SOURCE: &str = "infra::assets::serve_output";

    let Some(mut candidate) = resolve_request_path(root, path.as_deref().unwrap_or_default())
    else {
        return not_found(SOURCE, "request path rejected");
    };

    if tokio::fs::metadata(&candidate)
        .await
        .is_ok_and(|metadata| metadata.is_dir())
    {
        candidate.push(INDEX_FILE);
    }

    match tokio::fs::read(&candidate).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&candidate).first_or_octet_stream();
            build_response(Bytes::from(bytes), mime)
        }
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            not_found(SOURCE, format!("no file at `{}`", candidate.display()))
        }
        Err(err) => {
            error!(
                target = SOURCE,
                path = %candidate.display(),
                error = %err,
                "failed to read output file"
            );
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
                &err,
            )
            .into_response()
        }
    }
}

/// Map a request path onto the output directory. Empty paths and paths
/// ending in `/` name the directory's index; `..` anywhere is refused.
pub fn resolve_request_path(root: &FsPath, request: &str) -> Option<PathBuf> {
    let trimmed = request.trim_start_matches('/');
    if trimmed.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for segment in trimmed.split('/').filter(|segment| !segment.is_empty()) {
        if segment == "." || segment.contains('\\') {
            return None;
        }
        resolved.push(segment);
    }

    if trimmed.is_empty() || trimmed.ends_with('/') {
        resolved.push(INDEX_FILE);
    }
    Some(resolved)
}

fn not_found(source: &'static str, detail: impl Into<String>) -> Response {
    HttpError::new(source, StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, detail).into_response()
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    response
}
