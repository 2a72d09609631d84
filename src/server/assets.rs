//! Static asset delivery with conditional-caching support.
//!
//! Every asset response carries an `ETag` derived from the file's
//! modification time and length, plus `Last-Modified` and client-cache
//! headers. `If-None-Match`, when present, alone decides revalidation;
//! otherwise an exact `If-Modified-Since` match does. Either match yields
//! a bodiless 304 with the same caching headers.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use chrono::{DateTime, Duration, Utc};
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};

use crate::common::ServeConfig;

const NOT_FOUND_BODY: &str = "<h1>The page you requested does not exist.</h1>";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn http_date(time: DateTime<Utc>) -> String {
    time.format(HTTP_DATE_FORMAT).to_string()
}

/// Content type by extension; unknown extensions fall back to HTML, the
/// same advisory behavior the asset pages rely on.
fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("jpeg") | Some("jpg") => "image/jpg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        _ => "text/html",
    }
}

/// ETag over the file's mtime and length, truncated the way short content
/// identifiers are built elsewhere in the crate's ecosystem.
fn compute_etag(modified_ms: i64, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{modified_ms}{length}").as_bytes());
    format!("\"{}\"", &format!("{:x}", hasher.finalize())[..16])
}

/// If-None-Match comparison supporting lists and the wildcard.
fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .any(|candidate| candidate.trim() == etag || candidate.trim() == "*")
}

/// Resolve the request path to a file under the configured root.
/// Directory requests resolve to their `index.html`; traversal components
/// are rejected outright.
fn resolve_path(root: &Path, raw_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(raw_path).decode_utf8().ok()?;
    let mut relative = decoded.trim_start_matches('/').to_string();
    if relative.is_empty() || relative.ends_with('/') {
        relative.push_str("index.html");
    }

    let candidate = Path::new(&relative);
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }

    Some(root.join(candidate))
}

fn not_found() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/html")
        .body(Body::from(NOT_FOUND_BODY))
        .expect("static 404 response")
}

/// Fallback handler serving any path under the configured root.
pub async fn serve_asset(
    State(config): State<ServeConfig>,
    request: Request<Body>,
) -> Response<Body> {
    let path = request.uri().path().to_string();
    let Some(file_path) = resolve_path(&config.root, &path) else {
        return not_found();
    };

    let Ok(metadata) = tokio::fs::metadata(&file_path).await else {
        return not_found();
    };
    if !metadata.is_file() {
        return not_found();
    }
    let Ok(contents) = tokio::fs::read(&file_path).await else {
        return not_found();
    };

    let modified: DateTime<Utc> = metadata
        .modified()
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .into();
    let last_modified = http_date(modified);
    let etag = compute_etag(modified.timestamp_millis(), contents.len());

    let status = revalidation_status(request.headers(), &etag, &last_modified);

    let now = Utc::now();
    let expires = now + Duration::seconds(i64::from(config.cache.expires_secs));
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type_for(&file_path))
        .header(
            header::CACHE_CONTROL,
            format!("max-age={}", config.cache.max_age_secs),
        )
        .header(header::EXPIRES, http_date(expires))
        .header(header::DATE, http_date(now))
        .header(header::ETAG, &etag)
        .header(header::LAST_MODIFIED, &last_modified)
        .header(
            header::SERVER,
            concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
        );

    let body = if status == StatusCode::NOT_MODIFIED {
        Body::empty()
    } else {
        builder = builder.header(header::CONTENT_LENGTH, contents.len());
        Body::from(contents)
    };

    builder.body(body).expect("asset response")
}

/// 304 decision: `If-None-Match` alone decides when present, otherwise an
/// exact `If-Modified-Since` string match.
fn revalidation_status(headers: &HeaderMap, etag: &str, last_modified: &str) -> StatusCode {
    if let Some(if_none_match) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    {
        if etag_matches(if_none_match, etag) {
            return StatusCode::NOT_MODIFIED;
        }
        return StatusCode::OK;
    }
    if let Some(if_modified_since) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
    {
        if if_modified_since == last_modified {
            return StatusCode::NOT_MODIFIED;
        }
    }
    StatusCode::OK
}
